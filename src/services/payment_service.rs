use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    dto::orders::{PayOrderResponse, VerifyQuery, VerifyResponse},
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol},
        Orders,
    },
    error::{AppError, AppResult},
    gateway::{GatewayError, VERIFY_STATUS_ALREADY_VERIFIED, VERIFY_STATUS_OK},
    middleware::auth::AuthUser,
    models::ORDER_STATUS_PAID,
    response::{ApiResponse, Meta},
    routes::policy::{require_order_access, OrderScope, OrderVerb},
    services::order_service,
    state::AppState,
};

/// Callback status flag the gateway sends on a completed payment attempt.
const CALLBACK_STATUS_OK: &str = "OK";

/// What the verification callback should do to the order, decided from the
/// gateway's result code.
#[derive(Debug, PartialEq, Eq)]
pub enum VerifyAction {
    MarkPaid,
    /// Re-delivered callback for a settled payment; succeed without touching
    /// the order again.
    AlreadyVerified,
    Rejected(i64),
}

pub fn verification_action(status_code: i64) -> VerifyAction {
    match status_code {
        VERIFY_STATUS_OK => VerifyAction::MarkPaid,
        VERIFY_STATUS_ALREADY_VERIFIED => VerifyAction::AlreadyVerified,
        other => VerifyAction::Rejected(other),
    }
}

/// Initiate payment for an order the caller owns. The order keeps its
/// authority token only once the gateway returned a well-formed one, so a
/// failed initiation leaves the row untouched.
pub async fn pay(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<PayOrderResponse>> {
    let access = require_order_access(user, OrderVerb::Pay)?;

    let order = Orders::find_by_id(order_id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    // Pay is scoped Own for every role; staff get no bypass here.
    if access.scope == OrderScope::Own {
        order_service::ensure_owner(state, user, &order).await?;
    }

    if order.status == ORDER_STATUS_PAID {
        return Err(AppError::BadRequest("Order has already been paid".into()));
    }

    let amount = order_service::order_total(&state.orm, order.id).await?;
    let description = format!("Order {}", order.id);
    let callback_url = format!("{}/api/orders/verify", state.config.callback_base_url);

    let authority = state
        .gateway
        .request_payment(amount, &description, &callback_url)
        .await
        .map_err(|err| AppError::GatewayUnavailable(err.to_string()))?;

    let mut active: OrderActive = order.into();
    active.zarinpal_authority = Set(Some(authority.clone()));
    active.update(&state.orm).await?;

    let payment_url = state.gateway.payment_page_url(&authority);
    tracing::info!(%order_id, amount, "payment initiated");

    Ok(ApiResponse::success(
        "Redirect to payment gateway",
        PayOrderResponse {
            authority,
            payment_url,
        },
        Some(Meta::empty()),
    ))
}

/// Gateway redirect callback. Unauthenticated: trust comes from the
/// authority-token lookup alone.
pub async fn verify(
    state: &AppState,
    query: VerifyQuery,
) -> AppResult<ApiResponse<VerifyResponse>> {
    let order = Orders::find()
        .filter(OrderCol::ZarinpalAuthority.eq(query.authority.clone()))
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if query.status != CALLBACK_STATUS_OK {
        return Err(AppError::BadRequest(
            "payment was canceled at the gateway".into(),
        ));
    }

    let amount = order_service::order_total(&state.orm, order.id).await?;
    let outcome = state
        .gateway
        .verify_payment(amount, &query.authority)
        .await
        .map_err(|err| match err {
            GatewayError::Transport(_) => AppError::GatewayUnavailable(err.to_string()),
            GatewayError::Rejected(message) => AppError::BadRequest(message),
        })?;

    match verification_action(outcome.status_code) {
        VerifyAction::MarkPaid => {
            let order_id = order.id;
            let ref_id = outcome.ref_id.map(|id| id.to_string());
            let mut active: OrderActive = order.into();
            active.status = Set(ORDER_STATUS_PAID.to_string());
            active.zarinpal_ref_id = Set(ref_id.clone());
            active.zarinpal_data = Set(Some(outcome.raw));
            active.update(&state.orm).await?;

            tracing::info!(%order_id, ?ref_id, "payment verified");
            Ok(ApiResponse::success(
                "Payment verified",
                VerifyResponse {
                    order_id,
                    status: ORDER_STATUS_PAID.to_string(),
                    ref_id,
                },
                Some(Meta::empty()),
            ))
        }
        VerifyAction::AlreadyVerified => Ok(ApiResponse::success(
            "Payment already verified",
            VerifyResponse {
                order_id: order.id,
                status: order.status,
                ref_id: order.zarinpal_ref_id,
            },
            Some(Meta::empty()),
        )),
        VerifyAction::Rejected(code) => Err(AppError::BadRequest(format!(
            "payment verification failed with gateway code {code}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_actions() {
        assert_eq!(verification_action(100), VerifyAction::MarkPaid);
        assert_eq!(verification_action(101), VerifyAction::AlreadyVerified);
        assert_eq!(verification_action(-21), VerifyAction::Rejected(-21));
        assert_eq!(verification_action(0), VerifyAction::Rejected(0));
    }
}
