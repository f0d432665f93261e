use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        CreateOrderRequest, OrderDto, OrderList, PayOrderResponse, UpdateOrderStatusRequest,
        VerifyQuery, VerifyResponse,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{order_service, payment_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        // Static segment, so it wins over "/{id}".
        .route("/verify", get(verify_payment))
        .route(
            "/{id}",
            get(get_order).patch(update_status).delete(delete_order),
        )
        .route("/{id}/pay", post(pay_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "asc, desc")
    ),
    responses(
        (status = 200, description = "Own orders; every order for staff", body = ApiResponse<OrderList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created from cart", body = ApiResponse<OrderDto>),
        (status = 400, description = "Missing cart, empty cart, or no customer profile"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderDto>>> {
    let resp = order_service::create_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderDto>),
        (status = 404, description = "Not found or not yours"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDto>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated (staff only)", body = ApiResponse<Order>),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Deleted (staff only)"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Order still has items"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = order_service::delete_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/pay",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Gateway redirect info", body = ApiResponse<PayOrderResponse>),
        (status = 400, description = "Order already paid"),
        (status = 404, description = "Not found or not yours"),
        (status = 503, description = "Gateway unavailable"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn pay_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PayOrderResponse>>> {
    let resp = payment_service::pay(&state, &user, id).await?;
    Ok(Json(resp))
}

// The gateway callback carries no session; the authority-token lookup is
// the only authentication.
#[utoipa::path(
    get,
    path = "/api/orders/verify",
    params(
        ("Authority" = String, Query, description = "Gateway authority token"),
        ("Status" = String, Query, description = "OK or NOK")
    ),
    responses(
        (status = 200, description = "Payment verified", body = ApiResponse<VerifyResponse>),
        (status = 400, description = "Canceled or rejected by the gateway"),
        (status = 404, description = "Unknown authority"),
        (status = 503, description = "Gateway unavailable"),
    ),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> AppResult<Json<ApiResponse<VerifyResponse>>> {
    let resp = payment_service::verify(&state, query).await?;
    Ok(Json(resp))
}
