use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::customers::{CreateCustomerRequest, CustomerList, UpdateCustomerRequest},
    entity::{
        customers::{ActiveModel, Column, Model as CustomerModel},
        Customers,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::Customer,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_customers(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CustomerList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Customers::find().order_by_desc(Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(customer_from_entity)
        .collect();

    Ok(ApiResponse::paginated("Customers", CustomerList { items }, page, limit, total))
}

/// Staff-side creation; the profile binds one-to-one to an identity
/// provider principal.
pub async fn create_customer(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCustomerRequest,
) -> AppResult<ApiResponse<Customer>> {
    ensure_staff(user)?;

    let existing = Customers::find()
        .filter(Column::UserId.eq(payload.user_id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "a customer already exists for this account".into(),
        ));
    }

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(payload.user_id),
        phone_number: Set(payload.phone_number),
        created_at: NotSet,
    };
    let customer = active.insert(&state.orm).await?;

    Ok(ApiResponse::success(
        "Customer created",
        customer_from_entity(customer),
        Some(Meta::empty()),
    ))
}

pub async fn get_me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Customer>> {
    let customer = find_by_user(state, user.user_id).await?;
    Ok(ApiResponse::success("Profile", customer_from_entity(customer), None))
}

pub async fn update_me(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateCustomerRequest,
) -> AppResult<ApiResponse<Customer>> {
    let customer = find_by_user(state, user.user_id).await?;
    let mut active: ActiveModel = customer.into();
    active.phone_number = Set(payload.phone_number);
    let customer = active.update(&state.orm).await?;
    Ok(ApiResponse::success(
        "Profile updated",
        customer_from_entity(customer),
        None,
    ))
}

pub async fn find_by_user(state: &AppState, user_id: Uuid) -> AppResult<CustomerModel> {
    let customer = Customers::find()
        .filter(Column::UserId.eq(user_id))
        .one(&state.orm)
        .await?;
    match customer {
        Some(c) => Ok(c),
        None => Err(AppError::NotFound),
    }
}

pub fn customer_from_entity(model: CustomerModel) -> Customer {
    Customer {
        id: model.id,
        user_id: model.user_id,
        phone_number: model.phone_number,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
