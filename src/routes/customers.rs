use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::customers::{CreateCustomerRequest, CustomerList, UpdateCustomerRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Customer,
    response::ApiResponse,
    routes::params::Pagination,
    services::customer_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/me", get(get_me).put(update_me))
}

#[utoipa::path(get, path = "/api/customers", tag = "Customers",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List customers (staff only)", body = ApiResponse<CustomerList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])))]
pub async fn list_customers(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CustomerList>>> {
    let resp = customer_service::list_customers(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(post, path = "/api/customers", tag = "Customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 200, description = "Create customer profile (staff only)", body = ApiResponse<Customer>),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Profile already exists for this account"),
    ),
    security(("bearer_auth" = [])))]
pub async fn create_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCustomerRequest>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    let resp = customer_service::create_customer(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/customers/me", tag = "Customers",
    responses(
        (status = 200, description = "Own customer profile", body = ApiResponse<Customer>),
        (status = 404, description = "No profile for this account"),
    ),
    security(("bearer_auth" = [])))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Customer>>> {
    let resp = customer_service::get_me(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(put, path = "/api/customers/me", tag = "Customers",
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<Customer>),
        (status = 404, description = "No profile for this account"),
    ),
    security(("bearer_auth" = [])))]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateCustomerRequest>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    let resp = customer_service::update_me(&state, &user, payload).await?;
    Ok(Json(resp))
}
