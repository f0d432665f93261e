use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddCartItemRequest, CartDetail, CartItemDto, UpdateCartItemRequest},
    error::AppResult,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

// Carts are anonymous; the opaque cart id is the only credential.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_cart))
        .route("/{cart_id}", get(get_cart).delete(delete_cart))
        .route("/{cart_id}/items", post(add_item))
        .route(
            "/{cart_id}/items/{item_id}",
            patch(update_item).delete(remove_item),
        )
}

#[utoipa::path(post, path = "/api/carts", tag = "Carts",
    responses((status = 200, description = "Create an empty cart", body = ApiResponse<CartDetail>)))]
pub async fn create_cart(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CartDetail>>> {
    let resp = cart_service::create_cart(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/carts/{cart_id}", tag = "Carts",
    params(("cart_id" = Uuid, Path, description = "Cart ID")),
    responses(
        (status = 200, description = "Cart with items and totals", body = ApiResponse<CartDetail>),
        (status = 404, description = "Cart not found"),
    ))]
pub async fn get_cart(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartDetail>>> {
    let resp = cart_service::get_cart(&state, cart_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(delete, path = "/api/carts/{cart_id}", tag = "Carts",
    params(("cart_id" = Uuid, Path, description = "Cart ID")),
    responses(
        (status = 200, description = "Cart deleted"),
        (status = 404, description = "Cart not found"),
    ))]
pub async fn delete_cart(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = cart_service::delete_cart(&state, cart_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(post, path = "/api/carts/{cart_id}/items", tag = "Carts",
    params(("cart_id" = Uuid, Path, description = "Cart ID")),
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Item added or merged", body = ApiResponse<CartItemDto>),
        (status = 400, description = "Unknown product or invalid quantity"),
        (status = 404, description = "Cart not found"),
    ))]
pub async fn add_item(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
    Json(payload): Json<AddCartItemRequest>,
) -> AppResult<Json<ApiResponse<CartItemDto>>> {
    let resp = cart_service::add_item(&state, cart_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(patch, path = "/api/carts/{cart_id}/items/{item_id}", tag = "Carts",
    params(
        ("cart_id" = Uuid, Path, description = "Cart ID"),
        ("item_id" = Uuid, Path, description = "Cart item ID")
    ),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity updated", body = ApiResponse<CartItemDto>),
        (status = 404, description = "Cart or item not found"),
    ))]
pub async fn update_item(
    State(state): State<AppState>,
    Path((cart_id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<CartItemDto>>> {
    let resp = cart_service::update_item(&state, cart_id, item_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(delete, path = "/api/carts/{cart_id}/items/{item_id}", tag = "Carts",
    params(
        ("cart_id" = Uuid, Path, description = "Cart ID"),
        ("item_id" = Uuid, Path, description = "Cart item ID")
    ),
    responses(
        (status = 200, description = "Item removed"),
        (status = 404, description = "Cart or item not found"),
    ))]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((cart_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = cart_service::remove_item(&state, cart_id, item_id).await?;
    Ok(Json(resp))
}
