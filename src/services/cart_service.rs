use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddCartItemRequest, CartDetail, CartItemDto, CartProduct, UpdateCartItemRequest},
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Model as CartItemModel},
        carts::{ActiveModel as CartActive, Model as CartModel},
        products::Model as ProductModel,
        CartItems, Carts, Products,
    },
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn line_total(quantity: i32, unit_price: i64) -> i64 {
    unit_price * quantity as i64
}

/// Carts are anonymous: anyone holding the opaque id owns it.
pub async fn create_cart(state: &AppState) -> AppResult<ApiResponse<CartDetail>> {
    let active = CartActive {
        id: Set(Uuid::new_v4()),
        created_at: NotSet,
    };
    let cart = active.insert(&state.orm).await?;

    let detail = CartDetail {
        id: cart.id,
        created_at: cart.created_at.with_timezone(&Utc),
        items: Vec::new(),
        total_price: 0,
    };
    Ok(ApiResponse::success("Cart created", detail, Some(Meta::empty())))
}

pub async fn get_cart(state: &AppState, cart_id: Uuid) -> AppResult<ApiResponse<CartDetail>> {
    let cart = find_cart(state, cart_id).await?;
    let detail = load_cart_detail(state, cart).await?;
    Ok(ApiResponse::success("Cart", detail, None))
}

pub async fn delete_cart(
    state: &AppState,
    cart_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    // Items go away with the cart via the FK cascade.
    let result = Carts::delete_by_id(cart_id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success(
        "Cart deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Add semantics merge on (cart, product): a repeated add increments the
/// existing line's quantity instead of creating a second row.
pub async fn add_item(
    state: &AppState,
    cart_id: Uuid,
    payload: AddCartItemRequest,
) -> AppResult<ApiResponse<CartItemDto>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest("quantity must be at least 1".into()));
    }

    find_cart(state, cart_id).await?;

    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::BadRequest("product not found".into())),
    };

    let existing = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .filter(CartItemCol::ProductId.eq(payload.product_id))
        .one(&state.orm)
        .await?;

    let item = match existing {
        Some(item) => {
            let merged = item.quantity + payload.quantity;
            let mut active: CartItemActive = item.into();
            active.quantity = Set(merged);
            active.update(&state.orm).await?
        }
        None => {
            let active = CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart_id),
                product_id: Set(payload.product_id),
                quantity: Set(payload.quantity),
                created_at: NotSet,
            };
            active.insert(&state.orm).await?
        }
    };

    Ok(ApiResponse::success(
        "Item added",
        cart_item_dto(item, &product),
        None,
    ))
}

/// Direct quantity assignment, no merge.
pub async fn update_item(
    state: &AppState,
    cart_id: Uuid,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItemDto>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest("quantity must be at least 1".into()));
    }

    let item = CartItems::find_by_id(item_id)
        .filter(CartItemCol::CartId.eq(cart_id))
        .one(&state.orm)
        .await?;
    let item = match item {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };

    let product = Products::find_by_id(item.product_id).one(&state.orm).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: CartItemActive = item.into();
    active.quantity = Set(payload.quantity);
    let item = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Item updated",
        cart_item_dto(item, &product),
        None,
    ))
}

pub async fn remove_item(
    state: &AppState,
    cart_id: Uuid,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartItemCol::Id.eq(item_id))
        .filter(CartItemCol::CartId.eq(cart_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success(
        "Item removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn find_cart(state: &AppState, cart_id: Uuid) -> AppResult<CartModel> {
    match Carts::find_by_id(cart_id).one(&state.orm).await? {
        Some(cart) => Ok(cart),
        None => Err(AppError::NotFound),
    }
}

async fn load_cart_detail(state: &AppState, cart: CartModel) -> AppResult<CartDetail> {
    let rows = cart
        .find_related(CartItems)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    let mut total_price = 0;
    for (item, product) in rows {
        let product = product.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("cart item {} has no product", item.id))
        })?;
        total_price += line_total(item.quantity, product.unit_price);
        items.push(cart_item_dto(item, &product));
    }

    Ok(CartDetail {
        id: cart.id,
        created_at: cart.created_at.with_timezone(&Utc),
        items,
        total_price,
    })
}

fn cart_item_dto(item: CartItemModel, product: &ProductModel) -> CartItemDto {
    CartItemDto {
        id: item.id,
        product: CartProduct {
            id: product.id,
            name: product.name.clone(),
            unit_price: product.unit_price,
        },
        quantity: item.quantity,
        item_total: line_total(item.quantity, product.unit_price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_multiplies_quantity_by_unit_price() {
        assert_eq!(line_total(2, 100), 200);
        assert_eq!(line_total(1, 0), 0);
        assert_eq!(line_total(3, 2500), 7500);
    }
}
