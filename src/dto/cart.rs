use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

/// Trimmed product view embedded in cart lines.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartProduct {
    pub id: Uuid,
    pub name: String,
    pub unit_price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemDto {
    pub id: Uuid,
    pub product: CartProduct,
    pub quantity: i32,
    pub item_total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartDetail {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub items: Vec<CartItemDto>,
    pub total_price: i64,
}
