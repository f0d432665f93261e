use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub cart_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

/// Trimmed product view embedded in order lines.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderProduct {
    pub id: Uuid,
    pub name: String,
    pub unit_price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemDto {
    pub id: Uuid,
    pub product: OrderProduct,
    pub quantity: i32,
    /// Price snapshotted at order-creation time.
    pub unit_price: i64,
}

/// Customer contact details, only present in the staff representation.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderCustomer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub phone_number: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDto {
    pub id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemDto>,
    pub total_price: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<OrderCustomer>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PayOrderResponse {
    pub authority: String,
    /// Hosted gateway page the caller should be redirected to.
    pub payment_url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyQuery {
    #[serde(rename = "Authority", alias = "authority")]
    pub authority: String,
    #[serde(rename = "Status", alias = "status")]
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    pub order_id: Uuid,
    pub status: String,
    pub ref_id: Option<String>,
}
