use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub unit_price: i64,
    pub inventory: i32,
    pub cover: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductImage {
    pub id: Uuid,
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BannerImage {
    pub id: Uuid,
    pub title: String,
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
}

/// Valid order states; transitions are effectively one-way (unpaid -> paid).
pub const ORDER_STATUS_UNPAID: &str = "unpaid";
pub const ORDER_STATUS_PAID: &str = "paid";
pub const ORDER_STATUS_CANCELED: &str = "canceled";

pub fn is_valid_order_status(status: &str) -> bool {
    matches!(
        status,
        ORDER_STATUS_UNPAID | ORDER_STATUS_PAID | ORDER_STATUS_CANCELED
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_validation() {
        assert!(is_valid_order_status("unpaid"));
        assert!(is_valid_order_status("paid"));
        assert!(is_valid_order_status("canceled"));
        assert!(!is_valid_order_status("shipped"));
        assert!(!is_valid_order_status(""));
    }
}
