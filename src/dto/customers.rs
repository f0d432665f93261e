use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Customer;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    pub user_id: Uuid,
    pub phone_number: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCustomerRequest {
    pub phone_number: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerList {
    pub items: Vec<Customer>,
}
