use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{BannerImage, Product, ProductImage};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub unit_price: i64,
    pub inventory: i32,
    pub cover: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<i64>,
    pub inventory: Option<i32>,
    pub cover: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddProductImageRequest {
    pub path: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBannerRequest {
    pub title: String,
    pub path: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BannerList {
    pub items: Vec<BannerImage>,
}
