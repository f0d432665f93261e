use axum::Router;

use crate::state::AppState;

pub mod banners;
pub mod carts;
pub mod customers;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod policy;
pub mod products;

// Build the API router without binding state; it is provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/banners", banners::router())
        .nest("/carts", carts::router())
        .nest("/customers", customers::router())
        .nest("/orders", orders::router())
}
