use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::products::{BannerList, CreateBannerRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::BannerImage,
    response::ApiResponse,
    routes::params::Pagination,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_banners).post(create_banner))
        .route("/{id}", delete(delete_banner))
}

#[utoipa::path(get, path = "/api/banners", tag = "Banners",
    responses((status = 200, description = "List banners", body = ApiResponse<BannerList>)))]
pub async fn list_banners(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<BannerList>>> {
    let resp = product_service::list_banners(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(post, path = "/api/banners", tag = "Banners",
    request_body = CreateBannerRequest,
    responses(
        (status = 200, description = "Create banner (staff only)", body = ApiResponse<BannerImage>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])))]
pub async fn create_banner(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBannerRequest>,
) -> AppResult<Json<ApiResponse<BannerImage>>> {
    let resp = product_service::create_banner(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(delete, path = "/api/banners/{id}", tag = "Banners",
    params(("id" = Uuid, Path, description = "Banner ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Banner not found"),
    ),
    security(("bearer_auth" = [])))]
pub async fn delete_banner(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_banner(&state, &user, id).await?;
    Ok(Json(resp))
}
