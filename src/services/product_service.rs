use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::products::{
        AddProductImageRequest, BannerList, CreateBannerRequest, CreateProductRequest,
        ProductDetail, ProductList, UpdateProductRequest,
    },
    entity::{
        banner_images::{ActiveModel as BannerActive, Model as BannerModel},
        order_items::Column as OrderItemCol,
        product_images::{ActiveModel as ImageActive, Column as ImageCol, Model as ImageModel},
        products::{ActiveModel, Column, Model as ProductModel},
        BannerImages, OrderItems, ProductImages, Products,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{BannerImage, Product, ProductImage},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

/// Derive a URL slug from a product name: lowercase, alphanumeric runs
/// joined by single hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn validate_product_name(name: &str) -> AppResult<()> {
    if name.trim().chars().count() < 6 {
        return Err(AppError::BadRequest(
            "product name should be at least 6 characters".into(),
        ));
    }
    Ok(())
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::UnitPrice.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::UnitPrice.lte(max_price));
    }

    if query.in_stock == Some(true) {
        condition = condition.add(Column::Inventory.gt(0));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Name => Column::Name,
        ProductSortBy::UnitPrice => Column::UnitPrice,
        ProductSortBy::Inventory => Column::Inventory,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    Ok(ApiResponse::paginated("Products", ProductList { items }, page, limit, total))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find_by_id(id).one(&state.orm).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let images = ProductImages::find()
        .filter(ImageCol::ProductId.eq(product.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(image_from_entity)
        .collect();

    let detail = ProductDetail {
        product: product_from_entity(product),
        images,
    };
    Ok(ApiResponse::success("Product", detail, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_staff(user)?;
    validate_product_name(&payload.name)?;
    if payload.unit_price < 0 {
        return Err(AppError::BadRequest("unit price cannot be negative".into()));
    }
    if payload.inventory < 0 {
        return Err(AppError::BadRequest("inventory cannot be negative".into()));
    }

    let slug = slugify(&payload.name);
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        slug: Set(slug),
        description: Set(payload.description),
        unit_price: Set(payload.unit_price),
        inventory: Set(payload.inventory),
        cover: Set(payload.cover),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_staff(user)?;

    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    if let Some(price) = payload.unit_price {
        if price < 0 {
            return Err(AppError::BadRequest("unit price cannot be negative".into()));
        }
    }
    if let Some(inventory) = payload.inventory {
        if inventory < 0 {
            return Err(AppError::BadRequest("inventory cannot be negative".into()));
        }
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        validate_product_name(&name)?;
        active.slug = Set(slugify(&name));
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.unit_price {
        active.unit_price = Set(price);
    }
    if let Some(inventory) = payload.inventory {
        active.inventory = Set(inventory);
    }
    if let Some(cover) = payload.cover {
        active.cover = Set(Some(cover));
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

/// Deletion is blocked while any order item still references the product;
/// cart items go away with it via cascade.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;

    let product = Products::find_by_id(id).one(&state.orm).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let referencing = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(id))
        .count(&state.orm)
        .await?;
    if referencing > 0 {
        return Err(AppError::Conflict(
            "there are order items including this product".into(),
        ));
    }

    product.delete(&state.orm).await?;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Attach an image path to a product. The binary itself lives on disk;
/// only the reference is stored.
pub async fn add_product_image(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: AddProductImageRequest,
) -> AppResult<ApiResponse<ProductImage>> {
    ensure_staff(user)?;

    let product = Products::find_by_id(product_id).one(&state.orm).await?;
    if product.is_none() {
        return Err(AppError::NotFound);
    }

    let active = ImageActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(Some(product_id)),
        path: Set(payload.path),
        created_at: NotSet,
    };
    let image = active.insert(&state.orm).await?;

    Ok(ApiResponse::success(
        "Image attached",
        image_from_entity(image),
        Some(Meta::empty()),
    ))
}

pub async fn remove_product_image(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    image_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;

    let result = ProductImages::delete_many()
        .filter(ImageCol::Id.eq(image_id))
        .filter(ImageCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Image removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_banners(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<BannerList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = BannerImages::find().order_by_desc(crate::entity::banner_images::Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(banner_from_entity)
        .collect();

    Ok(ApiResponse::paginated("Banners", BannerList { items }, page, limit, total))
}

pub async fn create_banner(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBannerRequest,
) -> AppResult<ApiResponse<BannerImage>> {
    ensure_staff(user)?;
    let active = BannerActive {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title),
        path: Set(payload.path),
        created_at: NotSet,
    };
    let banner = active.insert(&state.orm).await?;
    Ok(ApiResponse::success(
        "Banner created",
        banner_from_entity(banner),
        Some(Meta::empty()),
    ))
}

pub async fn delete_banner(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;
    let result = BannerImages::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        slug: model.slug,
        description: model.description,
        unit_price: model.unit_price,
        inventory: model.inventory,
        cover: model.cover,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn image_from_entity(model: ImageModel) -> ProductImage {
    ProductImage {
        id: model.id,
        path: model.path,
    }
}

fn banner_from_entity(model: BannerModel) -> BannerImage {
    BannerImage {
        id: model.id,
        title: model.title,
        path: model.path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_joins_words_with_hyphens() {
        assert_eq!(slugify("Blue Suede Shoes"), "blue-suede-shoes");
        assert_eq!(slugify("  Leading & trailing!  "), "leading-trailing");
        assert_eq!(slugify("Model X-9000"), "model-x-9000");
        assert_eq!(slugify("ALLCAPS"), "allcaps");
    }

    #[test]
    fn slugify_collapses_symbol_runs() {
        assert_eq!(slugify("a -- b"), "a-b");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn short_names_are_rejected() {
        assert!(validate_product_name("abc").is_err());
        assert!(validate_product_name("   ab   ").is_err());
        assert!(validate_product_name("abcdef").is_ok());
    }
}
