//! Marketplace handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::users;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::server::state::AppState;

use super::db;

const DEFAULT_PAGE_SIZE: i64 = 15;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    pub category_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProductRequest {
    pub name: String,
    pub brand: String,
    pub specification: String,
    pub price: String,
    pub image_url: Option<String>,
    pub category_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub specification: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size", rename = "pageSize")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub rating: f32,
}

fn require_admin(caller: &crate::middleware::auth::AuthenticatedUser) -> Result<(), ApiError> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(ApiError::forbidden("Admin access required"))
    }
}

// -- categories --------------------------------------------------------

/// `POST /api/categories` (admin)
pub async fn add_category(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(request): Json<CategoryRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&caller)?;
    if request.category_name.trim().is_empty() {
        return Err(ApiError::bad_request("Category name must be provided"));
    }

    let category = db::create_category(&state.db, request.category_name.trim()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Category added successfully",
        "category": category,
    })))
}

/// `PUT /api/categories/{id}` (admin)
pub async fn update_category(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<CategoryRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&caller)?;
    if request.category_name.trim().is_empty() {
        return Err(ApiError::bad_request("Category name must be provided"));
    }

    let category = db::update_category(&state.db, id, request.category_name.trim())
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Category updated successfully",
        "category": category,
    })))
}

/// `GET /api/categories`
pub async fn list_categories(
    State(state): State<AppState>,
) -> ApiResult<Json<serde_json::Value>> {
    let categories = db::list_categories(&state.db).await?;
    Ok(Json(json!({"success": true, "categories": categories})))
}

/// `DELETE /api/categories/{id}` (admin) - refused while products still
/// reference the category.
pub async fn delete_category(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&caller)?;

    if db::find_category(&state.db, id).await?.is_none() {
        return Err(ApiError::not_found("Category not found"));
    }
    if db::category_product_count(&state.db, id).await? > 0 {
        return Err(ApiError::conflict(
            "Category cannot be deleted as it is associated with products",
        ));
    }

    db::delete_category(&state.db, id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Category deleted successfully",
    })))
}

// -- products ----------------------------------------------------------

/// `POST /api/products`
pub async fn upload_product(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(request): Json<UploadProductRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    if request.name.trim().len() < 3 {
        return Err(ApiError::bad_request(
            "Product name must be at least 3 characters long",
        ));
    }
    if request.brand.trim().len() < 3 {
        return Err(ApiError::bad_request(
            "Brand name must be at least 3 characters long",
        ));
    }

    let user = users::find_user_by_id(&state.db, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if db::find_category(&state.db, request.category_id).await?.is_none() {
        return Err(ApiError::not_found("Category not found"));
    }

    let product = db::insert_product(
        &state.db,
        db::NewProduct {
            user_id: user.id,
            phone_number: user.phone_number,
            name: request.name,
            brand: Some(request.brand),
            specification: Some(request.specification),
            price: Some(request.price),
            image_url: request.image_url,
            category_id: request.category_id,
        },
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Product uploaded successfully",
        "product": product,
    })))
}

/// `PUT /api/products/{id}` - owner only; ownership is part of the
/// update's WHERE clause.
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(product_id): Path<i64>,
    Json(request): Json<UpdateProductRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    if let Some(category_id) = request.category_id {
        if db::find_category(&state.db, category_id).await?.is_none() {
            return Err(ApiError::not_found("Category not found"));
        }
    }

    let product = db::update_product(
        &state.db,
        product_id,
        caller.user_id,
        db::ProductUpdate {
            name: request.name,
            brand: request.brand,
            specification: request.specification,
            price: request.price,
            image_url: request.image_url,
            category_id: request.category_id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Product not found"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Product updated successfully",
        "product": product,
    })))
}

/// `GET /api/products?page=&pageSize=` - everyone else's listings.
pub async fn all_products(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let page_number = page.page.max(1);
    let page_size = page.page_size.clamp(1, 100);
    let offset = (page_number - 1) * page_size;

    let products = db::list_products(&state.db, caller.user_id, page_size, offset).await?;
    if products.is_empty() {
        return Err(ApiError::not_found("Products not found"));
    }

    Ok(Json(json!({
        "success": true,
        "message": "List of all Products!",
        "currentPage": page_number,
        "products": products,
    })))
}

/// `GET /api/products/{id}`
pub async fn product_details(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let product = db::find_product(&state.db, product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Product details!",
        "product": product,
    })))
}

/// `GET /api/categories/{id}/products`
pub async fn products_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let category = db::find_category(&state.db, category_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    let products = db::products_by_category(&state.db, category_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Products retrieved for category {}", category.name),
        "products": products,
    })))
}

/// `GET /api/users/{id}/products`
pub async fn products_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    if users::find_user_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let products = db::products_by_user(&state.db, user_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "List of all Products for this user!",
        "products": products,
    })))
}

// -- seller ratings ----------------------------------------------------

/// `POST /api/sellers/{id}/rating` - upsert the caller's rating for a
/// seller and refresh the seller's average on their product rows.
pub async fn rate_seller(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(seller_id): Path<Uuid>,
    Json(request): Json<RatingRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    if !(1.0..=5.0).contains(&request.rating) {
        return Err(ApiError::bad_request("Rating must be between 1.0 and 5.0"));
    }
    if seller_id == caller.user_id {
        return Err(ApiError::bad_request("You cannot rate yourself"));
    }
    if !db::seller_has_products(&state.db, seller_id).await? {
        return Err(ApiError::not_found("Seller not found"));
    }

    let average = db::rate_seller(&state.db, caller.user_id, seller_id, request.rating).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Rating added successfully",
        "averageRating": average,
    })))
}
