//! Marketplace persistence.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub user_id: Uuid,
    pub phone_number: String,
    pub name: String,
    pub brand: Option<String>,
    pub specification: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub category_id: i64,
    /// Denormalized average of the seller's ratings, refreshed when a
    /// rating lands.
    pub seller_rating: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewProduct {
    pub user_id: Uuid,
    pub phone_number: String,
    pub name: String,
    pub brand: Option<String>,
    pub specification: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub category_id: i64,
}

#[derive(Debug, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub specification: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
}

const PRODUCT_COLUMNS: &str = "id, user_id, phone_number, name, brand, specification, \
     price, image_url, category_id, seller_rating, created_at";

// -- categories --------------------------------------------------------

pub async fn create_category(pool: &PgPool, name: &str) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r#"INSERT INTO categories (name) VALUES ($1) RETURNING id, name"#,
    )
    .bind(name)
    .fetch_one(pool)
    .await
}

pub async fn update_category(
    pool: &PgPool,
    id: i64,
    name: &str,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r#"UPDATE categories SET name = $1 WHERE id = $2 RETURNING id, name"#,
    )
    .bind(name)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(r#"SELECT id, name FROM categories ORDER BY name ASC"#)
        .fetch_all(pool)
        .await
}

pub async fn find_category(pool: &PgPool, id: i64) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(r#"SELECT id, name FROM categories WHERE id = $1"#)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn category_product_count(pool: &PgPool, id: i64) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as(r#"SELECT COUNT(*) FROM products WHERE category_id = $1"#)
            .bind(id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

pub async fn delete_category(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM categories WHERE id = $1"#)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

// -- products ----------------------------------------------------------

pub async fn insert_product(
    pool: &PgPool,
    new_product: NewProduct,
) -> Result<Product, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        r#"
        INSERT INTO products (user_id, phone_number, name, brand, specification,
                              price, image_url, category_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(new_product.user_id)
    .bind(&new_product.phone_number)
    .bind(&new_product.name)
    .bind(&new_product.brand)
    .bind(&new_product.specification)
    .bind(&new_product.price)
    .bind(&new_product.image_url)
    .bind(new_product.category_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

/// Partial update, scoped to the owning user so a non-owner simply
/// matches no row.
pub async fn update_product(
    pool: &PgPool,
    product_id: i64,
    owner_id: Uuid,
    update: ProductUpdate,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        r#"
        UPDATE products SET
            name = COALESCE($1, name),
            brand = COALESCE($2, brand),
            specification = COALESCE($3, specification),
            price = COALESCE($4, price),
            image_url = COALESCE($5, image_url),
            category_id = COALESCE($6, category_id)
        WHERE id = $7 AND user_id = $8
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(&update.name)
    .bind(&update.brand)
    .bind(&update.specification)
    .bind(&update.price)
    .bind(&update.image_url)
    .bind(update.category_id)
    .bind(product_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
}

/// Everyone else's products, newest first, paged.
pub async fn list_products(
    pool: &PgPool,
    excluding_user: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM products
        WHERE user_id <> $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(excluding_user)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn find_product(pool: &PgPool, id: i64) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        r#"SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn products_by_category(
    pool: &PgPool,
    category_id: i64,
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM products
        WHERE category_id = $1
        ORDER BY created_at DESC
        "#
    ))
    .bind(category_id)
    .fetch_all(pool)
    .await
}

pub async fn products_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM products
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

// -- seller ratings ----------------------------------------------------

/// Upsert a rating (one per rater/seller pair), then refresh the
/// seller's denormalized average on their product rows. Runs in one
/// transaction so the average never reflects a rating that failed to
/// land.
pub async fn rate_seller(
    pool: &PgPool,
    rater_id: Uuid,
    seller_id: Uuid,
    rating: f32,
) -> Result<f32, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO seller_ratings (user_id, seller_id, rating)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, seller_id) DO UPDATE SET rating = EXCLUDED.rating
        "#,
    )
    .bind(rater_id)
    .bind(seller_id)
    .bind(rating)
    .execute(&mut *tx)
    .await?;

    let (average,): (Option<f32>,) = sqlx::query_as(
        r#"SELECT AVG(rating)::REAL FROM seller_ratings WHERE seller_id = $1"#,
    )
    .bind(seller_id)
    .fetch_one(&mut *tx)
    .await?;
    let average = average.unwrap_or(rating);

    sqlx::query(r#"UPDATE products SET seller_rating = $1 WHERE user_id = $2"#)
        .bind(format!("{average:.1}"))
        .bind(seller_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(average)
}

pub async fn seller_has_products(pool: &PgPool, seller_id: Uuid) -> Result<bool, sqlx::Error> {
    let found: Option<(i64,)> =
        sqlx::query_as(r#"SELECT id FROM products WHERE user_id = $1 LIMIT 1"#)
            .bind(seller_id)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}
