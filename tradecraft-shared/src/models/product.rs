/// Product and service catalog model
///
/// Products double as services via the `is_service` flag. `cost` is
/// seller-private and is stripped from responses for anyone but the
/// owner.
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub units_available: i32,
    pub price: Decimal,
    pub cost: Decimal,
    pub product_code: String,
    pub is_service: bool,
    pub is_deleted: bool,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub units_available: i32,
    pub price: Decimal,
    pub cost: Decimal,
    pub product_code: String,
    pub is_service: bool,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub units_available: Option<i32>,
    pub price: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub is_available: Option<bool>,
    pub updated_by: Option<Uuid>,
}

impl Product {
    pub async fn create(pool: &PgPool, data: CreateProduct) -> Result<Product, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products
                (seller_id, name, description, category, units_available, price, cost,
                 product_code, is_service, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $1, $1)
            RETURNING *
            "#,
        )
        .bind(data.created_by)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.category)
        .bind(data.units_available)
        .bind(data.price)
        .bind(data.cost)
        .bind(&data.product_code)
        .bind(data.is_service)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Catalog listing: available, non-deleted products, newest first.
    pub async fn list_available(pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE is_deleted = FALSE AND is_available = TRUE
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateProduct) -> Result<Product, sqlx::Error> {
        let mut query = String::from("UPDATE products SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.category.is_some() {
            bind_count += 1;
            query.push_str(&format!(", category = ${}", bind_count));
        }
        if data.units_available.is_some() {
            bind_count += 1;
            query.push_str(&format!(", units_available = ${}", bind_count));
        }
        if data.price.is_some() {
            bind_count += 1;
            query.push_str(&format!(", price = ${}", bind_count));
        }
        if data.cost.is_some() {
            bind_count += 1;
            query.push_str(&format!(", cost = ${}", bind_count));
        }
        if data.is_available.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_available = ${}", bind_count));
        }
        if data.updated_by.is_some() {
            bind_count += 1;
            query.push_str(&format!(", updated_by = ${}", bind_count));
        }

        query.push_str(" WHERE id = $1 AND is_deleted = FALSE RETURNING *");

        let mut q = sqlx::query_as::<_, Product>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(category) = data.category {
            q = q.bind(category);
        }
        if let Some(units_available) = data.units_available {
            q = q.bind(units_available);
        }
        if let Some(price) = data.price {
            q = q.bind(price);
        }
        if let Some(cost) = data.cost {
            q = q.bind(cost);
        }
        if let Some(is_available) = data.is_available {
            q = q.bind(is_available);
        }
        if let Some(updated_by) = data.updated_by {
            q = q.bind(updated_by);
        }

        q.fetch_one(pool).await
    }

    pub async fn soft_delete(pool: &PgPool, id: Uuid, updated_by: Uuid) -> Result<Product, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET is_deleted = TRUE, is_available = FALSE, updated_at = NOW(), updated_by = $2
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(updated_by)
        .fetch_one(pool)
        .await
    }
}

// CRUD behavior is covered by the database integration tests in tests/.
