/// Order and order-item models
///
/// Orders are scoped to their creator: listing and lookups always filter
/// by `created_by`, so a business actor only ever sees their own orders.
/// Deletion flips `is_deleted`; the rows stay behind for payments that
/// reference them.
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub discount: Decimal,
    pub delivery_date: DateTime<Utc>,
    pub order_status: String,
    pub comments: Option<String>,
    pub is_one_time_delivery: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_type: String,
    pub item_price: Decimal,
    pub quantity: i32,
    pub status: String,
    pub delivery_date: DateTime<Utc>,
    pub comments: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub customer_id: Option<Uuid>,
    pub total_amount: Decimal,
    pub discount: Decimal,
    pub delivery_date: DateTime<Utc>,
    pub order_status: String,
    pub comments: Option<String>,
    pub is_one_time_delivery: bool,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOrder {
    pub total_amount: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub order_status: Option<String>,
    pub comments: Option<String>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CreateOrderItem {
    pub order_id: Uuid,
    pub item_type: String,
    pub item_price: Decimal,
    pub quantity: i32,
    pub status: String,
    pub delivery_date: DateTime<Utc>,
    pub comments: Option<String>,
    pub created_by: Uuid,
}

impl Order {
    pub async fn create(pool: &PgPool, data: CreateOrder) -> Result<Order, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders
                (customer_id, total_amount, discount, delivery_date, order_status,
                 comments, is_one_time_delivery, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(data.customer_id)
        .bind(data.total_amount)
        .bind(data.discount)
        .bind(data.delivery_date)
        .bind(&data.order_status)
        .bind(&data.comments)
        .bind(data.is_one_time_delivery)
        .bind(data.created_by)
        .fetch_one(pool)
        .await
    }

    /// Looks up an order owned by `owner`. Deleted orders are invisible.
    pub async fn find_owned(pool: &PgPool, id: Uuid, owner: Uuid) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE id = $1 AND created_by = $2 AND is_deleted = FALSE",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_owned(pool: &PgPool, owner: Uuid) -> Result<Vec<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE created_by = $1 AND is_deleted = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateOrder) -> Result<Order, sqlx::Error> {
        let mut query = String::from("UPDATE orders SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.total_amount.is_some() {
            bind_count += 1;
            query.push_str(&format!(", total_amount = ${}", bind_count));
        }
        if data.discount.is_some() {
            bind_count += 1;
            query.push_str(&format!(", discount = ${}", bind_count));
        }
        if data.delivery_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", delivery_date = ${}", bind_count));
        }
        if data.order_status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", order_status = ${}", bind_count));
        }
        if data.comments.is_some() {
            bind_count += 1;
            query.push_str(&format!(", comments = ${}", bind_count));
        }
        if data.updated_by.is_some() {
            bind_count += 1;
            query.push_str(&format!(", updated_by = ${}", bind_count));
        }

        query.push_str(" WHERE id = $1 AND is_deleted = FALSE RETURNING *");

        let mut q = sqlx::query_as::<_, Order>(&query).bind(id);

        if let Some(total_amount) = data.total_amount {
            q = q.bind(total_amount);
        }
        if let Some(discount) = data.discount {
            q = q.bind(discount);
        }
        if let Some(delivery_date) = data.delivery_date {
            q = q.bind(delivery_date);
        }
        if let Some(order_status) = data.order_status {
            q = q.bind(order_status);
        }
        if let Some(comments) = data.comments {
            q = q.bind(comments);
        }
        if let Some(updated_by) = data.updated_by {
            q = q.bind(updated_by);
        }

        q.fetch_one(pool).await
    }

    /// Soft delete. Items under the order are flagged too.
    pub async fn soft_delete(pool: &PgPool, id: Uuid, updated_by: Uuid) -> Result<Order, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET is_deleted = TRUE, updated_at = NOW(), updated_by = $2
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(updated_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE order_items SET is_deleted = TRUE, updated_at = NOW(), updated_by = $2 WHERE order_id = $1",
        )
        .bind(id)
        .bind(updated_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Adds a received payment amount onto the order's running total.
    pub async fn apply_payment<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        id: Uuid,
        amount: Decimal,
    ) -> Result<Order, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET paid_amount = paid_amount + $2, updated_at = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(amount)
        .fetch_one(executor)
        .await
    }
}

impl OrderItem {
    pub async fn create<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        data: CreateOrderItem,
    ) -> Result<OrderItem, sqlx::Error> {
        sqlx::query_as::<_, OrderItem>(
            r#"
            INSERT INTO order_items
                (order_id, item_type, item_price, quantity, status, delivery_date, comments, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(data.order_id)
        .bind(&data.item_type)
        .bind(data.item_price)
        .bind(data.quantity)
        .bind(&data.status)
        .bind(data.delivery_date)
        .bind(&data.comments)
        .bind(data.created_by)
        .fetch_one(executor)
        .await
    }

    pub async fn list_for_order(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderItem>, sqlx::Error> {
        sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT * FROM order_items
            WHERE order_id = $1 AND is_deleted = FALSE
            ORDER BY created_at ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(pool)
        .await
    }
}

// CRUD behavior is covered by the database integration tests in tests/.
