/// Payment model
///
/// Payments hang off orders and are owner-scoped the same way. Recording
/// a payment also bumps the order's `paid_amount`, done in one
/// transaction so the two never drift.
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::order::Order;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub paid_amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub mode_of_payment: String,
    pub comments: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub order_id: Uuid,
    pub paid_amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub mode_of_payment: String,
    pub comments: Option<String>,
    pub created_by: Uuid,
}

/// Partial update for a payment. The amount is immutable once recorded;
/// correct a wrong amount by deleting and re-entering the payment.
#[derive(Debug, Clone, Default)]
pub struct UpdatePayment {
    pub payment_date: Option<DateTime<Utc>>,
    pub mode_of_payment: Option<String>,
    pub comments: Option<String>,
    pub updated_by: Option<Uuid>,
}

impl Payment {
    /// Records a payment and applies it to the order in one transaction.
    pub async fn create(pool: &PgPool, data: CreatePayment) -> Result<Payment, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments
                (order_id, paid_amount, payment_date, mode_of_payment, comments, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(data.order_id)
        .bind(data.paid_amount)
        .bind(data.payment_date)
        .bind(&data.mode_of_payment)
        .bind(&data.comments)
        .bind(data.created_by)
        .fetch_one(&mut *tx)
        .await?;

        Order::apply_payment(&mut *tx, data.order_id, data.paid_amount).await?;

        tx.commit().await?;
        Ok(payment)
    }

    pub async fn find_owned(pool: &PgPool, id: Uuid, owner: Uuid) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE id = $1 AND created_by = $2 AND is_deleted = FALSE",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_owned(pool: &PgPool, owner: Uuid) -> Result<Vec<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            SELECT * FROM payments
            WHERE created_by = $1 AND is_deleted = FALSE
            ORDER BY payment_date DESC
            "#,
        )
        .bind(owner)
        .fetch_all(pool)
        .await
    }

    pub async fn list_for_order(pool: &PgPool, order_id: Uuid) -> Result<Vec<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            SELECT * FROM payments
            WHERE order_id = $1 AND is_deleted = FALSE
            ORDER BY payment_date DESC
            "#,
        )
        .bind(order_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdatePayment) -> Result<Payment, sqlx::Error> {
        let mut query = String::from("UPDATE payments SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.payment_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", payment_date = ${}", bind_count));
        }
        if data.mode_of_payment.is_some() {
            bind_count += 1;
            query.push_str(&format!(", mode_of_payment = ${}", bind_count));
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

        let mut q = sqlx::query_as::<_, Payment>(&query).bind(id);

        if let Some(payment_date) = data.payment_date {
            q = q.bind(payment_date);
        }
        if let Some(mode_of_payment) = data.mode_of_payment {
            q = q.bind(mode_of_payment);
        }
        if let Some(comments) = data.comments {
            q = q.bind(comments);
        }
        if let Some(updated_by) = data.updated_by {
            q = q.bind(updated_by);
        }

        q.fetch_one(pool).await
    }

    /// Soft delete. Backs the amount out of the order so totals reconcile.
    pub async fn soft_delete(pool: &PgPool, id: Uuid, updated_by: Uuid) -> Result<Payment, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET is_deleted = TRUE, updated_at = NOW(), updated_by = $2
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(updated_by)
        .fetch_one(&mut *tx)
        .await?;

        Order::apply_payment(&mut *tx, payment.order_id, -payment.paid_amount).await?;

        tx.commit().await?;
        Ok(payment)
    }
}

// CRUD behavior is covered by the database integration tests in tests/.
