/// Business model and CRUD operations
///
/// A business owns its staff accounts and carries a denormalized
/// `staff_count` guarded by `max_staff_count`. The counter is only ever
/// changed through [`Business::adjust_staff_count`] inside a transaction
/// that holds the row lock taken by [`Business::lock_for_update`].
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub staff_count: i32,
    pub max_staff_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CreateBusiness {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub max_staff_count: i32,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateBusiness {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub max_staff_count: Option<i32>,
    pub updated_by: Option<Uuid>,
}

impl Business {
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        data: CreateBusiness,
    ) -> Result<Business, sqlx::Error> {
        sqlx::query_as::<_, Business>(
            r#"
            INSERT INTO businesses (name, description, address, max_staff_count, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.address)
        .bind(data.max_staff_count)
        .bind(data.created_by)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Business>, sqlx::Error> {
        sqlx::query_as::<_, Business>(
            "SELECT * FROM businesses WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Loads the business row with `FOR UPDATE`, serializing concurrent
    /// staff-count changes for the lifetime of the surrounding transaction.
    pub async fn lock_for_update(
        conn: &mut sqlx::PgConnection,
        id: Uuid,
    ) -> Result<Option<Business>, sqlx::Error> {
        sqlx::query_as::<_, Business>(
            "SELECT * FROM businesses WHERE id = $1 AND is_active = TRUE FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateBusiness) -> Result<Business, sqlx::Error> {
        let mut query = String::from("UPDATE businesses SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.address.is_some() {
            bind_count += 1;
            query.push_str(&format!(", address = ${}", bind_count));
        }
        if data.max_staff_count.is_some() {
            bind_count += 1;
            query.push_str(&format!(", max_staff_count = ${}", bind_count));
        }
        if data.updated_by.is_some() {
            bind_count += 1;
            query.push_str(&format!(", updated_by = ${}", bind_count));
        }

        query.push_str(" WHERE id = $1 AND is_active = TRUE RETURNING *");

        let mut q = sqlx::query_as::<_, Business>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(address) = data.address {
            q = q.bind(address);
        }
        if let Some(max_staff_count) = data.max_staff_count {
            q = q.bind(max_staff_count);
        }
        if let Some(updated_by) = data.updated_by {
            q = q.bind(updated_by);
        }

        q.fetch_one(pool).await
    }

    /// Moves the staff counter by `delta` (+1 on staff creation, -1 on
    /// staff removal). The CHECK constraint keeps it from going negative.
    pub async fn adjust_staff_count<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        delta: i32,
    ) -> Result<Business, sqlx::Error> {
        sqlx::query_as::<_, Business>(
            r#"
            UPDATE businesses
            SET staff_count = staff_count + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_one(executor)
        .await
    }

    pub async fn deactivate(pool: &PgPool, id: Uuid, updated_by: Uuid) -> Result<Business, sqlx::Error> {
        sqlx::query_as::<_, Business>(
            r#"
            UPDATE businesses
            SET is_active = FALSE, updated_at = NOW(), updated_by = $2
            WHERE id = $1 AND is_active = TRUE
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
