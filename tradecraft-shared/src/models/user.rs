/// User model and CRUD operations
///
/// Users carry one of four fixed roles. Business admins and business staff
/// always belong to a business (`business_id`); normal users and platform
/// admins never do. Accounts are soft-deleted by clearing `is_active`, so
/// every read path filters on it.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Fixed set of user roles. Stored as text in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    NormalUser,
    BusinessAdmin,
    BusinessStaff,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::NormalUser => "normal_user",
            UserRole::BusinessAdmin => "business_admin",
            UserRole::BusinessStaff => "business_staff",
            UserRole::Admin => "admin",
        }
    }

    /// True for roles that act on behalf of a business.
    pub fn is_business_role(&self) -> bool {
        matches!(self, UserRole::BusinessAdmin | UserRole::BusinessStaff)
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal_user" => Ok(UserRole::NormalUser),
            "business_admin" => Ok(UserRole::BusinessAdmin),
            "business_staff" => Ok(UserRole::BusinessStaff),
            "admin" => Ok(UserRole::Admin),
            _ => Err(format!("unknown user role: {}", s)),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User account record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub is_active: bool,
    pub is_superuser: bool,
    pub business_id: Option<Uuid>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

/// Data for creating a new user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub is_superuser: bool,
    pub business_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

/// Partial update for a user. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
    pub business_id: Option<Option<Uuid>>,
    pub updated_by: Option<Uuid>,
}

impl User {
    /// Inserts a new user. Takes any executor so it can run inside the
    /// staff-creation transaction.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        data: CreateUser,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, role, is_superuser, business_id, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(data.role)
        .bind(data.is_superuser)
        .bind(data.business_id)
        .bind(data.created_by)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND is_active = TRUE")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// True when any account, active or not, holds this email. Used by
    /// registration: a deactivated account keeps its email reserved.
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(pool)
        .await?;
        Ok(exists.0)
    }

    /// Looks up a user by email, case-insensitively. Used by login, so
    /// inactive accounts are excluded here too.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1) AND is_active = TRUE",
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateUser) -> Result<User, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        if data.is_active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_active = ${}", bind_count));
        }
        if data.business_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", business_id = ${}", bind_count));
        }
        if data.updated_by.is_some() {
            bind_count += 1;
            query.push_str(&format!(", updated_by = ${}", bind_count));
        }

        query.push_str(" WHERE id = $1 RETURNING *");

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(is_active) = data.is_active {
            q = q.bind(is_active);
        }
        if let Some(business_id) = data.business_id {
            q = q.bind(business_id);
        }
        if let Some(updated_by) = data.updated_by {
            q = q.bind(updated_by);
        }

        q.fetch_one(pool).await
    }

    /// Soft delete: clears `is_active` and returns the final record state.
    /// Takes any executor so staff removal can decrement the business
    /// counter in the same transaction.
    pub async fn deactivate<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        updated_by: Uuid,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_active = FALSE, updated_at = NOW(), updated_by = $2
            WHERE id = $1 AND is_active = TRUE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(updated_by)
        .fetch_one(executor)
        .await
    }

    /// Active staff accounts of a business, admins first then by creation.
    pub async fn list_staff(pool: &PgPool, business_id: Uuid) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE business_id = $1 AND is_active = TRUE
              AND role IN ('business_admin', 'business_staff')
            ORDER BY role ASC, created_at ASC
            "#,
        )
        .bind(business_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_round_trip() {
        for role in [
            UserRole::NormalUser,
            UserRole::BusinessAdmin,
            UserRole::BusinessStaff,
            UserRole::Admin,
        ] {
            assert_eq!(UserRole::from_str(role.as_str()), Ok(role));
        }
    }

    #[test]
    fn test_role_from_str_rejects_unknown() {
        assert!(UserRole::from_str("superadmin").is_err());
        assert!(UserRole::from_str("").is_err());
        assert!(UserRole::from_str("Business_Admin").is_err());
    }

    #[test]
    fn test_business_roles() {
        assert!(UserRole::BusinessAdmin.is_business_role());
        assert!(UserRole::BusinessStaff.is_business_role());
        assert!(!UserRole::NormalUser.is_business_role());
        assert!(!UserRole::Admin.is_business_role());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            role: UserRole::NormalUser,
            is_active: true,
            is_superuser: false,
            business_id: None,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by: None,
            updated_by: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));
    }

    // Integration tests for the CRUD operations require a live database
    // and live in tests/.
}
