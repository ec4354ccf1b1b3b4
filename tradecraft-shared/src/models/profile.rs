/// User profile model with visibility redaction
///
/// Each user has at most one profile row. When a business actor reads the
/// profile of a user they merely have an approved relation with (rather
/// than owning the account), the sensitive fields are masked: the values
/// are replaced in place, never omitted, so the response shape stays
/// stable for clients.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Placeholder written over masked string fields.
pub const REDACTED: &str = "xxx";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a profile. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    pub full_name: Option<String>,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
}

impl UserProfile {
    /// Returns a copy with phone, date of birth and marital status masked.
    pub fn redacted(&self) -> UserProfile {
        UserProfile {
            phone: Some(REDACTED.to_string()),
            date_of_birth: None,
            marital_status: Some(REDACTED.to_string()),
            ..self.clone()
        }
    }

    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<UserProfile>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Creates an empty profile row for a freshly registered user.
    pub async fn create_empty<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        user_id: Uuid,
    ) -> Result<UserProfile, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            "INSERT INTO user_profiles (user_id) VALUES ($1) RETURNING *",
        )
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    /// Upserts profile fields. Only fields present in `data` are written;
    /// the COALESCE keeps existing values for arriving rows too.
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        data: UpdateProfile,
    ) -> Result<UserProfile, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (user_id, full_name, display_name, phone, date_of_birth, gender, marital_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE SET
                full_name = COALESCE(EXCLUDED.full_name, user_profiles.full_name),
                display_name = COALESCE(EXCLUDED.display_name, user_profiles.display_name),
                phone = COALESCE(EXCLUDED.phone, user_profiles.phone),
                date_of_birth = COALESCE(EXCLUDED.date_of_birth, user_profiles.date_of_birth),
                gender = COALESCE(EXCLUDED.gender, user_profiles.gender),
                marital_status = COALESCE(EXCLUDED.marital_status, user_profiles.marital_status),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(data.full_name)
        .bind(data.display_name)
        .bind(data.phone)
        .bind(data.date_of_birth)
        .bind(data.gender)
        .bind(data.marital_status)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> UserProfile {
        UserProfile {
            user_id: Uuid::new_v4(),
            full_name: Some("Jordan Lee".to_string()),
            display_name: Some("jordan".to_string()),
            phone: Some("+15550100".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 2),
            gender: Some("female".to_string()),
            marital_status: Some("married".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_redaction_masks_sensitive_fields() {
        let redacted = sample_profile().redacted();
        assert_eq!(redacted.phone.as_deref(), Some(REDACTED));
        assert_eq!(redacted.date_of_birth, None);
        assert_eq!(redacted.marital_status.as_deref(), Some(REDACTED));
    }

    #[test]
    fn test_redaction_keeps_public_fields() {
        let profile = sample_profile();
        let redacted = profile.redacted();
        assert_eq!(redacted.full_name, profile.full_name);
        assert_eq!(redacted.display_name, profile.display_name);
        assert_eq!(redacted.gender, profile.gender);
        assert_eq!(redacted.user_id, profile.user_id);
    }

    #[test]
    fn test_redacted_fields_stay_present_in_json() {
        let json = serde_json::to_value(sample_profile().redacted()).unwrap();
        assert_eq!(json["phone"], REDACTED);
        assert!(json["date_of_birth"].is_null());
        assert_eq!(json["marital_status"], REDACTED);
    }
}
