/// User-business relation ledger
///
/// Relations are requests from a business toward a user. A request starts
/// pending with a seven-day expiry and moves to approved, declined or
/// blocked only by the targeted user. Expiry is never swept by a
/// background job; it is derived from `request_expiry_date` at read time.
///
/// At most one open (pending or blocked) relation may exist per
/// user-business pair. A partial unique index backs that invariant, so a
/// concurrent duplicate surfaces as a database unique violation rather
/// than a missed check.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Default lifetime of a pending request, in days.
pub const DEFAULT_EXPIRY_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RelationStatus {
    Pending,
    Approved,
    Declined,
    Blocked,
}

impl RelationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationStatus::Pending => "pending",
            RelationStatus::Approved => "approved",
            RelationStatus::Declined => "declined",
            RelationStatus::Blocked => "blocked",
        }
    }

    /// Open relations block a business from filing another request for
    /// the same user.
    pub fn is_open(&self) -> bool {
        matches!(self, RelationStatus::Pending | RelationStatus::Blocked)
    }
}

impl std::str::FromStr for RelationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RelationStatus::Pending),
            "approved" => Ok(RelationStatus::Approved),
            "declined" => Ok(RelationStatus::Declined),
            "blocked" => Ok(RelationStatus::Blocked),
            _ => Err(format!("unknown relation status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Relation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_id: Uuid,
    pub status: RelationStatus,
    pub comments: Option<String>,
    pub request_date: DateTime<Utc>,
    pub request_expiry_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CreateRelation {
    pub user_id: Uuid,
    pub business_id: Uuid,
    pub comments: Option<String>,
    pub created_by: Uuid,
}

impl Relation {
    /// True when the request's expiry has passed and it was never
    /// resolved to approved.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status != RelationStatus::Approved && self.request_expiry_date < now
    }

    /// Inserts a new pending request expiring [`DEFAULT_EXPIRY_DAYS`] from
    /// now. A unique violation from the partial index means an open
    /// relation already exists and is surfaced unchanged to the caller.
    pub async fn create(pool: &PgPool, data: CreateRelation) -> Result<Relation, sqlx::Error> {
        let expiry = Utc::now() + Duration::days(DEFAULT_EXPIRY_DAYS);
        sqlx::query_as::<_, Relation>(
            r#"
            INSERT INTO user_business_relations
                (user_id, business_id, status, comments, request_expiry_date, created_by)
            VALUES ($1, $2, 'pending', $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(data.business_id)
        .bind(&data.comments)
        .bind(expiry)
        .bind(data.created_by)
        .fetch_one(pool)
        .await
    }

    /// Inserts a relation already in the approved state. Self-registration
    /// against an existing business takes this path; no request/response
    /// round trip is involved.
    pub async fn create_approved(
        pool: &PgPool,
        user_id: Uuid,
        business_id: Uuid,
        created_by: Uuid,
    ) -> Result<Relation, sqlx::Error> {
        let expiry = Utc::now() + Duration::days(DEFAULT_EXPIRY_DAYS);
        sqlx::query_as::<_, Relation>(
            r#"
            INSERT INTO user_business_relations
                (user_id, business_id, status, request_expiry_date, updated_date, created_by)
            VALUES ($1, $2, 'approved', $3, NOW(), $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(business_id)
        .bind(expiry)
        .bind(created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Relation>, sqlx::Error> {
        sqlx::query_as::<_, Relation>("SELECT * FROM user_business_relations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The open (pending or blocked) relation for a pair, if any.
    pub async fn find_open(
        pool: &PgPool,
        user_id: Uuid,
        business_id: Uuid,
    ) -> Result<Option<Relation>, sqlx::Error> {
        sqlx::query_as::<_, Relation>(
            r#"
            SELECT * FROM user_business_relations
            WHERE user_id = $1 AND business_id = $2
              AND status IN ('pending', 'blocked')
            "#,
        )
        .bind(user_id)
        .bind(business_id)
        .fetch_optional(pool)
        .await
    }

    /// The latest approved relation between a user and a business. Drives
    /// the relation-gated profile policies.
    pub async fn find_approved(
        pool: &PgPool,
        user_id: Uuid,
        business_id: Uuid,
    ) -> Result<Option<Relation>, sqlx::Error> {
        sqlx::query_as::<_, Relation>(
            r#"
            SELECT * FROM user_business_relations
            WHERE user_id = $1 AND business_id = $2 AND status = 'approved'
            ORDER BY request_date DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(business_id)
        .fetch_optional(pool)
        .await
    }

    /// Moves a relation to a new status, stamping `updated_date`.
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: RelationStatus,
        comments: Option<String>,
    ) -> Result<Relation, sqlx::Error> {
        sqlx::query_as::<_, Relation>(
            r#"
            UPDATE user_business_relations
            SET status = $2, comments = COALESCE($3, comments), updated_date = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(comments)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM user_business_relations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Non-approved relations filed by a business, newest first.
    pub async fn list_for_business(pool: &PgPool, business_id: Uuid) -> Result<Vec<Relation>, sqlx::Error> {
        sqlx::query_as::<_, Relation>(
            r#"
            SELECT * FROM user_business_relations
            WHERE business_id = $1 AND status <> 'approved'
            ORDER BY request_date DESC
            "#,
        )
        .bind(business_id)
        .fetch_all(pool)
        .await
    }

    /// Non-approved relations targeting a user, newest first.
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Relation>, sqlx::Error> {
        sqlx::query_as::<_, Relation>(
            r#"
            SELECT * FROM user_business_relations
            WHERE user_id = $1 AND status <> 'approved'
            ORDER BY request_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

/// Listing response: relations grouped by effective state.
///
/// Expiry wins over stored status, so a pending request whose expiry has
/// passed lands in `expired` even though the row still says pending.
/// Blocked relations are grouped with declined ones; both are closed to
/// the requesting business.
#[derive(Debug, Default, Serialize)]
pub struct RelationBuckets {
    pub pending: Vec<Relation>,
    pub declined: Vec<Relation>,
    pub expired: Vec<Relation>,
}

pub fn bucket_relations(relations: Vec<Relation>, now: DateTime<Utc>) -> RelationBuckets {
    let mut buckets = RelationBuckets::default();
    for relation in relations {
        if relation.is_expired(now) {
            buckets.expired.push(relation);
        } else {
            match relation.status {
                RelationStatus::Pending => buckets.pending.push(relation),
                RelationStatus::Declined | RelationStatus::Blocked => {
                    buckets.declined.push(relation)
                }
                RelationStatus::Approved => {}
            }
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn relation_with(status: RelationStatus, expires_in_days: i64) -> Relation {
        let now = Utc::now();
        Relation {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            status,
            comments: None,
            request_date: now - Duration::days(1),
            request_expiry_date: now + Duration::days(expires_in_days),
            updated_date: None,
            created_by: None,
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            RelationStatus::Pending,
            RelationStatus::Approved,
            RelationStatus::Declined,
            RelationStatus::Blocked,
        ] {
            assert_eq!(RelationStatus::from_str(status.as_str()), Ok(status));
        }
        assert!(RelationStatus::from_str("accepted").is_err());
    }

    #[test]
    fn test_open_statuses() {
        assert!(RelationStatus::Pending.is_open());
        assert!(RelationStatus::Blocked.is_open());
        assert!(!RelationStatus::Approved.is_open());
        assert!(!RelationStatus::Declined.is_open());
    }

    #[test]
    fn test_expiry_wins_over_status() {
        let now = Utc::now();
        let stale_pending = relation_with(RelationStatus::Pending, -1);
        let stale_declined = relation_with(RelationStatus::Declined, -3);

        let buckets = bucket_relations(vec![stale_pending, stale_declined], now);
        assert_eq!(buckets.expired.len(), 2);
        assert!(buckets.pending.is_empty());
        assert!(buckets.declined.is_empty());
    }

    #[test]
    fn test_bucketing_by_status() {
        let now = Utc::now();
        let relations = vec![
            relation_with(RelationStatus::Pending, 5),
            relation_with(RelationStatus::Declined, 5),
            relation_with(RelationStatus::Blocked, 5),
        ];

        let buckets = bucket_relations(relations, now);
        assert_eq!(buckets.pending.len(), 1);
        assert_eq!(buckets.declined.len(), 2);
        assert!(buckets.expired.is_empty());
    }

    #[test]
    fn test_approved_never_expires() {
        let now = Utc::now();
        let approved = relation_with(RelationStatus::Approved, -10);
        assert!(!approved.is_expired(now));
    }
}
