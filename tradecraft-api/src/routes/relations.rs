/// Relation workflow handlers
///
/// A business files a request toward a user; only that user resolves it
/// (approve, decline or block). Listing never shows approved relations
/// and groups the rest with expiry taking precedence over stored status.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use tradecraft_shared::auth::middleware::CurrentUser;
use tradecraft_shared::auth::policy::{self, Actor};
use tradecraft_shared::models::relation::{
    bucket_relations, CreateRelation, Relation, RelationBuckets, RelationStatus,
};
use tradecraft_shared::models::user::User;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateRelationRequest {
    pub user_id: Uuid,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRelationRequest {
    pub status: RelationStatus,
    pub comments: Option<String>,
}

/// `GET /account/business/relations/` — business actors see their
/// business's ledger, everyone else their own, bucketed either way.
pub async fn list_relations(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<RelationBuckets>, ApiError> {
    let actor = Actor::from(&current.0);

    let relations = match actor.business_id {
        Some(business_id) if policy::is_business_actor(&actor) => {
            Relation::list_for_business(&state.db, business_id).await?
        }
        _ => Relation::list_for_user(&state.db, actor.id).await?,
    };

    Ok(Json(bucket_relations(relations, Utc::now())))
}

/// `POST /account/business/relations/` — business actor files a request
/// toward a user. An open (pending or blocked) relation for the pair is
/// a conflict; the partial unique index catches the concurrent case.
pub async fn create_relation(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreateRelationRequest>,
) -> Result<(StatusCode, Json<Relation>), ApiError> {
    let actor = Actor::from(&current.0);
    if !policy::is_business_actor(&actor) {
        return Err(ApiError::forbidden());
    }
    let business_id = actor.business_id.ok_or_else(ApiError::forbidden)?;

    let target = User::find_by_id(&state.db, body.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    if Relation::find_open(&state.db, target.id, business_id)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "An open relation with this user already exists.".to_string(),
        ));
    }

    let relation = Relation::create(
        &state.db,
        CreateRelation {
            user_id: target.id,
            business_id,
            comments: body.comments,
            created_by: actor.id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(relation)))
}

/// A request can be resolved only while it is still pending and
/// unexpired, and never back to pending.
fn ensure_resolvable(
    relation: &Relation,
    new_status: RelationStatus,
    now: DateTime<Utc>,
) -> Result<(), ApiError> {
    if relation.status != RelationStatus::Pending {
        return Err(ApiError::BadRequest(
            "Only a pending relation can be updated.".to_string(),
        ));
    }
    if relation.is_expired(now) {
        return Err(ApiError::BadRequest(
            "This relation request has expired.".to_string(),
        ));
    }
    if new_status == RelationStatus::Pending {
        return Err(ApiError::BadRequest(
            "A relation cannot be moved back to pending.".to_string(),
        ));
    }
    Ok(())
}

/// Only a pending request can be withdrawn; an approved or resolved
/// relation stays on the ledger.
fn ensure_withdrawable(relation: &Relation) -> Result<(), ApiError> {
    if relation.status != RelationStatus::Pending {
        return Err(ApiError::BadRequest(
            "Only a pending relation can be deleted.".to_string(),
        ));
    }
    Ok(())
}

/// `PUT /account/business/relations/:id/` — only the targeted user
/// resolves their own pending, unexpired request.
pub async fn update_relation(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRelationRequest>,
) -> Result<Json<Relation>, ApiError> {
    let actor = Actor::from(&current.0);

    let relation = Relation::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Relation not found.".to_string()))?;

    if !policy::is_owner(&actor, relation.user_id) {
        return Err(ApiError::forbidden());
    }
    ensure_resolvable(&relation, body.status, Utc::now())?;

    let updated = Relation::update_status(&state.db, id, body.status, body.comments).await?;
    Ok(Json(updated))
}

/// `DELETE /account/business/relations/:id/` — the filing business may
/// withdraw a request, but only while it is still pending.
pub async fn delete_relation(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let actor = Actor::from(&current.0);

    let relation = Relation::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Relation not found.".to_string()))?;

    if !policy::works_for_business(&actor, relation.business_id) {
        return Err(ApiError::forbidden());
    }
    ensure_withdrawable(&relation)?;

    Relation::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn relation(status: RelationStatus, expiry: DateTime<Utc>) -> Relation {
        Relation {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            status,
            comments: None,
            request_date: Utc::now(),
            request_expiry_date: expiry,
            updated_date: None,
            created_by: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn test_pending_unexpired_relation_is_resolvable() {
        let now = Utc::now();
        let r = relation(RelationStatus::Pending, now + Duration::days(3));
        assert!(ensure_resolvable(&r, RelationStatus::Approved, now).is_ok());
        assert!(ensure_resolvable(&r, RelationStatus::Blocked, now).is_ok());
    }

    #[test]
    fn test_only_pending_relations_are_resolvable() {
        let now = Utc::now();
        for status in [
            RelationStatus::Approved,
            RelationStatus::Declined,
            RelationStatus::Blocked,
        ] {
            let r = relation(status, now + Duration::days(3));
            assert!(matches!(
                ensure_resolvable(&r, RelationStatus::Declined, now),
                Err(ApiError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn test_expired_request_cannot_be_resolved() {
        let now = Utc::now();
        let r = relation(RelationStatus::Pending, now - Duration::hours(1));
        assert!(matches!(
            ensure_resolvable(&r, RelationStatus::Approved, now),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_relation_cannot_return_to_pending() {
        let now = Utc::now();
        let r = relation(RelationStatus::Pending, now + Duration::days(3));
        assert!(matches!(
            ensure_resolvable(&r, RelationStatus::Pending, now),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_only_pending_relations_are_deletable() {
        let now = Utc::now();
        let pending = relation(RelationStatus::Pending, now + Duration::days(3));
        assert!(ensure_withdrawable(&pending).is_ok());

        for status in [
            RelationStatus::Approved,
            RelationStatus::Declined,
            RelationStatus::Blocked,
        ] {
            let r = relation(status, now + Duration::days(3));
            assert!(matches!(
                ensure_withdrawable(&r),
                Err(ApiError::BadRequest(_))
            ));
        }
    }
}
