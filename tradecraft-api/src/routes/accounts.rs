/// Account and profile handlers
///
/// Self-registration is public; everything else runs behind the auth
/// layer. Account deletion is a soft delete (`is_active = false`) and
/// returns the final record state with 200, as every delete here does.
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use tradecraft_shared::auth::middleware::CurrentUser;
use tradecraft_shared::auth::password;
use tradecraft_shared::auth::policy::{self, Actor, ProfileAccess};
use tradecraft_shared::models::business::Business;
use tradecraft_shared::models::profile::{UpdateProfile, UserProfile};
use tradecraft_shared::models::relation::{Relation, RelationStatus};
use tradecraft_shared::models::user::{CreateUser, UpdateUser, User, UserRole};

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountQuery {
    /// Business id to auto-link the new account to.
    pub bid: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: Option<String>,
}

/// `POST /account/create/` — public self-registration. With `?bid=` and
/// an existing business, the new account starts with an approved
/// relation to that business.
pub async fn create_account(
    State(state): State<AppState>,
    Query(query): Query<CreateAccountQuery>,
    Json(body): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    body.validate()?;

    if User::email_exists(&state.db, &body.email).await? {
        return Err(ApiError::Conflict(
            "An account with this email already exists.".to_string(),
        ));
    }

    let password_hash = password::hash_password(&body.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: body.email,
            password_hash,
            role: UserRole::NormalUser,
            is_superuser: false,
            business_id: None,
            created_by: None,
        },
    )
    .await?;

    UserProfile::create_empty(&state.db, user.id).await?;

    if let Some(bid) = query.bid {
        // A bad bid is ignored rather than failing the registration.
        if Business::find_by_id(&state.db, bid).await?.is_some() {
            Relation::create_approved(&state.db, user.id, bid, user.id).await?;
        }
    }

    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /account/:id/` — the owner, or an admin of the business the
/// account belongs to.
pub async fn get_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let actor = Actor::from(&current.0);
    let target = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    let allowed = policy::any_of([
        policy::is_owner(&actor, target.id),
        target
            .business_id
            .map(|b| policy::manages_business(&actor, b))
            .unwrap_or(false),
    ]);
    if !allowed {
        return Err(ApiError::forbidden());
    }

    Ok(Json(target))
}

/// `PUT /account/:id/` — owner-only partial update.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateAccountRequest>,
) -> Result<Json<User>, ApiError> {
    body.validate()?;

    let actor = Actor::from(&current.0);
    if !policy::is_owner(&actor, id) {
        return Err(ApiError::forbidden());
    }

    let password_hash = match body.password {
        Some(password) => Some(password::hash_password(&password)?),
        None => None,
    };

    let updated = User::update(
        &state.db,
        id,
        UpdateUser {
            email: body.email,
            password_hash,
            updated_by: Some(actor.id),
            ..UpdateUser::default()
        },
    )
    .await?;

    Ok(Json(updated))
}

/// `DELETE /account/:id/` — owner-only soft delete. Deactivating a staff
/// account releases its quota seat in the same transaction.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let actor = Actor::from(&current.0);
    if !policy::is_owner(&actor, id) {
        return Err(ApiError::forbidden());
    }

    let target = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    let mut tx = state.db.begin().await?;
    let deactivated = User::deactivate(&mut *tx, id, actor.id).await?;
    if target.role == UserRole::BusinessStaff {
        if let Some(business_id) = target.business_id {
            Business::adjust_staff_count(&mut *tx, business_id, -1).await?;
        }
    }
    tx.commit().await?;

    Ok(Json(deactivated))
}

/// Resolves the approved-relation status between a profile owner and the
/// acting business, when the actor has one.
async fn relation_for(
    state: &AppState,
    actor: &Actor,
    owner_id: Uuid,
) -> Result<Option<RelationStatus>, ApiError> {
    let Some(business_id) = actor.business_id else {
        return Ok(None);
    };
    let relation = Relation::find_approved(&state.db, owner_id, business_id).await?;
    Ok(relation.map(|r| r.status))
}

/// `GET /account/profile/:id/` — profile with the redaction rule.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    let actor = Actor::from(&current.0);
    let relation = relation_for(&state, &actor, id).await?;

    let profile = UserProfile::find_by_user(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found.".to_string()))?;

    match policy::profile_access(&actor, id, relation) {
        ProfileAccess::Full => Ok(Json(profile)),
        ProfileAccess::Redacted => Ok(Json(profile.redacted())),
        ProfileAccess::Denied => Err(ApiError::forbidden()),
    }
}

/// `PUT /account/profile/:id/` — the owner, or a business actor holding
/// an approved relation with the owner.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProfile>,
) -> Result<Json<UserProfile>, ApiError> {
    let actor = Actor::from(&current.0);
    let relation = relation_for(&state, &actor, id).await?;

    if !policy::can_write_profile(&actor, id, relation) {
        return Err(ApiError::forbidden());
    }

    let updated = UserProfile::update(&state.db, id, body).await?;
    Ok(Json(updated))
}
