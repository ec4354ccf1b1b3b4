/// Business and staff handlers
///
/// Business registration creates the business and its admin account in
/// one transaction. Staff creation runs the quota check while holding
/// the business row lock, then inserts the account and bumps the staff
/// counter before committing, so two concurrent requests can never both
/// take the last seat.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use tradecraft_shared::auth::middleware::CurrentUser;
use tradecraft_shared::auth::password;
use tradecraft_shared::auth::policy::{self, Actor, ProfileAccess};
use tradecraft_shared::models::business::{Business, CreateBusiness, UpdateBusiness};
use tradecraft_shared::models::profile::{UpdateProfile, UserProfile};
use tradecraft_shared::models::relation::{Relation, RelationStatus};
use tradecraft_shared::models::user::{CreateUser, UpdateUser, User, UserRole};
use tradecraft_shared::quota::StaffQuota;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBusinessRequest {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub max_staff_count: i32,
    #[validate(email(message = "must be a valid email address"))]
    pub admin_email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub admin_password: String,
}

#[derive(Debug, Serialize)]
pub struct CreateBusinessResponse {
    pub business: Business,
    pub admin: User,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBusinessRequest {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub max_staff_count: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStaffRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    /// Target business. Only honored for superusers; business admins
    /// always create staff in their own business.
    pub business_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStaffRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: Option<String>,
}

/// `POST /account/business/create/` — public business registration. The
/// business and its admin account land in one transaction; a failure on
/// either rolls both back.
pub async fn create_business(
    State(state): State<AppState>,
    Json(body): Json<CreateBusinessRequest>,
) -> Result<(StatusCode, Json<CreateBusinessResponse>), ApiError> {
    body.validate()?;

    if User::email_exists(&state.db, &body.admin_email).await? {
        return Err(ApiError::Conflict(
            "An account with this email already exists.".to_string(),
        ));
    }

    let password_hash = password::hash_password(&body.admin_password)?;

    let mut tx = state.db.begin().await?;

    let business = Business::create(
        &mut *tx,
        CreateBusiness {
            name: body.name,
            description: body.description,
            address: body.address,
            max_staff_count: body.max_staff_count,
            created_by: None,
        },
    )
    .await?;

    let admin = User::create(
        &mut *tx,
        CreateUser {
            email: body.admin_email,
            password_hash,
            role: UserRole::BusinessAdmin,
            is_superuser: false,
            business_id: Some(business.id),
            created_by: None,
        },
    )
    .await?;

    UserProfile::create_empty(&mut *tx, admin.id).await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBusinessResponse { business, admin }),
    ))
}

/// `GET /account/business/:id/` — any member of the business.
pub async fn get_business(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Business>, ApiError> {
    let actor = Actor::from(&current.0);
    if !policy::works_for_business(&actor, id) {
        return Err(ApiError::forbidden());
    }

    let business = Business::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Business not found.".to_string()))?;

    Ok(Json(business))
}

/// `PUT /account/business/:id/` — admin of this business only.
pub async fn update_business(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateBusinessRequest>,
) -> Result<Json<Business>, ApiError> {
    body.validate()?;

    let actor = Actor::from(&current.0);
    if !policy::manages_business(&actor, id) {
        return Err(ApiError::forbidden());
    }

    let updated = Business::update(
        &state.db,
        id,
        UpdateBusiness {
            name: body.name,
            description: body.description,
            address: body.address,
            max_staff_count: body.max_staff_count,
            updated_by: Some(actor.id),
        },
    )
    .await?;

    Ok(Json(updated))
}

/// The business the actor acts for, or 403.
fn own_business(actor: &Actor) -> Result<Uuid, ApiError> {
    if !policy::is_business_actor(actor) {
        return Err(ApiError::forbidden());
    }
    actor.business_id.ok_or_else(ApiError::forbidden)
}

/// Resolves which business a new staff account belongs to. A superuser
/// names the business in the payload; a business admin always creates
/// staff in their own business, and the payload field is ignored.
fn staff_business(actor: &Actor, payload_business: Option<Uuid>) -> Result<Uuid, ApiError> {
    if actor.is_superuser {
        return payload_business.or(actor.business_id).ok_or_else(|| {
            ApiError::BadRequest("A business id is required.".to_string())
        });
    }
    if !policy::is_business_admin(actor) {
        return Err(ApiError::forbidden());
    }
    own_business(actor)
}

/// `GET /account/business/staff/` — staff roster of the actor's business.
pub async fn list_staff(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<User>>, ApiError> {
    let actor = Actor::from(&current.0);
    let business_id = own_business(&actor)?;

    let staff = User::list_staff(&state.db, business_id).await?;
    Ok(Json(staff))
}

/// `POST /account/business/staff/` — admin-only staff creation under
/// quota. The row lock taken by the quota check serializes concurrent
/// creations against the same business.
pub async fn create_staff(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreateStaffRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    body.validate()?;

    let actor = Actor::from(&current.0);
    let business_id = staff_business(&actor, body.business_id)?;

    if User::email_exists(&state.db, &body.email).await? {
        return Err(ApiError::Conflict(
            "An account with this email already exists.".to_string(),
        ));
    }

    let password_hash = password::hash_password(&body.password)?;

    let mut tx = state.db.begin().await?;

    StaffQuota::enforce_locked(&mut *tx, business_id).await?;

    let staff = User::create(
        &mut *tx,
        CreateUser {
            email: body.email,
            password_hash,
            role: UserRole::BusinessStaff,
            is_superuser: false,
            business_id: Some(business_id),
            created_by: Some(actor.id),
        },
    )
    .await?;

    UserProfile::create_empty(&mut *tx, staff.id).await?;
    Business::adjust_staff_count(&mut *tx, business_id, 1).await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(staff)))
}

/// Loads a staff account and checks it belongs to the actor's business.
async fn staff_in_own_business(
    state: &AppState,
    actor: &Actor,
    staff_id: Uuid,
) -> Result<(User, Uuid), ApiError> {
    let business_id = own_business(actor)?;

    let staff = User::find_by_id(&state.db, staff_id)
        .await?
        .filter(|u| u.role.is_business_role() && u.business_id == Some(business_id))
        .ok_or_else(|| ApiError::NotFound("Staff user not found.".to_string()))?;

    Ok((staff, business_id))
}

/// `GET /account/business/staff/:id/`
pub async fn get_staff(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let actor = Actor::from(&current.0);
    let (staff, _) = staff_in_own_business(&state, &actor, id).await?;
    Ok(Json(staff))
}

/// `PUT /account/business/staff/:id/` — admin-only staff update. `None`
/// fields are left untouched; the password only rotates when one is sent.
pub async fn update_staff(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStaffRequest>,
) -> Result<Json<User>, ApiError> {
    body.validate()?;

    let actor = Actor::from(&current.0);
    let (_, business_id) = staff_in_own_business(&state, &actor, id).await?;
    if !policy::manages_business(&actor, business_id) {
        return Err(ApiError::forbidden());
    }

    let password_hash = match body.password {
        Some(ref plain) => Some(password::hash_password(plain)?),
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

/// `DELETE /account/business/staff/:id/` — admin-only soft delete,
/// releasing the quota seat in the same transaction.
pub async fn delete_staff(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let actor = Actor::from(&current.0);
    let (staff, business_id) = staff_in_own_business(&state, &actor, id).await?;
    if !policy::manages_business(&actor, business_id) {
        return Err(ApiError::forbidden());
    }
    if staff.id == actor.id {
        return Err(ApiError::BadRequest(
            "A business admin cannot remove their own account here.".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;
    let deactivated = User::deactivate(&mut *tx, staff.id, actor.id).await?;
    if staff.role == UserRole::BusinessStaff {
        Business::adjust_staff_count(&mut *tx, business_id, -1).await?;
    }
    tx.commit().await?;

    Ok(Json(deactivated))
}

/// `GET /account/business/staff/:id/profile/` — a customer's profile as
/// seen by the business. Without an approved relation the sensitive
/// fields come back masked.
pub async fn get_customer_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    let actor = Actor::from(&current.0);
    let business_id = own_business(&actor)?;

    let customer = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    let profile = UserProfile::find_by_user(&state.db, customer.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found.".to_string()))?;

    let relation = Relation::find_approved(&state.db, customer.id, business_id)
        .await?
        .map(|r| r.status);

    match policy::profile_access(&actor, customer.id, relation) {
        ProfileAccess::Full => Ok(Json(profile)),
        ProfileAccess::Redacted => Ok(Json(profile.redacted())),
        ProfileAccess::Denied => Err(ApiError::forbidden()),
    }
}

/// `PUT /account/business/staff/:id/profile/` — requires an approved
/// relation between the customer and the actor's business.
pub async fn update_customer_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProfile>,
) -> Result<Json<UserProfile>, ApiError> {
    let actor = Actor::from(&current.0);
    let business_id = own_business(&actor)?;

    let customer = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    let relation: Option<RelationStatus> =
        Relation::find_approved(&state.db, customer.id, business_id)
            .await?
            .map(|r| r.status);

    if !policy::can_write_profile(&actor, customer.id, relation) {
        return Err(ApiError::forbidden());
    }

    let updated = UserProfile::update(&state.db, customer.id, body).await?;
    Ok(Json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: UserRole, is_superuser: bool, business_id: Option<Uuid>) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
            is_superuser,
            business_id,
        }
    }

    #[test]
    fn test_staff_business_admin_uses_own_business() {
        let business = Uuid::new_v4();
        let admin = actor(UserRole::BusinessAdmin, false, Some(business));

        assert_eq!(staff_business(&admin, None).unwrap(), business);
        // The payload field only means something to superusers.
        assert_eq!(
            staff_business(&admin, Some(Uuid::new_v4())).unwrap(),
            business
        );
    }

    #[test]
    fn test_staff_business_superuser_names_business_in_payload() {
        let superuser = actor(UserRole::Admin, true, None);
        let target = Uuid::new_v4();

        assert_eq!(staff_business(&superuser, Some(target)).unwrap(), target);
        assert!(matches!(
            staff_business(&superuser, None),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_staff_business_rejects_non_admins() {
        let staff = actor(UserRole::BusinessStaff, false, Some(Uuid::new_v4()));
        let user = actor(UserRole::NormalUser, false, None);

        assert!(matches!(
            staff_business(&staff, None),
            Err(ApiError::PermissionDenied(_))
        ));
        assert!(matches!(
            staff_business(&user, None),
            Err(ApiError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_update_staff_request_fields_are_optional() {
        let body: UpdateStaffRequest = serde_json::from_str("{}").unwrap();
        assert!(body.email.is_none());
        assert!(body.password.is_none());
        assert!(body.validate().is_ok());
    }
}
