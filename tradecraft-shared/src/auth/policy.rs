/// Authorization predicates
///
/// Every predicate here is a pure function over an [`Actor`] snapshot
/// and already-resolved context (resource ownership, relation status).
/// Handlers load whatever rows a decision needs, evaluate the predicates
/// and combine them with [`any_of`]. No predicate touches the database.
///
/// Platform superusers pass every check.
use uuid::Uuid;

use crate::models::relation::RelationStatus;
use crate::models::user::{User, UserRole};

/// Snapshot of the authenticated account that policy decisions run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
    pub is_superuser: bool,
    pub business_id: Option<Uuid>,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor {
            id: user.id,
            role: user.role,
            is_superuser: user.is_superuser,
            business_id: user.business_id,
        }
    }
}

/// Grants if any one of the evaluated checks granted.
pub fn any_of(checks: impl IntoIterator<Item = bool>) -> bool {
    checks.into_iter().any(|granted| granted)
}

/// The actor is the resource owner.
pub fn is_owner(actor: &Actor, owner_id: Uuid) -> bool {
    actor.is_superuser || actor.id == owner_id
}

/// The actor administers some business.
pub fn is_business_admin(actor: &Actor) -> bool {
    actor.is_superuser || actor.role == UserRole::BusinessAdmin
}

/// The actor acts on behalf of some business, as admin or staff.
pub fn is_business_actor(actor: &Actor) -> bool {
    actor.is_superuser || actor.role.is_business_role()
}

/// The actor administers this particular business.
pub fn manages_business(actor: &Actor, business_id: Uuid) -> bool {
    actor.is_superuser
        || (actor.role == UserRole::BusinessAdmin && actor.business_id == Some(business_id))
}

/// The actor works for this particular business, in either role.
pub fn works_for_business(actor: &Actor, business_id: Uuid) -> bool {
    actor.is_superuser
        || (actor.role.is_business_role() && actor.business_id == Some(business_id))
}

/// How much of a profile the actor may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAccess {
    /// Every field, as stored.
    Full,
    /// Profile visible with sensitive fields masked.
    Redacted,
    Denied,
}

/// Resolves profile visibility. Owners (and superusers) see everything.
/// A business actor holding an approved relation with the profile's
/// owner also sees everything; one without the approval gets the
/// redacted view. Anyone with no business standing is denied.
pub fn profile_access(
    actor: &Actor,
    owner_id: Uuid,
    relation: Option<RelationStatus>,
) -> ProfileAccess {
    if actor.is_superuser || actor.id == owner_id {
        return ProfileAccess::Full;
    }
    if is_business_actor(actor) {
        return if relation == Some(RelationStatus::Approved) {
            ProfileAccess::Full
        } else {
            ProfileAccess::Redacted
        };
    }
    ProfileAccess::Denied
}

/// Whether the actor may update the profile: the owner, or a business
/// actor holding an approved relation with the owner. A merely-visible
/// (redacted) profile is never writable.
pub fn can_write_profile(
    actor: &Actor,
    owner_id: Uuid,
    relation: Option<RelationStatus>,
) -> bool {
    if actor.is_superuser || actor.id == owner_id {
        return true;
    }
    is_business_actor(actor) && relation == Some(RelationStatus::Approved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: UserRole, business_id: Option<Uuid>) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
            is_superuser: false,
            business_id,
        }
    }

    fn superuser() -> Actor {
        Actor {
            is_superuser: true,
            ..actor(UserRole::Admin, None)
        }
    }

    #[test]
    fn test_any_of() {
        assert!(any_of([false, true, false]));
        assert!(!any_of([false, false]));
        assert!(!any_of([]));
    }

    #[test]
    fn test_is_owner() {
        let a = actor(UserRole::NormalUser, None);
        assert!(is_owner(&a, a.id));
        assert!(!is_owner(&a, Uuid::new_v4()));
        assert!(is_owner(&superuser(), Uuid::new_v4()));
    }

    #[test]
    fn test_business_role_predicates() {
        let admin = actor(UserRole::BusinessAdmin, Some(Uuid::new_v4()));
        let staff = actor(UserRole::BusinessStaff, Some(Uuid::new_v4()));
        let user = actor(UserRole::NormalUser, None);

        assert!(is_business_admin(&admin));
        assert!(!is_business_admin(&staff));
        assert!(is_business_admin(&superuser()));
        assert!(is_business_actor(&staff));
        assert!(!is_business_actor(&user));
    }

    #[test]
    fn test_manages_business_requires_admin_of_that_business() {
        let business = Uuid::new_v4();
        let admin = actor(UserRole::BusinessAdmin, Some(business));
        let staff = actor(UserRole::BusinessStaff, Some(business));
        let other_admin = actor(UserRole::BusinessAdmin, Some(Uuid::new_v4()));

        assert!(manages_business(&admin, business));
        assert!(!manages_business(&staff, business));
        assert!(!manages_business(&other_admin, business));
        assert!(manages_business(&superuser(), business));
    }

    #[test]
    fn test_works_for_business_covers_staff() {
        let business = Uuid::new_v4();
        let staff = actor(UserRole::BusinessStaff, Some(business));
        let stranger = actor(UserRole::NormalUser, None);

        assert!(works_for_business(&staff, business));
        assert!(!works_for_business(&staff, Uuid::new_v4()));
        assert!(!works_for_business(&stranger, business));
    }

    #[test]
    fn test_profile_access_owner_is_full() {
        let a = actor(UserRole::NormalUser, None);
        assert_eq!(profile_access(&a, a.id, None), ProfileAccess::Full);
    }

    #[test]
    fn test_profile_access_approved_relation_is_full() {
        let business_actor = actor(UserRole::BusinessStaff, Some(Uuid::new_v4()));
        let owner = Uuid::new_v4();
        assert_eq!(
            profile_access(&business_actor, owner, Some(RelationStatus::Approved)),
            ProfileAccess::Full
        );
    }

    #[test]
    fn test_profile_access_redacted_without_approval() {
        let business_actor = actor(UserRole::BusinessAdmin, Some(Uuid::new_v4()));
        let owner = Uuid::new_v4();
        for status in [
            None,
            Some(RelationStatus::Pending),
            Some(RelationStatus::Declined),
            Some(RelationStatus::Blocked),
        ] {
            assert_eq!(
                profile_access(&business_actor, owner, status),
                ProfileAccess::Redacted
            );
        }
    }

    #[test]
    fn test_profile_access_denied_without_business_standing() {
        // A plain user has no business standing; only the owner path can
        // grant them access, whatever relations exist.
        let user = actor(UserRole::NormalUser, None);
        assert_eq!(
            profile_access(&user, Uuid::new_v4(), Some(RelationStatus::Approved)),
            ProfileAccess::Denied
        );
    }

    #[test]
    fn test_can_write_profile_follows_read_gate() {
        let business_actor = actor(UserRole::BusinessAdmin, Some(Uuid::new_v4()));
        let owner = Uuid::new_v4();
        assert!(can_write_profile(&business_actor, owner, Some(RelationStatus::Approved)));
        assert!(!can_write_profile(&business_actor, owner, Some(RelationStatus::Pending)));
        let owner_actor = actor(UserRole::NormalUser, None);
        assert!(can_write_profile(&owner_actor, owner_actor.id, None));
    }
}
