//! Database integration tests.
//!
//! These run against a real PostgreSQL instance named by
//! `TEST_DATABASE_URL` and are skipped silently when it is not set, so
//! the suite stays green in environments without a database.

use sqlx::PgPool;
use uuid::Uuid;

use tradecraft_shared::db::{migrations, pool};
use tradecraft_shared::models::business::{Business, CreateBusiness};
use tradecraft_shared::models::relation::{CreateRelation, Relation, RelationStatus};
use tradecraft_shared::models::user::{CreateUser, User, UserRole};
use tradecraft_shared::quota::{QuotaError, StaffQuota};

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    migrations::ensure_database_exists(&url).await.ok()?;

    let config = pool::DatabaseConfig {
        url,
        max_connections: 5,
        ..pool::DatabaseConfig::default()
    };
    let pool = pool::create_pool(config).await.expect("test pool");
    migrations::run_migrations(&pool).await.expect("migrations");
    Some(pool)
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4())
}

async fn make_business(pool: &PgPool, max_staff: i32) -> Business {
    Business::create(
        pool,
        CreateBusiness {
            name: format!("biz-{}", Uuid::new_v4()),
            description: None,
            address: None,
            max_staff_count: max_staff,
            created_by: None,
        },
    )
    .await
    .expect("business")
}

async fn make_staff(pool: &PgPool, business_id: Uuid) -> User {
    User::create(
        pool,
        CreateUser {
            email: unique_email("staff"),
            password_hash: "$argon2id$test".to_string(),
            role: UserRole::BusinessStaff,
            is_superuser: false,
            business_id: Some(business_id),
            created_by: None,
        },
    )
    .await
    .expect("staff user")
}

async fn make_normal_user(pool: &PgPool) -> User {
    User::create(
        pool,
        CreateUser {
            email: unique_email("user"),
            password_hash: "$argon2id$test".to_string(),
            role: UserRole::NormalUser,
            is_superuser: false,
            business_id: None,
            created_by: None,
        },
    )
    .await
    .expect("normal user")
}

#[tokio::test]
async fn staff_counter_matches_active_staff() {
    let Some(pool) = test_pool().await else { return };
    let business = make_business(&pool, 10).await;

    let mut staff = Vec::new();
    for _ in 0..3 {
        let user = make_staff(&pool, business.id).await;
        Business::adjust_staff_count(&pool, business.id, 1).await.unwrap();
        staff.push(user);
    }

    let reloaded = Business::find_by_id(&pool, business.id).await.unwrap().unwrap();
    assert_eq!(reloaded.staff_count, 3);
    assert_eq!(User::list_staff(&pool, business.id).await.unwrap().len(), 3);

    // Deactivating one staff account releases its seat.
    User::deactivate(&pool, staff[0].id, staff[1].id).await.unwrap();
    Business::adjust_staff_count(&pool, business.id, -1).await.unwrap();

    let reloaded = Business::find_by_id(&pool, business.id).await.unwrap().unwrap();
    assert_eq!(reloaded.staff_count, 2);
    assert_eq!(
        User::list_staff(&pool, business.id).await.unwrap().len(),
        reloaded.staff_count as usize
    );
}

#[tokio::test]
async fn quota_blocks_when_full() {
    let Some(pool) = test_pool().await else { return };
    let business = make_business(&pool, 2).await;

    for _ in 0..2 {
        let mut tx = pool.begin().await.unwrap();
        StaffQuota::enforce_locked(&mut *tx, business.id).await.unwrap();
        let staff = make_staff(&pool, business.id).await;
        Business::adjust_staff_count(&mut *tx, business.id, 1).await.unwrap();
        tx.commit().await.unwrap();
        drop(staff);
    }

    let mut tx = pool.begin().await.unwrap();
    let err = StaffQuota::enforce_locked(&mut *tx, business.id).await.unwrap_err();
    assert!(matches!(
        err,
        QuotaError::LimitExceeded {
            current: 2,
            limit: 2
        }
    ));
    tx.rollback().await.unwrap();

    // The failed attempt left the counter untouched.
    let reloaded = Business::find_by_id(&pool, business.id).await.unwrap().unwrap();
    assert_eq!(reloaded.staff_count, 2);

    let check = StaffQuota::check(&pool, business.id).await.unwrap();
    assert!(!check.allowed);
    assert_eq!(check.remaining, 0);
}

#[tokio::test]
async fn open_relation_is_unique_per_pair() {
    let Some(pool) = test_pool().await else { return };
    let business = make_business(&pool, 5).await;
    let user = make_normal_user(&pool).await;
    let admin = make_staff(&pool, business.id).await;

    let first = Relation::create(
        &pool,
        CreateRelation {
            user_id: user.id,
            business_id: business.id,
            comments: None,
            created_by: admin.id,
        },
    )
    .await
    .expect("first relation");
    assert_eq!(first.status, RelationStatus::Pending);

    // Second open relation for the same pair hits the partial unique index.
    let duplicate = Relation::create(
        &pool,
        CreateRelation {
            user_id: user.id,
            business_id: business.id,
            comments: None,
            created_by: admin.id,
        },
    )
    .await;
    match duplicate {
        Err(sqlx::Error::Database(db)) => assert!(db.is_unique_violation()),
        other => panic!("expected unique violation, got {other:?}"),
    }

    // Once resolved to declined, a new request is allowed again.
    Relation::update_status(&pool, first.id, RelationStatus::Declined, None)
        .await
        .unwrap();
    Relation::create(
        &pool,
        CreateRelation {
            user_id: user.id,
            business_id: business.id,
            comments: None,
            created_by: admin.id,
        },
    )
    .await
    .expect("new relation after decline");
}

#[tokio::test]
async fn approved_relation_found_for_pair() {
    let Some(pool) = test_pool().await else { return };
    let business = make_business(&pool, 5).await;
    let user = make_normal_user(&pool).await;

    assert!(Relation::find_approved(&pool, user.id, business.id)
        .await
        .unwrap()
        .is_none());

    Relation::create_approved(&pool, user.id, business.id, user.id)
        .await
        .unwrap();

    let found = Relation::find_approved(&pool, user.id, business.id)
        .await
        .unwrap()
        .expect("approved relation");
    assert_eq!(found.status, RelationStatus::Approved);
    assert!(found.updated_date.is_some());
}

#[tokio::test]
async fn deactivated_user_disappears_from_lookups() {
    let Some(pool) = test_pool().await else { return };
    let user = make_normal_user(&pool).await;

    assert!(User::find_by_id(&pool, user.id).await.unwrap().is_some());
    assert!(User::find_by_email(&pool, &user.email).await.unwrap().is_some());

    User::deactivate(&pool, user.id, user.id).await.unwrap();

    assert!(User::find_by_id(&pool, user.id).await.unwrap().is_none());
    assert!(User::find_by_email(&pool, &user.email).await.unwrap().is_none());
    // The email stays reserved.
    assert!(User::email_exists(&pool, &user.email).await.unwrap());
}
