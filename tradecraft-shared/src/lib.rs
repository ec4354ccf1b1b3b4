//! # Tradecraft Shared Library
//!
//! Shared types and business logic for the Tradecraft commerce backend.
//! Everything the HTTP layer consumes lives here: database models, the
//! permission evaluator, the staff-quota enforcer, and the relation ledger.
//!
//! ## Module Organization
//!
//! - `models`: Database models and CRUD operations
//! - `auth`: Password hashing, JWT tokens, request middleware, and the
//!   pure permission predicates
//! - `quota`: Staff headcount quota enforcement
//! - `db`: Connection pool and migration helpers

pub mod auth;
pub mod db;
pub mod models;
pub mod quota;

/// Current version of the Tradecraft shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
