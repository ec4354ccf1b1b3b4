/// Database access layer
///
/// Provides the PostgreSQL connection pool and migration runner used by the
/// API server and by integration tests.

pub mod migrations;
pub mod pool;
