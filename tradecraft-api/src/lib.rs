/// Tradecraft HTTP API
///
/// Thin axum layer over `tradecraft-shared`: configuration, error
/// mapping, the router and the route handlers.

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
