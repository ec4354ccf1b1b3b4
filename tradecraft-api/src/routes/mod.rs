/// Route handlers
///
/// One module per resource family, mirroring the URL layout in
/// `app::build_router`.

pub mod accounts;
pub mod auth;
pub mod business;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;
pub mod relations;
