/// Database models for Tradecraft
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts with role-based access (normal user, business
///   admin, business staff, admin)
/// - `business`: Tenant entity owning staff users and a staff quota
/// - `profile`: 1:1 demographic profile with visibility redaction
/// - `relation`: User-business relation requests (the relation ledger)
/// - `order`: Orders and order items
/// - `payment`: Payments against orders
/// - `product`: Product and service catalog

pub mod business;
pub mod order;
pub mod payment;
pub mod product;
pub mod profile;
pub mod relation;
pub mod user;
