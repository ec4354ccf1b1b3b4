/// Authentication and authorization for Tradecraft
///
/// - `jwt`: access/refresh token pairs (HS256)
/// - `password`: Argon2id hashing and verification
/// - `middleware`: bearer-token authentication against the user table
/// - `policy`: pure authorization predicates and the `any_of` combinator

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
