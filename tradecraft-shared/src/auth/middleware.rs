/// Bearer-token authentication
///
/// Validates the access token, then loads the account from the database
/// and checks it is still active. The freshly loaded record is what the
/// handlers see, so deactivating an account locks it out immediately
/// even while its tokens are unexpired.
use sqlx::PgPool;
use thiserror::Error;

use crate::auth::jwt::{self, JwtError, TokenType};
use crate::models::user::User;

/// The authenticated account, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing or malformed Authorization header")]
    MissingCredentials,

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error("account not found or deactivated")]
    UnknownAccount,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Extracts the token from an `Authorization: Bearer ...` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authenticates an access token against the user table.
pub async fn authenticate(
    pool: &PgPool,
    secret: &[u8],
    auth_header: Option<&str>,
) -> Result<CurrentUser, AuthError> {
    let token = auth_header
        .and_then(bearer_token)
        .ok_or(AuthError::MissingCredentials)?;

    let claims = jwt::validate_typed_token(token, TokenType::Access, secret)?;

    // find_by_id filters on is_active.
    let user = User::find_by_id(pool, claims.sub)
        .await?
        .ok_or(AuthError::UnknownAccount)?;

    Ok(CurrentUser(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("bearer abc"), None);
    }

    // authenticate() needs a live database; covered in tests/.
}
