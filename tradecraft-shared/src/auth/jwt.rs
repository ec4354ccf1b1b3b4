/// JWT access and refresh tokens
///
/// Login issues a pair: a short-lived access token (30 minutes) returned
/// in the response body and a refresh token (1 day) set as an httponly
/// cookie. Tokens carry only the user id; role and business context are
/// loaded fresh from the database on every authenticated request, so a
/// role change takes effect without waiting out the token.
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Access token lifetime.
pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 30;
/// Refresh token lifetime.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 1;

const ISSUER: &str = "tradecraft";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub token_type: TokenType,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("token encoding failed: {0}")]
    Encoding(jsonwebtoken::errors::Error),

    #[error("token is invalid or expired")]
    Invalid,

    #[error("expected a {expected:?} token")]
    WrongTokenType { expected: TokenType },
}

fn create_token(
    user_id: Uuid,
    token_type: TokenType,
    ttl: Duration,
    secret: &[u8],
) -> Result<String, JwtError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iss: ISSUER.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        token_type,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .map_err(JwtError::Encoding)
}

pub fn create_access_token(user_id: Uuid, secret: &[u8]) -> Result<String, JwtError> {
    create_token(
        user_id,
        TokenType::Access,
        Duration::minutes(ACCESS_TOKEN_TTL_MINUTES),
        secret,
    )
}

pub fn create_refresh_token(user_id: Uuid, secret: &[u8]) -> Result<String, JwtError> {
    create_token(
        user_id,
        TokenType::Refresh,
        Duration::days(REFRESH_TOKEN_TTL_DAYS),
        secret,
    )
}

fn validate_token(token: &str, secret: &[u8]) -> Result<Claims, JwtError> {
    let mut validation = Validation::default();
    validation.set_issuer(&[ISSUER]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|_| JwtError::Invalid)
}

/// Validates a token and requires it to be of the given type. A refresh
/// token never authenticates a request, and an access token never mints
/// a new one.
pub fn validate_typed_token(
    token: &str,
    token_type: TokenType,
    secret: &[u8],
) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;
    if claims.token_type != token_type {
        return Err(JwtError::WrongTokenType {
            expected: token_type,
        });
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-that-is-long-enough";

    #[test]
    fn test_access_token_round_trip() {
        let user_id = Uuid::new_v4();
        let token = create_access_token(user_id, SECRET).unwrap();
        let claims = validate_typed_token(&token, TokenType::Access, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let token = create_refresh_token(Uuid::new_v4(), SECRET).unwrap();
        assert!(matches!(
            validate_typed_token(&token, TokenType::Access, SECRET),
            Err(JwtError::WrongTokenType { .. })
        ));
    }

    #[test]
    fn test_access_token_rejected_as_refresh() {
        let token = create_access_token(Uuid::new_v4(), SECRET).unwrap();
        assert!(validate_typed_token(&token, TokenType::Refresh, SECRET).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_access_token(Uuid::new_v4(), SECRET).unwrap();
        assert!(matches!(
            validate_typed_token(&token, TokenType::Access, b"another-secret"),
            Err(JwtError::Invalid)
        ));
    }

    #[test]
    fn test_refresh_outlives_access() {
        let user_id = Uuid::new_v4();
        let access = create_access_token(user_id, SECRET).unwrap();
        let refresh = create_refresh_token(user_id, SECRET).unwrap();
        let a = validate_typed_token(&access, TokenType::Access, SECRET).unwrap();
        let r = validate_typed_token(&refresh, TokenType::Refresh, SECRET).unwrap();
        assert!(r.exp > a.exp);
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            validate_typed_token("not.a.token", TokenType::Access, SECRET),
            Err(JwtError::Invalid)
        ));
    }
}
