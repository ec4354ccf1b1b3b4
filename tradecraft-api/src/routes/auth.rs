/// Login and token refresh
///
/// Login returns the access token in the body and plants the refresh
/// token as an httponly cookie scoped to the token-refresh path, so
/// browser scripts never see it. `GET /core/token/` reads that cookie
/// and mints a fresh access token after re-checking the account is
/// still active.
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use tradecraft_shared::auth::jwt::{
    self, TokenType, ACCESS_TOKEN_TTL_MINUTES, REFRESH_TOKEN_TTL_DAYS,
};
use tradecraft_shared::auth::password;
use tradecraft_shared::models::user::User;

use crate::app::AppState;
use crate::error::ApiError;

const REFRESH_COOKIE: &str = "refresh_token";

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Builds the `Set-Cookie` value for the refresh token. Path-scoped to
/// the refresh endpoint so the cookie is not sent with every request.
fn refresh_cookie(token: &str) -> String {
    format!(
        "{REFRESH_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/core/; Max-Age={}",
        REFRESH_TOKEN_TTL_DAYS * 86_400
    )
}

/// Pulls a named cookie out of the `Cookie` request header.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(axum::http::header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .map(str::trim)
        .find_map(|pair| {
            pair.strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|value| !value.is_empty())
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    body.validate()?;

    let user = User::find_by_email(&state.db, &body.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password.".to_string()))?;

    password::verify_password(&body.password, &user.password_hash)?;

    User::update_last_login(&state.db, user.id).await?;

    let access_token = jwt::create_access_token(user.id, state.jwt_secret())?;
    let refresh_token = jwt::create_refresh_token(user.id, state.jwt_secret())?;

    let response = TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: ACCESS_TOKEN_TTL_MINUTES * 60,
        user: Some(user),
    };

    Ok((
        AppendHeaders([(SET_COOKIE, refresh_cookie(&refresh_token))]),
        Json(response),
    ))
}

pub async fn refresh_access_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = cookie_value(&headers, REFRESH_COOKIE)
        .ok_or_else(|| ApiError::Unauthorized("Refresh token cookie missing.".to_string()))?;

    let claims = jwt::validate_typed_token(token, TokenType::Refresh, state.jwt_secret())?;

    // The account may have been deactivated since the cookie was issued.
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account not found or deactivated.".to_string()))?;

    let access_token = jwt::create_access_token(user.id, state.jwt_secret())?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: ACCESS_TOKEN_TTL_MINUTES * 60,
        user: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn test_refresh_cookie_attributes() {
        let cookie = refresh_cookie("abc.def.ghi");
        assert!(cookie.starts_with("refresh_token=abc.def.ghi;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/core/"));
        assert!(cookie.contains("Max-Age=86400"));
    }

    #[test]
    fn test_cookie_value_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            "sessionid=zzz; refresh_token=tok123; theme=dark".parse().unwrap(),
        );
        assert_eq!(cookie_value(&headers, "refresh_token"), Some("tok123"));
        assert_eq!(cookie_value(&headers, "theme"), Some("dark"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_cookie_value_empty_and_prefix_names() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "refresh_token=; refresh=abc".parse().unwrap());
        // Empty value is treated as absent; "refresh" must not match
        // the longer cookie name's prefix.
        assert_eq!(cookie_value(&headers, "refresh_token"), None);
        assert_eq!(cookie_value(&headers, "refresh"), Some("abc"));
    }

    #[test]
    fn test_login_request_validation() {
        let bad = LoginRequest {
            email: "not-an-email".to_string(),
            password: "pw".to_string(),
        };
        assert!(bad.validate().is_err());

        let good = LoginRequest {
            email: "user@example.com".to_string(),
            password: "pw".to_string(),
        };
        assert!(good.validate().is_ok());
    }
}
