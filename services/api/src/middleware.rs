//! Middleware for JWT token validation and authentication
//!
//! Session tokens travel in HTTP-only cookies; a Bearer `Authorization`
//! header is accepted as a fallback for non-browser clients.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::error;
use uuid::Uuid;

use crate::{error::ApiError, jwt::TokenType, state::AppState};

/// Cookie carrying the access token
pub const ACCESS_COOKIE: &str = "access_token";
/// Cookie carrying the refresh token
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Read a single cookie value out of the `Cookie` request header.
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    for pair in cookie_header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();
        if key == name {
            return Some(value.to_string());
        }
    }
    None
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// Authentication middleware
///
/// Validates the access token and places the caller identity into request
/// extensions for handlers to pick up via `Extension<AuthUser>`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = get_cookie_value(req.headers(), ACCESS_COOKIE)
        .or_else(|| bearer_token(req.headers()))
        .ok_or(ApiError::Unauthorized)?;

    let claims = state.jwt_service.validate_token(&token).map_err(|e| {
        error!("Failed to validate access token: {}", e);
        ApiError::Unauthorized
    })?;

    if claims.token_type != TokenType::Access {
        return Err(ApiError::Unauthorized);
    }

    req.extensions_mut().insert(AuthUser { id: claims.sub });

    Ok(next.run(req).await)
}

/// Best-effort identity extraction for endpoints that serve both
/// authenticated and anonymous callers.
///
/// Reads the refresh cookie; any validation failure is treated as an
/// anonymous request, never an error.
pub fn optional_identity(headers: &HeaderMap, state: &AppState) -> Option<Uuid> {
    let token = get_cookie_value(headers, REFRESH_COOKIE)?;
    match state.jwt_service.validate_token(&token) {
        Ok(claims) if claims.token_type == TokenType::Refresh => Some(claims.sub),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_parsing_picks_the_right_pair() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("a=1; access_token=abc.def.ghi; b=2"),
        );
        assert_eq!(
            get_cookie_value(&headers, ACCESS_COOKIE),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(get_cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn bearer_header_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer some.jwt.token"),
        );
        assert_eq!(bearer_token(&headers), Some("some.jwt.token".to_string()));

        let mut bad = HeaderMap::new();
        bad.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );
        assert_eq!(bearer_token(&bad), None);
    }
}
