use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::error::ApiError;

/// Authenticated principal extracted from the session token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub principal_id: Uuid,
    pub email: Option<String>,
}

/// Session middleware: validates the access token from the Authorization
/// header or the session cookie and injects an AuthUser extension.
pub async fn session_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_session_token(&headers)
        .map_err(|msg| ApiError::unauthorized(msg).into_response())?;

    let claims = auth::validate_session_token(&token)
        .map_err(|msg| ApiError::unauthorized(msg).into_response())?;

    let auth_user = auth_user_from_claims(&claims)
        .map_err(|msg| ApiError::unauthorized(msg).into_response())?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

fn auth_user_from_claims(claims: &Claims) -> Result<AuthUser, String> {
    Ok(AuthUser {
        principal_id: auth::principal_id(claims)?,
        email: claims.email.clone(),
    })
}

/// Session token lives in `Authorization: Bearer <jwt>` or, for browser
/// requests, in the `sb-access-token` cookie set by the auth service.
fn extract_session_token(headers: &HeaderMap) -> Result<String, String> {
    if let Some(auth_header) = headers.get("authorization") {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| "Invalid Authorization header format".to_string())?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            if token.trim().is_empty() {
                return Err("Empty session token".to_string());
            }
            return Ok(token.to_string());
        }
        return Err("Authorization header must use Bearer token format".to_string());
    }

    if let Some(cookie_header) = headers.get("cookie") {
        let cookie_str = cookie_header
            .to_str()
            .map_err(|_| "Invalid Cookie header format".to_string())?;
        if let Some(token) = cookie_value(cookie_str, "sb-access-token") {
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }
    }

    Err("Missing session".to_string())
}

fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then_some(v)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_session_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn cookie_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; sb-access-token=tok123; lang=en"),
        );
        assert_eq!(extract_session_token(&headers).unwrap(), "tok123");
    }

    #[test]
    fn missing_session_is_an_error() {
        let headers = HeaderMap::new();
        assert!(extract_session_token(&headers).is_err());
    }

    #[test]
    fn non_bearer_authorization_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcg=="));
        assert!(extract_session_token(&headers).is_err());
    }
}
