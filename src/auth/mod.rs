use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

/// Claims carried by the auth service's HS256 access tokens.
///
/// `sub` is the principal id; the auth service stamps `aud` with
/// "authenticated" for signed-in users.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub aud: String,
    pub email: Option<String>,
    pub exp: i64,
    pub iat: Option<i64>,
}

/// Validate an access token and extract its claims
pub fn validate_session_token(token: &str) -> Result<Claims, String> {
    let secret = config::config()
        .auth
        .jwt_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Session verification not configured".to_string())?;

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.set_audience(&["authenticated"]);

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| format!("Invalid session token: {}", e))?;

    Ok(token_data.claims)
}

/// Parse the principal id out of validated claims
pub fn principal_id(claims: &Claims) -> Result<Uuid, String> {
    Uuid::parse_str(&claims.sub).map_err(|_| "Session subject is not a valid id".to_string())
}
