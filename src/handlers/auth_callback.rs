//! OAuth/PKCE sign-in callback. Exchanges the one-time code at the auth
//! service, then auto-provisions a trial tenant for first-time principals.

use axum::extract::Query;
use axum::response::Redirect;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth;
use crate::config;
use crate::services;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
}

/// GET /auth/callback?code=...
///
/// Failures never surface as API errors here; the browser is mid-redirect,
/// so every path ends in a redirect, with errors routed to the login page.
pub async fn callback(Query(params): Query<CallbackParams>) -> Redirect {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Redirect::to("/login?error=missing_code");
    };

    let access_token = match exchange_code(&code).await {
        Ok(token) => token,
        Err(e) => {
            warn!("Sign-in code exchange failed: {}", e);
            return Redirect::to("/login?error=exchange_failed");
        }
    };

    let claims = match auth::validate_session_token(&access_token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("Exchanged token failed validation: {}", e);
            return Redirect::to("/login?error=invalid_token");
        }
    };
    let principal_id = match auth::principal_id(&claims) {
        Ok(id) => id,
        Err(e) => {
            warn!("{}", e);
            return Redirect::to("/login?error=invalid_token");
        }
    };

    // First sign-in gets a trial tenant. Provisioning problems must not block
    // the sign-in itself.
    match services::tenants().memberships_for_user(principal_id).await {
        Ok(memberships) if memberships.is_empty() => {
            let email = claims.email.as_deref().unwrap_or_default();
            match services::tenants().provision_for_signin(principal_id, email).await {
                Ok(tenant) => info!("First sign-in provisioned tenant {}", tenant.slug),
                Err(e) => warn!("Tenant auto-provisioning failed: {}", e),
            }
        }
        Ok(_) => {}
        Err(e) => warn!("Membership lookup failed during sign-in: {}", e),
    }

    Redirect::to(&config::config().auth.post_login_redirect)
}

/// Exchange a PKCE authorization code for an access token at the auth service
async fn exchange_code(code: &str) -> Result<String, String> {
    let cfg = &config::config().auth;
    let api_base = cfg
        .api_base
        .as_deref()
        .ok_or_else(|| "Auth service not configured".to_string())?;
    let anon_key = cfg
        .anon_key
        .as_deref()
        .ok_or_else(|| "Auth service not configured".to_string())?;

    let response = reqwest::Client::new()
        .post(format!("{}/auth/v1/token?grant_type=pkce", api_base))
        .header("apikey", anon_key)
        .json(&serde_json::json!({ "auth_code": code }))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("{}: {}", status, body));
    }

    let body: Value = response.json().await.map_err(|e| e.to_string())?;
    body.get("access_token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| "Token response had no access_token".to_string())
}
