//! Subscription billing: checkout/portal session creation for tenants and
//! the payment provider's webhook.

use axum::body::Bytes;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::config;
use crate::error::ApiError;
use crate::integrations::payments::{self, verify_webhook_signature, BillingUpdate};
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services;
use crate::tenancy::{guard, resolve_tenant_context};

/// POST /api/marketing/billing/checkout - start a subscription checkout for
/// the caller's tenant; responds with the provider redirect URL.
pub async fn checkout(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let tenant_id = guard::require_tenant(&ctx)?;

    let tenant = services::tenants()
        .get_by_id(tenant_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tenant not found"))?;

    let url = payments::client()
        .create_checkout_session(tenant.id, &tenant.owner_email)
        .await?;
    Ok(ApiResponse::success(json!({ "url": url })))
}

/// POST /api/marketing/billing/portal - billing-portal session for a tenant
/// that already has a provider customer
pub async fn portal(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let tenant_id = guard::require_tenant(&ctx)?;

    let tenant = services::tenants()
        .get_by_id(tenant_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tenant not found"))?;
    let customer_id = tenant
        .billing_customer_id()
        .ok_or_else(|| ApiError::bad_request("Tenant has no billing account"))?;

    let url = payments::client()
        .create_portal_session(customer_id, &config::config().billing.success_url)
        .await?;
    Ok(ApiResponse::success(json!({ "url": url })))
}

/// POST /api/marketing/billing/webhook - payment provider event delivery.
/// Mounted outside the session layer; the signature is the authentication.
///
/// Signature failures are the only error responses. Once the signature
/// verifies we always answer 200: the provider retries on non-2xx, and a
/// replayed mutation is worse than a dropped one here. Recognized events that
/// fail to apply are logged and swallowed.
pub async fn webhook(headers: HeaderMap, body: Bytes) -> Result<Json<Value>, ApiError> {
    let secret = config::config()
        .billing
        .webhook_secret
        .as_deref()
        .ok_or_else(|| ApiError::service_unavailable("Billing webhook not configured"))?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("Missing webhook signature"))?;
    verify_webhook_signature(&body, signature, secret)?;

    let event: Value = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("Webhook payload was not JSON: {}", e);
            return Ok(Json(json!({ "received": true })));
        }
    };

    if let Some(update) = payments::plan_update(&event) {
        if let Err(e) = apply_update(&update).await {
            error!("Webhook event {:?} failed to apply: {}", update, e);
        }
    }
    Ok(Json(json!({ "received": true })))
}

async fn apply_update(update: &BillingUpdate) -> Result<(), ApiError> {
    match update {
        BillingUpdate::CheckoutCompleted {
            tenant_id,
            customer_id,
            subscription_id,
        } => {
            services::tenants()
                .activate_premium(*tenant_id, customer_id, subscription_id)
                .await?;
            info!("Tenant {} upgraded to premium", tenant_id);
        }
        BillingUpdate::SubscriptionEnded { subscription_id }
        | BillingUpdate::SubscriptionLapsed { subscription_id } => {
            match services::tenants().find_by_subscription(subscription_id).await? {
                Some(tenant) => {
                    services::tenants().downgrade_to_free(tenant.id).await?;
                    info!("Tenant {} downgraded to free", tenant.id);
                }
                None => warn!("No tenant linked to subscription {}", subscription_id),
            }
        }
        BillingUpdate::SubscriptionPastDue { subscription_id } => {
            match services::tenants().find_by_subscription(subscription_id).await? {
                Some(tenant) => {
                    services::tenants().suspend(tenant.id).await?;
                    info!("Tenant {} suspended for past-due subscription", tenant.id);
                }
                None => warn!("No tenant linked to subscription {}", subscription_id),
            }
        }
        BillingUpdate::PaymentFailed => {
            warn!("Payment failed event received");
        }
    }
    Ok(())
}
