use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use std::sync::OnceLock;
use thiserror::Error;
use uuid::Uuid;

use crate::config;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment provider not configured")]
    NotConfigured,

    #[error("Webhook signature verification failed")]
    InvalidSignature,

    #[error("Provider error: {0}")]
    Provider(String),
}

/// HTTP client for the payments provider (checkout + portal sessions)
pub struct PaymentClient {
    http: reqwest::Client,
}

impl PaymentClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Create a subscription checkout session; returns the redirect URL.
    /// The tenant id rides along as client_reference_id so the webhook can
    /// attribute the completed checkout.
    pub async fn create_checkout_session(
        &self,
        tenant_id: Uuid,
        customer_email: &str,
    ) -> Result<String, PaymentError> {
        let cfg = &config::config().billing;
        let secret_key = cfg.secret_key.as_deref().ok_or(PaymentError::NotConfigured)?;
        let price_id = cfg.price_id.as_deref().ok_or(PaymentError::NotConfigured)?;

        let params = [
            ("mode", "subscription".to_string()),
            ("line_items[0][price]", price_id.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("client_reference_id", tenant_id.to_string()),
            ("customer_email", customer_email.to_string()),
            ("success_url", cfg.success_url.clone()),
            ("cancel_url", cfg.cancel_url.clone()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", cfg.api_base))
            .bearer_auth(secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        Self::redirect_url(response).await
    }

    /// Create a billing-portal session for an existing provider customer
    pub async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<String, PaymentError> {
        let cfg = &config::config().billing;
        let secret_key = cfg.secret_key.as_deref().ok_or(PaymentError::NotConfigured)?;

        let params = [
            ("customer", customer_id.to_string()),
            ("return_url", return_url.to_string()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/billing_portal/sessions", cfg.api_base))
            .bearer_auth(secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        Self::redirect_url(response).await
    }

    async fn redirect_url(response: reqwest::Response) -> Result<String, PaymentError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Provider(format!("{}: {}", status, body)));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;
        body.get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| PaymentError::Provider("Session response had no url".to_string()))
    }
}

impl Default for PaymentClient {
    fn default() -> Self {
        Self::new()
    }
}

pub fn client() -> &'static PaymentClient {
    static INSTANCE: OnceLock<PaymentClient> = OnceLock::new();
    INSTANCE.get_or_init(PaymentClient::new)
}

/// Verify the provider's webhook signature header (`t=<ts>,v1=<hex hmac>`)
/// against the raw payload. HMAC-SHA256 over `"{t}.{payload}"`.
pub fn verify_webhook_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
) -> Result<(), PaymentError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = Some(v),
            Some(("v1", v)) => signatures.push(v),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(PaymentError::InvalidSignature)?;
    if signatures.is_empty() {
        return Err(PaymentError::InvalidSignature);
    }

    for signature in signatures {
        let Some(provided) = decode_hex(signature) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| PaymentError::InvalidSignature)?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        if mac.verify_slice(&provided).is_ok() {
            return Ok(());
        }
    }

    Err(PaymentError::InvalidSignature)
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

/// Tenant state transition planned from a verified webhook event.
/// Pure decision logic; applying it is the handler's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingUpdate {
    /// checkout completed → premium, persist provider linkage
    CheckoutCompleted {
        tenant_id: Uuid,
        customer_id: String,
        subscription_id: String,
    },
    /// subscription deleted → free, clear linkage
    SubscriptionEnded { subscription_id: String },
    /// subscription updated with status canceled/unpaid → free
    SubscriptionLapsed { subscription_id: String },
    /// subscription updated with status past_due → suspend, plan kept
    SubscriptionPastDue { subscription_id: String },
    /// payment failed → notification only, no state change
    PaymentFailed,
}

/// Map a webhook event to a planned transition. Unknown event types and
/// malformed payloads plan nothing.
pub fn plan_update(event: &Value) -> Option<BillingUpdate> {
    let event_type = event.get("type").and_then(Value::as_str)?;
    let object = event.pointer("/data/object")?;

    match event_type {
        "checkout.session.completed" => {
            let tenant_id = object
                .get("client_reference_id")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok())?;
            let customer_id = object.get("customer").and_then(Value::as_str)?.to_string();
            let subscription_id = object
                .get("subscription")
                .and_then(Value::as_str)?
                .to_string();
            Some(BillingUpdate::CheckoutCompleted {
                tenant_id,
                customer_id,
                subscription_id,
            })
        }
        "customer.subscription.deleted" => {
            let subscription_id = object.get("id").and_then(Value::as_str)?.to_string();
            Some(BillingUpdate::SubscriptionEnded { subscription_id })
        }
        "customer.subscription.updated" => {
            let subscription_id = object.get("id").and_then(Value::as_str)?.to_string();
            match object.get("status").and_then(Value::as_str) {
                Some("canceled") | Some("unpaid") => {
                    Some(BillingUpdate::SubscriptionLapsed { subscription_id })
                }
                Some("past_due") => Some(BillingUpdate::SubscriptionPastDue { subscription_id }),
                _ => None,
            }
        }
        "invoice.payment_failed" => Some(BillingUpdate::PaymentFailed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sign(payload: &[u8], timestamp: &str, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        let digest = mac.finalize().into_bytes();
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        format!("t={},v1={}", timestamp, hex)
    }

    #[test]
    fn valid_signature_verifies() {
        let payload = br#"{"type":"invoice.payment_failed"}"#;
        let header = sign(payload, "1700000000", "whsec_test");
        assert!(verify_webhook_signature(payload, &header, "whsec_test").is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let payload = br#"{"type":"invoice.payment_failed"}"#;
        let header = sign(payload, "1700000000", "whsec_test");
        assert!(verify_webhook_signature(payload, &header, "whsec_other").is_err());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let header = sign(b"original", "1700000000", "whsec_test");
        assert!(verify_webhook_signature(b"tampered", &header, "whsec_test").is_err());
    }

    #[test]
    fn malformed_header_is_rejected() {
        assert!(verify_webhook_signature(b"x", "garbage", "whsec_test").is_err());
        assert!(verify_webhook_signature(b"x", "t=123", "whsec_test").is_err());
        assert!(verify_webhook_signature(b"x", "v1=zz", "whsec_test").is_err());
    }

    #[test]
    fn checkout_completed_plans_premium_upgrade() {
        let tenant_id = Uuid::new_v4();
        let event = json!({
            "type": "checkout.session.completed",
            "data": { "object": {
                "client_reference_id": tenant_id.to_string(),
                "customer": "cus_123",
                "subscription": "sub_456",
            }}
        });
        assert_eq!(
            plan_update(&event),
            Some(BillingUpdate::CheckoutCompleted {
                tenant_id,
                customer_id: "cus_123".to_string(),
                subscription_id: "sub_456".to_string(),
            })
        );
    }

    #[test]
    fn subscription_statuses_map_to_transitions() {
        let event = |status: &str| {
            json!({
                "type": "customer.subscription.updated",
                "data": { "object": { "id": "sub_789", "status": status } }
            })
        };
        assert_eq!(
            plan_update(&event("canceled")),
            Some(BillingUpdate::SubscriptionLapsed {
                subscription_id: "sub_789".to_string()
            })
        );
        assert_eq!(
            plan_update(&event("unpaid")),
            Some(BillingUpdate::SubscriptionLapsed {
                subscription_id: "sub_789".to_string()
            })
        );
        assert_eq!(
            plan_update(&event("past_due")),
            Some(BillingUpdate::SubscriptionPastDue {
                subscription_id: "sub_789".to_string()
            })
        );
        // active is not a transition
        assert_eq!(plan_update(&event("active")), None);
    }

    #[test]
    fn unknown_events_plan_nothing() {
        let event = json!({
            "type": "customer.created",
            "data": { "object": { "id": "cus_1" } }
        });
        assert_eq!(plan_update(&event), None);
    }

    #[test]
    fn payment_failed_is_notification_only() {
        let event = json!({
            "type": "invoice.payment_failed",
            "data": { "object": { "id": "in_1" } }
        });
        assert_eq!(plan_update(&event), Some(BillingUpdate::PaymentFailed));
    }
}
