use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::info;

use crate::config;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email provider not configured")]
    NotConfigured,

    #[error("No recipient email")]
    MissingRecipient,

    #[error("No email draft body")]
    MissingBody,

    #[error("Provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundEmail {
    pub to_email: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html_body: String,
}

/// Seam over the transactional email provider so batch flows can be tested
/// without network access.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &OutboundEmail) -> Result<(), EmailError>;
}

/// HTTP client for the transactional email provider
pub struct EmailClient {
    http: reqwest::Client,
}

impl EmailClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for EmailClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailSender for EmailClient {
    async fn send(&self, message: &OutboundEmail) -> Result<(), EmailError> {
        let cfg = &config::config().email;
        let api_key = cfg.api_key.as_deref().ok_or(EmailError::NotConfigured)?;

        // Test environments redirect every message to a fixed inbox
        let to_email = cfg
            .test_recipient_override
            .as_deref()
            .unwrap_or(&message.to_email);

        let payload = json!({
            "sender": { "name": cfg.sender_name, "email": cfg.sender_email },
            "to": [{ "email": to_email, "name": message.to_name }],
            "subject": message.subject,
            "htmlContent": message.html_body,
        });

        let response = self
            .http
            .post(format!("{}/v3/smtp/email", cfg.api_base))
            .header("api-key", api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EmailError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Provider(format!("{}: {}", status, body)));
        }

        info!("Sent email to {}", to_email);
        Ok(())
    }
}

/// Process-wide provider client; construction requires no credentials
pub fn sender() -> &'static EmailClient {
    static INSTANCE: OnceLock<EmailClient> = OnceLock::new();
    INSTANCE.get_or_init(EmailClient::new)
}
