use serde_json::{json, Value};
use std::sync::OnceLock;
use thiserror::Error;

use crate::config;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Graph database not configured")]
    NotConfigured,

    #[error("Graph query failed: {0}")]
    Query(String),
}

/// Thin client for the graph database's HTTP transaction endpoint.
/// Configuration is optional; absence degrades the endpoint to 503.
pub struct GraphClient {
    http: reqwest::Client,
}

impl GraphClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Run a single read statement and return the provider's result envelope
    pub async fn query(&self, statement: &str, parameters: Value) -> Result<Value, GraphError> {
        let cfg = &config::config().graph;
        let uri = cfg.uri.as_deref().ok_or(GraphError::NotConfigured)?;

        let payload = json!({
            "statements": [{ "statement": statement, "parameters": parameters }]
        });

        let mut request = self
            .http
            .post(format!("{}/db/neo4j/tx/commit", uri.trim_end_matches('/')))
            .json(&payload);
        if let (Some(user), Some(password)) = (cfg.user.as_deref(), cfg.password.as_deref()) {
            request = request.basic_auth(user, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| GraphError::Query(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Query(format!("{}: {}", status, body)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GraphError::Query(e.to_string()))?;

        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                return Err(GraphError::Query(errors[0].to_string()));
            }
        }

        Ok(body)
    }
}

impl Default for GraphClient {
    fn default() -> Self {
        Self::new()
    }
}

pub fn client() -> &'static GraphClient {
    static INSTANCE: OnceLock<GraphClient> = OnceLock::new();
    INSTANCE.get_or_init(GraphClient::new)
}
