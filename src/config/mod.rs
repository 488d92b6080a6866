use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub billing: BillingConfig,
    pub llm: LlmConfig,
    pub graph: GraphConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Backing relational store. `url` is optional so the binary can start
/// (and serve a degraded /health) without credentials present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

/// Auth service that issues the session tokens we verify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the auth service.
    pub jwt_secret: Option<String>,
    /// Base URL for the auth service's token endpoint (code exchange).
    pub api_base: Option<String>,
    /// Publishable key sent alongside code-exchange requests.
    pub anon_key: Option<String>,
    /// Where /auth/callback redirects after a successful sign-in.
    pub post_login_redirect: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub sender_email: String,
    pub sender_name: String,
    /// When set, every outbound message is redirected here (test environments).
    pub test_recipient_override: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    /// Fixed price id for the premium plan checkout, when configured.
    pub price_id: Option<String>,
    pub api_base: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
}

/// Optional graph database. Absence degrades /api/graph/query to 503.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub uri: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout_secs =
                v.parse().unwrap_or(self.database.connection_timeout_secs);
        }

        // Auth
        if let Ok(v) = env::var("AUTH_JWT_SECRET") {
            self.auth.jwt_secret = Some(v);
        }
        if let Ok(v) = env::var("AUTH_API_BASE") {
            self.auth.api_base = Some(v);
        }
        if let Ok(v) = env::var("AUTH_ANON_KEY") {
            self.auth.anon_key = Some(v);
        }
        if let Ok(v) = env::var("AUTH_POST_LOGIN_REDIRECT") {
            self.auth.post_login_redirect = v;
        }

        // Email
        if let Ok(v) = env::var("EMAIL_API_KEY") {
            self.email.api_key = Some(v);
        }
        if let Ok(v) = env::var("EMAIL_API_BASE") {
            self.email.api_base = v;
        }
        if let Ok(v) = env::var("EMAIL_SENDER_ADDRESS") {
            self.email.sender_email = v;
        }
        if let Ok(v) = env::var("EMAIL_SENDER_NAME") {
            self.email.sender_name = v;
        }
        if let Ok(v) = env::var("EMAIL_TEST_RECIPIENT") {
            self.email.test_recipient_override = Some(v);
        }

        // Billing
        if let Ok(v) = env::var("BILLING_SECRET_KEY") {
            self.billing.secret_key = Some(v);
        }
        if let Ok(v) = env::var("BILLING_WEBHOOK_SECRET") {
            self.billing.webhook_secret = Some(v);
        }
        if let Ok(v) = env::var("BILLING_PRICE_ID") {
            self.billing.price_id = Some(v);
        }
        if let Ok(v) = env::var("BILLING_API_BASE") {
            self.billing.api_base = v;
        }
        if let Ok(v) = env::var("BILLING_SUCCESS_URL") {
            self.billing.success_url = v;
        }
        if let Ok(v) = env::var("BILLING_CANCEL_URL") {
            self.billing.cancel_url = v;
        }

        // LLM
        if let Ok(v) = env::var("LLM_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Ok(v) = env::var("LLM_API_BASE") {
            self.llm.api_base = v;
        }
        if let Ok(v) = env::var("LLM_MODEL") {
            self.llm.model = v;
        }

        // Graph
        if let Ok(v) = env::var("GRAPH_URI") {
            self.graph.uri = Some(v);
        }
        if let Ok(v) = env::var("GRAPH_USER") {
            self.graph.user = Some(v);
        }
        if let Ok(v) = env::var("GRAPH_PASSWORD") {
            self.graph.password = Some(v);
        }

        // Security
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    fn base() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            auth: AuthConfig {
                jwt_secret: None,
                api_base: None,
                anon_key: None,
                post_login_redirect: "/dashboard".to_string(),
            },
            email: EmailConfig {
                api_key: None,
                api_base: "https://api.brevo.com".to_string(),
                sender_email: "noreply@pulsecrm.example".to_string(),
                sender_name: "Pulse CRM".to_string(),
                test_recipient_override: None,
            },
            billing: BillingConfig {
                secret_key: None,
                webhook_secret: None,
                price_id: None,
                api_base: "https://api.stripe.com".to_string(),
                success_url: "/dashboard/billing?status=success".to_string(),
                cancel_url: "/dashboard/billing?status=canceled".to_string(),
            },
            llm: LlmConfig {
                api_key: None,
                api_base: "https://dashscope-intl.aliyuncs.com/compatible-mode".to_string(),
                model: "qwen-plus".to_string(),
            },
            graph: GraphConfig {
                uri: None,
                user: None,
                password: None,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
        }
    }

    fn development() -> Self {
        Self::base()
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout_secs: 10,
                ..Self::base().database
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.pulsecrm.example".to_string()],
            },
            ..Self::base()
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout_secs: 5,
                ..Self::base().database
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.pulsecrm.example".to_string()],
            },
            ..Self::base()
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults_are_permissive() {
        let config = AppConfig::development();
        assert!(config.security.enable_cors);
        assert_eq!(config.database.max_connections, 10);
        assert!(config.graph.uri.is_none());
    }

    #[test]
    fn production_tightens_pool_and_origins() {
        let config = AppConfig::production();
        assert_eq!(config.database.max_connections, 50);
        assert_eq!(config.security.cors_origins.len(), 1);
    }
}
