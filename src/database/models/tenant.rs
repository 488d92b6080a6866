use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Tenant plan values stored in `tenants.plan`
pub mod plan {
    pub const FREE: &str = "free";
    pub const PREMIUM: &str = "premium";
    pub const ENTERPRISE: &str = "enterprise";
}

/// Tenant status values stored in `tenants.status`
pub mod status {
    pub const TRIAL: &str = "trial";
    pub const ACTIVE: &str = "active";
    pub const SUSPENDED: &str = "suspended";
}

/// A customer organization; the primary scope boundary for data access.
///
/// `settings` is an open key/value map; billing stores the payment provider's
/// `customer_id` and `subscription_id` there. Tenants are never hard-deleted,
/// only moved through soft states.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub owner_email: String,
    pub plan: String,
    pub status: String,
    pub settings: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
}

impl Tenant {
    pub fn billing_customer_id(&self) -> Option<&str> {
        self.settings.get("customer_id").and_then(Value::as_str)
    }
}

/// Links a principal id to a tenant with a stored role (owner|admin|member|viewer)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenantMembership {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}
