use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Inbound contact-form lead (internal admin surface, not tenant-scoped)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub province: Option<String>,
    pub status: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Prospect list entry generated for a tenant (tenant-scoped)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GeneratedLead {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub province: Option<String>,
    pub industry: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Confirmed contact. Promotion from a Lead copies fields into a new row;
/// the source lead keeps existing independently (`source_lead_id` is a
/// provenance pointer, not a foreign-key migration).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub province: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub source_lead_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
