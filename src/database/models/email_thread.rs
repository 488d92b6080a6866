use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Thread status values. Forward-only: pending_review → sent | dismissed.
pub mod status {
    pub const PENDING_REVIEW: &str = "pending_review";
    pub const SENT: &str = "sent";
    pub const DISMISSED: &str = "dismissed";
}

/// An outreach opportunity: an inbound message plus an AI-drafted reply
/// awaiting human review before send.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmailThread {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub recipient_email: Option<String>,
    pub subject: Option<String>,
    pub inbound_message: Option<String>,
    pub draft_reply: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}
