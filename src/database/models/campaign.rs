use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Advertising campaign; belongs to exactly one tenant
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Campaign {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub objective: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Content type tags stored in `campaign_content.content_type`
pub mod content_type {
    pub const HEADLINE: &str = "headline";
    pub const AD_COPY: &str = "ad_copy";
    pub const DESCRIPTION: &str = "description";
    pub const CTA: &str = "cta";
    pub const SOCIAL_POST: &str = "social_post";
    pub const IMAGE_PROMPT: &str = "image_prompt";
}

/// A single generated creative asset belonging to a campaign
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CampaignContent {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub content_type: String,
    pub content: String,
    pub variant: Option<String>,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}
