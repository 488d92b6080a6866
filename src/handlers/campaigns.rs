use axum::extract::{Path, Query};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::campaign::content_type;
use crate::database::models::{Campaign, CampaignContent};
use crate::error::ApiError;
use crate::integrations::email::{self, EmailSender, OutboundEmail};
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::{self, ListOptions, NewCampaign, NewCampaignContent};
use crate::tenancy::{guard, resolve_tenant_context, TenantContext};

use super::page_json;

/// GET /api/marketing/campaigns
pub async fn list(
    Extension(auth): Extension<AuthUser>,
    Query(opts): Query<ListOptions>,
) -> ApiResult<Value> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let tenant_id = guard::require_tenant(&ctx)?;

    let page = services::campaigns().list(tenant_id, &opts).await?;
    Ok(ApiResponse::success(page_json(page, opts.limit())))
}

/// POST /api/marketing/campaigns
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    Json(new): Json<NewCampaign>,
) -> ApiResult<Campaign> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let tenant_id = guard::require_tenant(&ctx)?;

    if new.name.trim().is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    let campaign = services::campaigns().create(tenant_id, new).await?;
    Ok(ApiResponse::created(campaign))
}

/// GET /api/marketing/campaigns/:id - campaign plus its content items
pub async fn get(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let campaign = load_owned_campaign(&ctx, id).await?;

    let content = services::campaigns().list_content(campaign.id).await?;
    Ok(ApiResponse::success(json!({
        "campaign": campaign,
        "content": content,
    })))
}

/// DELETE /api/marketing/campaigns/:id
pub async fn remove(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let campaign = load_owned_campaign(&ctx, id).await?;

    services::campaigns().delete(campaign.id).await?;
    Ok(ApiResponse::success(json!({ "deleted": true })))
}

#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    pub items: Vec<NewCampaignContent>,
}

/// POST /api/marketing/campaigns/:id/content - attach generated assets
pub async fn add_content(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<ContentRequest>,
) -> ApiResult<Vec<CampaignContent>> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let campaign = load_owned_campaign(&ctx, id).await?;

    if req.items.is_empty() {
        return Err(ApiError::bad_request("items must not be empty"));
    }
    if let Some(item) = req.items.iter().find(|i| !is_known_content_type(&i.content_type)) {
        return Err(ApiError::bad_request(format!(
            "Unknown content type '{}'",
            item.content_type
        )));
    }
    let inserted = services::campaigns().add_content(campaign.id, req.items).await?;
    Ok(ApiResponse::created(inserted))
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub approved: bool,
}

/// POST /api/marketing/campaigns/:id/content/:content_id/approve
pub async fn set_content_approval(
    Extension(auth): Extension<AuthUser>,
    Path((id, content_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ApprovalRequest>,
) -> ApiResult<CampaignContent> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let campaign = load_owned_campaign(&ctx, id).await?;

    let content = services::campaigns()
        .set_content_approval(campaign.id, content_id, req.approved)
        .await?
        .ok_or_else(|| ApiError::not_found("Content item not found"))?;
    Ok(ApiResponse::success(content))
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub recipient: String,
}

/// POST /api/marketing/campaigns/:id/send - email a content preview.
/// 422 when the campaign has no content yet.
pub async fn send_preview(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<PreviewRequest>,
) -> ApiResult<Value> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let campaign = load_owned_campaign(&ctx, id).await?;

    let content = services::campaigns().list_content(campaign.id).await?;
    if content.is_empty() {
        return Err(ApiError::unprocessable_entity("Campaign has no content"));
    }

    let message = OutboundEmail {
        to_email: req.recipient,
        to_name: None,
        subject: format!("Campaign preview: {}", campaign.name),
        html_body: preview_html(&campaign, &content),
    };
    email::sender().send(&message).await?;

    Ok(ApiResponse::success(json!({ "sent": true })))
}

fn is_known_content_type(tag: &str) -> bool {
    matches!(
        tag,
        content_type::HEADLINE
            | content_type::AD_COPY
            | content_type::DESCRIPTION
            | content_type::CTA
            | content_type::SOCIAL_POST
            | content_type::IMAGE_PROMPT
    )
}

fn preview_html(campaign: &Campaign, content: &[CampaignContent]) -> String {
    let mut html = format!("<h1>{}</h1>", campaign.name);
    for item in content {
        html.push_str(&format!(
            "<h3>{}{}</h3><p>{}</p>",
            item.content_type,
            item.variant
                .as_deref()
                .map(|v| format!(" ({})", v))
                .unwrap_or_default(),
            item.content
        ));
    }
    html
}

async fn load_owned_campaign(ctx: &TenantContext, id: Uuid) -> Result<Campaign, ApiError> {
    guard::require_tenant(ctx)?;
    let campaign = services::campaigns()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Campaign not found"))?;
    guard::assert_tenant_owns(ctx, campaign.tenant_id)?;
    Ok(campaign)
}
