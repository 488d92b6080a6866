use axum::extract::{Path, Query};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::GeneratedLead;
use crate::error::ApiError;
use crate::integrations::email::{self, EmailError, EmailSender, OutboundEmail};
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::{self, ListOptions};
use crate::tenancy::{guard, resolve_tenant_context};

use super::page_json;

/// GET /api/marketing/leads - the tenant's generated prospect list
pub async fn list(
    Extension(auth): Extension<AuthUser>,
    Query(opts): Query<ListOptions>,
) -> ApiResult<Value> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let tenant_id = guard::require_tenant(&ctx)?;

    let page = services::generated_leads().list(tenant_id, &opts).await?;
    Ok(ApiResponse::success(page_json(page, opts.limit())))
}

#[derive(Debug, Deserialize)]
pub struct LeadStatusUpdate {
    pub status: String,
    pub notes: Option<String>,
}

/// PATCH /api/marketing/leads/:id
pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(update): Json<LeadStatusUpdate>,
) -> ApiResult<GeneratedLead> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let lead = load_owned_lead(&ctx, id).await?;

    let updated = services::generated_leads()
        .update_status(lead.id, &update.status, update.notes.as_deref())
        .await?
        .ok_or_else(|| ApiError::not_found("Lead not found"))?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/marketing/leads/:id
pub async fn remove(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let lead = load_owned_lead(&ctx, id).await?;

    services::generated_leads().delete(lead.id).await?;
    Ok(ApiResponse::success(json!({ "deleted": true })))
}

#[derive(Debug, Deserialize)]
pub struct OutreachRequest {
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// POST /api/marketing/leads/:id/send - one outreach email to the prospect
pub async fn send(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<OutreachRequest>,
) -> ApiResult<Value> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let lead = load_owned_lead(&ctx, id).await?;

    let recipient = lead
        .email
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(EmailError::MissingRecipient)?;
    let body = req
        .body
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or(EmailError::MissingBody)?;

    let message = OutboundEmail {
        to_email: recipient.to_string(),
        to_name: lead.contact_name.clone(),
        subject: req
            .subject
            .clone()
            .unwrap_or_else(|| format!("Hello {}", lead.company_name)),
        html_body: body.to_string(),
    };
    email::sender().send(&message).await?;

    services::generated_leads()
        .update_status(lead.id, "contacted", None)
        .await?;

    Ok(ApiResponse::success(json!({ "sent": true })))
}

/// Load a generated lead and assert the caller's tenant owns it. Several of
/// these operations run on the elevated store credential, so the check here
/// is the isolation boundary.
async fn load_owned_lead(
    ctx: &crate::tenancy::TenantContext,
    id: Uuid,
) -> Result<GeneratedLead, ApiError> {
    guard::require_tenant(ctx)?;
    let lead = services::generated_leads()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lead not found"))?;
    guard::assert_tenant_owns(ctx, lead.tenant_id)?;
    Ok(lead)
}
