use axum::extract::Path;
use axum::{Extension, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::tenant::plan;
use crate::database::models::Tenant;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::{self, TenantUpdate};
use crate::tenancy::{guard, resolve_tenant_context};

/// GET /api/clients - full tenant roster (internal admin surface)
pub async fn list() -> ApiResult<Vec<Tenant>> {
    let tenants = services::tenants().list_clients().await?;
    Ok(ApiResponse::success(tenants))
}

/// PATCH /api/clients/:id - adjust a tenant's name, plan, or status
pub async fn update(
    Path(id): Path<Uuid>,
    Json(update): Json<TenantUpdate>,
) -> ApiResult<Tenant> {
    if let Some(p) = update.plan.as_deref() {
        if !matches!(p, plan::FREE | plan::PREMIUM | plan::ENTERPRISE) {
            return Err(ApiError::bad_request(format!("Unknown plan '{}'", p)));
        }
    }
    let tenant = services::tenants()
        .update(id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("Tenant not found"))?;
    Ok(ApiResponse::success(tenant))
}

/// GET /api/marketing/tenant - the caller's own tenant plus current-month
/// lead-generation usage
pub async fn current(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    let ctx = resolve_tenant_context(auth.principal_id).await;
    let tenant_id = guard::require_tenant(&ctx)?;

    let tenant = services::tenants()
        .get_by_id(tenant_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tenant not found"))?;
    let leads_this_month = services::generated_leads().count_monthly(tenant_id).await?;

    Ok(ApiResponse::success(json!({
        "tenant": tenant,
        "role": ctx.role.as_str(),
        "usage": { "leadsThisMonth": leads_this_month },
    })))
}
