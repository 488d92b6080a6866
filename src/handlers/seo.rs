use axum::extract::{Path, Query};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::SeoOverride;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::{self, SeoUpsert};

/// GET /api/seo - all page overrides
pub async fn list() -> ApiResult<Vec<SeoOverride>> {
    let rows = services::seo().list().await?;
    Ok(ApiResponse::success(rows))
}

#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub path: String,
}

/// GET /api/seo/lookup?path=/about - the override for one page path.
/// Query parameter because page paths contain slashes.
pub async fn lookup(Query(params): Query<LookupParams>) -> ApiResult<SeoOverride> {
    let row = services::seo()
        .get_by_path(&params.path)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No override for '{}'", params.path)))?;
    Ok(ApiResponse::success(row))
}

/// PUT /api/seo - insert or update the override for a page path
pub async fn upsert(Json(upsert): Json<SeoUpsert>) -> ApiResult<SeoOverride> {
    if upsert.page_path.trim().is_empty() {
        return Err(ApiError::bad_request("page_path is required"));
    }
    let row = services::seo().upsert(upsert).await?;
    Ok(ApiResponse::success(row))
}

/// DELETE /api/seo/:id
pub async fn remove(Path(id): Path<Uuid>) -> ApiResult<Value> {
    let deleted = services::seo().delete(id).await?;
    if !deleted {
        return Err(ApiError::not_found("SEO override not found"));
    }
    Ok(ApiResponse::success(json!({ "deleted": true })))
}
