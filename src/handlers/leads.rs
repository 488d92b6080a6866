use axum::extract::Query;
use axum::Json;
use serde_json::Value;

use crate::database::models::Lead;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::{self, ListOptions, NewLead};

use super::page_json;

/// GET /api/leads - contact-form leads, filterable by source/province/status
pub async fn list(Query(opts): Query<ListOptions>) -> ApiResult<Value> {
    let page = services::leads().list(&opts).await?;
    Ok(ApiResponse::success(page_json(page, opts.limit())))
}

/// POST /api/leads - contact-form intake
pub async fn create(Json(new): Json<NewLead>) -> ApiResult<Lead> {
    if new.name.trim().is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    let lead = services::leads().create(new).await?;
    Ok(ApiResponse::created(lead))
}
