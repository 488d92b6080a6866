use axum::extract::{Path, Query};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::Customer;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::{self, CustomerUpdate, ListOptions, NewCustomer, PromoteOverrides};

use super::page_json;

/// GET /api/customers
pub async fn list(Query(opts): Query<ListOptions>) -> ApiResult<Value> {
    let page = services::customers().list(&opts).await?;
    Ok(ApiResponse::success(page_json(page, opts.limit())))
}

/// POST /api/customers
pub async fn create(Json(new): Json<NewCustomer>) -> ApiResult<Customer> {
    if new.name.trim().is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    let customer = services::customers().create(new).await?;
    Ok(ApiResponse::created(customer))
}

/// GET /api/customers/:id
pub async fn get(Path(id): Path<Uuid>) -> ApiResult<Customer> {
    let customer = services::customers()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer not found"))?;
    Ok(ApiResponse::success(customer))
}

/// PATCH /api/customers/:id
pub async fn update(
    Path(id): Path<Uuid>,
    Json(update): Json<CustomerUpdate>,
) -> ApiResult<Customer> {
    let customer = services::customers()
        .update(id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer not found"))?;
    Ok(ApiResponse::success(customer))
}

/// DELETE /api/customers/:id
pub async fn remove(Path(id): Path<Uuid>) -> ApiResult<Value> {
    let deleted = services::customers().delete(id).await?;
    if !deleted {
        return Err(ApiError::not_found("Customer not found"));
    }
    Ok(ApiResponse::success(json!({ "deleted": true })))
}

#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    pub lead_id: Uuid,
    #[serde(flatten)]
    pub overrides: PromoteOverrides,
}

/// POST /api/customers/promote - copy a lead into a new customer.
/// The source lead persists untouched; repeating the call creates another
/// independent customer.
pub async fn promote(Json(req): Json<PromoteRequest>) -> ApiResult<Customer> {
    let customer = services::customers()
        .promote_from_lead(req.lead_id, req.overrides)
        .await?;
    Ok(ApiResponse::created(customer))
}
