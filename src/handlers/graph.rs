use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::integrations::graph;
use crate::middleware::response::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct GraphQueryRequest {
    pub statement: String,
    #[serde(default)]
    pub parameters: Value,
}

/// POST /api/graph/query - run one read statement against the optional graph
/// database. 503 when no graph backend is configured.
pub async fn query(Json(req): Json<GraphQueryRequest>) -> ApiResult<Value> {
    if req.statement.trim().is_empty() {
        return Err(ApiError::bad_request("statement is required"));
    }
    let parameters = if req.parameters.is_null() {
        Value::Object(Default::default())
    } else {
        req.parameters
    };
    let result = graph::client().query(&req.statement, parameters).await?;
    Ok(ApiResponse::success(result))
}
