use axum::extract::{Path, Query};
use serde_json::Value;

use crate::database::models::BlogPost;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::{self, BlogPostUpdate, ListOptions, NewBlogPost};

use super::page_json;

/// GET /api/blog - list posts, newest first
pub async fn list(Query(opts): Query<ListOptions>) -> ApiResult<Value> {
    let page = services::blog().list(&opts).await?;
    Ok(ApiResponse::success(page_json(page, opts.limit())))
}

/// POST /api/blog - create a post
pub async fn create(
    axum::Json(new): axum::Json<NewBlogPost>,
) -> ApiResult<BlogPost> {
    if new.slug.trim().is_empty() {
        return Err(ApiError::bad_request("slug is required"));
    }
    if new.title.trim().is_empty() {
        return Err(ApiError::bad_request("title is required"));
    }
    let post = services::blog().create(new).await?;
    Ok(ApiResponse::created(post))
}

/// GET /api/blog/:slug
pub async fn get(Path(slug): Path<String>) -> ApiResult<BlogPost> {
    let post = services::blog()
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No post with slug '{}'", slug)))?;
    Ok(ApiResponse::success(post))
}

/// PATCH /api/blog/:slug
pub async fn update(
    Path(slug): Path<String>,
    axum::Json(update): axum::Json<BlogPostUpdate>,
) -> ApiResult<BlogPost> {
    let post = services::blog()
        .update(&slug, update)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No post with slug '{}'", slug)))?;
    Ok(ApiResponse::success(post))
}

/// DELETE /api/blog/:slug
pub async fn remove(Path(slug): Path<String>) -> ApiResult<Value> {
    let deleted = services::blog().delete(&slug).await?;
    if !deleted {
        return Err(ApiError::not_found(format!("No post with slug '{}'", slug)));
    }
    Ok(ApiResponse::success(serde_json::json!({ "deleted": true })))
}

/// POST /api/blog/:slug/toggle - flip the published flag
pub async fn toggle(Path(slug): Path<String>) -> ApiResult<BlogPost> {
    let post = services::blog()
        .toggle_publish(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No post with slug '{}'", slug)))?;
    Ok(ApiResponse::success(post))
}
