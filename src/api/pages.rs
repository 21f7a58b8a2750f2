//! CMS page API endpoints
//!
//! Admin CRUD over pages plus a public read of published pages by slug.
//! Section content passes through untouched; the editor producing it is
//! not part of this backend.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::common::require_field;
use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::PageRepository;
use crate::models::Page;

#[derive(Debug, Deserialize)]
pub struct PagePayload {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub sections: Option<serde_json::Value>,
    pub published: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub sections: serde_json::Value,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Page> for PageResponse {
    fn from(page: Page) -> Self {
        Self {
            id: page.id,
            slug: page.slug,
            title: page.title,
            sections: page.sections,
            published: page.published,
            created_at: page.created_at.to_rfc3339(),
            updated_at: page.updated_at.to_rfc3339(),
        }
    }
}

/// Build the admin pages router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pages).post(create_page))
        .route("/{id}", get(get_page).put(update_page).delete(delete_page))
}

/// Build the public pages router (published pages by slug)
pub fn public_router() -> Router<AppState> {
    Router::new().route("/{slug}", get(get_published_page))
}

async fn list_pages(State(state): State<AppState>) -> Result<Json<Vec<PageResponse>>, ApiError> {
    let pages = state.pages.list().await.map_err(ApiError::internal)?;
    Ok(Json(pages.into_iter().map(Into::into).collect()))
}

async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = state
        .pages
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Page not found"))?;

    Ok(Json(page.into()))
}

async fn get_published_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PageResponse>, ApiError> {
    let page = state
        .pages
        .get_by_slug(&slug)
        .await
        .map_err(ApiError::internal)?
        .filter(|page| page.published)
        .ok_or_else(|| ApiError::not_found("Page not found"))?;

    Ok(Json(page.into()))
}

async fn create_page(
    State(state): State<AppState>,
    Json(payload): Json<PagePayload>,
) -> Result<(StatusCode, Json<PageResponse>), ApiError> {
    let slug = require_field(payload.slug, "Page slug is required")?;
    let title = require_field(payload.title, "Page title is required")?;

    if state
        .pages
        .exists_by_slug(&slug)
        .await
        .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!(
            "Page slug '{}' already exists",
            slug
        )));
    }

    let page = state
        .pages
        .create(&Page {
            id: 0,
            slug,
            title,
            sections: payload.sections.unwrap_or_else(|| serde_json::json!([])),
            published: payload.published.unwrap_or(false),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .await
        .map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, Json(page.into())))
}

async fn update_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<PagePayload>,
) -> Result<Json<PageResponse>, ApiError> {
    let slug = require_field(payload.slug, "Page slug is required")?;
    let title = require_field(payload.title, "Page title is required")?;

    let mut page = state
        .pages
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Page not found"))?;

    if slug != page.slug
        && state
            .pages
            .exists_by_slug(&slug)
            .await
            .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!(
            "Page slug '{}' already exists",
            slug
        )));
    }

    page.slug = slug;
    page.title = title;
    if let Some(sections) = payload.sections {
        page.sections = sections;
    }
    if let Some(published) = payload.published {
        page.published = published;
    }

    let updated = state
        .pages
        .update(&page)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Page not found"))?;

    Ok(Json(updated.into()))
}

async fn delete_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.pages.delete(id).await.map_err(ApiError::internal)?;

    if !deleted {
        return Err(ApiError::not_found("Page not found"));
    }

    Ok(StatusCode::OK)
}
