//! Brand API endpoints
//!
//! - GET    /api/brands
//! - POST   /api/brands
//! - GET    /api/brands/:id
//! - PUT    /api/brands/:id
//! - DELETE /api/brands/:id

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::require_field;
use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::BrandRepository;

#[derive(Debug, Deserialize)]
pub struct BrandPayload {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BrandResponse {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

impl From<crate::models::Brand> for BrandResponse {
    fn from(brand: crate::models::Brand) -> Self {
        Self {
            id: brand.id,
            name: brand.name,
            created_at: brand.created_at.to_rfc3339(),
        }
    }
}

/// Build the brands router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_brands).post(create_brand))
        .route("/{id}", get(get_brand).put(update_brand).delete(delete_brand))
}

async fn list_brands(State(state): State<AppState>) -> Result<Json<Vec<BrandResponse>>, ApiError> {
    let brands = state.brands.list().await.map_err(ApiError::internal)?;
    Ok(Json(brands.into_iter().map(Into::into).collect()))
}

async fn get_brand(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BrandResponse>, ApiError> {
    let brand = state
        .brands
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Brand not found"))?;

    Ok(Json(brand.into()))
}

async fn create_brand(
    State(state): State<AppState>,
    Json(payload): Json<BrandPayload>,
) -> Result<(StatusCode, Json<BrandResponse>), ApiError> {
    let name = require_field(payload.name, "Brand name is required")?;

    if state
        .brands
        .exists_by_name(&name)
        .await
        .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!(
            "Brand '{}' already exists",
            name
        )));
    }

    let brand = state.brands.create(&name).await.map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, Json(brand.into())))
}

async fn update_brand(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<BrandPayload>,
) -> Result<Json<BrandResponse>, ApiError> {
    let name = require_field(payload.name, "Brand name is required")?;

    let existing = state
        .brands
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Brand not found"))?;

    if name != existing.name
        && state
            .brands
            .exists_by_name(&name)
            .await
            .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!(
            "Brand '{}' already exists",
            name
        )));
    }

    let brand = state
        .brands
        .update(id, &name)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Brand not found"))?;

    Ok(Json(brand.into()))
}

async fn delete_brand(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.brands.delete(id).await.map_err(ApiError::internal)?;

    if !deleted {
        return Err(ApiError::not_found("Brand not found"));
    }

    Ok(StatusCode::OK)
}
