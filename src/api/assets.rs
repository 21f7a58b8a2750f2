//! Asset API endpoints
//!
//! Assets reference brands, categories, locations, and departments; every
//! reference is validated before a write. Newly requested assets are
//! created with the default `pending` status and promoted via updates.
//! Maintenance records are managed as an asset sub-resource.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::common::{ensure_exists, require_field};
use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::{
    AssetRepository, BrandRepository, CategoryRepository, DepartmentRepository,
    LocationRepository, MaintenanceRepository,
};
use crate::models::{Asset, AssetStatus, CreateAssetInput, MaintenanceRecord};

#[derive(Debug, Deserialize)]
pub struct AssetPayload {
    pub asset_tag: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub brand_id: Option<i64>,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub department_id: Option<i64>,
    pub purchase_cost_cents: Option<i64>,
    pub purchase_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ListAssetsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssetResponse {
    pub id: i64,
    pub asset_tag: String,
    pub name: String,
    pub status: String,
    pub brand_id: Option<i64>,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub department_id: Option<i64>,
    pub purchase_cost_cents: Option<i64>,
    pub purchase_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Asset> for AssetResponse {
    fn from(asset: Asset) -> Self {
        Self {
            id: asset.id,
            asset_tag: asset.asset_tag,
            name: asset.name,
            status: asset.status.to_string(),
            brand_id: asset.brand_id,
            category_id: asset.category_id,
            location_id: asset.location_id,
            department_id: asset.department_id,
            purchase_cost_cents: asset.purchase_cost_cents,
            purchase_date: asset.purchase_date.map(|d| d.to_rfc3339()),
            created_at: asset.created_at.to_rfc3339(),
            updated_at: asset.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MaintenancePayload {
    pub description: Option<String>,
    pub cost_cents: Option<i64>,
    pub performed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct MaintenanceResponse {
    pub id: i64,
    pub asset_id: i64,
    pub description: String,
    pub cost_cents: i64,
    pub performed_at: String,
    pub created_at: String,
}

impl From<MaintenanceRecord> for MaintenanceResponse {
    fn from(record: MaintenanceRecord) -> Self {
        Self {
            id: record.id,
            asset_id: record.asset_id,
            description: record.description,
            cost_cents: record.cost_cents,
            performed_at: record.performed_at.to_rfc3339(),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// Build the assets router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_assets).post(create_asset))
        .route("/{id}", get(get_asset).put(update_asset).delete(delete_asset))
        .route(
            "/{id}/maintenance",
            get(list_maintenance).post(create_maintenance),
        )
}

fn parse_status(raw: Option<String>, default: AssetStatus) -> Result<AssetStatus, ApiError> {
    match raw {
        None => Ok(default),
        Some(raw) => AssetStatus::parse(&raw).ok_or_else(|| {
            ApiError::validation_error(
                "Status must be one of: pending, active, in_maintenance, retired",
            )
        }),
    }
}

/// Validate every foreign key the payload references
async fn check_references(state: &AppState, payload: &AssetPayload) -> Result<(), ApiError> {
    if let Some(brand_id) = payload.brand_id {
        ensure_exists(|id| state.brands.get_by_id(id), "Brand", brand_id).await?;
    }
    if let Some(category_id) = payload.category_id {
        ensure_exists(|id| state.categories.get_by_id(id), "Category", category_id).await?;
    }
    if let Some(location_id) = payload.location_id {
        ensure_exists(|id| state.locations.get_by_id(id), "Location", location_id).await?;
    }
    if let Some(department_id) = payload.department_id {
        ensure_exists(
            |id| state.departments.get_by_id(id),
            "Department",
            department_id,
        )
        .await?;
    }
    Ok(())
}

async fn list_assets(
    State(state): State<AppState>,
    Query(query): Query<ListAssetsQuery>,
) -> Result<Json<Vec<AssetResponse>>, ApiError> {
    let status = match query.status {
        None => None,
        Some(raw) => Some(parse_status(Some(raw), AssetStatus::Pending)?),
    };

    let assets = state.assets.list(status).await.map_err(ApiError::internal)?;
    Ok(Json(assets.into_iter().map(Into::into).collect()))
}

async fn get_asset(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AssetResponse>, ApiError> {
    let asset = state
        .assets
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Asset not found"))?;

    Ok(Json(asset.into()))
}

async fn create_asset(
    State(state): State<AppState>,
    Json(payload): Json<AssetPayload>,
) -> Result<(StatusCode, Json<AssetResponse>), ApiError> {
    let asset_tag = require_field(payload.asset_tag.clone(), "Asset tag is required")?;
    let name = require_field(payload.name.clone(), "Asset name is required")?;
    let status = parse_status(payload.status.clone(), AssetStatus::Pending)?;

    if state
        .assets
        .exists_by_tag(&asset_tag)
        .await
        .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!(
            "Asset tag '{}' already exists",
            asset_tag
        )));
    }

    check_references(&state, &payload).await?;

    let asset = state
        .assets
        .create(&CreateAssetInput {
            asset_tag,
            name,
            status,
            brand_id: payload.brand_id,
            category_id: payload.category_id,
            location_id: payload.location_id,
            department_id: payload.department_id,
            purchase_cost_cents: payload.purchase_cost_cents,
            purchase_date: payload.purchase_date,
        })
        .await
        .map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, Json(asset.into())))
}

async fn update_asset(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AssetPayload>,
) -> Result<Json<AssetResponse>, ApiError> {
    let asset_tag = require_field(payload.asset_tag.clone(), "Asset tag is required")?;
    let name = require_field(payload.name.clone(), "Asset name is required")?;

    let mut asset = state
        .assets
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Asset not found"))?;

    let status = parse_status(payload.status.clone(), asset.status)?;

    if asset_tag != asset.asset_tag
        && state
            .assets
            .exists_by_tag(&asset_tag)
            .await
            .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!(
            "Asset tag '{}' already exists",
            asset_tag
        )));
    }

    check_references(&state, &payload).await?;

    asset.asset_tag = asset_tag;
    asset.name = name;
    asset.status = status;
    asset.brand_id = payload.brand_id;
    asset.category_id = payload.category_id;
    asset.location_id = payload.location_id;
    asset.department_id = payload.department_id;
    asset.purchase_cost_cents = payload.purchase_cost_cents;
    asset.purchase_date = payload.purchase_date;

    let updated = state
        .assets
        .update(&asset)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Asset not found"))?;

    Ok(Json(updated.into()))
}

async fn delete_asset(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.assets.delete(id).await.map_err(ApiError::internal)?;

    if !deleted {
        return Err(ApiError::not_found("Asset not found"));
    }

    Ok(StatusCode::OK)
}

async fn list_maintenance(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<MaintenanceResponse>>, ApiError> {
    ensure_exists(|aid| state.assets.get_by_id(aid), "Asset", id).await?;

    let records = state
        .maintenance
        .list_for_asset(id)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

async fn create_maintenance(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<MaintenancePayload>,
) -> Result<(StatusCode, Json<MaintenanceResponse>), ApiError> {
    let description = require_field(payload.description, "Maintenance description is required")?;

    ensure_exists(|aid| state.assets.get_by_id(aid), "Asset", id).await?;

    let record = state
        .maintenance
        .create(&MaintenanceRecord {
            id: 0,
            asset_id: id,
            description,
            cost_cents: payload.cost_cents.unwrap_or(0),
            performed_at: payload.performed_at.unwrap_or_else(Utc::now),
            created_at: Utc::now(),
        })
        .await
        .map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, Json(record.into())))
}
