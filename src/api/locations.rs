//! Location API endpoints

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
use crate::db::repositories::LocationRepository;
use crate::models::Location;

#[derive(Debug, Deserialize)]
pub struct LocationPayload {
    pub name: Option<String>,
    pub site: Option<String>,
    pub building: Option<String>,
    pub floor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub id: i64,
    pub name: String,
    pub site: Option<String>,
    pub building: Option<String>,
    pub floor: Option<String>,
    pub created_at: String,
}

impl From<Location> for LocationResponse {
    fn from(location: Location) -> Self {
        Self {
            id: location.id,
            name: location.name,
            site: location.site,
            building: location.building,
            floor: location.floor,
            created_at: location.created_at.to_rfc3339(),
        }
    }
}

/// Build the locations router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_locations).post(create_location))
        .route(
            "/{id}",
            get(get_location).put(update_location).delete(delete_location),
        )
}

async fn list_locations(
    State(state): State<AppState>,
) -> Result<Json<Vec<LocationResponse>>, ApiError> {
    let locations = state.locations.list().await.map_err(ApiError::internal)?;
    Ok(Json(locations.into_iter().map(Into::into).collect()))
}

async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<LocationResponse>, ApiError> {
    let location = state
        .locations
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Location not found"))?;

    Ok(Json(location.into()))
}

async fn create_location(
    State(state): State<AppState>,
    Json(payload): Json<LocationPayload>,
) -> Result<(StatusCode, Json<LocationResponse>), ApiError> {
    let name = require_field(payload.name, "Location name is required")?;

    if state
        .locations
        .exists_by_name(&name)
        .await
        .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!(
            "Location '{}' already exists",
            name
        )));
    }

    let location = state
        .locations
        .create(&Location {
            id: 0,
            name,
            site: payload.site,
            building: payload.building,
            floor: payload.floor,
            created_at: Utc::now(),
        })
        .await
        .map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, Json(location.into())))
}

async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<LocationPayload>,
) -> Result<Json<LocationResponse>, ApiError> {
    let name = require_field(payload.name, "Location name is required")?;

    let mut location = state
        .locations
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Location not found"))?;

    if name != location.name
        && state
            .locations
            .exists_by_name(&name)
            .await
            .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!(
            "Location '{}' already exists",
            name
        )));
    }

    location.name = name;
    location.site = payload.site;
    location.building = payload.building;
    location.floor = payload.floor;

    let updated = state
        .locations
        .update(&location)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Location not found"))?;

    Ok(Json(updated.into()))
}

async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .locations
        .delete(id)
        .await
        .map_err(ApiError::internal)?;

    if !deleted {
        return Err(ApiError::not_found("Location not found"));
    }

    Ok(StatusCode::OK)
}
