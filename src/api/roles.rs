//! Role API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::require_field;
use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::RoleRepository;

#[derive(Debug, Deserialize)]
pub struct RolePayload {
    pub name: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: i64,
    pub name: String,
    pub permissions: Vec<String>,
    pub created_at: String,
}

impl From<crate::models::Role> for RoleResponse {
    fn from(role: crate::models::Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            permissions: role.permissions,
            created_at: role.created_at.to_rfc3339(),
        }
    }
}

/// Build the roles router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/{id}", get(get_role).put(update_role).delete(delete_role))
}

async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<RoleResponse>>, ApiError> {
    let roles = state.roles.list().await.map_err(ApiError::internal)?;
    Ok(Json(roles.into_iter().map(Into::into).collect()))
}

async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RoleResponse>, ApiError> {
    let role = state
        .roles
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Role not found"))?;

    Ok(Json(role.into()))
}

async fn create_role(
    State(state): State<AppState>,
    Json(payload): Json<RolePayload>,
) -> Result<(StatusCode, Json<RoleResponse>), ApiError> {
    let name = require_field(payload.name, "Role name is required")?;

    if state
        .roles
        .exists_by_name(&name)
        .await
        .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!("Role '{}' already exists", name)));
    }

    let role = state
        .roles
        .create(&name, &payload.permissions)
        .await
        .map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, Json(role.into())))
}

async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RolePayload>,
) -> Result<Json<RoleResponse>, ApiError> {
    let name = require_field(payload.name, "Role name is required")?;

    let existing = state
        .roles
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Role not found"))?;

    if name != existing.name
        && state
            .roles
            .exists_by_name(&name)
            .await
            .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!("Role '{}' already exists", name)));
    }

    let role = state
        .roles
        .update(id, &name, &payload.permissions)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Role not found"))?;

    Ok(Json(role.into()))
}

async fn delete_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.roles.delete(id).await.map_err(ApiError::internal)?;

    if !deleted {
        return Err(ApiError::not_found("Role not found"));
    }

    Ok(StatusCode::OK)
}
