//! Department API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::require_field;
use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::DepartmentRepository;

#[derive(Debug, Deserialize)]
pub struct DepartmentPayload {
    pub name: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DepartmentResponse {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub created_at: String,
}

impl From<crate::models::Department> for DepartmentResponse {
    fn from(department: crate::models::Department) -> Self {
        Self {
            id: department.id,
            name: department.name,
            code: department.code,
            created_at: department.created_at.to_rfc3339(),
        }
    }
}

/// Build the departments router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_departments).post(create_department))
        .route(
            "/{id}",
            get(get_department)
                .put(update_department)
                .delete(delete_department),
        )
}

async fn list_departments(
    State(state): State<AppState>,
) -> Result<Json<Vec<DepartmentResponse>>, ApiError> {
    let departments = state.departments.list().await.map_err(ApiError::internal)?;
    Ok(Json(departments.into_iter().map(Into::into).collect()))
}

async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DepartmentResponse>, ApiError> {
    let department = state
        .departments
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Department not found"))?;

    Ok(Json(department.into()))
}

async fn create_department(
    State(state): State<AppState>,
    Json(payload): Json<DepartmentPayload>,
) -> Result<(StatusCode, Json<DepartmentResponse>), ApiError> {
    let name = require_field(payload.name, "Department name is required")?;
    let code = require_field(payload.code, "Department code is required")?;

    if state
        .departments
        .exists_by_code(&code)
        .await
        .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!(
            "Department code '{}' already exists",
            code
        )));
    }

    let department = state
        .departments
        .create(&name, &code)
        .await
        .map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, Json(department.into())))
}

async fn update_department(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<DepartmentPayload>,
) -> Result<Json<DepartmentResponse>, ApiError> {
    let name = require_field(payload.name, "Department name is required")?;
    let code = require_field(payload.code, "Department code is required")?;

    let existing = state
        .departments
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Department not found"))?;

    if code != existing.code
        && state
            .departments
            .exists_by_code(&code)
            .await
            .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!(
            "Department code '{}' already exists",
            code
        )));
    }

    let department = state
        .departments
        .update(id, &name, &code)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Department not found"))?;

    Ok(Json(department.into()))
}

async fn delete_department(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .departments
        .delete(id)
        .await
        .map_err(ApiError::internal)?;

    if !deleted {
        return Err(ApiError::not_found("Department not found"));
    }

    Ok(StatusCode::OK)
}
