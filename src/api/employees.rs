//! Employee API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::common::{ensure_exists, require_field};
use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::{DepartmentRepository, EmployeeRepository};
use crate::models::Employee;

#[derive(Debug, Deserialize)]
pub struct EmployeePayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub nfc_number: Option<String>,
    pub department_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct EmployeeResponse {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub nfc_number: String,
    pub department_id: Option<i64>,
    pub created_at: String,
}

impl From<Employee> for EmployeeResponse {
    fn from(employee: Employee) -> Self {
        Self {
            id: employee.id,
            name: employee.name,
            email: employee.email,
            nfc_number: employee.nfc_number,
            department_id: employee.department_id,
            created_at: employee.created_at.to_rfc3339(),
        }
    }
}

/// Build the employees router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route(
            "/{id}",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}

async fn list_employees(
    State(state): State<AppState>,
) -> Result<Json<Vec<EmployeeResponse>>, ApiError> {
    let employees = state.employees.list().await.map_err(ApiError::internal)?;
    Ok(Json(employees.into_iter().map(Into::into).collect()))
}

async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EmployeeResponse>, ApiError> {
    let employee = state
        .employees
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    Ok(Json(employee.into()))
}

async fn create_employee(
    State(state): State<AppState>,
    Json(payload): Json<EmployeePayload>,
) -> Result<(StatusCode, Json<EmployeeResponse>), ApiError> {
    let name = require_field(payload.name, "Employee name is required")?;
    let nfc_number = require_field(payload.nfc_number, "Employee NFC number is required")?;

    if state
        .employees
        .exists_by_nfc(&nfc_number)
        .await
        .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!(
            "NFC number '{}' is already registered",
            nfc_number
        )));
    }

    if let Some(department_id) = payload.department_id {
        ensure_exists(
            |id| state.departments.get_by_id(id),
            "Department",
            department_id,
        )
        .await?;
    }

    let employee = state
        .employees
        .create(&Employee {
            id: 0,
            name,
            email: payload.email,
            nfc_number,
            department_id: payload.department_id,
            created_at: Utc::now(),
        })
        .await
        .map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, Json(employee.into())))
}

async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<EmployeePayload>,
) -> Result<Json<EmployeeResponse>, ApiError> {
    let name = require_field(payload.name, "Employee name is required")?;
    let nfc_number = require_field(payload.nfc_number, "Employee NFC number is required")?;

    let mut employee = state
        .employees
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    if nfc_number != employee.nfc_number
        && state
            .employees
            .exists_by_nfc(&nfc_number)
            .await
            .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!(
            "NFC number '{}' is already registered",
            nfc_number
        )));
    }

    if let Some(department_id) = payload.department_id {
        ensure_exists(
            |did| state.departments.get_by_id(did),
            "Department",
            department_id,
        )
        .await?;
    }

    employee.name = name;
    employee.email = payload.email;
    employee.nfc_number = nfc_number;
    employee.department_id = payload.department_id;

    let updated = state
        .employees
        .update(&employee)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    Ok(Json(updated.into()))
}

async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .employees
        .delete(id)
        .await
        .map_err(ApiError::internal)?;

    if !deleted {
        return Err(ApiError::not_found("Employee not found"));
    }

    Ok(StatusCode::OK)
}
