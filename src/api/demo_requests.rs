//! Demo request API endpoints
//!
//! The create endpoint is public: it persists the request, then sends a
//! best-effort notification email. A failed email is logged and the
//! request is still accepted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::common::require_field;
use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::DemoRequestRepository;
use crate::models::DemoRequest;

#[derive(Debug, Deserialize)]
pub struct DemoRequestPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DemoRequestResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: Option<String>,
    pub created_at: String,
}

impl From<DemoRequest> for DemoRequestResponse {
    fn from(request: DemoRequest) -> Self {
        Self {
            id: request.id,
            name: request.name,
            email: request.email,
            company: request.company,
            message: request.message,
            created_at: request.created_at.to_rfc3339(),
        }
    }
}

/// Build the public demo-request router
pub fn public_router() -> Router<AppState> {
    Router::new().route("/", post(create_demo_request))
}

/// Build the admin demo-request router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_demo_requests))
        .route("/{id}", axum::routing::delete(delete_demo_request))
}

async fn create_demo_request(
    State(state): State<AppState>,
    Json(payload): Json<DemoRequestPayload>,
) -> Result<(StatusCode, Json<DemoRequestResponse>), ApiError> {
    let name = require_field(payload.name, "Name is required")?;
    let email = require_field(payload.email, "Email is required")?;

    if !email.contains('@') {
        return Err(ApiError::validation_error("Email is not valid"));
    }

    let request = state
        .demo_requests
        .create(&DemoRequest {
            id: 0,
            name,
            email,
            company: payload.company,
            message: payload.message,
            created_at: Utc::now(),
        })
        .await
        .map_err(ApiError::internal)?;

    // Notification is best-effort; the request is already persisted
    if let Err(e) = state.email.send_demo_request_notification(&request).await {
        tracing::warn!("Demo request notification email failed: {}", e);
    }

    Ok((StatusCode::CREATED, Json(request.into())))
}

async fn list_demo_requests(
    State(state): State<AppState>,
) -> Result<Json<Vec<DemoRequestResponse>>, ApiError> {
    let requests = state
        .demo_requests
        .list()
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

async fn delete_demo_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .demo_requests
        .delete(id)
        .await
        .map_err(ApiError::internal)?;

    if !deleted {
        return Err(ApiError::not_found("Demo request not found"));
    }

    Ok(StatusCode::OK)
}
