//! API middleware
//!
//! Application state, the shared error envelope, and Bearer-token
//! authentication for protected routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::db::repositories::{
    AdminRepository, AssetRepository, BrandRepository, CategoryRepository, DemoRequestRepository,
    DepartmentRepository, EmployeeRepository, LocationRepository, MaintenanceRepository,
    PageRepository, PlanRepository, RoleRepository,
};
use crate::db::DbPool;
use crate::services::{
    auth::Claims, AuthService, BackupService, EmailService, ReportService, SensorHub,
};

/// Application state containing shared services and repositories
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
    pub auth: Arc<AuthService>,
    pub email: Arc<EmailService>,
    pub reports: Arc<ReportService>,
    pub backup: Arc<BackupService>,
    pub sensors: Arc<SensorHub>,
    pub admins: Arc<dyn AdminRepository>,
    pub assets: Arc<dyn AssetRepository>,
    pub brands: Arc<dyn BrandRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub demo_requests: Arc<dyn DemoRequestRepository>,
    pub departments: Arc<dyn DepartmentRepository>,
    pub employees: Arc<dyn EmployeeRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub maintenance: Arc<dyn MaintenanceRepository>,
    pub pages: Arc<dyn PageRepository>,
    pub plans: Arc<dyn PlanRepository>,
    pub roles: Arc<dyn RoleRepository>,
}

/// Authenticated admin extracted from a verified Bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin(pub Claims);

/// Error envelope returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn gone(message: impl Into<String>) -> Self {
        Self::new("GONE", message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new("TOO_MANY_REQUESTS", message)
    }

    /// Log the underlying failure and return a generic 500 envelope;
    /// internal details are never echoed to clients.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", err);
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "GONE" => StatusCode::GONE,
            "TOO_MANY_REQUESTS" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Extract the Bearer token from the Authorization header
fn extract_bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// Authentication middleware for protected routes
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let claims = state
        .auth
        .verify_token(&token)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    request.extensions_mut().insert(AuthenticatedAdmin(claims));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};

    fn request_with_header(value: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        let request = request_with_header("Bearer token-123");
        assert_eq!(
            extract_bearer_token(&request),
            Some("token-123".to_string())
        );
    }

    #[test]
    fn test_extract_bearer_token_wrong_scheme() {
        let request = request_with_header("Basic dXNlcjpwYXNz");
        assert!(extract_bearer_token(&request).is_none());
    }

    #[test]
    fn test_extract_bearer_token_missing() {
        let request = Request::builder()
            .uri("/test")
            .body(Body::empty())
            .unwrap();
        assert!(extract_bearer_token(&request).is_none());
    }

    #[test]
    fn test_api_error_codes() {
        assert_eq!(ApiError::conflict("dup").code, "CONFLICT");
        assert_eq!(ApiError::gone("expired").code, "GONE");
        assert_eq!(
            ApiError::too_many_requests("slow down").code,
            "TOO_MANY_REQUESTS"
        );
        assert_eq!(ApiError::validation_error("bad").code, "VALIDATION_ERROR");
    }

    #[test]
    fn test_internal_error_hides_details() {
        let error = ApiError::internal("database exploded at row 42");
        assert_eq!(error.message, "Internal server error");
        assert!(!error.message.contains("row 42"));
    }
}
