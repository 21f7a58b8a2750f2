//! Admin authentication endpoints
//!
//! - POST /api/auth/login       password step, emails the OTP
//! - POST /api/auth/verify-otp  second factor, returns the Bearer token

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::common::require_field;
use crate::api::middleware::{ApiError, AppState};
use crate::services::auth::AuthError;

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub otp_required: bool,
    pub expires_in_minutes: i64,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpPayload {
    pub email: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Build the public auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/verify-otp", post(verify_otp))
}

/// Map authentication failures onto the API status contract
fn map_auth_error(err: AuthError) -> ApiError {
    match err {
        AuthError::InvalidCredentials | AuthError::NoChallenge => {
            ApiError::unauthorized("Invalid credentials")
        }
        AuthError::OtpExpired => ApiError::gone("The verification code has expired; start over"),
        AuthError::TooManyAttempts => {
            ApiError::too_many_requests("Too many failed verification attempts; start over")
        }
        AuthError::InvalidToken => ApiError::unauthorized("Invalid or expired token"),
        AuthError::Internal(e) => ApiError::internal(e),
    }
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = require_field(payload.email, "Email is required")?;
    let password = require_field(payload.password, "Password is required")?;

    let (admin, challenge) = state
        .auth
        .start_login(&email, &password)
        .await
        .map_err(map_auth_error)?;

    let expiry_minutes = state.config.auth.otp_expiry_minutes;

    // The code travels by email only; a send failure is logged and the
    // response stays the same.
    if let Err(e) = state
        .email
        .send_otp_email(&admin.email, &admin.name, &challenge.code, expiry_minutes)
        .await
    {
        tracing::warn!("OTP email failed for {}: {}", admin.email, e);
    }

    Ok(Json(LoginResponse {
        otp_required: true,
        expires_in_minutes: expiry_minutes,
    }))
}

async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpPayload>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = require_field(payload.email, "Email is required")?;
    let code = require_field(payload.code, "Verification code is required")?;

    let token = state
        .auth
        .verify_otp(&email, &code)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(TokenResponse { token }))
}
