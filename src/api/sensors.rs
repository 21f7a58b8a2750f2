//! Simulated sensor API endpoints
//!
//! - GET /api/sensors/motion
//! - GET /api/sensors/vibration
//! - GET /api/sensors/fuel
//! - GET /api/sensors/car-detection

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::AppState;
use crate::services::sensor::{
    CarDetectionReading, FuelReading, MotionReading, VibrationReading,
};

/// Build the sensors router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/motion", get(motion))
        .route("/vibration", get(vibration))
        .route("/fuel", get(fuel))
        .route("/car-detection", get(car_detection))
}

async fn motion(State(state): State<AppState>) -> Json<MotionReading> {
    Json(state.sensors.motion())
}

async fn vibration(State(state): State<AppState>) -> Json<VibrationReading> {
    Json(state.sensors.vibration().await)
}

async fn fuel(State(state): State<AppState>) -> Json<FuelReading> {
    Json(state.sensors.fuel())
}

async fn car_detection(State(state): State<AppState>) -> Json<CarDetectionReading> {
    Json(state.sensors.car_detection())
}
