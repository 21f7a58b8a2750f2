//! API layer - HTTP handlers and routing
//!
//! Conventional REST routes per resource under `/api`, Bearer-JWT auth on
//! everything except login, the public demo-request form, and published
//! page reads.

pub mod assets;
pub mod auth;
pub mod backup;
pub mod brands;
pub mod categories;
pub mod common;
pub mod demo_requests;
pub mod departments;
pub mod employees;
pub mod locations;
pub mod middleware;
pub mod pages;
pub mod plans;
pub mod reports;
pub mod roles;
pub mod sensors;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState};

/// Build the `/api` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (Bearer token required)
    let protected_routes = Router::new()
        .nest("/assets", assets::router())
        .nest("/brands", brands::router())
        .nest("/categories", categories::router())
        .nest("/departments", departments::router())
        .nest("/employees", employees::router())
        .nest("/locations", locations::router())
        .nest("/roles", roles::router())
        .nest("/plans", plans::router())
        .nest("/pages", pages::router())
        .nest("/admin/demo-requests", demo_requests::router())
        .nest("/sensors", sensors::router())
        .nest("/reports", reports::router())
        .nest("/backup", backup::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::router())
        .nest("/demo-requests", demo_requests::public_router())
        .nest("/page", pages::public_router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
