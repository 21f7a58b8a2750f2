//! Report API endpoints
//!
//! `GET /api/reports/{type}?dateRange=thisMonth&format=csv`
//!
//! JSON responses carry the report inline; CSV, Excel, and HTML exports
//! are returned as downloads with a Content-Disposition filename of the
//! form `<ReportType>_<dateRange>_<epochMillis>.<ext>`.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{ReportFormat, ReportType};
use crate::services::report::{export_filename, render};

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(rename = "dateRange", default = "default_date_range")]
    pub date_range: String,
    #[serde(default)]
    pub format: Option<String>,
}

fn default_date_range() -> String {
    "thisMonth".to_string()
}

/// Build the reports router
pub fn router() -> Router<AppState> {
    Router::new().route("/{report_type}", get(generate_report))
}

async fn generate_report(
    State(state): State<AppState>,
    Path(report_type): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let report_type = ReportType::parse(&report_type).ok_or_else(|| {
        ApiError::validation_error(
            "Report type must be one of: inventory, utilization, maintenance-history, locations",
        )
    })?;

    let format = match query.format.as_deref() {
        None => ReportFormat::Json,
        Some(raw) => ReportFormat::parse(raw).ok_or_else(|| {
            ApiError::validation_error("Format must be one of: json, csv, xlsx, html")
        })?,
    };

    let now = Utc::now();
    let report = state
        .reports
        .generate(report_type, &query.date_range, now)
        .await
        .map_err(ApiError::internal)?;

    let body = render(&report, format).map_err(ApiError::internal)?;

    let mut response = Response::builder().header(header::CONTENT_TYPE, format.content_type());

    // Non-JSON formats are downloads
    if format != ReportFormat::Json {
        let filename = export_filename(report_type, &query.date_range, format, now);
        response = response.header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        );
    }

    response
        .body(axum::body::Body::from(body))
        .map_err(ApiError::internal)
        .map(|r| r.into_response())
}
