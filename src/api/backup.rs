//! Backup API endpoints
//!
//! Manual trigger for the backup orchestrator; the scheduled path runs
//! the same service from the background task.

use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::services::backup::{BackupError, BackupOutcome};

#[derive(Debug, Serialize)]
pub struct BackupRunResponse {
    pub path: String,
    pub size_bytes: u64,
    pub compressed: bool,
    pub checksum: String,
    pub drive_file: Option<crate::services::drive::DriveFile>,
    pub finished_at: String,
}

impl From<BackupOutcome> for BackupRunResponse {
    fn from(outcome: BackupOutcome) -> Self {
        Self {
            path: outcome.path.display().to_string(),
            size_bytes: outcome.size_bytes,
            compressed: outcome.compressed,
            checksum: outcome.checksum,
            drive_file: outcome.drive_file,
            finished_at: outcome.finished_at.to_rfc3339(),
        }
    }
}

/// Build the backup router
pub fn router() -> Router<AppState> {
    Router::new().route("/run", post(run_backup))
}

async fn run_backup(State(state): State<AppState>) -> Result<Json<BackupRunResponse>, ApiError> {
    let outcome = state.backup.run().await.map_err(map_backup_error)?;
    Ok(Json(outcome.into()))
}

/// Configuration-shaped failures are the operator's to fix (400); the
/// rest are server-side (500).
fn map_backup_error(err: BackupError) -> ApiError {
    match err {
        BackupError::InvalidPath(_) | BackupError::InMemoryDatabase => {
            ApiError::validation_error(err.to_string())
        }
        BackupError::TargetUnavailable { .. } => ApiError::validation_error(err.to_string()),
        BackupError::Snapshot(_) | BackupError::Artifact(_) => ApiError::internal(err),
    }
}
