//! Database backup orchestrator
//!
//! Produces a consistent on-disk snapshot of the database (`VACUUM INTO`),
//! optionally gzip-compresses it, and hands the artifact to the Drive
//! uploader for best-effort offsite replication.
//!
//! Target-directory resolution is an explicit decision table over three
//! inputs: the kind of path the operator configured (UNC share, absolute,
//! relative, or none), whether the directory is writable from this host,
//! and whether a default directory beside the database file is available.
//! UNC shares cannot be probed from the application host, so they are
//! passed through with a warning and the engine's own error is
//! authoritative. The configured path is validated before it is spliced
//! into any SQL statement.

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::Row;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{BackupConfig, DriveConfig};
use crate::db::DbPool;
use crate::services::drive::{DriveFile, DriveUploader};

/// Backup failures, each with enough detail for an operator to act on
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("Backup target path is invalid: {0}")]
    InvalidPath(String),

    #[error("Cannot back up an in-memory database; configure a file-backed database first")]
    InMemoryDatabase,

    #[error(
        "Backup directory '{path}' is not writable and no default backup directory is \
         available. Grant the service user write permission on the directory (and execute \
         permission on its parent directories), or unset DB_BACKUP_DISK_PATH to use the \
         default location beside the database file."
    )]
    TargetUnavailable { path: String },

    #[error("Backup statement failed: {0}")]
    Snapshot(String),

    #[error("Backup artifact error: {0}")]
    Artifact(String),
}

/// The kind of path the operator configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// `\\server\share` network path, usable by the database host only
    Unc,
    /// Absolute local path
    Absolute,
    /// Relative path, resolved against the working directory
    Relative,
}

impl PathKind {
    /// Classify a validated path string
    pub fn classify(path: &str) -> PathKind {
        if path.starts_with("\\\\") {
            PathKind::Unc
        } else if Path::new(path).is_absolute() {
            PathKind::Absolute
        } else {
            PathKind::Relative
        }
    }
}

/// Outcome of the target-directory decision table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathDecision {
    /// Directory verified writable
    Proceed(PathBuf),
    /// Directory cannot be verified from this host; the engine's own
    /// error is authoritative
    WarnAndProceed(PathBuf),
    /// Configured directory unusable, default directory substituted
    Fallback(PathBuf),
    /// No usable directory
    Fail(String),
}

/// Compression seam so tests can inject a failing compressor
pub trait Compressor: Send + Sync {
    /// Compress `src` into `dest`
    fn compress(&self, src: &Path, dest: &Path) -> io::Result<()>;
}

/// Gzip compressor used in production
pub struct GzipCompressor;

impl Compressor for GzipCompressor {
    fn compress(&self, src: &Path, dest: &Path) -> io::Result<()> {
        let mut input = File::open(src)?;
        let output = File::create(dest)?;
        let mut encoder = GzEncoder::new(output, Compression::default());
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?;
        Ok(())
    }
}

/// Result of one backup run
#[derive(Debug, Clone, Serialize)]
pub struct BackupOutcome {
    /// Path of the artifact on disk
    pub path: PathBuf,
    /// Artifact size in bytes
    pub size_bytes: u64,
    /// Whether the artifact is gzip-compressed
    pub compressed: bool,
    /// SHA-256 checksum of the artifact
    pub checksum: String,
    /// Offsite copy, when the upload succeeded
    pub drive_file: Option<DriveFile>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
}

/// Backup orchestrator
pub struct BackupService {
    pool: DbPool,
    config: BackupConfig,
    uploader: DriveUploader,
    compressor: Arc<dyn Compressor>,
}

impl BackupService {
    pub fn new(pool: DbPool, config: BackupConfig, drive: DriveConfig) -> Self {
        Self {
            pool,
            config,
            uploader: DriveUploader::new(drive),
            compressor: Arc::new(GzipCompressor),
        }
    }

    /// Replace the compressor (tests)
    pub fn with_compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = compressor;
        self
    }

    /// Run one backup: resolve the target directory, snapshot, compress,
    /// and attempt the offsite upload. Upload failure never fails the run.
    pub async fn run(&self) -> Result<BackupOutcome, BackupError> {
        let db_file = self.database_file().await?;
        let db_name = db_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "database".to_string());

        let target_dir = match self.resolve_target_dir(&db_file)? {
            PathDecision::Proceed(dir) => dir,
            PathDecision::WarnAndProceed(dir) => {
                tracing::warn!(
                    "Backup directory '{}' cannot be verified from this host; \
                     delegating validation to the database engine",
                    dir.display()
                );
                dir
            }
            PathDecision::Fallback(dir) => {
                tracing::warn!(
                    "Configured backup directory is not accessible; falling back to \
                     default directory '{}'",
                    dir.display()
                );
                dir
            }
            PathDecision::Fail(path) => return Err(BackupError::TargetUnavailable { path }),
        };

        let artifact_name = artifact_name(&db_name, Utc::now());
        let snapshot_path = target_dir.join(&artifact_name);

        self.execute_snapshot(&snapshot_path).await?;

        // Compression is best-effort: on failure the uncompressed snapshot
        // is kept and the run still succeeds (single fallback, no retry).
        let (artifact_path, compressed) = if self.config.compress {
            let compressed_path = target_dir.join(format!("{}.gz", artifact_name));
            match self.compressor.compress(&snapshot_path, &compressed_path) {
                Ok(()) => {
                    let _ = fs::remove_file(&snapshot_path);
                    (compressed_path, true)
                }
                Err(e) => {
                    tracing::warn!(
                        "Backup compression failed ({}); keeping uncompressed artifact", e
                    );
                    let _ = fs::remove_file(&compressed_path);
                    (snapshot_path, false)
                }
            }
        } else {
            (snapshot_path, false)
        };

        let size_bytes = fs::metadata(&artifact_path)
            .map_err(|e| BackupError::Artifact(format!("cannot stat artifact: {}", e)))?
            .len();
        let checksum = sha256_file(&artifact_path)
            .map_err(|e| BackupError::Artifact(format!("cannot checksum artifact: {}", e)))?;

        // Upload is independent of backup success: a failed upload is
        // logged with remediation guidance and reported as drive_file: None.
        let drive_file = match self.uploader.upload_backup(&artifact_path).await {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!("Drive upload failed: {}. {}", e, e.remediation());
                None
            }
        };

        let outcome = BackupOutcome {
            path: artifact_path,
            size_bytes,
            compressed,
            checksum,
            drive_file,
            finished_at: Utc::now(),
        };

        tracing::info!(
            "Backup completed: {} ({} bytes, compressed: {})",
            outcome.path.display(),
            outcome.size_bytes,
            outcome.compressed
        );

        Ok(outcome)
    }

    /// Resolve the database file via a system query.
    async fn database_file(&self) -> Result<PathBuf, BackupError> {
        let rows = sqlx::query("PRAGMA database_list")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BackupError::Snapshot(e.to_string()))?;

        let file: Option<String> = rows.iter().find_map(|row| {
            let name: String = row.get("name");
            if name == "main" {
                Some(row.get("file"))
            } else {
                None
            }
        });

        match file {
            Some(file) if !file.is_empty() => Ok(PathBuf::from(file)),
            _ => Err(BackupError::InMemoryDatabase),
        }
    }

    /// The target-directory decision table.
    fn resolve_target_dir(&self, db_file: &Path) -> Result<PathDecision, BackupError> {
        let default_dir = default_backup_dir(db_file);

        let Some(configured) = &self.config.disk_path else {
            // No override: the default directory must be usable.
            return Ok(match default_dir {
                Some(dir) if probe_directory(&dir) => PathDecision::Proceed(dir),
                Some(dir) => PathDecision::Fail(dir.display().to_string()),
                None => PathDecision::Fail("<no default directory>".to_string()),
            });
        };

        let validated = validate_path_shape(&configured.to_string_lossy())?;

        Ok(match PathKind::classify(&validated) {
            // A network share is only reachable from the database host.
            PathKind::Unc => PathDecision::WarnAndProceed(PathBuf::from(validated)),
            PathKind::Absolute | PathKind::Relative => {
                let dir = PathBuf::from(validated);
                if probe_directory(&dir) {
                    PathDecision::Proceed(dir)
                } else {
                    match default_dir {
                        Some(fallback) if probe_directory(&fallback) => {
                            PathDecision::Fallback(fallback)
                        }
                        _ => PathDecision::Fail(dir.display().to_string()),
                    }
                }
            }
        })
    }

    async fn execute_snapshot(&self, target: &Path) -> Result<(), BackupError> {
        // Overwrite semantics: an artifact already at the target path is
        // replaced, not appended to.
        if target.exists() {
            fs::remove_file(target)
                .map_err(|e| BackupError::Artifact(format!("cannot replace artifact: {}", e)))?;
        }

        let statement = format!("VACUUM INTO '{}'", target.display());
        sqlx::query(&statement)
            .execute(&self.pool)
            .await
            .map_err(|e| BackupError::Snapshot(e.to_string()))?;

        Ok(())
    }
}

/// Validate the shape of a configured path before it reaches any SQL
/// statement. Rejects multi-line paths, NUL bytes, and multiply-quoted or
/// quote-bearing segments; strips one surrounding pair of double quotes.
pub fn validate_path_shape(raw: &str) -> Result<String, BackupError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(BackupError::InvalidPath("path is empty".to_string()));
    }
    if trimmed.contains('\n') || trimmed.contains('\r') {
        return Err(BackupError::InvalidPath(
            "path contains line breaks".to_string(),
        ));
    }
    if trimmed.contains('\0') {
        return Err(BackupError::InvalidPath("path contains NUL".to_string()));
    }

    // Operators sometimes quote the whole path; one surrounding pair is
    // tolerated, anything further is malformed.
    let unquoted = if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    if unquoted.contains('"') {
        return Err(BackupError::InvalidPath(
            "path contains multiple quoted segments".to_string(),
        ));
    }
    if unquoted.contains('\'') {
        return Err(BackupError::InvalidPath(
            "path contains quote characters".to_string(),
        ));
    }
    if unquoted.is_empty() {
        return Err(BackupError::InvalidPath("path is empty".to_string()));
    }

    Ok(unquoted.to_string())
}

/// Artifact name: `<dbName>-<ISO8601-with-dashes>.bak`
pub fn artifact_name(db_name: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}.bak", db_name, at.format("%Y-%m-%dT%H-%M-%S"))
}

/// The engine's default backup directory: `backups/` beside the database
/// file. `None` when the database file has no parent directory.
fn default_backup_dir(db_file: &Path) -> Option<PathBuf> {
    db_file.parent().map(|parent| parent.join("backups"))
}

/// Probe whether a directory is writable from this host: create it if
/// missing, then write and remove a probe file.
fn probe_directory(dir: &Path) -> bool {
    if fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".assetra-probe");
    match File::create(&probe) {
        Ok(_) => {
            let _ = fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
