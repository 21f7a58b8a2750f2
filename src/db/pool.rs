//! Database connection pool
//!
//! The platform ships on SQLite: a single embedded file the backup
//! orchestrator can snapshot with `VACUUM INTO`. The pool factory
//! normalizes plain file paths into sqlx connection URLs and creates the
//! parent directory on first start.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::DatabaseConfig;

/// Shared connection pool handed to repositories and services
pub type DbPool = SqlitePool;

/// Create the application connection pool.
///
/// Accepts either a plain file path (`data/assetra.db`), a full sqlx URL
/// (`sqlite:data/assetra.db`), or `:memory:`. File-based databases are
/// created on first connect, and foreign keys are enforced on every
/// connection.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let url = &config.url;
    let in_memory = url == ":memory:" || url.starts_with("sqlite::memory:");

    // Ensure the database directory exists for file-based SQLite
    if !in_memory {
        let path = url.strip_prefix("sqlite:").unwrap_or(url);
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {:?}", parent)
                })?;
            }
        }
    }

    let connection_url = if in_memory {
        "sqlite::memory:".to_string()
    } else if url.starts_with("sqlite:") {
        url.to_string()
    } else {
        format!("sqlite:{}", url)
    };

    let options = SqliteConnectOptions::from_str(&connection_url)
        .with_context(|| format!("Invalid database URL: {}", url))?
        .create_if_missing(true)
        .foreign_keys(true);

    // An in-memory database exists per connection; the pool must stay on
    // a single connection or every checkout would see an empty database.
    let max_connections = if in_memory { 1 } else { 20 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to database: {}", url))?;

    Ok(pool)
}

/// Create an in-memory pool for tests
pub async fn create_test_pool() -> Result<DbPool> {
    let config = DatabaseConfig {
        url: ":memory:".to_string(),
    };
    create_pool(&config).await
}
