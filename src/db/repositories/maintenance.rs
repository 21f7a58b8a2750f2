//! Maintenance record repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

use crate::db::DbPool;
use crate::models::MaintenanceRecord;

/// Maintenance record repository trait
#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    /// Record a maintenance event
    async fn create(&self, record: &MaintenanceRecord) -> Result<MaintenanceRecord>;

    /// Get record by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<MaintenanceRecord>>;

    /// List records for one asset, newest first
    async fn list_for_asset(&self, asset_id: i64) -> Result<Vec<MaintenanceRecord>>;

    /// Delete a record; returns false when the row did not exist
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based maintenance record repository
pub struct SqlxMaintenanceRepository {
    pool: DbPool,
}

impl SqlxMaintenanceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn MaintenanceRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MaintenanceRepository for SqlxMaintenanceRepository {
    async fn create(&self, record: &MaintenanceRecord) -> Result<MaintenanceRecord> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO maintenance_records (asset_id, description, cost_cents, performed_at, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.asset_id)
        .bind(&record.description)
        .bind(record.cost_cents)
        .bind(record.performed_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create maintenance record")?;

        Ok(MaintenanceRecord {
            id: result.last_insert_rowid(),
            asset_id: record.asset_id,
            description: record.description.clone(),
            cost_cents: record.cost_cents,
            performed_at: record.performed_at,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<MaintenanceRecord>> {
        let row = sqlx::query(
            "SELECT id, asset_id, description, cost_cents, performed_at, created_at FROM maintenance_records WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get maintenance record by ID")?;

        Ok(row.map(|row| row_to_record(&row)))
    }

    async fn list_for_asset(&self, asset_id: i64) -> Result<Vec<MaintenanceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, asset_id, description, cost_cents, performed_at, created_at
            FROM maintenance_records
            WHERE asset_id = ?
            ORDER BY performed_at DESC
            "#,
        )
        .bind(asset_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list maintenance records")?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM maintenance_records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete maintenance record")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> MaintenanceRecord {
    MaintenanceRecord {
        id: row.get("id"),
        asset_id: row.get("asset_id"),
        description: row.get("description"),
        cost_cents: row.get("cost_cents"),
        performed_at: row.get::<DateTime<Utc>, _>("performed_at"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::asset::{AssetRepository, SqlxAssetRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{AssetStatus, CreateAssetInput};

    async fn setup() -> (SqlxMaintenanceRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let assets = SqlxAssetRepository::new(pool.clone());
        let asset = assets
            .create(&CreateAssetInput {
                asset_tag: "AST-0001".to_string(),
                name: "Forklift".to_string(),
                status: AssetStatus::Active,
                brand_id: None,
                category_id: None,
                location_id: None,
                department_id: None,
                purchase_cost_cents: None,
                purchase_date: None,
            })
            .await
            .expect("Failed to create asset");

        (SqlxMaintenanceRepository::new(pool), asset.id)
    }

    fn test_record(asset_id: i64) -> MaintenanceRecord {
        MaintenanceRecord {
            id: 0,
            asset_id,
            description: "Replaced hydraulic hose".to_string(),
            cost_cents: 18_500,
            performed_at: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_records() {
        let (repo, asset_id) = setup().await;

        repo.create(&test_record(asset_id))
            .await
            .expect("Failed to create record");
        repo.create(&test_record(asset_id))
            .await
            .expect("Failed to create record");

        let records = repo
            .list_for_asset(asset_id)
            .await
            .expect("Failed to list records");
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_create_record_missing_asset_fails() {
        let (repo, _) = setup().await;

        let result = repo.create(&test_record(99999)).await;
        assert!(result.is_err(), "Should fail due to missing asset FK");
    }

    #[tokio::test]
    async fn test_delete_record() {
        let (repo, asset_id) = setup().await;
        let created = repo
            .create(&test_record(asset_id))
            .await
            .expect("Failed to create record");

        assert!(repo.delete(created.id).await.expect("Failed to delete"));
        assert!(repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get record")
            .is_none());
    }
}
