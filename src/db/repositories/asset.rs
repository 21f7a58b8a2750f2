//! Asset repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::DbPool;
use crate::models::{Asset, AssetStatus, CreateAssetInput};

/// Asset repository trait
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Create a new asset
    async fn create(&self, input: &CreateAssetInput) -> Result<Asset>;

    /// Get asset by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Asset>>;

    /// Get asset by inventory tag
    async fn get_by_tag(&self, asset_tag: &str) -> Result<Option<Asset>>;

    /// List assets, optionally filtered by status
    async fn list(&self, status: Option<AssetStatus>) -> Result<Vec<Asset>>;

    /// Update an asset
    async fn update(&self, asset: &Asset) -> Result<Option<Asset>>;

    /// Delete an asset; returns false when the row did not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Check if an asset tag is already registered
    async fn exists_by_tag(&self, asset_tag: &str) -> Result<bool>;
}

/// SQLx-based asset repository
pub struct SqlxAssetRepository {
    pool: DbPool,
}

impl SqlxAssetRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn AssetRepository> {
        Arc::new(Self::new(pool))
    }
}

const ASSET_COLUMNS: &str = "id, asset_tag, name, status, brand_id, category_id, location_id, \
                             department_id, purchase_cost_cents, purchase_date, created_at, updated_at";

#[async_trait]
impl AssetRepository for SqlxAssetRepository {
    async fn create(&self, input: &CreateAssetInput) -> Result<Asset> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO assets (
                asset_tag, name, status, brand_id, category_id, location_id,
                department_id, purchase_cost_cents, purchase_date, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.asset_tag)
        .bind(&input.name)
        .bind(input.status.as_str())
        .bind(input.brand_id)
        .bind(input.category_id)
        .bind(input.location_id)
        .bind(input.department_id)
        .bind(input.purchase_cost_cents)
        .bind(input.purchase_date)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create asset")?;

        Ok(Asset {
            id: result.last_insert_rowid(),
            asset_tag: input.asset_tag.clone(),
            name: input.name.clone(),
            status: input.status,
            brand_id: input.brand_id,
            category_id: input.category_id,
            location_id: input.location_id,
            department_id: input.department_id,
            purchase_cost_cents: input.purchase_cost_cents,
            purchase_date: input.purchase_date,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Asset>> {
        let query = format!("SELECT {} FROM assets WHERE id = ?", ASSET_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get asset by ID")?;

        row.map(|row| row_to_asset(&row)).transpose()
    }

    async fn get_by_tag(&self, asset_tag: &str) -> Result<Option<Asset>> {
        let query = format!("SELECT {} FROM assets WHERE asset_tag = ?", ASSET_COLUMNS);
        let row = sqlx::query(&query)
            .bind(asset_tag)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get asset by tag")?;

        row.map(|row| row_to_asset(&row)).transpose()
    }

    async fn list(&self, status: Option<AssetStatus>) -> Result<Vec<Asset>> {
        let rows = match status {
            Some(status) => {
                let query = format!(
                    "SELECT {} FROM assets WHERE status = ? ORDER BY asset_tag",
                    ASSET_COLUMNS
                );
                sqlx::query(&query)
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let query = format!("SELECT {} FROM assets ORDER BY asset_tag", ASSET_COLUMNS);
                sqlx::query(&query).fetch_all(&self.pool).await
            }
        }
        .context("Failed to list assets")?;

        rows.iter().map(row_to_asset).collect()
    }

    async fn update(&self, asset: &Asset) -> Result<Option<Asset>> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE assets
            SET asset_tag = ?, name = ?, status = ?, brand_id = ?, category_id = ?,
                location_id = ?, department_id = ?, purchase_cost_cents = ?,
                purchase_date = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&asset.asset_tag)
        .bind(&asset.name)
        .bind(asset.status.as_str())
        .bind(asset.brand_id)
        .bind(asset.category_id)
        .bind(asset.location_id)
        .bind(asset.department_id)
        .bind(asset.purchase_cost_cents)
        .bind(asset.purchase_date)
        .bind(now)
        .bind(asset.id)
        .execute(&self.pool)
        .await
        .context("Failed to update asset")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(asset.id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM assets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete asset")?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_tag(&self, asset_tag: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM assets WHERE asset_tag = ?")
            .bind(asset_tag)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check asset tag existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }
}

fn row_to_asset(row: &sqlx::sqlite::SqliteRow) -> Result<Asset> {
    let status_str: String = row.get("status");
    let status = AssetStatus::parse(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Unknown asset status: {}", status_str))?;

    Ok(Asset {
        id: row.get("id"),
        asset_tag: row.get("asset_tag"),
        name: row.get("name"),
        status,
        brand_id: row.get("brand_id"),
        category_id: row.get("category_id"),
        location_id: row.get("location_id"),
        department_id: row.get("department_id"),
        purchase_cost_cents: row.get("purchase_cost_cents"),
        purchase_date: row.get("purchase_date"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxAssetRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxAssetRepository::new(pool)
    }

    fn test_input(tag: &str) -> CreateAssetInput {
        CreateAssetInput {
            asset_tag: tag.to_string(),
            name: "Forklift 3".to_string(),
            status: AssetStatus::Pending,
            brand_id: None,
            category_id: None,
            location_id: None,
            department_id: None,
            purchase_cost_cents: Some(1_250_000),
            purchase_date: None,
        }
    }

    #[tokio::test]
    async fn test_create_asset_defaults_to_pending() {
        let repo = setup().await;

        let created = repo
            .create(&test_input("AST-0001"))
            .await
            .expect("Failed to create asset");

        assert!(created.id > 0);
        assert_eq!(created.status, AssetStatus::Pending);
    }

    #[tokio::test]
    async fn test_get_by_tag() {
        let repo = setup().await;
        repo.create(&test_input("AST-0001"))
            .await
            .expect("Failed to create asset");

        let found = repo
            .get_by_tag("AST-0001")
            .await
            .expect("Failed to get asset")
            .expect("Asset not found");
        assert_eq!(found.asset_tag, "AST-0001");
    }

    #[tokio::test]
    async fn test_list_filtered_by_status() {
        let repo = setup().await;
        let pending = repo
            .create(&test_input("AST-0001"))
            .await
            .expect("Failed to create asset");
        repo.create(&test_input("AST-0002"))
            .await
            .expect("Failed to create asset");

        // Promote one asset to active
        let mut active = pending.clone();
        active.status = AssetStatus::Active;
        repo.update(&active).await.expect("Failed to update asset");

        let active_assets = repo
            .list(Some(AssetStatus::Active))
            .await
            .expect("Failed to list assets");
        assert_eq!(active_assets.len(), 1);
        assert_eq!(active_assets[0].asset_tag, "AST-0001");

        let all = repo.list(None).await.expect("Failed to list assets");
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_update_touches_updated_at() {
        let repo = setup().await;
        let created = repo
            .create(&test_input("AST-0001"))
            .await
            .expect("Failed to create asset");

        let mut changed = created.clone();
        changed.name = "Forklift 3 (refurbished)".to_string();
        let updated = repo
            .update(&changed)
            .await
            .expect("Failed to update asset")
            .expect("Asset not found");

        assert_eq!(updated.name, "Forklift 3 (refurbished)");
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_asset() {
        let repo = setup().await;
        let mut missing = repo
            .create(&test_input("AST-0001"))
            .await
            .expect("Failed to create asset");
        missing.id = 99999;

        let updated = repo.update(&missing).await.expect("Failed to update");
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_unique_tag_constraint() {
        let repo = setup().await;
        repo.create(&test_input("AST-0001"))
            .await
            .expect("Failed to create asset");

        let result = repo.create(&test_input("AST-0001")).await;
        assert!(result.is_err(), "Should fail due to duplicate tag");
    }

    #[tokio::test]
    async fn test_delete_asset() {
        let repo = setup().await;
        let created = repo
            .create(&test_input("AST-0001"))
            .await
            .expect("Failed to create asset");

        assert!(repo.delete(created.id).await.expect("Failed to delete"));
        assert!(!repo.delete(created.id).await.expect("Failed to delete"));
    }
}
