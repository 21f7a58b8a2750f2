//! Brand repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::DbPool;
use crate::models::Brand;

/// Brand repository trait
#[async_trait]
pub trait BrandRepository: Send + Sync {
    /// Create a new brand
    async fn create(&self, name: &str) -> Result<Brand>;

    /// Get brand by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Brand>>;

    /// List all brands
    async fn list(&self) -> Result<Vec<Brand>>;

    /// Rename a brand
    async fn update(&self, id: i64, name: &str) -> Result<Option<Brand>>;

    /// Delete a brand; returns false when the row did not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Check if a brand name is already taken
    async fn exists_by_name(&self, name: &str) -> Result<bool>;
}

/// SQLx-based brand repository
pub struct SqlxBrandRepository {
    pool: DbPool,
}

impl SqlxBrandRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn BrandRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BrandRepository for SqlxBrandRepository {
    async fn create(&self, name: &str) -> Result<Brand> {
        let now = Utc::now();

        let result = sqlx::query("INSERT INTO brands (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(now)
            .execute(&self.pool)
            .await
            .context("Failed to create brand")?;

        Ok(Brand {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Brand>> {
        let row = sqlx::query("SELECT id, name, created_at FROM brands WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get brand by ID")?;

        Ok(row.map(|row| row_to_brand(&row)))
    }

    async fn list(&self) -> Result<Vec<Brand>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM brands ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list brands")?;

        Ok(rows.iter().map(row_to_brand).collect())
    }

    async fn update(&self, id: i64, name: &str) -> Result<Option<Brand>> {
        let result = sqlx::query("UPDATE brands SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update brand")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM brands WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete brand")?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM brands WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check brand name existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }
}

fn row_to_brand(row: &sqlx::sqlite::SqliteRow) -> Brand {
    Brand {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxBrandRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxBrandRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_brand() {
        let repo = setup().await;

        let created = repo.create("Acme").await.expect("Failed to create brand");
        assert!(created.id > 0);
        assert_eq!(created.name, "Acme");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get brand")
            .expect("Brand not found");
        assert_eq!(found.name, "Acme");
    }

    #[tokio::test]
    async fn test_get_missing_brand() {
        let repo = setup().await;
        let found = repo.get_by_id(99999).await.expect("Failed to get brand");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_brands_sorted() {
        let repo = setup().await;
        repo.create("Zeta").await.expect("Failed to create brand");
        repo.create("Acme").await.expect("Failed to create brand");

        let brands = repo.list().await.expect("Failed to list brands");
        assert_eq!(brands.len(), 2);
        assert_eq!(brands[0].name, "Acme");
        assert_eq!(brands[1].name, "Zeta");
    }

    #[tokio::test]
    async fn test_update_brand() {
        let repo = setup().await;
        let created = repo.create("Acme").await.expect("Failed to create brand");

        let updated = repo
            .update(created.id, "Acme Industries")
            .await
            .expect("Failed to update brand")
            .expect("Brand not found");
        assert_eq!(updated.name, "Acme Industries");
    }

    #[tokio::test]
    async fn test_update_missing_brand() {
        let repo = setup().await;
        let updated = repo.update(99999, "Nope").await.expect("Failed to update");
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_delete_brand() {
        let repo = setup().await;
        let created = repo.create("Acme").await.expect("Failed to create brand");

        assert!(repo.delete(created.id).await.expect("Failed to delete"));
        assert!(!repo.delete(created.id).await.expect("Failed to delete"));
        assert!(repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get brand")
            .is_none());
    }

    #[tokio::test]
    async fn test_exists_by_name() {
        let repo = setup().await;
        repo.create("Acme").await.expect("Failed to create brand");

        assert!(repo.exists_by_name("Acme").await.expect("check failed"));
        assert!(!repo.exists_by_name("Other").await.expect("check failed"));
    }

    #[tokio::test]
    async fn test_unique_name_constraint() {
        let repo = setup().await;
        repo.create("Acme").await.expect("Failed to create brand");

        let result = repo.create("Acme").await;
        assert!(result.is_err(), "Should fail due to duplicate name");
    }
}
