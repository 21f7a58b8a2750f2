//! Location repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::DbPool;
use crate::models::Location;

/// Location repository trait
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Create a new location
    async fn create(&self, location: &Location) -> Result<Location>;

    /// Get location by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Location>>;

    /// List all locations
    async fn list(&self) -> Result<Vec<Location>>;

    /// Update a location
    async fn update(&self, location: &Location) -> Result<Option<Location>>;

    /// Delete a location; returns false when the row did not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Check if a location name is already taken
    async fn exists_by_name(&self, name: &str) -> Result<bool>;
}

/// SQLx-based location repository
pub struct SqlxLocationRepository {
    pool: DbPool,
}

impl SqlxLocationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn LocationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl LocationRepository for SqlxLocationRepository {
    async fn create(&self, location: &Location) -> Result<Location> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO locations (name, site, building, floor, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&location.name)
        .bind(&location.site)
        .bind(&location.building)
        .bind(&location.floor)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create location")?;

        Ok(Location {
            id: result.last_insert_rowid(),
            name: location.name.clone(),
            site: location.site.clone(),
            building: location.building.clone(),
            floor: location.floor.clone(),
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Location>> {
        let row = sqlx::query(
            "SELECT id, name, site, building, floor, created_at FROM locations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get location by ID")?;

        Ok(row.map(|row| row_to_location(&row)))
    }

    async fn list(&self) -> Result<Vec<Location>> {
        let rows = sqlx::query(
            "SELECT id, name, site, building, floor, created_at FROM locations ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list locations")?;

        Ok(rows.iter().map(row_to_location).collect())
    }

    async fn update(&self, location: &Location) -> Result<Option<Location>> {
        let result = sqlx::query(
            "UPDATE locations SET name = ?, site = ?, building = ?, floor = ? WHERE id = ?",
        )
        .bind(&location.name)
        .bind(&location.site)
        .bind(&location.building)
        .bind(&location.floor)
        .bind(location.id)
        .execute(&self.pool)
        .await
        .context("Failed to update location")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(location.id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM locations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete location")?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM locations WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check location name existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }
}

fn row_to_location(row: &sqlx::sqlite::SqliteRow) -> Location {
    Location {
        id: row.get("id"),
        name: row.get("name"),
        site: row.get("site"),
        building: row.get("building"),
        floor: row.get("floor"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxLocationRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxLocationRepository::new(pool)
    }

    fn test_location(name: &str) -> Location {
        Location {
            id: 0,
            name: name.to_string(),
            site: Some("HQ".to_string()),
            building: Some("B1".to_string()),
            floor: Some("2".to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_location() {
        let repo = setup().await;

        let created = repo
            .create(&test_location("Warehouse North"))
            .await
            .expect("Failed to create location");
        assert!(created.id > 0);

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get location")
            .expect("Location not found");
        assert_eq!(found.name, "Warehouse North");
        assert_eq!(found.site.as_deref(), Some("HQ"));
    }

    #[tokio::test]
    async fn test_update_location() {
        let repo = setup().await;
        let mut created = repo
            .create(&test_location("Warehouse North"))
            .await
            .expect("Failed to create location");

        created.floor = Some("3".to_string());
        let updated = repo
            .update(&created)
            .await
            .expect("Failed to update")
            .expect("Location not found");
        assert_eq!(updated.floor.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_unique_name_constraint() {
        let repo = setup().await;
        repo.create(&test_location("Warehouse North"))
            .await
            .expect("Failed to create location");

        let result = repo.create(&test_location("Warehouse North")).await;
        assert!(result.is_err(), "Should fail due to duplicate name");
    }

    #[tokio::test]
    async fn test_delete_missing_location() {
        let repo = setup().await;
        assert!(!repo.delete(424242).await.expect("Failed to delete"));
    }
}
