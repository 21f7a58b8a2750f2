//! Role repository
//!
//! Permissions are stored as a JSON string array on the role row.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::DbPool;
use crate::models::Role;

/// Role repository trait
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Create a new role
    async fn create(&self, name: &str, permissions: &[String]) -> Result<Role>;

    /// Get role by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Role>>;

    /// List all roles
    async fn list(&self) -> Result<Vec<Role>>;

    /// Update a role
    async fn update(&self, id: i64, name: &str, permissions: &[String]) -> Result<Option<Role>>;

    /// Delete a role; returns false when the row did not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Check if a role name is already taken
    async fn exists_by_name(&self, name: &str) -> Result<bool>;
}

/// SQLx-based role repository
pub struct SqlxRoleRepository {
    pool: DbPool,
}

impl SqlxRoleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn RoleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RoleRepository for SqlxRoleRepository {
    async fn create(&self, name: &str, permissions: &[String]) -> Result<Role> {
        let now = Utc::now();
        let permissions_json =
            serde_json::to_string(permissions).context("Failed to serialize permissions")?;

        let result =
            sqlx::query("INSERT INTO roles (name, permissions, created_at) VALUES (?, ?, ?)")
                .bind(name)
                .bind(&permissions_json)
                .bind(now)
                .execute(&self.pool)
                .await
                .context("Failed to create role")?;

        Ok(Role {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            permissions: permissions.to_vec(),
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Role>> {
        let row = sqlx::query("SELECT id, name, permissions, created_at FROM roles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get role by ID")?;

        row.map(|row| row_to_role(&row)).transpose()
    }

    async fn list(&self) -> Result<Vec<Role>> {
        let rows = sqlx::query("SELECT id, name, permissions, created_at FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list roles")?;

        rows.iter().map(row_to_role).collect()
    }

    async fn update(&self, id: i64, name: &str, permissions: &[String]) -> Result<Option<Role>> {
        let permissions_json =
            serde_json::to_string(permissions).context("Failed to serialize permissions")?;

        let result = sqlx::query("UPDATE roles SET name = ?, permissions = ? WHERE id = ?")
            .bind(name)
            .bind(&permissions_json)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update role")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete role")?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM roles WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check role name existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }
}

fn row_to_role(row: &sqlx::sqlite::SqliteRow) -> Result<Role> {
    let permissions_json: String = row.get("permissions");
    let permissions: Vec<String> = serde_json::from_str(&permissions_json)
        .context("Failed to parse stored role permissions")?;

    Ok(Role {
        id: row.get("id"),
        name: row.get("name"),
        permissions,
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxRoleRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxRoleRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_role_with_permissions() {
        let repo = setup().await;

        let created = repo
            .create(
                "auditor",
                &["assets.read".to_string(), "reports.read".to_string()],
            )
            .await
            .expect("Failed to create role");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get role")
            .expect("Role not found");
        assert_eq!(found.permissions.len(), 2);
        assert!(found.has_permission("assets.read"));
    }

    #[tokio::test]
    async fn test_create_role_empty_permissions() {
        let repo = setup().await;

        let created = repo
            .create("viewer", &[])
            .await
            .expect("Failed to create role");
        assert!(created.permissions.is_empty());
    }

    #[tokio::test]
    async fn test_update_role_permissions() {
        let repo = setup().await;
        let created = repo
            .create("auditor", &["assets.read".to_string()])
            .await
            .expect("Failed to create role");

        let updated = repo
            .update(
                created.id,
                "auditor",
                &["assets.read".to_string(), "assets.write".to_string()],
            )
            .await
            .expect("Failed to update role")
            .expect("Role not found");
        assert_eq!(updated.permissions.len(), 2);
    }

    #[tokio::test]
    async fn test_unique_name_constraint() {
        let repo = setup().await;
        repo.create("auditor", &[])
            .await
            .expect("Failed to create role");

        let result = repo.create("auditor", &[]).await;
        assert!(result.is_err(), "Should fail due to duplicate name");
    }
}
