//! Department repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::DbPool;
use crate::models::Department;

/// Department repository trait
#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    /// Create a new department
    async fn create(&self, name: &str, code: &str) -> Result<Department>;

    /// Get department by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Department>>;

    /// List all departments
    async fn list(&self) -> Result<Vec<Department>>;

    /// Update a department
    async fn update(&self, id: i64, name: &str, code: &str) -> Result<Option<Department>>;

    /// Delete a department; returns false when the row did not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Check if a department code is already taken
    async fn exists_by_code(&self, code: &str) -> Result<bool>;
}

/// SQLx-based department repository
pub struct SqlxDepartmentRepository {
    pool: DbPool,
}

impl SqlxDepartmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn DepartmentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl DepartmentRepository for SqlxDepartmentRepository {
    async fn create(&self, name: &str, code: &str) -> Result<Department> {
        let now = Utc::now();

        let result =
            sqlx::query("INSERT INTO departments (name, code, created_at) VALUES (?, ?, ?)")
                .bind(name)
                .bind(code)
                .bind(now)
                .execute(&self.pool)
                .await
                .context("Failed to create department")?;

        Ok(Department {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            code: code.to_string(),
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Department>> {
        let row = sqlx::query("SELECT id, name, code, created_at FROM departments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get department by ID")?;

        Ok(row.map(|row| row_to_department(&row)))
    }

    async fn list(&self) -> Result<Vec<Department>> {
        let rows = sqlx::query("SELECT id, name, code, created_at FROM departments ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list departments")?;

        Ok(rows.iter().map(row_to_department).collect())
    }

    async fn update(&self, id: i64, name: &str, code: &str) -> Result<Option<Department>> {
        let result = sqlx::query("UPDATE departments SET name = ?, code = ? WHERE id = ?")
            .bind(name)
            .bind(code)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update department")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete department")?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_code(&self, code: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM departments WHERE code = ?")
            .bind(code)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check department code existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }
}

fn row_to_department(row: &sqlx::sqlite::SqliteRow) -> Department {
    Department {
        id: row.get("id"),
        name: row.get("name"),
        code: row.get("code"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxDepartmentRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxDepartmentRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_department() {
        let repo = setup().await;

        let created = repo
            .create("Operations", "OPS")
            .await
            .expect("Failed to create department");
        assert!(created.id > 0);

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get department")
            .expect("Department not found");
        assert_eq!(found.code, "OPS");
    }

    #[tokio::test]
    async fn test_exists_by_code() {
        let repo = setup().await;
        repo.create("Operations", "OPS")
            .await
            .expect("Failed to create department");

        assert!(repo.exists_by_code("OPS").await.expect("check failed"));
        assert!(!repo.exists_by_code("ENG").await.expect("check failed"));
    }

    #[tokio::test]
    async fn test_unique_code_constraint() {
        let repo = setup().await;
        repo.create("Operations", "OPS")
            .await
            .expect("Failed to create department");

        let result = repo.create("Other Ops", "OPS").await;
        assert!(result.is_err(), "Should fail due to duplicate code");
    }

    #[tokio::test]
    async fn test_update_missing_department() {
        let repo = setup().await;
        let updated = repo
            .update(99999, "Nope", "NOPE")
            .await
            .expect("Failed to update");
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_delete_department() {
        let repo = setup().await;
        let created = repo
            .create("Operations", "OPS")
            .await
            .expect("Failed to create department");

        assert!(repo.delete(created.id).await.expect("Failed to delete"));
        assert!(!repo.delete(created.id).await.expect("Failed to delete"));
    }
}
