//! Category repository
//!
//! Categories form a two-level hierarchy: a subcategory references its
//! parent via `parent_id`. Deleting a category with subcategories is
//! refused at this layer so the API can answer with a validation error
//! instead of a bare constraint failure.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::DbPool;
use crate::models::Category;

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        parent_id: Option<i64>,
    ) -> Result<Category>;

    /// Get category by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// List all categories (roots first, then by name)
    async fn list(&self) -> Result<Vec<Category>>;

    /// List direct subcategories of a category
    async fn list_children(&self, parent_id: i64) -> Result<Vec<Category>>;

    /// Update a category
    async fn update(&self, category: &Category) -> Result<Option<Category>>;

    /// Delete a category; returns false when the row did not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Check if a category name is already taken
    async fn exists_by_name(&self, name: &str) -> Result<bool>;

    /// Count direct subcategories
    async fn count_children(&self, id: i64) -> Result<i64>;
}

/// SQLx-based category repository
pub struct SqlxCategoryRepository {
    pool: DbPool,
}

impl SqlxCategoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        parent_id: Option<i64>,
    ) -> Result<Category> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO categories (name, description, parent_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(description)
        .bind(parent_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create category")?;

        Ok(Category {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            description: description.map(|s| s.to_string()),
            parent_id,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        let row = sqlx::query(
            "SELECT id, name, description, parent_id, created_at FROM categories WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get category by ID")?;

        Ok(row.map(|row| row_to_category(&row)))
    }

    async fn list(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, parent_id, created_at
            FROM categories
            ORDER BY parent_id IS NOT NULL, name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list categories")?;

        Ok(rows.iter().map(row_to_category).collect())
    }

    async fn list_children(&self, parent_id: i64) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, parent_id, created_at
            FROM categories
            WHERE parent_id = ?
            ORDER BY name
            "#,
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list subcategories")?;

        Ok(rows.iter().map(row_to_category).collect())
    }

    async fn update(&self, category: &Category) -> Result<Option<Category>> {
        let result = sqlx::query(
            "UPDATE categories SET name = ?, description = ?, parent_id = ? WHERE id = ?",
        )
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.parent_id)
        .bind(category.id)
        .execute(&self.pool)
        .await
        .context("Failed to update category")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(category.id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete category")?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM categories WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check category name existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn count_children(&self, id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM categories WHERE parent_id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count subcategories")?;

        Ok(row.get("count"))
    }
}

fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> Category {
    Category {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        parent_id: row.get("parent_id"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxCategoryRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxCategoryRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_root_category() {
        let repo = setup().await;

        let created = repo
            .create("Hardware", Some("Physical devices"), None)
            .await
            .expect("Failed to create category");

        assert!(created.id > 0);
        assert_eq!(created.name, "Hardware");
        assert!(created.is_root());
    }

    #[tokio::test]
    async fn test_create_subcategory() {
        let repo = setup().await;

        let parent = repo
            .create("Hardware", None, None)
            .await
            .expect("Failed to create parent");
        let child = repo
            .create("Laptops", None, Some(parent.id))
            .await
            .expect("Failed to create child");

        assert_eq!(child.parent_id, Some(parent.id));

        let children = repo
            .list_children(parent.id)
            .await
            .expect("Failed to list children");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "Laptops");
    }

    #[tokio::test]
    async fn test_list_roots_before_children() {
        let repo = setup().await;
        let parent = repo
            .create("Hardware", None, None)
            .await
            .expect("Failed to create parent");
        repo.create("Laptops", None, Some(parent.id))
            .await
            .expect("Failed to create child");
        repo.create("Fleet", None, None)
            .await
            .expect("Failed to create root");

        let all = repo.list().await.expect("Failed to list");
        assert_eq!(all.len(), 3);
        assert!(all[0].is_root());
        assert!(all[1].is_root());
        assert_eq!(all[2].name, "Laptops");
    }

    #[tokio::test]
    async fn test_update_category() {
        let repo = setup().await;
        let mut created = repo
            .create("Hardware", None, None)
            .await
            .expect("Failed to create category");

        created.name = "Equipment".to_string();
        created.description = Some("Updated".to_string());

        let updated = repo
            .update(&created)
            .await
            .expect("Failed to update")
            .expect("Category not found");
        assert_eq!(updated.name, "Equipment");
        assert_eq!(updated.description, Some("Updated".to_string()));
    }

    #[tokio::test]
    async fn test_count_children() {
        let repo = setup().await;
        let parent = repo
            .create("Hardware", None, None)
            .await
            .expect("Failed to create parent");
        repo.create("Laptops", None, Some(parent.id))
            .await
            .expect("Failed to create child");
        repo.create("Phones", None, Some(parent.id))
            .await
            .expect("Failed to create child");

        assert_eq!(
            repo.count_children(parent.id).await.expect("count failed"),
            2
        );
    }

    #[tokio::test]
    async fn test_delete_category() {
        let repo = setup().await;
        let created = repo
            .create("Hardware", None, None)
            .await
            .expect("Failed to create category");

        assert!(repo.delete(created.id).await.expect("Failed to delete"));
        assert!(repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get")
            .is_none());
    }

    #[tokio::test]
    async fn test_unique_name_constraint() {
        let repo = setup().await;
        repo.create("Hardware", None, None)
            .await
            .expect("Failed to create category");

        let result = repo.create("Hardware", None, None).await;
        assert!(result.is_err(), "Should fail due to duplicate name");
    }
}
