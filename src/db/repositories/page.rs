//! CMS page repository
//!
//! Section content is stored as the raw JSON the page editor produced.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::DbPool;
use crate::models::Page;

/// Page repository trait
#[async_trait]
pub trait PageRepository: Send + Sync {
    /// Create a new page
    async fn create(&self, page: &Page) -> Result<Page>;

    /// Get page by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Page>>;

    /// Get page by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Page>>;

    /// List all pages
    async fn list(&self) -> Result<Vec<Page>>;

    /// Update a page
    async fn update(&self, page: &Page) -> Result<Option<Page>>;

    /// Delete a page; returns false when the row did not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Check if a slug is already taken
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;
}

/// SQLx-based page repository
pub struct SqlxPageRepository {
    pool: DbPool,
}

impl SqlxPageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn PageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PageRepository for SqlxPageRepository {
    async fn create(&self, page: &Page) -> Result<Page> {
        let now = Utc::now();
        let sections_json =
            serde_json::to_string(&page.sections).context("Failed to serialize page sections")?;

        let result = sqlx::query(
            r#"
            INSERT INTO pages (slug, title, sections, published, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&page.slug)
        .bind(&page.title)
        .bind(&sections_json)
        .bind(page.published)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create page")?;

        Ok(Page {
            id: result.last_insert_rowid(),
            slug: page.slug.clone(),
            title: page.title.clone(),
            sections: page.sections.clone(),
            published: page.published,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Page>> {
        let row = sqlx::query(
            "SELECT id, slug, title, sections, published, created_at, updated_at FROM pages WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get page by ID")?;

        row.map(|row| row_to_page(&row)).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        let row = sqlx::query(
            "SELECT id, slug, title, sections, published, created_at, updated_at FROM pages WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get page by slug")?;

        row.map(|row| row_to_page(&row)).transpose()
    }

    async fn list(&self) -> Result<Vec<Page>> {
        let rows = sqlx::query(
            "SELECT id, slug, title, sections, published, created_at, updated_at FROM pages ORDER BY slug",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list pages")?;

        rows.iter().map(row_to_page).collect()
    }

    async fn update(&self, page: &Page) -> Result<Option<Page>> {
        let now = Utc::now();
        let sections_json =
            serde_json::to_string(&page.sections).context("Failed to serialize page sections")?;

        let result = sqlx::query(
            r#"
            UPDATE pages
            SET slug = ?, title = ?, sections = ?, published = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&page.slug)
        .bind(&page.title)
        .bind(&sections_json)
        .bind(page.published)
        .bind(now)
        .bind(page.id)
        .execute(&self.pool)
        .await
        .context("Failed to update page")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(page.id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete page")?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM pages WHERE slug = ?")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check page slug existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }
}

fn row_to_page(row: &sqlx::sqlite::SqliteRow) -> Result<Page> {
    let sections_json: String = row.get("sections");
    let sections: serde_json::Value =
        serde_json::from_str(&sections_json).context("Failed to parse stored page sections")?;

    Ok(Page {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        sections,
        published: row.get("published"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use serde_json::json;

    async fn setup() -> SqlxPageRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxPageRepository::new(pool)
    }

    fn test_page(slug: &str) -> Page {
        Page {
            id: 0,
            slug: slug.to_string(),
            title: "About us".to_string(),
            sections: json!([{"type": "hero", "content": {"heading": "Welcome"}}]),
            published: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_by_slug() {
        let repo = setup().await;

        repo.create(&test_page("about"))
            .await
            .expect("Failed to create page");

        let found = repo
            .get_by_slug("about")
            .await
            .expect("Failed to get page")
            .expect("Page not found");
        assert_eq!(found.title, "About us");
        assert!(found.sections.is_array());
    }

    #[tokio::test]
    async fn test_update_page_sections() {
        let repo = setup().await;
        let mut created = repo
            .create(&test_page("about"))
            .await
            .expect("Failed to create page");

        created.sections = json!([{"type": "text", "content": {"body": "Updated"}}]);
        created.published = true;

        let updated = repo
            .update(&created)
            .await
            .expect("Failed to update page")
            .expect("Page not found");
        assert!(updated.published);
        assert_eq!(updated.sections[0]["type"], "text");
    }

    #[tokio::test]
    async fn test_unique_slug_constraint() {
        let repo = setup().await;
        repo.create(&test_page("about"))
            .await
            .expect("Failed to create page");

        let result = repo.create(&test_page("about")).await;
        assert!(result.is_err(), "Should fail due to duplicate slug");
    }

    #[tokio::test]
    async fn test_delete_page() {
        let repo = setup().await;
        let created = repo
            .create(&test_page("about"))
            .await
            .expect("Failed to create page");

        assert!(repo.delete(created.id).await.expect("Failed to delete"));
        assert!(repo
            .get_by_slug("about")
            .await
            .expect("Failed to get page")
            .is_none());
    }
}
