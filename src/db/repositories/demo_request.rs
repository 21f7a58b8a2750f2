//! Demo request repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::DbPool;
use crate::models::DemoRequest;

/// Demo request repository trait
#[async_trait]
pub trait DemoRequestRepository: Send + Sync {
    /// Persist a new demo request
    async fn create(&self, request: &DemoRequest) -> Result<DemoRequest>;

    /// List all demo requests, newest first
    async fn list(&self) -> Result<Vec<DemoRequest>>;

    /// Delete a request; returns false when the row did not exist
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based demo request repository
pub struct SqlxDemoRequestRepository {
    pool: DbPool,
}

impl SqlxDemoRequestRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn DemoRequestRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl DemoRequestRepository for SqlxDemoRequestRepository {
    async fn create(&self, request: &DemoRequest) -> Result<DemoRequest> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO demo_requests (name, email, company, message, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.company)
        .bind(&request.message)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create demo request")?;

        Ok(DemoRequest {
            id: result.last_insert_rowid(),
            name: request.name.clone(),
            email: request.email.clone(),
            company: request.company.clone(),
            message: request.message.clone(),
            created_at: now,
        })
    }

    async fn list(&self) -> Result<Vec<DemoRequest>> {
        let rows = sqlx::query(
            "SELECT id, name, email, company, message, created_at FROM demo_requests ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list demo requests")?;

        Ok(rows.iter().map(row_to_request).collect())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM demo_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete demo request")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_request(row: &sqlx::sqlite::SqliteRow) -> DemoRequest {
    DemoRequest {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        company: row.get("company"),
        message: row.get("message"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxDemoRequestRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxDemoRequestRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_list_requests() {
        let repo = setup().await;

        repo.create(&DemoRequest {
            id: 0,
            name: "Jordan Lane".to_string(),
            email: "jordan@example.com".to_string(),
            company: Some("Lane Logistics".to_string()),
            message: None,
            created_at: Utc::now(),
        })
        .await
        .expect("Failed to create request");

        let requests = repo.list().await.expect("Failed to list requests");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].email, "jordan@example.com");
    }

    #[tokio::test]
    async fn test_delete_request() {
        let repo = setup().await;
        let created = repo
            .create(&DemoRequest {
                id: 0,
                name: "Jordan Lane".to_string(),
                email: "jordan@example.com".to_string(),
                company: None,
                message: None,
                created_at: Utc::now(),
            })
            .await
            .expect("Failed to create request");

        assert!(repo.delete(created.id).await.expect("Failed to delete"));
        assert!(repo.list().await.expect("Failed to list").is_empty());
    }
}
