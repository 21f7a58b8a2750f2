//! Admin account and OTP challenge repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

use crate::db::DbPool;
use crate::models::{Admin, OtpChallenge};

/// Admin repository trait
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Create a new admin account
    async fn create(&self, email: &str, name: &str, password_hash: &str) -> Result<Admin>;

    /// Get admin by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Admin>>;

    /// Get admin by login email
    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>>;

    /// Replace any pending OTP challenge for the admin with a new one
    async fn replace_challenge(
        &self,
        admin_id: i64,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<OtpChallenge>;

    /// Get the pending OTP challenge for an admin
    async fn get_challenge(&self, admin_id: i64) -> Result<Option<OtpChallenge>>;

    /// Increment the failed-attempt counter; returns the new count
    async fn record_failed_attempt(&self, challenge_id: i64) -> Result<u32>;

    /// Remove a challenge (consumed or abandoned)
    async fn delete_challenge(&self, challenge_id: i64) -> Result<()>;
}

/// SQLx-based admin repository
pub struct SqlxAdminRepository {
    pool: DbPool,
}

impl SqlxAdminRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn AdminRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AdminRepository for SqlxAdminRepository {
    async fn create(&self, email: &str, name: &str, password_hash: &str) -> Result<Admin> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO admins (email, name, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create admin")?;

        Ok(Admin {
            id: result.last_insert_rowid(),
            email: email.to_string(),
            name: name.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Admin>> {
        let row =
            sqlx::query("SELECT id, email, name, password_hash, created_at FROM admins WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to get admin by ID")?;

        Ok(row.map(|row| row_to_admin(&row)))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let row = sqlx::query(
            "SELECT id, email, name, password_hash, created_at FROM admins WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get admin by email")?;

        Ok(row.map(|row| row_to_admin(&row)))
    }

    async fn replace_challenge(
        &self,
        admin_id: i64,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<OtpChallenge> {
        let now = Utc::now();

        sqlx::query("DELETE FROM admin_otps WHERE admin_id = ?")
            .bind(admin_id)
            .execute(&self.pool)
            .await
            .context("Failed to clear previous OTP challenge")?;

        let result = sqlx::query(
            r#"
            INSERT INTO admin_otps (admin_id, code, expires_at, attempts, created_at)
            VALUES (?, ?, ?, 0, ?)
            "#,
        )
        .bind(admin_id)
        .bind(code)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to store OTP challenge")?;

        Ok(OtpChallenge {
            id: result.last_insert_rowid(),
            admin_id,
            code: code.to_string(),
            expires_at,
            attempts: 0,
            created_at: now,
        })
    }

    async fn get_challenge(&self, admin_id: i64) -> Result<Option<OtpChallenge>> {
        let row = sqlx::query(
            r#"
            SELECT id, admin_id, code, expires_at, attempts, created_at
            FROM admin_otps
            WHERE admin_id = ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get OTP challenge")?;

        Ok(row.map(|row| row_to_challenge(&row)))
    }

    async fn record_failed_attempt(&self, challenge_id: i64) -> Result<u32> {
        sqlx::query("UPDATE admin_otps SET attempts = attempts + 1 WHERE id = ?")
            .bind(challenge_id)
            .execute(&self.pool)
            .await
            .context("Failed to record OTP attempt")?;

        let row = sqlx::query("SELECT attempts FROM admin_otps WHERE id = ?")
            .bind(challenge_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to read OTP attempt count")?;

        let attempts: i64 = row.get("attempts");
        Ok(attempts as u32)
    }

    async fn delete_challenge(&self, challenge_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM admin_otps WHERE id = ?")
            .bind(challenge_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete OTP challenge")?;

        Ok(())
    }
}

fn row_to_admin(row: &sqlx::sqlite::SqliteRow) -> Admin {
    Admin {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

fn row_to_challenge(row: &sqlx::sqlite::SqliteRow) -> OtpChallenge {
    let attempts: i64 = row.get("attempts");
    OtpChallenge {
        id: row.get("id"),
        admin_id: row.get("admin_id"),
        code: row.get("code"),
        expires_at: row.get("expires_at"),
        attempts: attempts as u32,
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;

    async fn setup() -> SqlxAdminRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxAdminRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_admin() {
        let repo = setup().await;

        let created = repo
            .create("ops@example.com", "Ops Admin", "$argon2id$fake")
            .await
            .expect("Failed to create admin");

        let found = repo
            .get_by_email("ops@example.com")
            .await
            .expect("Failed to get admin")
            .expect("Admin not found");
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, "Ops Admin");
    }

    #[tokio::test]
    async fn test_unique_email_constraint() {
        let repo = setup().await;
        repo.create("ops@example.com", "Ops", "hash")
            .await
            .expect("Failed to create admin");

        let result = repo.create("ops@example.com", "Other", "hash").await;
        assert!(result.is_err(), "Should fail due to duplicate email");
    }

    #[tokio::test]
    async fn test_replace_challenge_supersedes_previous() {
        let repo = setup().await;
        let admin = repo
            .create("ops@example.com", "Ops", "hash")
            .await
            .expect("Failed to create admin");

        let expires = Utc::now() + Duration::minutes(10);
        repo.replace_challenge(admin.id, "111111", expires)
            .await
            .expect("Failed to store challenge");
        repo.replace_challenge(admin.id, "222222", expires)
            .await
            .expect("Failed to store challenge");

        let challenge = repo
            .get_challenge(admin.id)
            .await
            .expect("Failed to get challenge")
            .expect("Challenge not found");
        assert_eq!(challenge.code, "222222");
        assert_eq!(challenge.attempts, 0);
    }

    #[tokio::test]
    async fn test_record_failed_attempts() {
        let repo = setup().await;
        let admin = repo
            .create("ops@example.com", "Ops", "hash")
            .await
            .expect("Failed to create admin");

        let challenge = repo
            .replace_challenge(admin.id, "111111", Utc::now() + Duration::minutes(10))
            .await
            .expect("Failed to store challenge");

        assert_eq!(
            repo.record_failed_attempt(challenge.id)
                .await
                .expect("Failed to record attempt"),
            1
        );
        assert_eq!(
            repo.record_failed_attempt(challenge.id)
                .await
                .expect("Failed to record attempt"),
            2
        );
    }

    #[tokio::test]
    async fn test_delete_challenge() {
        let repo = setup().await;
        let admin = repo
            .create("ops@example.com", "Ops", "hash")
            .await
            .expect("Failed to create admin");

        let challenge = repo
            .replace_challenge(admin.id, "111111", Utc::now() + Duration::minutes(10))
            .await
            .expect("Failed to store challenge");

        repo.delete_challenge(challenge.id)
            .await
            .expect("Failed to delete challenge");

        let found = repo
            .get_challenge(admin.id)
            .await
            .expect("Failed to get challenge");
        assert!(found.is_none());
    }
}
