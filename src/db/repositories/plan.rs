//! Subscription plan repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::DbPool;
use crate::models::{BillingPeriod, SubscriptionPlan};

/// Subscription plan repository trait
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Create a new plan
    async fn create(&self, plan: &SubscriptionPlan) -> Result<SubscriptionPlan>;

    /// Get plan by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<SubscriptionPlan>>;

    /// List all plans, cheapest first
    async fn list(&self) -> Result<Vec<SubscriptionPlan>>;

    /// Update a plan
    async fn update(&self, plan: &SubscriptionPlan) -> Result<Option<SubscriptionPlan>>;

    /// Delete a plan; returns false when the row did not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Check if a plan name is already taken
    async fn exists_by_name(&self, name: &str) -> Result<bool>;
}

/// SQLx-based plan repository
pub struct SqlxPlanRepository {
    pool: DbPool,
}

impl SqlxPlanRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DbPool) -> Arc<dyn PlanRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PlanRepository for SqlxPlanRepository {
    async fn create(&self, plan: &SubscriptionPlan) -> Result<SubscriptionPlan> {
        let now = Utc::now();
        let features_json =
            serde_json::to_string(&plan.features).context("Failed to serialize plan features")?;

        let result = sqlx::query(
            r#"
            INSERT INTO subscription_plans (name, price_cents, billing_period, features, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&plan.name)
        .bind(plan.price_cents)
        .bind(plan.billing_period.as_str())
        .bind(&features_json)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create subscription plan")?;

        Ok(SubscriptionPlan {
            id: result.last_insert_rowid(),
            name: plan.name.clone(),
            price_cents: plan.price_cents,
            billing_period: plan.billing_period,
            features: plan.features.clone(),
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<SubscriptionPlan>> {
        let row = sqlx::query(
            "SELECT id, name, price_cents, billing_period, features, created_at FROM subscription_plans WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get subscription plan by ID")?;

        row.map(|row| row_to_plan(&row)).transpose()
    }

    async fn list(&self) -> Result<Vec<SubscriptionPlan>> {
        let rows = sqlx::query(
            "SELECT id, name, price_cents, billing_period, features, created_at FROM subscription_plans ORDER BY price_cents",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list subscription plans")?;

        rows.iter().map(row_to_plan).collect()
    }

    async fn update(&self, plan: &SubscriptionPlan) -> Result<Option<SubscriptionPlan>> {
        let features_json =
            serde_json::to_string(&plan.features).context("Failed to serialize plan features")?;

        let result = sqlx::query(
            r#"
            UPDATE subscription_plans
            SET name = ?, price_cents = ?, billing_period = ?, features = ?
            WHERE id = ?
            "#,
        )
        .bind(&plan.name)
        .bind(plan.price_cents)
        .bind(plan.billing_period.as_str())
        .bind(&features_json)
        .bind(plan.id)
        .execute(&self.pool)
        .await
        .context("Failed to update subscription plan")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(plan.id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subscription_plans WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete subscription plan")?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM subscription_plans WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check plan name existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }
}

fn row_to_plan(row: &sqlx::sqlite::SqliteRow) -> Result<SubscriptionPlan> {
    let features_json: String = row.get("features");
    let features: Vec<String> =
        serde_json::from_str(&features_json).context("Failed to parse stored plan features")?;

    let period_str: String = row.get("billing_period");
    let billing_period = BillingPeriod::parse(&period_str)
        .ok_or_else(|| anyhow::anyhow!("Unknown billing period: {}", period_str))?;

    Ok(SubscriptionPlan {
        id: row.get("id"),
        name: row.get("name"),
        price_cents: row.get("price_cents"),
        billing_period,
        features,
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxPlanRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxPlanRepository::new(pool)
    }

    fn test_plan(name: &str, price_cents: i64) -> SubscriptionPlan {
        SubscriptionPlan {
            id: 0,
            name: name.to_string(),
            price_cents,
            billing_period: BillingPeriod::Monthly,
            features: vec!["sensors".to_string(), "reports".to_string()],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_plan() {
        let repo = setup().await;

        let created = repo
            .create(&test_plan("Starter", 4900))
            .await
            .expect("Failed to create plan");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get plan")
            .expect("Plan not found");
        assert_eq!(found.price_cents, 4900);
        assert_eq!(found.features.len(), 2);
    }

    #[tokio::test]
    async fn test_list_sorted_by_price() {
        let repo = setup().await;
        repo.create(&test_plan("Pro", 14900))
            .await
            .expect("Failed to create plan");
        repo.create(&test_plan("Starter", 4900))
            .await
            .expect("Failed to create plan");

        let plans = repo.list().await.expect("Failed to list plans");
        assert_eq!(plans[0].name, "Starter");
        assert_eq!(plans[1].name, "Pro");
    }

    #[tokio::test]
    async fn test_unique_name_constraint() {
        let repo = setup().await;
        repo.create(&test_plan("Starter", 4900))
            .await
            .expect("Failed to create plan");

        let result = repo.create(&test_plan("Starter", 9900)).await;
        assert!(result.is_err(), "Should fail due to duplicate name");
    }
}
