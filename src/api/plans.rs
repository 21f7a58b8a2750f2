//! Subscription plan API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::common::require_field;
use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::PlanRepository;
use crate::models::{BillingPeriod, SubscriptionPlan};

#[derive(Debug, Deserialize)]
pub struct PlanPayload {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub billing_period: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub id: i64,
    pub name: String,
    pub price_cents: i64,
    pub billing_period: String,
    pub features: Vec<String>,
    pub created_at: String,
}

impl From<SubscriptionPlan> for PlanResponse {
    fn from(plan: SubscriptionPlan) -> Self {
        Self {
            id: plan.id,
            name: plan.name,
            price_cents: plan.price_cents,
            billing_period: plan.billing_period.as_str().to_string(),
            features: plan.features,
            created_at: plan.created_at.to_rfc3339(),
        }
    }
}

/// Build the subscription plans router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_plans).post(create_plan))
        .route("/{id}", get(get_plan).put(update_plan).delete(delete_plan))
}

fn parse_billing_period(raw: Option<String>) -> Result<BillingPeriod, ApiError> {
    match raw {
        None => Ok(BillingPeriod::Monthly),
        Some(raw) => BillingPeriod::parse(&raw).ok_or_else(|| {
            ApiError::validation_error("Billing period must be 'monthly' or 'yearly'")
        }),
    }
}

async fn list_plans(State(state): State<AppState>) -> Result<Json<Vec<PlanResponse>>, ApiError> {
    let plans = state.plans.list().await.map_err(ApiError::internal)?;
    Ok(Json(plans.into_iter().map(Into::into).collect()))
}

async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PlanResponse>, ApiError> {
    let plan = state
        .plans
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Subscription plan not found"))?;

    Ok(Json(plan.into()))
}

async fn create_plan(
    State(state): State<AppState>,
    Json(payload): Json<PlanPayload>,
) -> Result<(StatusCode, Json<PlanResponse>), ApiError> {
    let name = require_field(payload.name, "Plan name is required")?;
    let billing_period = parse_billing_period(payload.billing_period)?;

    if state
        .plans
        .exists_by_name(&name)
        .await
        .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!("Plan '{}' already exists", name)));
    }

    let plan = state
        .plans
        .create(&SubscriptionPlan {
            id: 0,
            name,
            price_cents: payload.price_cents.unwrap_or(0),
            billing_period,
            features: payload.features,
            created_at: Utc::now(),
        })
        .await
        .map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, Json(plan.into())))
}

async fn update_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<PlanPayload>,
) -> Result<Json<PlanResponse>, ApiError> {
    let name = require_field(payload.name, "Plan name is required")?;
    let billing_period = parse_billing_period(payload.billing_period)?;

    let mut plan = state
        .plans
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Subscription plan not found"))?;

    if name != plan.name
        && state
            .plans
            .exists_by_name(&name)
            .await
            .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!("Plan '{}' already exists", name)));
    }

    plan.name = name;
    plan.price_cents = payload.price_cents.unwrap_or(plan.price_cents);
    plan.billing_period = billing_period;
    plan.features = payload.features;

    let updated = state
        .plans
        .update(&plan)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Subscription plan not found"))?;

    Ok(Json(updated.into()))
}

async fn delete_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.plans.delete(id).await.map_err(ApiError::internal)?;

    if !deleted {
        return Err(ApiError::not_found("Subscription plan not found"));
    }

    Ok(StatusCode::OK)
}
