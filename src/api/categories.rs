//! Category API endpoints
//!
//! Categories are hierarchical; creating a subcategory validates that the
//! parent exists, and deleting a category with subcategories is refused.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{ensure_exists, require_field};
use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::CategoryRepository;

#[derive(Debug, Deserialize)]
pub struct CategoryPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    pub created_at: String,
}

impl From<crate::models::Category> for CategoryResponse {
    fn from(category: crate::models::Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            parent_id: category.parent_id,
            created_at: category.created_at.to_rfc3339(),
        }
    }
}

/// Build the categories router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/{id}/subcategories", get(list_subcategories))
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state.categories.list().await.map_err(ApiError::internal)?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = state
        .categories
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    Ok(Json(category.into()))
}

async fn list_subcategories(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    ensure_exists(|id| state.categories.get_by_id(id), "Category", id).await?;

    let children = state
        .categories
        .list_children(id)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(children.into_iter().map(Into::into).collect()))
}

async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CategoryPayload>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let name = require_field(payload.name, "Category name is required")?;

    if state
        .categories
        .exists_by_name(&name)
        .await
        .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!(
            "Category '{}' already exists",
            name
        )));
    }

    // The parent must exist before a subcategory can reference it
    if let Some(parent_id) = payload.parent_id {
        ensure_exists(|id| state.categories.get_by_id(id), "Category", parent_id).await?;
    }

    let category = state
        .categories
        .create(&name, payload.description.as_deref(), payload.parent_id)
        .await
        .map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, Json(category.into())))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryPayload>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let name = require_field(payload.name, "Category name is required")?;

    let mut category = state
        .categories
        .get_by_id(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    if name != category.name
        && state
            .categories
            .exists_by_name(&name)
            .await
            .map_err(ApiError::internal)?
    {
        return Err(ApiError::conflict(format!(
            "Category '{}' already exists",
            name
        )));
    }

    if let Some(parent_id) = payload.parent_id {
        if parent_id == id {
            return Err(ApiError::validation_error(
                "Category cannot be its own parent",
            ));
        }
        ensure_exists(|pid| state.categories.get_by_id(pid), "Category", parent_id).await?;
    }

    category.name = name;
    category.description = payload.description;
    category.parent_id = payload.parent_id;

    let updated = state
        .categories
        .update(&category)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    Ok(Json(updated.into()))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let children = state
        .categories
        .count_children(id)
        .await
        .map_err(ApiError::internal)?;

    if children > 0 {
        return Err(ApiError::validation_error(
            "Category still has subcategories; delete or reassign them first",
        ));
    }

    let deleted = state
        .categories
        .delete(id)
        .await
        .map_err(ApiError::internal)?;

    if !deleted {
        return Err(ApiError::not_found("Category not found"));
    }

    Ok(StatusCode::OK)
}
