//! Shared handler helpers

use std::future::Future;

use crate::api::middleware::ApiError;

/// Require a field in a create payload, answering 400 with the exact
/// "<Thing> is required" message when it is missing or blank.
pub fn require_field(value: Option<String>, message: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::validation_error(message)),
    }
}

/// Validate that a referenced row exists before a write, answering 400
/// when it does not. One helper instead of ad hoc existence checks per
/// handler.
pub async fn ensure_exists<F, Fut, T>(fetch: F, resource: &str, id: i64) -> Result<T, ApiError>
where
    F: FnOnce(i64) -> Fut,
    Fut: Future<Output = anyhow::Result<Option<T>>>,
{
    match fetch(id).await {
        Ok(Some(row)) => Ok(row),
        Ok(None) => Err(ApiError::validation_error(format!(
            "{} {} does not exist",
            resource, id
        ))),
        Err(e) => Err(ApiError::internal(e)),
    }
}
