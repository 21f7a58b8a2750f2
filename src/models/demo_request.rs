//! Demo request model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A prospect's request for a product demo, submitted from the public site
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemoRequest {
    /// Unique identifier
    pub id: i64,
    /// Contact name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Company name
    pub company: Option<String>,
    /// Free-form message
    pub message: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
