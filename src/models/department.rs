//! Department model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Department entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    /// Unique identifier
    pub id: i64,
    /// Department name
    pub name: String,
    /// Department code (unique)
    pub code: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
