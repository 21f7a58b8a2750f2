//! Brand model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Brand entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Brand {
    /// Unique identifier
    pub id: i64,
    /// Brand name (unique)
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
