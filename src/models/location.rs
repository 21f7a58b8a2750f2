//! Location model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Location entity: a physical place where assets are deployed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    /// Unique identifier
    pub id: i64,
    /// Location name (unique)
    pub name: String,
    /// Site label
    pub site: Option<String>,
    /// Building label
    pub building: Option<String>,
    /// Floor label
    pub floor: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
