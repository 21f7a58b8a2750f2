//! Maintenance record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A maintenance event performed on an asset; feeds the maintenance
/// history report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaintenanceRecord {
    /// Unique identifier
    pub id: i64,
    /// Asset the work was performed on
    pub asset_id: i64,
    /// What was done
    pub description: String,
    /// Cost in cents
    pub cost_cents: i64,
    /// When the work was performed
    pub performed_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
