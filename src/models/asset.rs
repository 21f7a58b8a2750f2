//! Asset model
//!
//! Assets are the platform's central entity: tracked devices and equipment
//! with references into brands, categories, locations, and departments.
//! Newly requested assets enter as `pending` and are promoted through the
//! status lifecycle by updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    /// Requested but not yet approved/deployed
    #[default]
    Pending,
    /// Deployed and in use
    Active,
    /// Pulled for maintenance
    InMaintenance,
    /// Decommissioned
    Retired,
}

impl AssetStatus {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Pending => "pending",
            AssetStatus::Active => "active",
            AssetStatus::InMaintenance => "in_maintenance",
            AssetStatus::Retired => "retired",
        }
    }

    /// Parse the storage representation; unknown values are rejected
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AssetStatus::Pending),
            "active" => Some(AssetStatus::Active),
            "in_maintenance" => Some(AssetStatus::InMaintenance),
            "retired" => Some(AssetStatus::Retired),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asset entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    /// Unique identifier
    pub id: i64,
    /// Unique inventory tag
    pub asset_tag: String,
    /// Display name
    pub name: String,
    /// Lifecycle status
    pub status: AssetStatus,
    /// Brand reference
    pub brand_id: Option<i64>,
    /// Category reference
    pub category_id: Option<i64>,
    /// Location reference
    pub location_id: Option<i64>,
    /// Owning department
    pub department_id: Option<i64>,
    /// Purchase cost in cents
    pub purchase_cost_cents: Option<i64>,
    /// Purchase date
    pub purchase_date: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an asset
#[derive(Debug, Clone)]
pub struct CreateAssetInput {
    pub asset_tag: String,
    pub name: String,
    pub status: AssetStatus,
    pub brand_id: Option<i64>,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub department_id: Option<i64>,
    pub purchase_cost_cents: Option<i64>,
    pub purchase_date: Option<DateTime<Utc>>,
}
