//! Report types and row shapes
//!
//! The four canned report shapes are read-only aggregations over asset and
//! maintenance rows. Rows are flat so every serializer (JSON, CSV, Excel,
//! HTML) renders them the same way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The canned report shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Full asset inventory
    Inventory,
    /// Asset counts by department and status
    Utilization,
    /// Maintenance events in the date range
    MaintenanceHistory,
    /// Assets grouped by location
    Locations,
}

impl ReportType {
    /// URL path segment for the report
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inventory" => Some(ReportType::Inventory),
            "utilization" => Some(ReportType::Utilization),
            "maintenance-history" => Some(ReportType::MaintenanceHistory),
            "locations" => Some(ReportType::Locations),
            _ => None,
        }
    }

    /// Stem used in export filenames
    pub fn file_stem(&self) -> &'static str {
        match self {
            ReportType::Inventory => "Inventory",
            ReportType::Utilization => "Utilization",
            ReportType::MaintenanceHistory => "MaintenanceHistory",
            ReportType::Locations => "Locations",
        }
    }

    /// Human-readable title for rendered documents
    pub fn title(&self) -> &'static str {
        match self {
            ReportType::Inventory => "Asset Inventory",
            ReportType::Utilization => "Asset Utilization",
            ReportType::MaintenanceHistory => "Maintenance History",
            ReportType::Locations => "Assets by Location",
        }
    }
}

/// Output format of a report export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
    Xlsx,
    Html,
}

impl ReportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "xlsx" | "excel" => Some(ReportFormat::Xlsx),
            "html" => Some(ReportFormat::Html),
            _ => None,
        }
    }

    /// Export file extension
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
            ReportFormat::Xlsx => "xlsx",
            ReportFormat::Html => "html",
        }
    }

    /// MIME type of the export body
    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Json => "application/json",
            ReportFormat::Csv => "text/csv",
            ReportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ReportFormat::Html => "text/html",
        }
    }
}

/// One inventory report row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryRow {
    pub asset_tag: String,
    pub name: String,
    pub status: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub department: Option<String>,
    pub purchase_cost_cents: Option<i64>,
    pub purchase_date: Option<DateTime<Utc>>,
}

/// One utilization report row: asset count per department and status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UtilizationRow {
    pub department: String,
    pub status: String,
    pub asset_count: i64,
}

/// One maintenance history report row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaintenanceRow {
    pub asset_tag: String,
    pub asset_name: String,
    pub description: String,
    pub cost_cents: i64,
    pub performed_at: DateTime<Utc>,
}

/// One location grouping report row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationGroupRow {
    pub location: String,
    pub asset_count: i64,
    pub total_value_cents: i64,
}

/// Rows of a generated report, tagged by shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ReportRows {
    Inventory(Vec<InventoryRow>),
    Utilization(Vec<UtilizationRow>),
    Maintenance(Vec<MaintenanceRow>),
    Locations(Vec<LocationGroupRow>),
}

impl ReportRows {
    /// Number of data rows
    pub fn len(&self) -> usize {
        match self {
            ReportRows::Inventory(rows) => rows.len(),
            ReportRows::Utilization(rows) => rows.len(),
            ReportRows::Maintenance(rows) => rows.len(),
            ReportRows::Locations(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fully generated report with its metadata
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Report shape
    pub report_type: ReportType,
    /// Date-range keyword the caller selected
    pub date_range: String,
    /// Resolved range start (inclusive)
    pub start: DateTime<Utc>,
    /// Resolved range end (exclusive)
    pub end: DateTime<Utc>,
    /// When the report was generated
    pub generated_at: DateTime<Utc>,
    /// The aggregated rows
    pub rows: ReportRows,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_type_parse() {
        assert_eq!(ReportType::parse("inventory"), Some(ReportType::Inventory));
        assert_eq!(
            ReportType::parse("maintenance-history"),
            Some(ReportType::MaintenanceHistory)
        );
        assert_eq!(ReportType::parse("bogus"), None);
    }

    #[test]
    fn test_report_format_parse() {
        assert_eq!(ReportFormat::parse("json"), Some(ReportFormat::Json));
        assert_eq!(ReportFormat::parse("excel"), Some(ReportFormat::Xlsx));
        assert_eq!(ReportFormat::parse("xlsx"), Some(ReportFormat::Xlsx));
        assert_eq!(ReportFormat::parse("pdf"), None);
    }

    #[test]
    fn test_format_extension_and_content_type() {
        assert_eq!(ReportFormat::Csv.extension(), "csv");
        assert_eq!(ReportFormat::Csv.content_type(), "text/csv");
        assert!(ReportFormat::Xlsx.content_type().contains("spreadsheet"));
    }
}
