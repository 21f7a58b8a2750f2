//! Report generation
//!
//! Read-only aggregation over asset and maintenance rows into four canned
//! report shapes, rendered to JSON, CSV, Excel, or a printable HTML
//! document. The full result set is built in memory; report endpoints are
//! not paginated. CSV output is built in an in-memory buffer rather than a
//! temp file, so concurrent report requests cannot collide.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use rust_xlsxwriter::{Format, Workbook};
use sqlx::Row;

use crate::db::DbPool;
use crate::models::{
    InventoryRow, LocationGroupRow, MaintenanceRow, Report, ReportFormat, ReportRows, ReportType,
    UtilizationRow,
};

/// Resolve a date-range keyword against a clock into a half-open
/// `[start, end)` interval. Unknown keywords resolve through the default
/// branch to `thisMonth`.
pub fn resolve_date_range(keyword: &str, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let day_start = |d: DateTime<Utc>| {
        Utc.with_ymd_and_hms(d.year(), d.month(), d.day(), 0, 0, 0)
            .unwrap()
    };
    let month_start = |year: i32, month: u32| Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap();
    let next_month = |year: i32, month: u32| {
        if month == 12 {
            month_start(year + 1, 1)
        } else {
            month_start(year, month + 1)
        }
    };

    match keyword {
        "today" => {
            let start = day_start(now);
            (start, start + Duration::days(1))
        }
        "thisWeek" => {
            let days_from_monday = now.weekday().num_days_from_monday() as i64;
            let start = day_start(now) - Duration::days(days_from_monday);
            (start, start + Duration::days(7))
        }
        "lastMonth" => {
            let (year, month) = if now.month() == 1 {
                (now.year() - 1, 12)
            } else {
                (now.year(), now.month() - 1)
            };
            (month_start(year, month), month_start(now.year(), now.month()))
        }
        "thisYear" => (
            month_start(now.year(), 1),
            month_start(now.year() + 1, 1),
        ),
        // "thisMonth" and anything unrecognized
        _ => (
            month_start(now.year(), now.month()),
            next_month(now.year(), now.month()),
        ),
    }
}

/// Export filename: `<ReportType>_<dateRange>_<epochMillis>.<ext>`
pub fn export_filename(
    report_type: ReportType,
    date_range: &str,
    format: ReportFormat,
    at: DateTime<Utc>,
) -> String {
    format!(
        "{}_{}_{}.{}",
        report_type.file_stem(),
        date_range,
        at.timestamp_millis(),
        format.extension()
    )
}

/// Report generator over the shared pool
pub struct ReportService {
    pool: DbPool,
}

impl ReportService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Generate a report for the given shape and date-range keyword.
    pub async fn generate(
        &self,
        report_type: ReportType,
        date_range: &str,
        now: DateTime<Utc>,
    ) -> Result<Report> {
        let (start, end) = resolve_date_range(date_range, now);

        let rows = match report_type {
            ReportType::Inventory => ReportRows::Inventory(self.inventory(start, end).await?),
            ReportType::Utilization => ReportRows::Utilization(self.utilization(start, end).await?),
            ReportType::MaintenanceHistory => {
                ReportRows::Maintenance(self.maintenance(start, end).await?)
            }
            ReportType::Locations => ReportRows::Locations(self.locations(start, end).await?),
        };

        Ok(Report {
            report_type,
            date_range: date_range.to_string(),
            start,
            end,
            generated_at: now,
            rows,
        })
    }

    async fn inventory(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InventoryRow>> {
        let rows = sqlx::query(
            r#"
            SELECT a.asset_tag, a.name, a.status,
                   b.name AS brand, c.name AS category,
                   l.name AS location, d.name AS department,
                   a.purchase_cost_cents, a.purchase_date
            FROM assets a
            LEFT JOIN brands b ON a.brand_id = b.id
            LEFT JOIN categories c ON a.category_id = c.id
            LEFT JOIN locations l ON a.location_id = l.id
            LEFT JOIN departments d ON a.department_id = d.id
            WHERE a.created_at >= ? AND a.created_at < ?
            ORDER BY a.asset_tag
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .context("Failed to build inventory report")?;

        Ok(rows
            .iter()
            .map(|row| InventoryRow {
                asset_tag: row.get("asset_tag"),
                name: row.get("name"),
                status: row.get("status"),
                brand: row.get("brand"),
                category: row.get("category"),
                location: row.get("location"),
                department: row.get("department"),
                purchase_cost_cents: row.get("purchase_cost_cents"),
                purchase_date: row.get("purchase_date"),
            })
            .collect())
    }

    async fn utilization(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<UtilizationRow>> {
        let rows = sqlx::query(
            r#"
            SELECT COALESCE(d.name, 'Unassigned') AS department, a.status,
                   COUNT(*) AS asset_count
            FROM assets a
            LEFT JOIN departments d ON a.department_id = d.id
            WHERE a.created_at >= ? AND a.created_at < ?
            GROUP BY department, a.status
            ORDER BY department, a.status
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .context("Failed to build utilization report")?;

        Ok(rows
            .iter()
            .map(|row| UtilizationRow {
                department: row.get("department"),
                status: row.get("status"),
                asset_count: row.get("asset_count"),
            })
            .collect())
    }

    async fn maintenance(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MaintenanceRow>> {
        let rows = sqlx::query(
            r#"
            SELECT a.asset_tag, a.name AS asset_name, m.description,
                   m.cost_cents, m.performed_at
            FROM maintenance_records m
            INNER JOIN assets a ON m.asset_id = a.id
            WHERE m.performed_at >= ? AND m.performed_at < ?
            ORDER BY m.performed_at DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .context("Failed to build maintenance history report")?;

        Ok(rows
            .iter()
            .map(|row| MaintenanceRow {
                asset_tag: row.get("asset_tag"),
                asset_name: row.get("asset_name"),
                description: row.get("description"),
                cost_cents: row.get("cost_cents"),
                performed_at: row.get("performed_at"),
            })
            .collect())
    }

    async fn locations(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LocationGroupRow>> {
        let rows = sqlx::query(
            r#"
            SELECT COALESCE(l.name, 'Unassigned') AS location,
                   COUNT(*) AS asset_count,
                   COALESCE(SUM(a.purchase_cost_cents), 0) AS total_value_cents
            FROM assets a
            LEFT JOIN locations l ON a.location_id = l.id
            WHERE a.created_at >= ? AND a.created_at < ?
            GROUP BY location
            ORDER BY location
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .context("Failed to build location report")?;

        Ok(rows
            .iter()
            .map(|row| LocationGroupRow {
                location: row.get("location"),
                asset_count: row.get("asset_count"),
                total_value_cents: row.get("total_value_cents"),
            })
            .collect())
    }
}

// ============================================================================
// Serializers
// ============================================================================

/// Column headers per report shape
fn headers(report: &Report) -> Vec<&'static str> {
    match report.rows {
        ReportRows::Inventory(_) => vec![
            "Asset Tag",
            "Name",
            "Status",
            "Brand",
            "Category",
            "Location",
            "Department",
            "Purchase Cost (cents)",
            "Purchase Date",
        ],
        ReportRows::Utilization(_) => vec!["Department", "Status", "Asset Count"],
        ReportRows::Maintenance(_) => vec![
            "Asset Tag",
            "Asset Name",
            "Description",
            "Cost (cents)",
            "Performed At",
        ],
        ReportRows::Locations(_) => vec!["Location", "Asset Count", "Total Value (cents)"],
    }
}

/// Flatten rows to display cells, shared by the CSV, Excel, and HTML
/// serializers
fn cells(report: &Report) -> Vec<Vec<String>> {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();

    match &report.rows {
        ReportRows::Inventory(rows) => rows
            .iter()
            .map(|r| {
                vec![
                    r.asset_tag.clone(),
                    r.name.clone(),
                    r.status.clone(),
                    opt(&r.brand),
                    opt(&r.category),
                    opt(&r.location),
                    opt(&r.department),
                    r.purchase_cost_cents.map(|c| c.to_string()).unwrap_or_default(),
                    r.purchase_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
                ]
            })
            .collect(),
        ReportRows::Utilization(rows) => rows
            .iter()
            .map(|r| {
                vec![
                    r.department.clone(),
                    r.status.clone(),
                    r.asset_count.to_string(),
                ]
            })
            .collect(),
        ReportRows::Maintenance(rows) => rows
            .iter()
            .map(|r| {
                vec![
                    r.asset_tag.clone(),
                    r.asset_name.clone(),
                    r.description.clone(),
                    r.cost_cents.to_string(),
                    r.performed_at.to_rfc3339(),
                ]
            })
            .collect(),
        ReportRows::Locations(rows) => rows
            .iter()
            .map(|r| {
                vec![
                    r.location.clone(),
                    r.asset_count.to_string(),
                    r.total_value_cents.to_string(),
                ]
            })
            .collect(),
    }
}

/// Render a report as pretty JSON
pub fn render_json(report: &Report) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(report).context("Failed to serialize report to JSON")
}

/// Render a report as CSV, built entirely in memory
pub fn render_csv(report: &Report) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(headers(report))
        .context("Failed to write CSV header")?;
    for row in cells(report) {
        writer.write_record(&row).context("Failed to write CSV row")?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to finish CSV output: {}", e))
}

/// Render a report as an Excel workbook
pub fn render_xlsx(report: &Report) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(report.report_type.file_stem())
        .map_err(|e| anyhow!("Failed to name worksheet: {}", e))?;

    for (col, header) in headers(report).iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(|e| anyhow!("Failed to write workbook header: {}", e))?;
    }

    for (row_idx, row) in cells(report).iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string((row_idx + 1) as u32, col_idx as u16, value)
                .map_err(|e| anyhow!("Failed to write workbook cell: {}", e))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| anyhow!("Failed to finish workbook: {}", e))
}

/// Render a report as a printable HTML document
pub fn render_html(report: &Report) -> String {
    let mut table_rows = String::new();
    for row in cells(report) {
        table_rows.push_str("      <tr>");
        for value in row {
            table_rows.push_str(&format!("<td>{}</td>", html_escape(&value)));
        }
        table_rows.push_str("</tr>\n");
    }

    let header_cells: String = headers(report)
        .iter()
        .map(|h| format!("<th>{}</th>", h))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <style>
    body {{ font-family: sans-serif; margin: 2rem; }}
    table {{ border-collapse: collapse; width: 100%; }}
    th, td {{ border: 1px solid #ccc; padding: 0.4rem 0.6rem; text-align: left; }}
    th {{ background: #f0f0f0; }}
    @media print {{ body {{ margin: 0; }} }}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <p>Range: {start} to {end} ({range}) &middot; generated {generated}</p>
  <table>
    <thead>
      <tr>{header_cells}</tr>
    </thead>
    <tbody>
{table_rows}    </tbody>
  </table>
</body>
</html>
"#,
        title = report.report_type.title(),
        start = report.start.format("%Y-%m-%d"),
        end = report.end.format("%Y-%m-%d"),
        range = report.date_range,
        generated = report.generated_at.to_rfc3339(),
        header_cells = header_cells,
        table_rows = table_rows,
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render a report into the requested format
pub fn render(report: &Report, format: ReportFormat) -> Result<Vec<u8>> {
    match format {
        ReportFormat::Json => render_json(report),
        ReportFormat::Csv => render_csv(report),
        ReportFormat::Xlsx => render_xlsx(report),
        ReportFormat::Html => Ok(render_html(report).into_bytes()),
    }
}
