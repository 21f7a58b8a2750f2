//! CMS page model
//!
//! Pages carry their section content as raw JSON; the visual editor that
//! produces it lives outside this backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// CMS page entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug (unique)
    pub slug: String,
    /// Page title
    pub title: String,
    /// Section content as produced by the page editor
    pub sections: serde_json::Value,
    /// Whether the page is publicly visible
    pub published: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}
