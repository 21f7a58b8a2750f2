//! Category model
//!
//! Categories are hierarchical: a subcategory references its parent via
//! `parent_id`, and the parent must exist before a subcategory can
//! reference it. A category with subcategories cannot be deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique identifier
    pub id: i64,
    /// Category name (unique)
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Parent category ID for subcategories
    pub parent_id: Option<i64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Check if this is a top-level category
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_root() {
        let root = Category {
            id: 1,
            name: "Hardware".to_string(),
            description: None,
            parent_id: None,
            created_at: Utc::now(),
        };
        let sub = Category {
            id: 2,
            name: "Laptops".to_string(),
            description: None,
            parent_id: Some(1),
            created_at: Utc::now(),
        };

        assert!(root.is_root());
        assert!(!sub.is_root());
    }
}
