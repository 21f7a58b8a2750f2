//! Role model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role entity with its granted permission names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    /// Unique identifier
    pub id: i64,
    /// Role name (unique)
    pub name: String,
    /// Granted permission names
    pub permissions: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Check whether the role grants a permission
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_permission() {
        let role = Role {
            id: 1,
            name: "auditor".to_string(),
            permissions: vec!["assets.read".to_string(), "reports.read".to_string()],
            created_at: Utc::now(),
        };

        assert!(role.has_permission("assets.read"));
        assert!(!role.has_permission("assets.write"));
    }
}
