//! Employee model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Employee entity; identified on readers by a unique NFC number
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    /// Unique identifier
    pub id: i64,
    /// Full name
    pub name: String,
    /// Contact email
    pub email: Option<String>,
    /// NFC badge number (unique)
    pub nfc_number: String,
    /// Department reference
    pub department_id: Option<i64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
