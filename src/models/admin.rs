//! Admin account and OTP challenge models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Administrator account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Admin {
    /// Unique identifier
    pub id: i64,
    /// Login email (unique)
    pub email: String,
    /// Display name
    pub name: String,
    /// Argon2 password hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Pending OTP challenge for a second-factor login
#[derive(Debug, Clone, PartialEq)]
pub struct OtpChallenge {
    /// Unique identifier
    pub id: i64,
    /// Admin the challenge belongs to
    pub admin_id: i64,
    /// The emailed code
    pub code: String,
    /// When the challenge stops being valid
    pub expires_at: DateTime<Utc>,
    /// Failed verification attempts so far
    pub attempts: u32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl OtpChallenge {
    /// Whether the challenge has expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_otp_expiry() {
        let now = Utc::now();
        let challenge = OtpChallenge {
            id: 1,
            admin_id: 1,
            code: "123456".to_string(),
            expires_at: now + Duration::minutes(10),
            attempts: 0,
            created_at: now,
        };

        assert!(!challenge.is_expired(now));
        assert!(challenge.is_expired(now + Duration::minutes(10)));
        assert!(challenge.is_expired(now + Duration::minutes(11)));
    }
}
