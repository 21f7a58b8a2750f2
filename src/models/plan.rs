//! Subscription plan model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Billing period of a subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    #[default]
    Monthly,
    Yearly,
}

impl BillingPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingPeriod::Monthly => "monthly",
            BillingPeriod::Yearly => "yearly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monthly" => Some(BillingPeriod::Monthly),
            "yearly" => Some(BillingPeriod::Yearly),
            _ => None,
        }
    }
}

/// Subscription plan entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionPlan {
    /// Unique identifier
    pub id: i64,
    /// Plan name (unique)
    pub name: String,
    /// Price per billing period, in cents
    pub price_cents: i64,
    /// Billing period
    pub billing_period: BillingPeriod,
    /// Included feature names
    pub features: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_period_roundtrip() {
        for period in [BillingPeriod::Monthly, BillingPeriod::Yearly] {
            assert_eq!(BillingPeriod::parse(period.as_str()), Some(period));
        }
        assert_eq!(BillingPeriod::parse("weekly"), None);
    }
}
