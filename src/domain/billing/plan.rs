//! Billing plan interval.

use serde::{Deserialize, Serialize};

/// Billing interval of a subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanInterval {
    Monthly,
    Yearly,
}

impl PlanInterval {
    /// Derives the plan interval from the vendor's recurring-interval string
    /// (taken off the first line item of the vendor subscription).
    ///
    /// `year` maps to Yearly; anything else, including a missing interval,
    /// maps to Monthly.
    pub fn from_vendor_interval(interval: Option<&str>) -> Self {
        match interval {
            Some("year") => Self::Yearly,
            _ => Self::Monthly,
        }
    }

    /// Database / API string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}
