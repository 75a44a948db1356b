//! Vendor-to-internal status mapping tables.
//!
//! The vendor's status vocabulary is richer than the internal one. Both
//! mapping functions are total: every vendor string, including ones added by
//! the vendor after this code shipped, lands on a defined internal status.

use serde::{Deserialize, Serialize};

/// Subscription lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid-up subscription with full access.
    Active,

    /// Not currently entitled (unpaid, incomplete, or unknown vendor state).
    Inactive,

    /// Ended by the user or the vendor.
    Cancelled,

    /// Payment failed but within the vendor's retry window.
    PastDue,

    /// In the vendor's trial period.
    Trialing,
}

impl SubscriptionStatus {
    /// Maps a vendor subscription status string onto the internal vocabulary.
    ///
    /// Unrecognised vendor statuses map to `Inactive` so a vendor-side
    /// vocabulary change can never leave a row in an undefined state.
    pub fn from_vendor(status: &str) -> Self {
        match status {
            "active" => Self::Active,
            "trialing" => Self::Trialing,
            "past_due" => Self::PastDue,
            "canceled" => Self::Cancelled,
            "unpaid" | "incomplete" | "incomplete_expired" => Self::Inactive,
            _ => Self::Inactive,
        }
    }

    /// Database / API string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Cancelled => "cancelled",
            Self::PastDue => "past_due",
            Self::Trialing => "trialing",
        }
    }

    /// Returns true if this status grants streaming access.
    pub fn has_access(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing | Self::PastDue)
    }
}

/// Payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Database / API string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

/// Configurable vendor-to-internal payment status table.
///
/// The upstream implementations disagreed on whether a vendor `canceled`
/// payment intent is a `Failed` payment or deserves its own status. Until
/// product resolves that, the target of `canceled` is an explicit table entry
/// rather than a hardcoded match arm; the default pins `canceled` -> Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentStatusMap {
    /// Internal status a vendor `canceled` payment intent maps to.
    pub canceled: PaymentStatus,
}

impl Default for PaymentStatusMap {
    fn default() -> Self {
        Self {
            canceled: PaymentStatus::Failed,
        }
    }
}

impl PaymentStatusMap {
    /// Maps a vendor payment-intent status string onto the internal vocabulary.
    ///
    /// Total: unrecognised vendor statuses map to `Pending` (the only
    /// non-terminal internal state).
    pub fn map(&self, status: &str) -> PaymentStatus {
        match status {
            "succeeded" => PaymentStatus::Succeeded,
            "pending" | "processing" => PaymentStatus::Pending,
            "failed" | "payment_failed" => PaymentStatus::Failed,
            "refunded" => PaymentStatus::Refunded,
            "canceled" => self.canceled,
            _ => PaymentStatus::Pending,
        }
    }
}
