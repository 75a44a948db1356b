//! Admin funding audit entity.
//!
//! One row per grant action. The row is an independent audit trail: it
//! records what was granted and by whom, while the side effect on the
//! user's subscription lives in the `subscriptions` table.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{FundingId, Timestamp, UserId};

/// Funding record status. Immutable apart from these transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingStatus {
    Active,
    Expired,
    Cancelled,
}

impl FundingStatus {
    /// Database / API string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Admin funding audit row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminFunding {
    /// Unique identifier for this grant.
    pub id: FundingId,

    /// User who received the grant.
    pub user_id: UserId,

    /// Nominal amount granted (informational, not billed).
    pub amount: Decimal,

    /// Number of calendar months granted.
    pub months_funded: i32,

    /// Grant start (the moment of the grant).
    pub start_date: Timestamp,

    /// Grant end (`start_date` + `months_funded` calendar months).
    pub end_date: Timestamp,

    /// Record status.
    pub status: FundingStatus,

    /// Admin who performed the grant.
    pub granted_by: UserId,

    /// When the row was created.
    pub created_at: Timestamp,
}

impl AdminFunding {
    /// Creates a new active grant record.
    pub fn grant(
        id: FundingId,
        user_id: UserId,
        granted_by: UserId,
        amount: Decimal,
        months: i32,
        start: Timestamp,
        end: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            amount,
            months_funded: months,
            start_date: start,
            end_date: end,
            status: FundingStatus::Active,
            granted_by,
            created_at: Timestamp::now(),
        }
    }
}
