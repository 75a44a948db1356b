//! Subscription entity.
//!
//! A user's subscription row. Rows originate either from vendor events (the
//! reconciliation path stamps the vendor subscription id) or from admin
//! funding (no vendor id, `funded_by_admin` set).
//!
//! "Current" subscription means latest by `created_at`; the store does not
//! enforce a single current row per user. That looseness is inherited from
//! the upstream system and preserved deliberately.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SubscriptionId, Timestamp, UserId};

use super::{PlanInterval, SubscriptionStatus, VendorSubscription};

/// Subscription row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique identifier for this subscription.
    pub id: SubscriptionId,

    /// User who owns this subscription.
    pub user_id: UserId,

    /// Vendor subscription id; unique when present, absent for
    /// admin-funded rows.
    pub vendor_subscription_id: Option<String>,

    /// Current lifecycle status.
    pub status: SubscriptionStatus,

    /// Billing plan interval.
    pub plan: PlanInterval,

    /// When the subscription started.
    pub start_date: Timestamp,

    /// When the subscription ends (extended by funding, moved by renewals).
    pub end_date: Timestamp,

    /// Start of the current billing period.
    pub current_period_start: Timestamp,

    /// End of the current billing period.
    pub current_period_end: Timestamp,

    /// True when the row was created or last extended by an admin grant.
    pub funded_by_admin: bool,

    /// When the subscription was cancelled, if it was.
    pub cancelled_at: Option<Timestamp>,

    /// When the row was created.
    pub created_at: Timestamp,

    /// When the row was last written.
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Creates a new row from a vendor subscription object.
    pub fn from_vendor(id: SubscriptionId, user_id: UserId, vendor: &VendorSubscription) -> Self {
        let now = Timestamp::now();
        let period_start = Timestamp::from_unix_secs(vendor.current_period_start);
        let period_end = Timestamp::from_unix_secs(vendor.current_period_end);

        Self {
            id,
            user_id,
            vendor_subscription_id: Some(vendor.id.clone()),
            status: SubscriptionStatus::from_vendor(&vendor.status),
            plan: PlanInterval::from_vendor_interval(vendor.plan_interval.as_deref()),
            start_date: period_start,
            end_date: period_end,
            current_period_start: period_start,
            current_period_end: period_end,
            funded_by_admin: false,
            cancelled_at: vendor.canceled_at.map(Timestamp::from_unix_secs),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates an admin-funded row with no vendor counterpart.
    pub fn admin_funded(
        id: SubscriptionId,
        user_id: UserId,
        start: Timestamp,
        end: Timestamp,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            user_id,
            vendor_subscription_id: None,
            status: SubscriptionStatus::Active,
            plan: PlanInterval::Monthly,
            start_date: start,
            end_date: end,
            current_period_start: start,
            current_period_end: end,
            funded_by_admin: true,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites every vendor-mapped field from a fresh vendor object.
    ///
    /// Last event wins: no timestamp comparison against the stored row, so
    /// replaying an identical event is a no-op and out-of-order delivery
    /// settles on whichever event was processed last.
    pub fn overwrite_from_vendor(&mut self, vendor: &VendorSubscription) {
        let period_start = Timestamp::from_unix_secs(vendor.current_period_start);
        let period_end = Timestamp::from_unix_secs(vendor.current_period_end);

        self.status = SubscriptionStatus::from_vendor(&vendor.status);
        self.plan = PlanInterval::from_vendor_interval(vendor.plan_interval.as_deref());
        self.current_period_start = period_start;
        self.current_period_end = period_end;
        self.end_date = period_end;
        self.cancelled_at = vendor.canceled_at.map(Timestamp::from_unix_secs);
        self.updated_at = Timestamp::now();
    }

    /// Soft-ends the subscription: status cancelled, cancellation stamped.
    pub fn mark_cancelled(&mut self, at: Timestamp) {
        self.status = SubscriptionStatus::Cancelled;
        self.cancelled_at = Some(at);
        self.updated_at = Timestamp::now();
    }

    /// Applies an admin funding grant: the end date is replaced (not
    /// appended to) and the row becomes active regardless of prior status.
    pub fn extend_funding(&mut self, new_end: Timestamp) {
        self.end_date = new_end;
        self.current_period_end = new_end;
        self.status = SubscriptionStatus::Active;
        self.funded_by_admin = true;
        self.updated_at = Timestamp::now();
    }
}
