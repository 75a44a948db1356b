//! Verified vendor event model.
//!
//! The gateway adapter parses the vendor's dynamically-shaped webhook payload
//! once, at the boundary, into this closed set of event shapes. The
//! reconciliation engine matches exhaustively over `VendorEvent` and never
//! touches raw vendor JSON.

use std::collections::HashMap;

use crate::domain::foundation::UserId;

/// A verified, typed vendor event.
#[derive(Debug, Clone, PartialEq)]
pub enum VendorEvent {
    /// `customer.subscription.created`
    SubscriptionCreated(VendorSubscription),
    /// `customer.subscription.updated`
    SubscriptionUpdated(VendorSubscription),
    /// `customer.subscription.deleted`
    SubscriptionDeleted(VendorSubscription),
    /// `payment_intent.succeeded`
    PaymentSucceeded(VendorPaymentIntent),
    /// `payment_intent.payment_failed`
    PaymentFailed(VendorPaymentIntent),
    /// Any other event type: acknowledged and ignored.
    Ignored { event_type: String },
}

impl VendorEvent {
    /// The vendor event type string, for logging.
    pub fn type_name(&self) -> &str {
        match self {
            Self::SubscriptionCreated(_) => "customer.subscription.created",
            Self::SubscriptionUpdated(_) => "customer.subscription.updated",
            Self::SubscriptionDeleted(_) => "customer.subscription.deleted",
            Self::PaymentSucceeded(_) => "payment_intent.succeeded",
            Self::PaymentFailed(_) => "payment_intent.payment_failed",
            Self::Ignored { event_type } => event_type,
        }
    }
}

/// Subscription object embedded in a vendor event, narrowed to the fields the
/// engine maps.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorSubscription {
    /// Vendor subscription id (sub_...).
    pub id: String,

    /// Vendor-side status string (mapped via `SubscriptionStatus::from_vendor`).
    pub status: String,

    /// Current billing period start (Unix timestamp).
    pub current_period_start: i64,

    /// Current billing period end (Unix timestamp).
    pub current_period_end: i64,

    /// Whether the subscription cancels at period end.
    pub cancel_at_period_end: bool,

    /// When cancellation was requested (Unix timestamp).
    pub canceled_at: Option<i64>,

    /// Recurring interval off the first line item ("month", "year", ...).
    pub plan_interval: Option<String>,

    /// Vendor-side metadata, set at subscription-creation time.
    pub metadata: HashMap<String, String>,
}

impl VendorSubscription {
    /// Owner correlation: the `user_id` metadata key stamped at creation.
    pub fn owner(&self) -> Option<UserId> {
        self.metadata
            .get("user_id")
            .and_then(|id| UserId::new(id.as_str()).ok())
    }
}

/// Payment-intent object embedded in a vendor event.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorPaymentIntent {
    /// Vendor payment-intent id (pi_...).
    pub id: String,

    /// Vendor-side status string (mapped via `PaymentStatusMap`).
    pub status: String,

    /// Amount in the currency's minor units.
    pub amount: i64,

    /// Lowercase ISO currency code.
    pub currency: String,

    /// Accepted payment method types.
    pub payment_method_types: Vec<String>,

    /// Vendor-side metadata.
    pub metadata: HashMap<String, String>,
}

impl VendorPaymentIntent {
    /// Owner correlation: the `user_id` metadata key.
    pub fn owner(&self) -> Option<UserId> {
        self.metadata
            .get("user_id")
            .and_then(|id| UserId::new(id.as_str()).ok())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn owner_reads_user_id_metadata() {
        let sub = vendor_subscription("sub_1", "active", "user-123");
        assert_eq!(sub.owner().unwrap().as_str(), "user-123");
    }

    #[test]
    fn owner_is_none_without_metadata() {
        let mut sub = vendor_subscription("sub_1", "active", "user-123");
        sub.metadata.clear();
        assert!(sub.owner().is_none());
    }

    #[test]
    fn owner_is_none_for_empty_metadata_value() {
        let mut pi = vendor_payment_intent("pi_1", "succeeded", "user-123");
        pi.metadata.insert("user_id".to_string(), String::new());
        assert!(pi.owner().is_none());
    }

    #[test]
    fn type_name_covers_all_variants() {
        let sub = vendor_subscription("sub_1", "active", "u");
        let pi = vendor_payment_intent("pi_1", "succeeded", "u");

        assert_eq!(
            VendorEvent::SubscriptionCreated(sub.clone()).type_name(),
            "customer.subscription.created"
        );
        assert_eq!(
            VendorEvent::SubscriptionDeleted(sub).type_name(),
            "customer.subscription.deleted"
        );
        assert_eq!(
            VendorEvent::PaymentFailed(pi).type_name(),
            "payment_intent.payment_failed"
        );
        assert_eq!(
            VendorEvent::Ignored {
                event_type: "invoice.created".to_string()
            }
            .type_name(),
            "invoice.created"
        );
    }
}
