//! Reconciliation engine - makes the local store match vendor-reported truth.
//!
//! This is the coordination point between verified vendor events and the
//! subscription/payment stores.
//!
//! ## Design
//!
//! The engine performs an idempotent upsert keyed by the vendor id:
//! 1. Look up the row by vendor id
//! 2. Full-field overwrite if found, insert if not
//! 3. Last event wins, in wall-clock processing order
//!
//! There is no event-id deduplication and no sequence tracking: replaying an
//! identical event settles on the same final state because the overwrite is
//! total, and the vendor gives no ordering guarantee across deliveries.
//!
//! ## Failure semantics
//!
//! Store failures propagate so the caller can surface a 5xx and the vendor's
//! delivery system retries. Events missing the owner-correlation metadata are
//! unrecoverable and are dropped (logged) instead of retried forever.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, PaymentId, SubscriptionId, Timestamp, UserId};
use crate::ports::{PaymentStore, SubscriptionStore};

use super::{Payment, PaymentStatusMap, Subscription, VendorEvent, VendorPaymentIntent, VendorSubscription};

/// Outcome of reconciling a single vendor event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A subscription row was created or overwritten.
    SubscriptionUpserted {
        subscription_id: SubscriptionId,
        created: bool,
    },
    /// A subscription row was soft-ended.
    SubscriptionCancelled { subscription_id: SubscriptionId },
    /// A deletion event arrived for a vendor id we have no row for.
    /// Acknowledged, not an error.
    NoMatchingSubscription,
    /// A payment row was created or overwritten.
    PaymentUpserted { payment_id: PaymentId, created: bool },
    /// Event type the engine does not care about.
    Ignored,
}

/// Errors from reconciliation.
#[derive(Debug, Clone)]
pub enum ReconcileError {
    /// The vendor event lacks the `user_id` metadata the engine depends on.
    /// Unrecoverable: the engine has no way to repair the missing linkage.
    MissingOwner {
        event_type: &'static str,
        vendor_id: String,
    },
    /// The store failed; the caller should let the vendor retry.
    Store(DomainError),
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingOwner {
                event_type,
                vendor_id,
            } => write!(
                f,
                "{} event for {} has no user_id metadata",
                event_type, vendor_id
            ),
            Self::Store(err) => write!(f, "store failure during reconciliation: {}", err),
        }
    }
}

impl std::error::Error for ReconcileError {}

impl From<DomainError> for ReconcileError {
    fn from(err: DomainError) -> Self {
        Self::Store(err)
    }
}

/// Reconciles verified vendor events into the local store.
pub struct ReconciliationEngine {
    subscriptions: Arc<dyn SubscriptionStore>,
    payments: Arc<dyn PaymentStore>,
    payment_status_map: PaymentStatusMap,
}

impl ReconciliationEngine {
    /// Creates an engine with the default payment status table.
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>, payments: Arc<dyn PaymentStore>) -> Self {
        Self {
            subscriptions,
            payments,
            payment_status_map: PaymentStatusMap::default(),
        }
    }

    /// Overrides the payment status table (the vendor `canceled` target is
    /// an unresolved product question).
    pub fn with_payment_status_map(mut self, map: PaymentStatusMap) -> Self {
        self.payment_status_map = map;
        self
    }

    /// Process one verified vendor event.
    pub async fn process(&self, event: VendorEvent) -> Result<ReconcileOutcome, ReconcileError> {
        match event {
            VendorEvent::SubscriptionCreated(sub) | VendorEvent::SubscriptionUpdated(sub) => {
                self.upsert_subscription(&sub).await
            }
            VendorEvent::SubscriptionDeleted(sub) => self.cancel_subscription(&sub).await,
            VendorEvent::PaymentSucceeded(pi) | VendorEvent::PaymentFailed(pi) => {
                self.upsert_payment(&pi).await
            }
            VendorEvent::Ignored { event_type } => {
                tracing::info!(event_type = %event_type, "Ignoring unhandled vendor event");
                Ok(ReconcileOutcome::Ignored)
            }
        }
    }

    /// Upsert a subscription row keyed by vendor subscription id.
    async fn upsert_subscription(
        &self,
        vendor: &VendorSubscription,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let owner = self.require_owner(vendor.owner(), "subscription", &vendor.id)?;

        match self.subscriptions.find_by_vendor_id(&vendor.id).await? {
            Some(mut existing) => {
                existing.overwrite_from_vendor(vendor);
                self.subscriptions.update(&existing).await?;
                tracing::debug!(
                    vendor_subscription_id = %vendor.id,
                    subscription_id = %existing.id,
                    status = existing.status.as_str(),
                    "Overwrote subscription from vendor event"
                );
                Ok(ReconcileOutcome::SubscriptionUpserted {
                    subscription_id: existing.id,
                    created: false,
                })
            }
            None => {
                let subscription = Subscription::from_vendor(SubscriptionId::new(), owner, vendor);
                self.subscriptions.insert(&subscription).await?;
                tracing::debug!(
                    vendor_subscription_id = %vendor.id,
                    subscription_id = %subscription.id,
                    "Created subscription from vendor event"
                );
                Ok(ReconcileOutcome::SubscriptionUpserted {
                    subscription_id: subscription.id,
                    created: true,
                })
            }
        }
    }

    /// Soft-end the subscription a deletion event refers to. Missing rows
    /// are a no-op, not an error: the vendor may deliver deletions for
    /// subscriptions this system never saw.
    async fn cancel_subscription(
        &self,
        vendor: &VendorSubscription,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        match self.subscriptions.find_by_vendor_id(&vendor.id).await? {
            Some(mut subscription) => {
                subscription.mark_cancelled(Timestamp::now());
                self.subscriptions.update(&subscription).await?;
                tracing::info!(
                    vendor_subscription_id = %vendor.id,
                    subscription_id = %subscription.id,
                    "Cancelled subscription from vendor deletion event"
                );
                Ok(ReconcileOutcome::SubscriptionCancelled {
                    subscription_id: subscription.id,
                })
            }
            None => {
                tracing::info!(
                    vendor_subscription_id = %vendor.id,
                    "Deletion event for unknown subscription, acknowledging"
                );
                Ok(ReconcileOutcome::NoMatchingSubscription)
            }
        }
    }

    /// Upsert a payment row keyed by vendor payment-intent id, linked to the
    /// owner's latest subscription when one exists.
    async fn upsert_payment(
        &self,
        vendor: &VendorPaymentIntent,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let owner = self.require_owner(vendor.owner(), "payment_intent", &vendor.id)?;
        let status = self.payment_status_map.map(&vendor.status);
        let subscription_id = self
            .subscriptions
            .find_latest_by_user(&owner)
            .await?
            .map(|s| s.id);

        match self.payments.find_by_vendor_id(&vendor.id).await? {
            Some(mut existing) => {
                existing.overwrite_from_vendor(vendor, status, subscription_id);
                self.payments.update(&existing).await?;
                Ok(ReconcileOutcome::PaymentUpserted {
                    payment_id: existing.id,
                    created: false,
                })
            }
            None => {
                let payment =
                    Payment::from_vendor(PaymentId::new(), owner, vendor, status, subscription_id);
                self.payments.insert(&payment).await?;
                tracing::debug!(
                    vendor_payment_intent_id = %vendor.id,
                    payment_id = %payment.id,
                    status = status.as_str(),
                    "Created payment from vendor event"
                );
                Ok(ReconcileOutcome::PaymentUpserted {
                    payment_id: payment.id,
                    created: true,
                })
            }
        }
    }

    fn require_owner(
        &self,
        owner: Option<UserId>,
        event_type: &'static str,
        vendor_id: &str,
    ) -> Result<UserId, ReconcileError> {
        owner.ok_or_else(|| {
            tracing::warn!(
                event_type,
                vendor_id,
                "Vendor event has no user_id metadata, dropping"
            );
            ReconcileError::MissingOwner {
                event_type,
                vendor_id: vendor_id.to_string(),
            }
        })
    }
}
