//! CancelSubscriptionHandler - Command handler for user-initiated cancellation.
//!
//! The gateway call changes nothing locally; this handler persists the
//! vendor state the gateway returns. Admin-funded subscriptions have no
//! vendor counterpart and are soft-ended locally without a gateway call.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Subscription};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{BillingGateway, SubscriptionStore};

/// Command to cancel the user's current subscription.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    /// User whose latest subscription is cancelled.
    pub user_id: UserId,
    /// True for an immediate vendor-side cancel; false cancels at period end.
    pub immediate: bool,
}

/// Result of a cancellation.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionResult {
    /// The subscription row after persisting the cancellation.
    pub subscription: Subscription,
}

/// Handler for subscription cancellation.
pub struct CancelSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionStore>,
    gateway: Arc<dyn BillingGateway>,
}

impl CancelSubscriptionHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        gateway: Arc<dyn BillingGateway>,
    ) -> Self {
        Self {
            subscriptions,
            gateway,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<CancelSubscriptionResult, BillingError> {
        let mut subscription = self
            .subscriptions
            .find_latest_by_user(&cmd.user_id)
            .await?
            .ok_or_else(|| BillingError::subscription_not_found(cmd.user_id.clone()))?;

        match subscription.vendor_subscription_id.clone() {
            Some(vendor_id) => {
                let vendor_state = self
                    .gateway
                    .cancel_subscription(&vendor_id, cmd.immediate)
                    .await
                    .map_err(BillingError::from)?;
                subscription.overwrite_from_vendor(&vendor_state);
                if subscription.cancelled_at.is_none() {
                    // Period-end cancels report no canceled_at yet; stamp the
                    // request time so the row records that it was asked for.
                    subscription.mark_cancelled(Timestamp::now());
                }
            }
            None => {
                // Admin-funded row, nothing on the vendor side to cancel.
                subscription.mark_cancelled(Timestamp::now());
            }
        }

        self.subscriptions.update(&subscription).await?;

        tracing::info!(
            user_id = %cmd.user_id,
            subscription_id = %subscription.id,
            immediate = cmd.immediate,
            "Cancelled subscription"
        );

        Ok(CancelSubscriptionResult { subscription })
    }
}
