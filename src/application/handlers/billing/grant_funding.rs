//! GrantFundingHandler - Command handler for admin subscription grants.
//!
//! The funding path bypasses the billing gateway entirely: it writes an
//! audit row, creates or extends the user's subscription, and flips the
//! user's denormalized status. The three writes are independent (no
//! transaction, no rollback) - a crash between them leaves partial state,
//! which matches the upstream system's behavior and keeps the audit row
//! even if the side effects did not land.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::billing::{AdminFunding, BillingError, Subscription, SubscriptionStatus};
use crate::domain::foundation::{FundingId, SubscriptionId, Timestamp, UserId};
use crate::ports::{FundingStore, SubscriptionStore, UserStore};

/// Command to grant subscription time to a user.
#[derive(Debug, Clone)]
pub struct GrantFundingCommand {
    /// User receiving the grant.
    pub user_id: UserId,
    /// Admin performing the grant.
    pub admin_id: UserId,
    /// Calendar months to grant.
    pub months: u32,
    /// Nominal amount recorded on the audit row.
    pub amount: Decimal,
}

/// Result of a funding grant.
#[derive(Debug, Clone)]
pub struct GrantFundingResult {
    /// The audit row that was created.
    pub funding: AdminFunding,
    /// The subscription row that was created or extended.
    pub subscription: Subscription,
}

/// Handler for admin funding grants.
pub struct GrantFundingHandler {
    users: Arc<dyn UserStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    fundings: Arc<dyn FundingStore>,
}

impl GrantFundingHandler {
    pub fn new(
        users: Arc<dyn UserStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        fundings: Arc<dyn FundingStore>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            fundings,
        }
    }

    pub async fn handle(&self, cmd: GrantFundingCommand) -> Result<GrantFundingResult, BillingError> {
        self.handle_at(cmd, Timestamp::now()).await
    }

    /// Grant funding as of an explicit moment. The grant window is
    /// `[now, now + months]` - an existing subscription's end date is
    /// replaced, not appended to.
    pub async fn handle_at(
        &self,
        cmd: GrantFundingCommand,
        now: Timestamp,
    ) -> Result<GrantFundingResult, BillingError> {
        if cmd.months == 0 {
            return Err(BillingError::validation("months", "must be at least 1"));
        }

        // 1. Target must exist before any write happens.
        if !self.users.exists(&cmd.user_id).await? {
            return Err(BillingError::user_not_found(cmd.user_id));
        }

        let end_date = now.add_calendar_months(cmd.months);

        // 2. Audit row first - it survives even if the later writes fail.
        let funding = AdminFunding::grant(
            FundingId::new(),
            cmd.user_id.clone(),
            cmd.admin_id.clone(),
            cmd.amount,
            cmd.months as i32,
            now,
            end_date,
        );
        self.fundings.insert(&funding).await?;

        // 3. Extend the latest subscription, or create a fresh one.
        let subscription = match self.subscriptions.find_latest_by_user(&cmd.user_id).await? {
            Some(mut existing) => {
                existing.extend_funding(end_date);
                self.subscriptions.update(&existing).await?;
                existing
            }
            None => {
                let created = Subscription::admin_funded(
                    SubscriptionId::new(),
                    cmd.user_id.clone(),
                    now,
                    end_date,
                );
                self.subscriptions.insert(&created).await?;
                created
            }
        };

        // 4. Denormalized status the web client reads.
        self.users
            .set_subscription_status(&cmd.user_id, SubscriptionStatus::Active)
            .await?;

        tracing::info!(
            user_id = %funding.user_id,
            admin_id = %funding.granted_by,
            months = funding.months_funded,
            end_date = %funding.end_date,
            "Granted admin funding"
        );

        Ok(GrantFundingResult {
            funding,
            subscription,
        })
    }
}
