//! Billing command handlers.

mod cancel_subscription;
mod grant_funding;
mod process_webhook;

pub use cancel_subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
};
pub use grant_funding::{GrantFundingCommand, GrantFundingHandler, GrantFundingResult};
pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult};
