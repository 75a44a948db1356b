//! Stripe adapter - implements the `BillingGateway` port.

mod gateway;
mod webhook_types;

pub use gateway::{StripeGateway, StripeGatewayConfig};
pub use webhook_types::{
    SignatureHeader, SignatureParseError, StripePaymentIntent, StripeSubscription,
    StripeWebhookEvent,
};
