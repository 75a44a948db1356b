//! Billing domain module.
//!
//! Holds the subscription/payment entities, the vendor event model, and the
//! reconciliation engine that keeps local rows consistent with vendor-reported
//! truth.
//!
//! # Module Structure
//!
//! - `subscription` - Subscription entity
//! - `payment` - Payment entity
//! - `funding` - AdminFunding audit entity
//! - `status` - vendor-to-internal status mapping tables
//! - `plan` - billing plan interval
//! - `vendor_event` - verified vendor event model (closed set)
//! - `reconciliation` - the reconciliation engine
//! - `errors` - billing error taxonomy

mod errors;
mod funding;
mod payment;
mod plan;
mod reconciliation;
mod status;
mod subscription;
mod vendor_event;

#[cfg(test)]
pub(crate) use vendor_event::test_support;

pub use errors::BillingError;
pub use funding::{AdminFunding, FundingStatus};
pub use payment::Payment;
pub use plan::PlanInterval;
pub use reconciliation::{ReconcileError, ReconcileOutcome, ReconciliationEngine};
pub use status::{PaymentStatus, PaymentStatusMap, SubscriptionStatus};
pub use subscription::Subscription;
pub use vendor_event::{VendorEvent, VendorPaymentIntent, VendorSubscription};
