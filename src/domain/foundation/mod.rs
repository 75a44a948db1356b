//! Foundation types shared across the domain.
//!
//! Strongly-typed identifiers, the `Timestamp` value object, and the
//! `DomainError` type used by store and gateway ports.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{FundingId, PaymentId, SubscriptionId, UserId};
pub use timestamp::Timestamp;
