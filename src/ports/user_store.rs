//! User store port.
//!
//! The accounts table is owned by a different part of the platform; billing
//! only needs existence checks and the denormalized subscription status
//! column that the web client reads.

use async_trait::async_trait;

use crate::domain::billing::SubscriptionStatus;
use crate::domain::foundation::{DomainError, UserId};

/// Store port for the slice of the users table billing touches.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Check whether a user exists.
    async fn exists(&self, user_id: &UserId) -> Result<bool, DomainError>;

    /// Write the user's denormalized subscription status.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the user doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn set_subscription_status(
        &self,
        user_id: &UserId,
        status: SubscriptionStatus,
    ) -> Result<(), DomainError>;
}
