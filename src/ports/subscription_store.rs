//! Subscription store port.
//!
//! Narrow persistence capability the reconciliation engine and funding
//! service depend on. Implementations own the actual database operations;
//! the engine never sees a concrete ORM type.

use async_trait::async_trait;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, SubscriptionId, UserId};

/// Store port for subscription rows.
///
/// The reconciliation path performs read-modify-write through this interface:
/// `find_by_vendor_id` then `insert` or `update`. No optimistic locking is
/// provided; last write wins.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Insert a new subscription row.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure (including a duplicate
    ///   vendor subscription id)
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Update an existing subscription row by id.
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the row doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Find a subscription by its vendor subscription id.
    ///
    /// Returns `None` if no row carries that vendor id.
    async fn find_by_vendor_id(
        &self,
        vendor_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Find a user's most recent subscription by creation time.
    ///
    /// "Current" is defined by creation order, not a flag; a user may hold
    /// several rows and this returns the newest.
    async fn find_latest_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Find a subscription by its internal id.
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError>;
}
