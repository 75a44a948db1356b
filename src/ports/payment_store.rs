//! Payment store port.

use async_trait::async_trait;

use crate::domain::billing::Payment;
use crate::domain::foundation::DomainError;

/// Store port for payment rows.
///
/// The write path is find-or-create by vendor payment-intent id; rows are
/// never deleted through this port.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Insert a new payment row.
    async fn insert(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Update an existing payment row by id.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` if the row doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Find a payment by its vendor payment-intent id.
    async fn find_by_vendor_id(
        &self,
        vendor_payment_intent_id: &str,
    ) -> Result<Option<Payment>, DomainError>;
}
