//! Funding store port.

use async_trait::async_trait;

use crate::domain::billing::AdminFunding;
use crate::domain::foundation::{DomainError, UserId};

/// Store port for admin funding audit rows.
///
/// Funding records are append-only from the service's point of view; status
/// transitions happen through separate administrative tooling.
#[async_trait]
pub trait FundingStore: Send + Sync {
    /// Insert a new funding audit row.
    async fn insert(&self, funding: &AdminFunding) -> Result<(), DomainError>;

    /// List a user's funding history, newest first.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<AdminFunding>, DomainError>;
}
