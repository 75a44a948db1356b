//! PostgreSQL implementation of UserStore.
//!
//! The users table belongs to the accounts side of the platform; billing
//! only reads existence and writes the denormalized subscription status.

use crate::domain::billing::SubscriptionStatus;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::UserStore;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the UserStore port.
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_user_id_as_uuid(user_id: &UserId) -> Result<Uuid, DomainError> {
    Uuid::parse_str(user_id.as_str()).map_err(|e| {
        DomainError::new(
            ErrorCode::ValidationFailed,
            format!("User ID must be a valid UUID: {}", e),
        )
    })
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn exists(&self, user_id: &UserId) -> Result<bool, DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;

        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(user_uuid)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to check user existence: {}", e),
                    )
                })?;

        Ok(exists.0)
    }

    async fn set_subscription_status(
        &self,
        user_id: &UserId,
        status: SubscriptionStatus,
    ) -> Result<(), DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;

        let result = sqlx::query(
            "UPDATE users SET subscription_status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_uuid)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update user subscription status: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::UserNotFound, "User not found"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_user_id_as_uuid_accepts_valid_uuid() {
        let user_id = UserId::new("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert!(parse_user_id_as_uuid(&user_id).is_ok());
    }

    #[test]
    fn parse_user_id_as_uuid_rejects_invalid_uuid() {
        let user_id = UserId::new("not-a-uuid").unwrap();
        assert!(parse_user_id_as_uuid(&user_id).is_err());
    }
}
