//! PostgreSQL implementation of SubscriptionStore.
//!
//! Provides persistent storage for subscription rows using PostgreSQL.

use crate::domain::billing::{PlanInterval, Subscription, SubscriptionStatus};
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp, UserId};
use crate::ports::SubscriptionStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the SubscriptionStore port.
///
/// Uses sqlx for type-safe database operations with connection pooling.
pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    vendor_subscription_id: Option<String>,
    status: String,
    plan: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    current_period_start: DateTime<Utc>,
    current_period_end: DateTime<Utc>,
    funded_by_admin: bool,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::new(row.user_id.to_string()).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            vendor_subscription_id: row.vendor_subscription_id,
            status: parse_status(&row.status)?,
            plan: parse_plan(&row.plan)?,
            start_date: Timestamp::from_datetime(row.start_date),
            end_date: Timestamp::from_datetime(row.end_date),
            current_period_start: Timestamp::from_datetime(row.current_period_start),
            current_period_end: Timestamp::from_datetime(row.current_period_end),
            funded_by_admin: row.funded_by_admin,
            cancelled_at: row.cancelled_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    match s {
        "active" => Ok(SubscriptionStatus::Active),
        "inactive" => Ok(SubscriptionStatus::Inactive),
        "cancelled" => Ok(SubscriptionStatus::Cancelled),
        "past_due" => Ok(SubscriptionStatus::PastDue),
        "trialing" => Ok(SubscriptionStatus::Trialing),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )),
    }
}

fn parse_plan(s: &str) -> Result<PlanInterval, DomainError> {
    match s {
        "monthly" => Ok(PlanInterval::Monthly),
        "yearly" => Ok(PlanInterval::Yearly),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid plan value: {}", s),
        )),
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
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let user_uuid = parse_user_id_as_uuid(&subscription.user_id)?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, vendor_subscription_id, status, plan,
                start_date, end_date, current_period_start, current_period_end,
                funded_by_admin, cancelled_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(user_uuid)
        .bind(&subscription.vendor_subscription_id)
        .bind(subscription.status.as_str())
        .bind(subscription.plan.as_str())
        .bind(subscription.start_date.as_datetime())
        .bind(subscription.end_date.as_datetime())
        .bind(subscription.current_period_start.as_datetime())
        .bind(subscription.current_period_end.as_datetime())
        .bind(subscription.funded_by_admin)
        .bind(subscription.cancelled_at.map(|t| *t.as_datetime()))
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to insert subscription: {}", e),
            )
        })?;

        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                vendor_subscription_id = $2,
                status = $3,
                plan = $4,
                start_date = $5,
                end_date = $6,
                current_period_start = $7,
                current_period_end = $8,
                funded_by_admin = $9,
                cancelled_at = $10,
                updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(&subscription.vendor_subscription_id)
        .bind(subscription.status.as_str())
        .bind(subscription.plan.as_str())
        .bind(subscription.start_date.as_datetime())
        .bind(subscription.end_date.as_datetime())
        .bind(subscription.current_period_start.as_datetime())
        .bind(subscription.current_period_end.as_datetime())
        .bind(subscription.funded_by_admin)
        .bind(subscription.cancelled_at.map(|t| *t.as_datetime()))
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update subscription: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                "Subscription not found",
            ));
        }

        Ok(())
    }

    async fn find_by_vendor_id(
        &self,
        vendor_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, vendor_subscription_id, status, plan,
                   start_date, end_date, current_period_start, current_period_end,
                   funded_by_admin, cancelled_at, created_at, updated_at
            FROM subscriptions
            WHERE vendor_subscription_id = $1
            "#,
        )
        .bind(vendor_subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find subscription: {}", e),
            )
        })?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_latest_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;

        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, vendor_subscription_id, status, plan,
                   start_date, end_date, current_period_start, current_period_end,
                   funded_by_admin, cancelled_at, created_at, updated_at
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find subscription: {}", e),
            )
        })?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, vendor_subscription_id, status, plan,
                   start_date, end_date, current_period_start, current_period_end,
                   funded_by_admin, cancelled_at, created_at, updated_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find subscription: {}", e),
            )
        })?;

        row.map(Subscription::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_works_for_all_values() {
        assert_eq!(parse_status("active").unwrap(), SubscriptionStatus::Active);
        assert_eq!(
            parse_status("inactive").unwrap(),
            SubscriptionStatus::Inactive
        );
        assert_eq!(
            parse_status("cancelled").unwrap(),
            SubscriptionStatus::Cancelled
        );
        assert_eq!(
            parse_status("past_due").unwrap(),
            SubscriptionStatus::PastDue
        );
        assert_eq!(
            parse_status("trialing").unwrap(),
            SubscriptionStatus::Trialing
        );
    }

    #[test]
    fn parse_status_rejects_invalid_values() {
        assert!(parse_status("invalid").is_err());
        assert!(parse_status("").is_err());
    }

    #[test]
    fn parse_plan_works_for_all_values() {
        assert_eq!(parse_plan("monthly").unwrap(), PlanInterval::Monthly);
        assert_eq!(parse_plan("yearly").unwrap(), PlanInterval::Yearly);
    }

    #[test]
    fn parse_plan_rejects_invalid_values() {
        assert!(parse_plan("weekly").is_err());
        assert!(parse_plan("").is_err());
    }

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

    #[test]
    fn roundtrip_status_conversion() {
        for status in [
            SubscriptionStatus::Active,
            SubscriptionStatus::Inactive,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Trialing,
        ] {
            let s = status.as_str();
            assert_eq!(parse_status(s).unwrap(), status);
        }
    }

    #[test]
    fn roundtrip_plan_conversion() {
        for plan in [PlanInterval::Monthly, PlanInterval::Yearly] {
            let s = plan.as_str();
            assert_eq!(parse_plan(s).unwrap(), plan);
        }
    }
}
