//! PostgreSQL implementation of FundingStore.

use crate::domain::billing::{AdminFunding, FundingStatus};
use crate::domain::foundation::{DomainError, ErrorCode, FundingId, Timestamp, UserId};
use crate::ports::FundingStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the FundingStore port.
pub struct PostgresFundingStore {
    pool: PgPool,
}

impl PostgresFundingStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a funding record.
#[derive(Debug, sqlx::FromRow)]
struct FundingRow {
    id: Uuid,
    user_id: Uuid,
    amount: Decimal,
    months_funded: i32,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: String,
    granted_by: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<FundingRow> for AdminFunding {
    type Error = DomainError;

    fn try_from(row: FundingRow) -> Result<Self, Self::Error> {
        Ok(AdminFunding {
            id: FundingId::from_uuid(row.id),
            user_id: UserId::new(row.user_id.to_string()).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            amount: row.amount,
            months_funded: row.months_funded,
            start_date: Timestamp::from_datetime(row.start_date),
            end_date: Timestamp::from_datetime(row.end_date),
            status: parse_status(&row.status)?,
            granted_by: UserId::new(row.granted_by.to_string()).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid granted_by: {}", e))
            })?,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn parse_status(s: &str) -> Result<FundingStatus, DomainError> {
    match s {
        "active" => Ok(FundingStatus::Active),
        "expired" => Ok(FundingStatus::Expired),
        "cancelled" => Ok(FundingStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid funding status value: {}", s),
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
impl FundingStore for PostgresFundingStore {
    async fn insert(&self, funding: &AdminFunding) -> Result<(), DomainError> {
        let user_uuid = parse_user_id_as_uuid(&funding.user_id)?;
        let admin_uuid = parse_user_id_as_uuid(&funding.granted_by)?;

        sqlx::query(
            r#"
            INSERT INTO admin_funding (
                id, user_id, amount, months_funded, start_date, end_date,
                status, granted_by, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(funding.id.as_uuid())
        .bind(user_uuid)
        .bind(funding.amount)
        .bind(funding.months_funded)
        .bind(funding.start_date.as_datetime())
        .bind(funding.end_date.as_datetime())
        .bind(funding.status.as_str())
        .bind(admin_uuid)
        .bind(funding.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to insert funding record: {}", e),
            )
        })?;

        Ok(())
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<AdminFunding>, DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;

        let rows: Vec<FundingRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, amount, months_funded, start_date, end_date,
                   status, granted_by, created_at
            FROM admin_funding
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_uuid)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to list funding records: {}", e),
            )
        })?;

        rows.into_iter().map(AdminFunding::try_from).collect()
    }
}
