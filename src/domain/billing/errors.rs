//! Billing-specific error types.
//!
//! Errors related to webhook processing, gateway calls, and funding.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InvalidWebhookSignature | 400 |
//! | BillingDisabled | 503 |
//! | UserNotFound | 404 |
//! | SubscriptionNotFound | 404 |
//! | Validation | 400 |
//! | Gateway | 502 |
//! | Reconciliation | 500 |
//! | Infrastructure | 500 |
//!
//! `MissingOwner` never reaches the HTTP layer as an error: the webhook
//! handler logs and drops the event with a success-shaped response so the
//! vendor does not retry it forever.

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::{GatewayError, GatewayErrorKind};

use super::ReconcileError;

/// Billing-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// Webhook signature verification failed. Permanent, non-retryable.
    InvalidWebhookSignature,

    /// Gateway operation attempted without configured credentials.
    BillingDisabled,

    /// Vendor event lacks the owner-correlation metadata.
    MissingOwner { event_type: String, vendor_id: String },

    /// Funding or cancellation target user does not exist.
    UserNotFound(UserId),

    /// No subscription row for the requested operation.
    SubscriptionNotFound(UserId),

    /// Request validation failed.
    Validation { field: String, message: String },

    /// The vendor rejected a gateway call.
    Gateway { reason: String },

    /// Persistence failed mid-reconciliation; the vendor should retry.
    Reconciliation(String),

    /// Other infrastructure failure.
    Infrastructure(String),
}

impl BillingError {
    // Constructor functions for cleaner error creation

    pub fn invalid_webhook_signature() -> Self {
        BillingError::InvalidWebhookSignature
    }

    pub fn billing_disabled() -> Self {
        BillingError::BillingDisabled
    }

    pub fn missing_owner(event_type: impl Into<String>, vendor_id: impl Into<String>) -> Self {
        BillingError::MissingOwner {
            event_type: event_type.into(),
            vendor_id: vendor_id.into(),
        }
    }

    pub fn user_not_found(user_id: UserId) -> Self {
        BillingError::UserNotFound(user_id)
    }

    pub fn subscription_not_found(user_id: UserId) -> Self {
        BillingError::SubscriptionNotFound(user_id)
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn gateway(reason: impl Into<String>) -> Self {
        BillingError::Gateway {
            reason: reason.into(),
        }
    }

    pub fn reconciliation(message: impl Into<String>) -> Self {
        BillingError::Reconciliation(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        BillingError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::InvalidWebhookSignature => ErrorCode::InvalidWebhookSignature,
            BillingError::BillingDisabled => ErrorCode::GatewayNotConfigured,
            BillingError::MissingOwner { .. } => ErrorCode::MissingOwnerMetadata,
            BillingError::UserNotFound(_) => ErrorCode::UserNotFound,
            BillingError::SubscriptionNotFound(_) => ErrorCode::SubscriptionNotFound,
            BillingError::Validation { .. } => ErrorCode::ValidationFailed,
            BillingError::Gateway { .. } => ErrorCode::GatewayError,
            BillingError::Reconciliation(_) => ErrorCode::ReconciliationFailed,
            BillingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            BillingError::InvalidWebhookSignature => "Invalid webhook signature".to_string(),
            BillingError::BillingDisabled => {
                "Billing is disabled: payment gateway is not configured".to_string()
            }
            BillingError::MissingOwner {
                event_type,
                vendor_id,
            } => format!(
                "{} event for {} has no owner metadata",
                event_type, vendor_id
            ),
            BillingError::UserNotFound(user_id) => format!("User not found: {}", user_id),
            BillingError::SubscriptionNotFound(user_id) => {
                format!("No subscription found for user: {}", user_id)
            }
            BillingError::Validation { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            BillingError::Gateway { reason } => format!("Payment gateway error: {}", reason),
            BillingError::Reconciliation(msg) => format!("Reconciliation failed: {}", msg),
            BillingError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if the vendor's webhook delivery should retry.
    ///
    /// Only persistence failures are retryable; signature and owner problems
    /// are permanent and retrying would never succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BillingError::Reconciliation(_) | BillingError::Infrastructure(_)
        )
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for BillingError {}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidWebhookSignature => BillingError::InvalidWebhookSignature,
            ErrorCode::GatewayNotConfigured => BillingError::BillingDisabled,
            ErrorCode::GatewayError => BillingError::Gateway {
                reason: err.to_string(),
            },
            ErrorCode::ValidationFailed => BillingError::Validation {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => BillingError::Infrastructure(err.to_string()),
        }
    }
}

impl From<BillingError> for DomainError {
    fn from(err: BillingError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

impl From<ReconcileError> for BillingError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::MissingOwner {
                event_type,
                vendor_id,
            } => BillingError::missing_owner(event_type, vendor_id),
            ReconcileError::Store(inner) => BillingError::reconciliation(inner.to_string()),
        }
    }
}

impl From<GatewayError> for BillingError {
    fn from(err: GatewayError) -> Self {
        match err.kind {
            GatewayErrorKind::NotConfigured => BillingError::BillingDisabled,
            GatewayErrorKind::InvalidSignature | GatewayErrorKind::InvalidPayload => {
                BillingError::InvalidWebhookSignature
            }
            _ => BillingError::Gateway {
                reason: err.message,
            },
        }
    }
}
