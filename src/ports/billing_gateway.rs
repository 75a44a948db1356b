//! Billing gateway port for the external payment vendor.
//!
//! Defines the contract the rest of the service uses to talk to the payment
//! vendor (Stripe). The reconciliation engine never touches vendor SDK types
//! directly; everything crosses this boundary as the domain's vendor event
//! model.
//!
//! # Design
//!
//! - **No local state**: gateway calls change nothing locally; callers
//!   persist results separately
//! - **Degrades when unconfigured**: outside production the gateway may run
//!   without credentials, in which case every call fails with
//!   `NotConfigured` instead of crashing the process

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::{VendorEvent, VendorPaymentIntent, VendorSubscription};
use crate::domain::foundation::{DomainError, ErrorCode};

/// Port for the payment vendor integration.
#[async_trait]
pub trait BillingGateway: Send + Sync {
    /// Create a subscription on the vendor side.
    ///
    /// `metadata` is stamped onto the vendor subscription and is how webhook
    /// events are later correlated back to the owning user (`user_id` key).
    /// No local state change.
    async fn create_subscription(
        &self,
        customer_ref: &str,
        price_ref: &str,
        metadata: HashMap<String, String>,
    ) -> Result<VendorSubscription, GatewayError>;

    /// Cancel a subscription on the vendor side.
    ///
    /// `immediate = true` hard-cancels; `false` sets cancel-at-period-end.
    /// No local state change; the caller persists the returned state.
    async fn cancel_subscription(
        &self,
        vendor_subscription_id: &str,
        immediate: bool,
    ) -> Result<VendorSubscription, GatewayError>;

    /// Create a one-off payment intent on the vendor side.
    ///
    /// `amount_minor` is in the currency's minor units, as the vendor
    /// expects. No local state change; the payment row appears when the
    /// vendor's payment-intent webhook arrives.
    async fn create_payment_intent(
        &self,
        customer_ref: &str,
        amount_minor: i64,
        currency: &str,
        metadata: HashMap<String, String>,
    ) -> Result<VendorPaymentIntent, GatewayError>;

    /// Verify a webhook signature over the raw request body and parse the
    /// event into the domain's closed event set.
    ///
    /// Callers must never process a payload whose signature did not verify.
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<VendorEvent, GatewayError>;
}

/// Errors from gateway operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayError {
    /// Error kind for categorization.
    pub kind: GatewayErrorKind,

    /// Human-readable message.
    pub message: String,

    /// Vendor's error code (if available).
    pub vendor_code: Option<String>,
}

impl GatewayError {
    /// Create a new gateway error.
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            vendor_code: None,
        }
    }

    /// Attach the vendor's error code.
    pub fn with_vendor_code(mut self, code: impl Into<String>) -> Self {
        self.vendor_code = Some(code.into());
        self
    }

    /// Gateway credentials are absent (billing disabled).
    pub fn not_configured() -> Self {
        Self::new(
            GatewayErrorKind::NotConfigured,
            "Billing is disabled: gateway credentials are not configured",
        )
    }

    /// Webhook signature did not verify.
    pub fn invalid_signature(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::InvalidSignature, message)
    }

    /// Webhook payload could not be parsed.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::InvalidPayload, message)
    }

    /// Network failure talking to the vendor.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Network, message)
    }

    /// Vendor rejected the request.
    pub fn vendor(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Vendor, message)
    }

    /// Vendor-side resource not found.
    pub fn not_found(resource: &str) -> Self {
        Self::new(GatewayErrorKind::NotFound, format!("{} not found", resource))
    }

    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, GatewayErrorKind::Network)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        let code = match err.kind {
            GatewayErrorKind::NotConfigured => ErrorCode::GatewayNotConfigured,
            GatewayErrorKind::InvalidSignature => ErrorCode::InvalidWebhookSignature,
            GatewayErrorKind::InvalidPayload => ErrorCode::ValidationFailed,
            _ => ErrorCode::GatewayError,
        };
        DomainError::new(code, err.message)
    }
}

/// Gateway error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorKind {
    /// Credentials absent; billing disabled.
    NotConfigured,

    /// Webhook signature verification failed.
    InvalidSignature,

    /// Webhook payload was malformed.
    InvalidPayload,

    /// Network connectivity issue.
    Network,

    /// Vendor API rejected the request.
    Vendor,

    /// Vendor-side resource not found.
    NotFound,
}

impl std::fmt::Display for GatewayErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorKind::NotConfigured => "not_configured",
            GatewayErrorKind::InvalidSignature => "invalid_signature",
            GatewayErrorKind::InvalidPayload => "invalid_payload",
            GatewayErrorKind::Network => "network_error",
            GatewayErrorKind::Vendor => "vendor_error",
            GatewayErrorKind::NotFound => "not_found",
        };
        write!(f, "{}", s)
    }
}
