//! HTTP DTOs (Data Transfer Objects) for billing endpoints.
//!
//! These types define the JSON request/response structure for the billing
//! API. Responses follow the platform's uniform envelope: successes are
//! `{success: true, data, message?}`, failures are
//! `{success: false, error, message, details?}`.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::billing::{
    AdminFunding, FundingStatus, PlanInterval, Subscription, SubscriptionStatus,
};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to grant subscription time to a user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantFundingRequest {
    /// User receiving the grant.
    pub user_id: String,

    /// Calendar months to grant (default 3).
    #[serde(default = "default_months")]
    pub months: u32,

    /// Nominal amount recorded on the audit row (default 0).
    #[serde(default)]
    pub amount: Decimal,
}

fn default_months() -> u32 {
    3
}

/// Request to cancel the caller's subscription.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelSubscriptionRequest {
    /// True cancels on the vendor immediately; false at period end.
    #[serde(default)]
    pub immediate: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response Envelope
// ════════════════════════════════════════════════════════════════════════════════

/// Uniform success envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Success with data only.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    /// Success with data and a human-readable message.
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

/// Uniform error envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
}

impl ErrorResponse {
    /// Creates an error envelope.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Attaches a field-level detail map (validation failures).
    pub fn with_details(mut self, details: HashMap<String, String>) -> Self {
        self.details = Some(details);
        self
    }
}

/// Acknowledgement body for webhook deliveries.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self { received: true }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Subscription view for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    /// Subscription ID.
    pub id: String,
    /// Owning user ID.
    pub user_id: String,
    /// Vendor subscription id, absent for admin-funded rows.
    pub vendor_subscription_id: Option<String>,
    /// Lifecycle status.
    pub status: SubscriptionStatus,
    /// Billing plan interval.
    pub plan: PlanInterval,
    /// Subscription start (ISO 8601).
    pub start_date: String,
    /// Subscription end (ISO 8601).
    pub end_date: String,
    /// Current billing period start (ISO 8601).
    pub current_period_start: String,
    /// Current billing period end (ISO 8601).
    pub current_period_end: String,
    /// True for admin-granted (non-billed) subscriptions.
    pub funded_by_admin: bool,
    /// Cancellation time, if cancelled (ISO 8601).
    pub cancelled_at: Option<String>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        Self {
            id: sub.id.to_string(),
            user_id: sub.user_id.to_string(),
            vendor_subscription_id: sub.vendor_subscription_id,
            status: sub.status,
            plan: sub.plan,
            start_date: sub.start_date.as_datetime().to_rfc3339(),
            end_date: sub.end_date.as_datetime().to_rfc3339(),
            current_period_start: sub.current_period_start.as_datetime().to_rfc3339(),
            current_period_end: sub.current_period_end.as_datetime().to_rfc3339(),
            funded_by_admin: sub.funded_by_admin,
            cancelled_at: sub.cancelled_at.map(|t| t.as_datetime().to_rfc3339()),
        }
    }
}

/// Funding record view for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct FundingResponse {
    /// Funding record ID.
    pub id: String,
    /// User who received the grant.
    pub user_id: String,
    /// Nominal amount granted.
    pub amount: Decimal,
    /// Months granted.
    pub months_funded: i32,
    /// Grant start (ISO 8601).
    pub start_date: String,
    /// Grant end (ISO 8601).
    pub end_date: String,
    /// Record status.
    pub status: FundingStatus,
    /// Admin who performed the grant.
    pub granted_by: String,
}

impl From<AdminFunding> for FundingResponse {
    fn from(funding: AdminFunding) -> Self {
        Self {
            id: funding.id.to_string(),
            user_id: funding.user_id.to_string(),
            amount: funding.amount,
            months_funded: funding.months_funded,
            start_date: funding.start_date.as_datetime().to_rfc3339(),
            end_date: funding.end_date.as_datetime().to_rfc3339(),
            status: funding.status,
            granted_by: funding.granted_by.to_string(),
        }
    }
}

/// Combined result of a funding grant.
#[derive(Debug, Clone, Serialize)]
pub struct GrantFundingResponse {
    /// The audit row that was created.
    pub funding: FundingResponse,
    /// The subscription row that was created or extended.
    pub subscription: SubscriptionResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_funding_request_applies_defaults() {
        let json = r#"{"userId": "550e8400-e29b-41d4-a716-446655440000"}"#;
        let request: GrantFundingRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.months, 3);
        assert_eq!(request.amount, Decimal::ZERO);
    }

    #[test]
    fn grant_funding_request_accepts_explicit_values() {
        let json = r#"{"userId": "u-1", "months": 6, "amount": 9.99}"#;
        let request: GrantFundingRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.user_id, "u-1");
        assert_eq!(request.months, 6);
        assert_eq!(request.amount.to_string(), "9.99");
    }

    #[test]
    fn cancel_request_defaults_to_period_end() {
        let request: CancelSubscriptionRequest = serde_json::from_str("{}").unwrap();
        assert!(!request.immediate);
    }

    #[test]
    fn success_envelope_shape() {
        let response = ApiResponse::with_message(serde_json::json!({"x": 1}), "done");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], serde_json::json!(true));
        assert_eq!(json["data"]["x"], serde_json::json!(1));
        assert_eq!(json["message"], serde_json::json!("done"));
    }

    #[test]
    fn success_envelope_omits_absent_message() {
        let response = ApiResponse::ok(serde_json::json!(null));
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("message").is_none());
    }

    #[test]
    fn error_envelope_shape() {
        let mut details = HashMap::new();
        details.insert("months".to_string(), "must be at least 1".to_string());
        let response = ErrorResponse::new("VALIDATION_FAILED", "Validation failed")
            .with_details(details);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], serde_json::json!(false));
        assert_eq!(json["error"], serde_json::json!("VALIDATION_FAILED"));
        assert_eq!(
            json["details"]["months"],
            serde_json::json!("must be at least 1")
        );
    }

    #[test]
    fn webhook_ack_shape() {
        let json = serde_json::to_value(WebhookAck::received()).unwrap();
        assert_eq!(json, serde_json::json!({"received": true}));
    }
}
