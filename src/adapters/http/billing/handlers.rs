//! HTTP handlers for billing endpoints.
//!
//! These handlers connect axum routes to the application layer command
//! handlers.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::billing::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, GrantFundingCommand, GrantFundingHandler,
    ProcessWebhookCommand, ProcessWebhookHandler,
};
use crate::domain::billing::{BillingError, ReconciliationEngine};
use crate::domain::foundation::UserId;
use crate::ports::{BillingGateway, FundingStore, PaymentStore, SubscriptionStore, UserStore};

use super::dto::{
    ApiResponse, CancelSubscriptionRequest, ErrorResponse, GrantFundingRequest,
    GrantFundingResponse, SubscriptionResponse, WebhookAck,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all billing dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped
/// dependencies for efficient sharing across handlers.
#[derive(Clone)]
pub struct BillingAppState {
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub payments: Arc<dyn PaymentStore>,
    pub fundings: Arc<dyn FundingStore>,
    pub users: Arc<dyn UserStore>,
    pub gateway: Arc<dyn BillingGateway>,
}

impl BillingAppState {
    /// Create handlers on demand from the shared state.
    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        let engine = ReconciliationEngine::new(self.subscriptions.clone(), self.payments.clone());
        ProcessWebhookHandler::new(self.gateway.clone(), engine)
    }

    pub fn grant_funding_handler(&self) -> GrantFundingHandler {
        GrantFundingHandler::new(
            self.users.clone(),
            self.subscriptions.clone(),
            self.fundings.clone(),
        )
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(self.subscriptions.clone(), self.gateway.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Actor Context (set by the platform's auth middleware upstream)
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated user context extracted from the request.
///
/// In production the JWT middleware upstream resolves the token and injects
/// the user id; here it is read from the `X-User-Id` header that middleware
/// sets.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Admin actor context for privileged endpoints.
///
/// The elevated-role capability check happens in the auth middleware before
/// the request reaches this module; by the time we read `X-Admin-Id`, the
/// caller has already been authorized.
#[derive(Debug, Clone)]
pub struct AdminActor {
    pub admin_id: UserId,
}

/// Rejection type for actor extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let user_id = parts
                .headers
                .get("X-User-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| UserId::new(s).ok())
                .ok_or(AuthenticationRequired)?;

            Ok(AuthenticatedUser { user_id })
        })
    }
}

impl<S> axum::extract::FromRequestParts<S> for AdminActor
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let admin_id = parts
                .headers
                .get("X-Admin-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| UserId::new(s).ok())
                .ok_or(AuthenticationRequired)?;

            Ok(AdminActor { admin_id })
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Endpoint
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/stripe - Handle vendor webhook deliveries.
///
/// Response contract, chosen to steer the vendor's retry behavior:
/// - `{"received": true}` (200) for every dispatched event, including
///   ignored types and dropped owner-less events - retrying those can
///   never help
/// - 400 on a missing header, missing secret, or failed signature -
///   permanent, never retried
/// - 500 on persistence failure - the vendor redelivers
pub async fn handle_stripe_webhook(
    State(state): State<BillingAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> axum::response::Response {
    let signature = match headers.get("Stripe-Signature").and_then(|v| v.to_str().ok()) {
        Some(signature) => signature.to_string(),
        None => {
            let error =
                ErrorResponse::new("MISSING_SIGNATURE", "Missing Stripe-Signature header");
            return (StatusCode::BAD_REQUEST, Json(error)).into_response();
        }
    };

    let handler = state.webhook_handler();
    let cmd = ProcessWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    match handler.handle(cmd).await {
        Ok(_) => (StatusCode::OK, Json(WebhookAck::received())).into_response(),
        Err(err) => {
            let status = match &err {
                // Absent secret and bad signature are both permanent 400s on
                // the webhook surface
                BillingError::InvalidWebhookSignature | BillingError::BillingDisabled => {
                    StatusCode::BAD_REQUEST
                }
                _ if err.is_retryable() => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            };
            tracing::error!(error = %err, "Webhook processing failed");
            let error = ErrorResponse::new(err.code().to_string(), err.message());
            (status, Json(error)).into_response()
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Funding and Subscription Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/admin/funding - Grant subscription time to a user.
pub async fn grant_funding(
    State(state): State<BillingAppState>,
    admin: AdminActor,
    Json(request): Json<GrantFundingRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let user_id = UserId::new(request.user_id)
        .map_err(|e| BillingError::validation("userId", e.to_string()))?;

    let handler = state.grant_funding_handler();
    let cmd = GrantFundingCommand {
        user_id,
        admin_id: admin.admin_id,
        months: request.months,
        amount: request.amount,
    };

    let result = handler.handle(cmd).await?;

    let response = GrantFundingResponse {
        funding: result.funding.into(),
        subscription: result.subscription.into(),
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(response, "Funding granted")),
    ))
}

/// POST /api/subscriptions/cancel - Cancel the caller's subscription.
pub async fn cancel_subscription(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CancelSubscriptionRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.cancel_subscription_handler();
    let cmd = CancelSubscriptionCommand {
        user_id: user.user_id,
        immediate: request.immediate,
    };

    let result = handler.handle(cmd).await?;

    let response: SubscriptionResponse = result.subscription.into();
    Ok(Json(ApiResponse::ok(response)))
}

/// GET /api/subscriptions/me - The caller's current (latest) subscription.
pub async fn get_my_subscription(
    State(state): State<BillingAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, BillingApiError> {
    let subscription = state
        .subscriptions
        .find_latest_by_user(&user.user_id)
        .await
        .map_err(BillingError::from)?;

    let response = subscription.map(SubscriptionResponse::from);
    Ok(Json(ApiResponse::ok(response)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
#[derive(Debug)]
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            BillingError::InvalidWebhookSignature => StatusCode::BAD_REQUEST,
            BillingError::BillingDisabled => StatusCode::SERVICE_UNAVAILABLE,
            BillingError::MissingOwner { .. } => StatusCode::BAD_REQUEST,
            BillingError::UserNotFound(_) | BillingError::SubscriptionNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            BillingError::Validation { .. } => StatusCode::BAD_REQUEST,
            BillingError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            BillingError::Reconciliation(_) | BillingError::Infrastructure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let mut body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        if let BillingError::Validation { field, message } = &self.0 {
            let mut details = std::collections::HashMap::new();
            details.insert(field.clone(), message.clone());
            body = body.with_details(details);
        }

        (status, Json(body)).into_response()
    }
}
