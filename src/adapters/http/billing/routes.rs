//! Axum router configuration for billing endpoints.
//!
//! This module defines the route structure for the billing API and wires
//! routes to their handlers.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    cancel_subscription, get_my_subscription, grant_funding, handle_stripe_webhook,
    BillingAppState,
};

/// Create the billing API router.
///
/// # Routes
///
/// ## User Endpoints (require authentication)
/// - `GET /subscriptions/me` - Current subscription of the caller
/// - `POST /subscriptions/cancel` - Cancel the caller's subscription
///
/// ## Admin Endpoints (require elevated role, enforced upstream)
/// - `POST /admin/funding` - Grant subscription time to a user
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/subscriptions/me", get(get_my_subscription))
        .route("/subscriptions/cancel", post(cancel_subscription))
        .route("/admin/funding", post(grant_funding))
}

/// Create the webhook router.
///
/// This is separate from the main billing routes because webhooks carry no
/// user authentication; trust comes from the vendor's signature header.
///
/// # Routes
/// - `POST /stripe` - Handle Stripe webhooks
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// Create the complete billing module router.
///
/// Combines user/admin routes and webhook routes into a single router
/// suitable for mounting at `/api`.
///
/// # Example
///
/// ```ignore
/// use axum::Router;
/// use cinebill::adapters::http::billing::{billing_router, BillingAppState};
///
/// let app_state = BillingAppState { /* ... */ };
/// let app = Router::new()
///     .nest("/api", billing_router())
///     .with_state(app_state);
/// ```
pub fn billing_router() -> Router<BillingAppState> {
    Router::new()
        .merge(billing_routes())
        .nest("/webhooks", webhook_routes())
}
