//! Integration tests for the webhook reconciliation flow.
//!
//! These tests drive the axum webhook handler with real HMAC-signed
//! payloads through the real Stripe gateway adapter, backed by in-memory
//! stores:
//! 1. Signature verification happens over the raw body
//! 2. Verified events reconcile into the stores
//! 3. Response codes steer the vendor's retry behavior

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sha2::Sha256;
use std::str::FromStr;

use cinebill::adapters::http::billing::handlers::handle_stripe_webhook;
use cinebill::adapters::http::billing::BillingAppState;
use cinebill::adapters::stripe::{StripeGateway, StripeGatewayConfig};
use cinebill::domain::billing::{
    AdminFunding, Payment, PaymentStatus, Subscription, SubscriptionStatus,
};
use cinebill::domain::foundation::{DomainError, SubscriptionId, UserId};
use cinebill::ports::{FundingStore, PaymentStore, SubscriptionStore, UserStore};

const TEST_SECRET: &str = "whsec_integration_test_secret";
const TEST_USER: &str = "550e8400-e29b-41d4-a716-446655440000";

// =============================================================================
// Test Infrastructure
// =============================================================================

/// In-memory subscription store for testing.
struct InMemorySubscriptionStore {
    rows: Mutex<Vec<Subscription>>,
}

impl InMemorySubscriptionStore {
    fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    fn rows(&self) -> Vec<Subscription> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        self.rows.lock().unwrap().push(subscription.clone());
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|s| s.id == subscription.id) {
            *row = subscription.clone();
        }
        Ok(())
    }

    async fn find_by_vendor_id(
        &self,
        vendor_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.vendor_subscription_id.as_deref() == Some(vendor_subscription_id))
            .cloned())
    }

    async fn find_latest_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|s| &s.user_id == user_id)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|s| &s.id == id)
            .cloned())
    }
}

/// In-memory payment store for testing.
struct InMemoryPaymentStore {
    rows: Mutex<Vec<Payment>>,
}

impl InMemoryPaymentStore {
    fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    fn rows(&self) -> Vec<Payment> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: &Payment) -> Result<(), DomainError> {
        self.rows.lock().unwrap().push(payment.clone());
        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|p| p.id == payment.id) {
            *row = payment.clone();
        }
        Ok(())
    }

    async fn find_by_vendor_id(
        &self,
        vendor_payment_intent_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.vendor_payment_intent_id == vendor_payment_intent_id)
            .cloned())
    }
}

struct StubFundingStore;

#[async_trait]
impl FundingStore for StubFundingStore {
    async fn insert(&self, _funding: &AdminFunding) -> Result<(), DomainError> {
        Ok(())
    }

    async fn list_by_user(&self, _user_id: &UserId) -> Result<Vec<AdminFunding>, DomainError> {
        Ok(vec![])
    }
}

struct StubUserStore;

#[async_trait]
impl UserStore for StubUserStore {
    async fn exists(&self, _user_id: &UserId) -> Result<bool, DomainError> {
        Ok(true)
    }

    async fn set_subscription_status(
        &self,
        _user_id: &UserId,
        _status: SubscriptionStatus,
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

struct TestApp {
    state: BillingAppState,
    subscriptions: Arc<InMemorySubscriptionStore>,
    payments: Arc<InMemoryPaymentStore>,
}

fn test_app() -> TestApp {
    let subscriptions = Arc::new(InMemorySubscriptionStore::new());
    let payments = Arc::new(InMemoryPaymentStore::new());
    let gateway = StripeGateway::new(StripeGatewayConfig::new("sk_test_key", TEST_SECRET));

    let state = BillingAppState {
        subscriptions: subscriptions.clone(),
        payments: payments.clone(),
        fundings: Arc::new(StubFundingStore),
        users: Arc::new(StubUserStore),
        gateway: Arc::new(gateway),
    };

    TestApp {
        state,
        subscriptions,
        payments,
    }
}

/// Sign a payload the way Stripe does: HMAC-SHA256 over `timestamp.payload`.
fn sign(payload: &str) -> HeaderMap {
    let timestamp = chrono::Utc::now().timestamp();
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac = Hmac::<Sha256>::new_from_slice(TEST_SECRET.as_bytes()).unwrap();
    mac.update(signed_payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    let mut headers = HeaderMap::new();
    headers.insert(
        "Stripe-Signature",
        format!("t={},v1={}", timestamp, signature).parse().unwrap(),
    );
    headers
}

fn subscription_event(event_type: &str, sub_id: &str, status: &str) -> String {
    serde_json::json!({
        "id": "evt_integration",
        "type": event_type,
        "created": chrono::Utc::now().timestamp(),
        "data": {
            "object": {
                "id": sub_id,
                "customer": "cus_test",
                "status": status,
                "current_period_start": 1704067200,
                "current_period_end": 1706745600,
                "cancel_at_period_end": false,
                "metadata": {"user_id": TEST_USER},
                "items": {
                    "data": [{
                        "id": "si_1",
                        "price": {
                            "id": "price_monthly",
                            "unit_amount": 1299,
                            "currency": "usd",
                            "recurring": {"interval": "month", "interval_count": 1}
                        },
                        "quantity": 1
                    }]
                }
            }
        },
        "livemode": false,
        "pending_webhooks": 1
    })
    .to_string()
}

fn payment_event(event_type: &str, intent_id: &str, status: &str, amount: i64) -> String {
    serde_json::json!({
        "id": "evt_payment",
        "type": event_type,
        "created": chrono::Utc::now().timestamp(),
        "data": {
            "object": {
                "id": intent_id,
                "customer": "cus_test",
                "status": status,
                "amount": amount,
                "currency": "usd",
                "payment_method_types": ["card"],
                "metadata": {"user_id": TEST_USER}
            }
        },
        "livemode": false
    })
    .to_string()
}

async fn deliver(app: &TestApp, payload: &str, headers: HeaderMap) -> StatusCode {
    let response = handle_stripe_webhook(
        State(app.state.clone()),
        headers,
        Bytes::from(payload.to_string()),
    )
    .await;
    response.status()
}

// =============================================================================
// Webhook Flow Tests
// =============================================================================

#[tokio::test]
async fn signed_subscription_event_creates_row() {
    let app = test_app();
    let payload = subscription_event("customer.subscription.created", "sub_int_1", "active");

    let status = deliver(&app, &payload, sign(&payload)).await;

    assert_eq!(status, StatusCode::OK);
    let rows = app.subscriptions.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].vendor_subscription_id.as_deref(), Some("sub_int_1"));
    assert_eq!(rows[0].status, SubscriptionStatus::Active);
    assert_eq!(rows[0].user_id.as_str(), TEST_USER);
}

#[tokio::test]
async fn replayed_delivery_is_idempotent() {
    let app = test_app();
    let payload = subscription_event("customer.subscription.updated", "sub_int_2", "trialing");

    let first = deliver(&app, &payload, sign(&payload)).await;
    let after_first = app.subscriptions.rows();
    let second = deliver(&app, &payload, sign(&payload)).await;
    let after_second = app.subscriptions.rows();

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(after_second.len(), 1, "no duplicate rows");
    assert_eq!(after_first[0].id, after_second[0].id);
    assert_eq!(after_first[0].status, after_second[0].status);
    assert_eq!(
        after_first[0].current_period_end,
        after_second[0].current_period_end
    );
}

#[tokio::test]
async fn tampered_body_is_rejected_before_any_write() {
    let app = test_app();
    let payload = subscription_event("customer.subscription.created", "sub_int_3", "active");
    let headers = sign(&payload);
    let tampered = payload.replace("active", "canceled");

    let status = deliver(&app, &tampered, headers).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.subscriptions.rows().is_empty(), "zero store writes");
    assert!(app.payments.rows().is_empty(), "zero store writes");
}

#[tokio::test]
async fn missing_signature_header_is_rejected() {
    let app = test_app();
    let payload = subscription_event("customer.subscription.created", "sub_int_4", "active");

    let status = deliver(&app, &payload, HeaderMap::new()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.subscriptions.rows().is_empty());
}

#[tokio::test]
async fn missing_webhook_secret_is_rejected() {
    let subscriptions = Arc::new(InMemorySubscriptionStore::new());
    let payments = Arc::new(InMemoryPaymentStore::new());
    let app = TestApp {
        state: BillingAppState {
            subscriptions: subscriptions.clone(),
            payments: payments.clone(),
            fundings: Arc::new(StubFundingStore),
            users: Arc::new(StubUserStore),
            gateway: Arc::new(StripeGateway::new(StripeGatewayConfig::disabled())),
        },
        subscriptions,
        payments,
    };
    let payload = subscription_event("customer.subscription.created", "sub_int_5", "active");

    let status = deliver(&app, &payload, sign(&payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.subscriptions.rows().is_empty());
}

#[tokio::test]
async fn subscription_deleted_cancels_existing_row() {
    let app = test_app();
    let created = subscription_event("customer.subscription.created", "sub_int_6", "active");
    deliver(&app, &created, sign(&created)).await;

    let deleted = subscription_event("customer.subscription.deleted", "sub_int_6", "canceled");
    let status = deliver(&app, &deleted, sign(&deleted)).await;

    assert_eq!(status, StatusCode::OK);
    let rows = app.subscriptions.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, SubscriptionStatus::Cancelled);
    assert!(rows[0].cancelled_at.is_some());
}

#[tokio::test]
async fn subscription_deleted_for_unknown_row_still_succeeds() {
    let app = test_app();
    let deleted = subscription_event("customer.subscription.deleted", "sub_never_seen", "canceled");

    let status = deliver(&app, &deleted, sign(&deleted)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(app.subscriptions.rows().is_empty());
}

#[tokio::test]
async fn unknown_event_type_is_acknowledged() {
    let app = test_app();
    let payload = serde_json::json!({
        "id": "evt_other",
        "type": "invoice.finalized",
        "created": chrono::Utc::now().timestamp(),
        "data": {"object": {"id": "in_1"}},
        "livemode": false
    })
    .to_string();

    let status = deliver(&app, &payload, sign(&payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(app.subscriptions.rows().is_empty());
    assert!(app.payments.rows().is_empty());
}

#[tokio::test]
async fn owner_less_event_is_dropped_with_success_response() {
    let app = test_app();
    let payload = serde_json::json!({
        "id": "evt_no_owner",
        "type": "customer.subscription.updated",
        "created": chrono::Utc::now().timestamp(),
        "data": {
            "object": {
                "id": "sub_no_owner",
                "customer": "cus_test",
                "status": "active",
                "current_period_start": 1704067200,
                "current_period_end": 1706745600,
                "metadata": {}
            }
        },
        "livemode": false
    })
    .to_string();

    let status = deliver(&app, &payload, sign(&payload)).await;

    // Success-shaped so the vendor does not retry forever
    assert_eq!(status, StatusCode::OK);
    assert!(app.subscriptions.rows().is_empty(), "no store mutation");
}

#[tokio::test]
async fn payment_intent_succeeded_converts_minor_units() {
    let app = test_app();
    let payload = payment_event("payment_intent.succeeded", "pi_int_1", "succeeded", 1999);

    let status = deliver(&app, &payload, sign(&payload)).await;

    assert_eq!(status, StatusCode::OK);
    let rows = app.payments.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, Decimal::from_str("19.99").unwrap());
    assert_eq!(rows[0].currency, "usd");
    assert_eq!(rows[0].status, PaymentStatus::Succeeded);
}

#[tokio::test]
async fn payment_links_to_subscription_created_earlier() {
    let app = test_app();
    let sub_payload = subscription_event("customer.subscription.created", "sub_int_7", "active");
    deliver(&app, &sub_payload, sign(&sub_payload)).await;

    let pay_payload = payment_event("payment_intent.succeeded", "pi_int_2", "succeeded", 1299);
    deliver(&app, &pay_payload, sign(&pay_payload)).await;

    let sub_id = app.subscriptions.rows()[0].id;
    assert_eq!(app.payments.rows()[0].subscription_id, Some(sub_id));
}

#[tokio::test]
async fn payment_failed_then_succeeded_settles_on_last_event() {
    let app = test_app();
    let failed = payment_event("payment_intent.payment_failed", "pi_int_3", "failed", 1299);
    deliver(&app, &failed, sign(&failed)).await;

    let succeeded = payment_event("payment_intent.succeeded", "pi_int_3", "succeeded", 1299);
    deliver(&app, &succeeded, sign(&succeeded)).await;

    let rows = app.payments.rows();
    assert_eq!(rows.len(), 1, "same vendor id, one row");
    assert_eq!(rows[0].status, PaymentStatus::Succeeded);
}
