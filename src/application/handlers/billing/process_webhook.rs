//! ProcessWebhookHandler - Command handler for vendor webhook deliveries.
//!
//! Control flow: signature verification at the gateway boundary, then
//! event-type dispatch into the reconciliation engine. The engine never sees
//! a payload whose signature did not verify.

use std::sync::Arc;

use crate::domain::billing::{BillingError, ReconcileError, ReconcileOutcome, ReconciliationEngine};
use crate::ports::BillingGateway;

/// Command to process one webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// Raw (unparsed) request body; the signature covers these exact bytes.
    pub payload: Vec<u8>,
    /// Value of the vendor's signature header.
    pub signature: String,
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessWebhookResult {
    /// The event was dispatched and the store reflects it.
    Reconciled(ReconcileOutcome),
    /// The event was unprocessable in a way retrying cannot fix; it was
    /// logged and dropped, and the vendor gets a success response.
    Dropped { reason: String },
}

/// Handler for vendor webhook deliveries.
pub struct ProcessWebhookHandler {
    gateway: Arc<dyn BillingGateway>,
    engine: ReconciliationEngine,
}

impl ProcessWebhookHandler {
    pub fn new(gateway: Arc<dyn BillingGateway>, engine: ReconciliationEngine) -> Self {
        Self { gateway, engine }
    }

    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<ProcessWebhookResult, BillingError> {
        // 1. Verify signature over the raw body and parse the event.
        let event = self
            .gateway
            .verify_webhook(&cmd.payload, &cmd.signature)
            .await
            .map_err(BillingError::from)?;

        tracing::info!(event_type = event.type_name(), "Webhook verified");

        // 2. Reconcile. Owner-less events are dropped, not retried: the
        //    missing linkage cannot appear on redelivery.
        match self.engine.process(event).await {
            Ok(outcome) => Ok(ProcessWebhookResult::Reconciled(outcome)),
            Err(err @ ReconcileError::MissingOwner { .. }) => {
                tracing::warn!(error = %err, "Dropping unprocessable webhook event");
                Ok(ProcessWebhookResult::Dropped {
                    reason: err.to_string(),
                })
            }
            Err(ReconcileError::Store(inner)) => {
                Err(BillingError::reconciliation(inner.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::test_support::{
        vendor_payment_intent, vendor_subscription,
    };
    use crate::domain::billing::{Subscription, SubscriptionStatus, VendorEvent, VendorSubscription};
    use crate::domain::foundation::{DomainError, SubscriptionId, UserId};
    use crate::ports::{GatewayError, PaymentStore, SubscriptionStore};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    struct MockGateway {
        event: Option<VendorEvent>,
        fail_verify: bool,
    }

    impl MockGateway {
        fn with_event(event: VendorEvent) -> Self {
            Self {
                event: Some(event),
                fail_verify: false,
            }
        }

        fn failing() -> Self {
            Self {
                event: None,
                fail_verify: true,
            }
        }
    }

    #[async_trait]
    impl BillingGateway for MockGateway {
        async fn create_subscription(
            &self,
            _customer_ref: &str,
            _price_ref: &str,
            _metadata: HashMap<String, String>,
        ) -> Result<VendorSubscription, GatewayError> {
            Ok(vendor_subscription("sub_mock", "active", "user-1"))
        }

        async fn cancel_subscription(
            &self,
            vendor_subscription_id: &str,
            _immediate: bool,
        ) -> Result<VendorSubscription, GatewayError> {
            Ok(vendor_subscription(
                vendor_subscription_id,
                "canceled",
                "user-1",
            ))
        }

        async fn create_payment_intent(
            &self,
            _customer_ref: &str,
            _amount_minor: i64,
            _currency: &str,
            _metadata: HashMap<String, String>,
        ) -> Result<crate::domain::billing::VendorPaymentIntent, GatewayError> {
            Ok(vendor_payment_intent("pi_mock", "processing", "user-1"))
        }

        async fn verify_webhook(
            &self,
            _payload: &[u8],
            _signature: &str,
        ) -> Result<VendorEvent, GatewayError> {
            if self.fail_verify {
                return Err(GatewayError::invalid_signature("Invalid signature"));
            }
            self.event
                .clone()
                .ok_or_else(|| GatewayError::invalid_payload("No event"))
        }
    }

    struct MockSubscriptionStore {
        rows: Mutex<Vec<Subscription>>,
    }

    impl MockSubscriptionStore {
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
    impl SubscriptionStore for MockSubscriptionStore {
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

        async fn find_by_id(
            &self,
            id: &SubscriptionId,
        ) -> Result<Option<Subscription>, DomainError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|s| &s.id == id)
                .cloned())
        }
    }

    struct MockPaymentStore {
        rows: Mutex<Vec<crate::domain::billing::Payment>>,
    }

    impl MockPaymentStore {
        fn new() -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
            }
        }

        fn rows(&self) -> Vec<crate::domain::billing::Payment> {
            self.rows.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaymentStore for MockPaymentStore {
        async fn insert(
            &self,
            payment: &crate::domain::billing::Payment,
        ) -> Result<(), DomainError> {
            self.rows.lock().unwrap().push(payment.clone());
            Ok(())
        }

        async fn update(
            &self,
            payment: &crate::domain::billing::Payment,
        ) -> Result<(), DomainError> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.iter_mut().find(|p| p.id == payment.id) {
                *row = payment.clone();
            }
            Ok(())
        }

        async fn find_by_vendor_id(
            &self,
            vendor_payment_intent_id: &str,
        ) -> Result<Option<crate::domain::billing::Payment>, DomainError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.vendor_payment_intent_id == vendor_payment_intent_id)
                .cloned())
        }
    }

    fn handler_with(
        gateway: MockGateway,
        subs: Arc<MockSubscriptionStore>,
        pays: Arc<MockPaymentStore>,
    ) -> ProcessWebhookHandler {
        let engine = ReconciliationEngine::new(subs, pays);
        ProcessWebhookHandler::new(Arc::new(gateway), engine)
    }

    fn command() -> ProcessWebhookCommand {
        ProcessWebhookCommand {
            payload: b"{}".to_vec(),
            signature: "t=0,v1=mock".to_string(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn subscription_event_reconciles_into_store() {
        let subs = Arc::new(MockSubscriptionStore::new());
        let pays = Arc::new(MockPaymentStore::new());
        let event =
            VendorEvent::SubscriptionCreated(vendor_subscription("sub_1", "active", "user-1"));
        let handler = handler_with(MockGateway::with_event(event), subs.clone(), pays);

        let result = handler.handle(command()).await.unwrap();

        assert!(matches!(
            result,
            ProcessWebhookResult::Reconciled(ReconcileOutcome::SubscriptionUpserted { .. })
        ));
        assert_eq!(subs.rows().len(), 1);
        assert_eq!(subs.rows()[0].status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn signature_failure_surfaces_and_writes_nothing() {
        let subs = Arc::new(MockSubscriptionStore::new());
        let pays = Arc::new(MockPaymentStore::new());
        let handler = handler_with(MockGateway::failing(), subs.clone(), pays.clone());

        let result = handler.handle(command()).await;

        assert!(matches!(
            result,
            Err(BillingError::InvalidWebhookSignature)
        ));
        assert!(subs.rows().is_empty(), "no store mutation");
        assert!(pays.rows().is_empty(), "no store mutation");
    }

    #[tokio::test]
    async fn owner_less_event_is_dropped_not_errored() {
        let subs = Arc::new(MockSubscriptionStore::new());
        let pays = Arc::new(MockPaymentStore::new());
        let mut vendor = vendor_subscription("sub_1", "active", "user-1");
        vendor.metadata.clear();
        let handler = handler_with(
            MockGateway::with_event(VendorEvent::SubscriptionCreated(vendor)),
            subs.clone(),
            pays,
        );

        let result = handler.handle(command()).await.unwrap();

        assert!(matches!(result, ProcessWebhookResult::Dropped { .. }));
        assert!(subs.rows().is_empty(), "no store mutation");
    }

    #[tokio::test]
    async fn payment_event_reconciles_into_store() {
        let subs = Arc::new(MockSubscriptionStore::new());
        let pays = Arc::new(MockPaymentStore::new());
        let event =
            VendorEvent::PaymentSucceeded(vendor_payment_intent("pi_1", "succeeded", "user-1"));
        let handler = handler_with(MockGateway::with_event(event), subs, pays.clone());

        let result = handler.handle(command()).await.unwrap();

        assert!(matches!(
            result,
            ProcessWebhookResult::Reconciled(ReconcileOutcome::PaymentUpserted { .. })
        ));
        assert_eq!(pays.rows().len(), 1);
    }

    #[tokio::test]
    async fn unknown_event_type_is_acknowledged() {
        let subs = Arc::new(MockSubscriptionStore::new());
        let pays = Arc::new(MockPaymentStore::new());
        let event = VendorEvent::Ignored {
            event_type: "customer.created".to_string(),
        };
        let handler = handler_with(MockGateway::with_event(event), subs.clone(), pays.clone());

        let result = handler.handle(command()).await.unwrap();

        assert_eq!(
            result,
            ProcessWebhookResult::Reconciled(ReconcileOutcome::Ignored)
        );
        assert!(subs.rows().is_empty());
        assert!(pays.rows().is_empty());
    }
}
