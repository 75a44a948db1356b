//! Stripe billing gateway adapter.
//!
//! Implements the `BillingGateway` port against the Stripe API.
//!
//! # Security
//!
//! - HMAC-SHA256 signature verification with constant-time comparison
//! - Timestamp validation (5-minute window) for replay attack prevention
//! - Secrets handled via `secrecy::SecretString`
//!
//! # Degraded mode
//!
//! Credentials are optional outside production. An unconfigured gateway
//! reports `NotConfigured` on every call instead of panicking, so a
//! development instance runs fine with billing switched off.

use std::collections::HashMap;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::PaymentConfig;
use crate::domain::billing::{VendorEvent, VendorPaymentIntent, VendorSubscription};
use crate::ports::{BillingGateway, GatewayError};

use super::webhook_types::{
    SignatureHeader, StripePaymentIntent, StripeSubscription, StripeWebhookEvent,
};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook events (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

/// Stripe gateway configuration.
#[derive(Clone)]
pub struct StripeGatewayConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: Option<SecretString>,

    /// Webhook signing secret (whsec_...).
    webhook_secret: Option<SecretString>,

    /// Base URL for the Stripe API (default: https://api.stripe.com).
    api_base_url: String,
}

impl StripeGatewayConfig {
    /// Create a fully configured gateway config.
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: Some(SecretString::new(api_key.into())),
            webhook_secret: Some(SecretString::new(webhook_secret.into())),
            api_base_url: default_base_url(),
        }
    }

    /// Create an unconfigured config: every gateway call reports
    /// `NotConfigured` (billing disabled).
    pub fn disabled() -> Self {
        Self {
            api_key: None,
            webhook_secret: None,
            api_base_url: default_base_url(),
        }
    }

    /// Build from the application's payment configuration.
    pub fn from_payment_config(config: &PaymentConfig) -> Self {
        Self {
            api_key: config.stripe_api_key.clone().map(SecretString::new),
            webhook_secret: config.stripe_webhook_secret.clone().map(SecretString::new),
            api_base_url: default_base_url(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

fn default_base_url() -> String {
    "https://api.stripe.com".to_string()
}

/// Stripe implementation of the `BillingGateway` port.
pub struct StripeGateway {
    config: StripeGatewayConfig,
    http_client: reqwest::Client,
}

impl StripeGateway {
    /// Create a new gateway with the given configuration.
    pub fn new(config: StripeGatewayConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn api_key(&self) -> Result<&SecretString, GatewayError> {
        self.config.api_key.as_ref().ok_or_else(|| {
            tracing::warn!("Stripe API call attempted without configured credentials");
            GatewayError::not_configured()
        })
    }

    fn webhook_secret(&self) -> Result<&SecretString, GatewayError> {
        self.config
            .webhook_secret
            .as_ref()
            .ok_or_else(GatewayError::not_configured)
    }

    /// Verify webhook signature using HMAC-SHA256.
    ///
    /// # Security
    ///
    /// - Uses constant-time comparison to prevent timing attacks
    /// - Validates timestamp to prevent replay attacks
    fn verify_signature(
        &self,
        payload: &[u8],
        header: &SignatureHeader,
    ) -> Result<(), GatewayError> {
        let secret = self.webhook_secret()?;

        // 1. Validate timestamp (prevent replay attacks)
        let now = chrono::Utc::now().timestamp();
        let age = now - header.timestamp;

        if age > MAX_TIMESTAMP_AGE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                age_secs = age,
                "Webhook event too old - possible replay attack"
            );
            return Err(GatewayError::invalid_signature(format!(
                "Event too old ({} seconds)",
                age
            )));
        }

        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                "Webhook event from future - clock skew or manipulation"
            );
            return Err(GatewayError::invalid_signature("Event timestamp in future"));
        }

        // 2. Compute expected signature over `timestamp.payload`
        let signed_payload = format!("{}.{}", header.timestamp, String::from_utf8_lossy(payload));

        let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key size");
        mac.update(signed_payload.as_bytes());
        let expected = mac.finalize().into_bytes();

        // 3. Constant-time comparison
        let expected_bytes: &[u8] = expected.as_slice();
        let provided_bytes: &[u8] = &header.v1_signature;

        if expected_bytes.len() != provided_bytes.len()
            || expected_bytes.ct_eq(provided_bytes).unwrap_u8() != 1
        {
            tracing::warn!("Invalid webhook signature");
            return Err(GatewayError::invalid_signature("Invalid signature"));
        }

        Ok(())
    }

    async fn parse_subscription_response(
        &self,
        response: reqwest::Response,
    ) -> Result<VendorSubscription, GatewayError> {
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(error = %error_text, "Stripe API request failed");
            return Err(GatewayError::vendor(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        let stripe_sub: StripeSubscription = response.json().await.map_err(|e| {
            GatewayError::vendor(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(stripe_sub.into_vendor())
    }
}

#[async_trait]
impl BillingGateway for StripeGateway {
    async fn create_subscription(
        &self,
        customer_ref: &str,
        price_ref: &str,
        metadata: HashMap<String, String>,
    ) -> Result<VendorSubscription, GatewayError> {
        let api_key = self.api_key()?;
        let url = format!("{}/v1/subscriptions", self.config.api_base_url);

        let mut params = vec![
            ("customer".to_string(), customer_ref.to_string()),
            ("items[0][price]".to_string(), price_ref.to_string()),
        ];
        for (key, value) in &metadata {
            params.push((format!("metadata[{}]", key), value.clone()));
        }

        let response = self
            .http_client
            .post(&url)
            .basic_auth(api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        self.parse_subscription_response(response).await
    }

    async fn cancel_subscription(
        &self,
        vendor_subscription_id: &str,
        immediate: bool,
    ) -> Result<VendorSubscription, GatewayError> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}/v1/subscriptions/{}",
            self.config.api_base_url, vendor_subscription_id
        );

        let response = if immediate {
            // Hard cancel
            self.http_client
                .delete(&url)
                .basic_auth(api_key.expose_secret(), Option::<&str>::None)
                .send()
                .await
        } else {
            // Cancel at period end
            self.http_client
                .post(&url)
                .basic_auth(api_key.expose_secret(), Option::<&str>::None)
                .form(&[("cancel_at_period_end", "true")])
                .send()
                .await
        }
        .map_err(|e| GatewayError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::not_found("Subscription"));
        }

        self.parse_subscription_response(response).await
    }

    async fn create_payment_intent(
        &self,
        customer_ref: &str,
        amount_minor: i64,
        currency: &str,
        metadata: HashMap<String, String>,
    ) -> Result<VendorPaymentIntent, GatewayError> {
        let api_key = self.api_key()?;
        let url = format!("{}/v1/payment_intents", self.config.api_base_url);

        let mut params = vec![
            ("customer".to_string(), customer_ref.to_string()),
            ("amount".to_string(), amount_minor.to_string()),
            ("currency".to_string(), currency.to_string()),
        ];
        for (key, value) in &metadata {
            params.push((format!("metadata[{}]", key), value.clone()));
        }

        let response = self
            .http_client
            .post(&url)
            .basic_auth(api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(error = %error_text, "Stripe create_payment_intent failed");
            return Err(GatewayError::vendor(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        let intent: StripePaymentIntent = response.json().await.map_err(|e| {
            GatewayError::vendor(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(intent.into_vendor())
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<VendorEvent, GatewayError> {
        // 1. Parse signature header
        let header = SignatureHeader::parse(signature).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse Stripe-Signature header");
            GatewayError::invalid_signature(e.to_string())
        })?;

        // 2. Verify signature (includes timestamp validation)
        self.verify_signature(payload, &header)?;

        // 3. Parse the event envelope
        let stripe_event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse webhook payload");
            GatewayError::invalid_payload(format!("Invalid JSON: {}", e))
        })?;

        tracing::info!(
            event_id = %stripe_event.id,
            event_type = %stripe_event.event_type,
            livemode = stripe_event.livemode,
            "Webhook signature verified"
        );

        // 4. Narrow to the domain event set
        stripe_event.into_vendor_event()
    }
}
