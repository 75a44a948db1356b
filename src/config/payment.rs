//! Payment configuration

use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Payment configuration (Stripe)
///
/// Both credentials are optional outside production: without them the gateway
/// runs in "billing disabled" mode and every gateway call fails with a
/// not-configured error instead of crashing the process. In production both
/// are mandatory and startup validation fails fast.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret API key (sk_test_... or sk_live_...)
    pub stripe_api_key: Option<String>,

    /// Stripe webhook signing secret (whsec_...)
    pub stripe_webhook_secret: Option<String>,

    /// Stripe price ID for the monthly plan
    pub stripe_monthly_price_id: Option<String>,

    /// Stripe price ID for the yearly plan
    pub stripe_yearly_price_id: Option<String>,
}

impl PaymentConfig {
    /// Check if the gateway has the credentials it needs to operate
    pub fn is_configured(&self) -> bool {
        self.stripe_api_key.is_some() && self.stripe_webhook_secret.is_some()
    }

    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key
            .as_deref()
            .map(|k| k.starts_with("sk_test_"))
            .unwrap_or(false)
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key
            .as_deref()
            .map(|k| k.starts_with("sk_live_"))
            .unwrap_or(false)
    }

    /// Validate payment configuration for the given environment
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if *environment == Environment::Production {
            if self.stripe_api_key.is_none() {
                return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
            }
            if self.stripe_webhook_secret.is_none() {
                return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
            }
        }

        // Verify key prefixes for safety whenever values are present
        if let Some(key) = &self.stripe_api_key {
            if !key.starts_with("sk_") {
                return Err(ValidationError::InvalidStripeKey);
            }
        }
        if let Some(secret) = &self.stripe_webhook_secret {
            if !secret.starts_with("whsec_") {
                return Err(ValidationError::InvalidStripeWebhookSecret);
            }
        }

        Ok(())
    }
}
