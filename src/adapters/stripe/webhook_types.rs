//! Stripe-specific types for webhook handling.
//!
//! These types represent Stripe API objects as they arrive in webhook
//! payloads. They are parsed once at the boundary and converted into the
//! domain's `VendorEvent` model so the rest of the service never touches
//! raw vendor JSON.

use serde::{Deserialize, Serialize};

use crate::domain::billing::{VendorEvent, VendorPaymentIntent, VendorSubscription};
use crate::ports::GatewayError;

// ════════════════════════════════════════════════════════════════════════════════
// Signature Parsing
// ════════════════════════════════════════════════════════════════════════════════

/// Error parsing the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureParseError {
    /// Header is empty or missing.
    MissingHeader,
    /// Missing timestamp component (t=...).
    MissingTimestamp,
    /// Missing v1 signature component.
    MissingV1Signature,
    /// Invalid timestamp format.
    InvalidTimestamp,
    /// Invalid signature format (not valid hex).
    InvalidSignatureFormat,
}

impl std::fmt::Display for SignatureParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "Missing Stripe-Signature header"),
            Self::MissingTimestamp => write!(f, "Missing timestamp (t=) in signature"),
            Self::MissingV1Signature => write!(f, "Missing v1 signature in header"),
            Self::InvalidTimestamp => write!(f, "Invalid timestamp format"),
            Self::InvalidSignatureFormat => write!(f, "Invalid signature format (not valid hex)"),
        }
    }
}

impl std::error::Error for SignatureParseError {}

/// Parsed Stripe-Signature header components.
///
/// The header format is: `t=timestamp,v1=signature[,v0=legacy_signature]`
#[derive(Debug, Clone)]
pub struct SignatureHeader {
    /// Unix timestamp when Stripe generated the event.
    pub timestamp: i64,

    /// Primary v1 signature (HMAC-SHA256, hex-encoded).
    pub v1_signature: Vec<u8>,

    /// Legacy v0 signature (deprecated, may be absent).
    pub v0_signature: Option<Vec<u8>>,
}

impl SignatureHeader {
    /// Parse a Stripe-Signature header into components.
    ///
    /// # Format
    ///
    /// ```text
    /// t=<timestamp>,v1=<signature>[,v0=<legacy_signature>]
    /// ```
    pub fn parse(header: &str) -> Result<Self, SignatureParseError> {
        if header.is_empty() {
            return Err(SignatureParseError::MissingHeader);
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;
        let mut v0_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or(SignatureParseError::MissingTimestamp)?;

            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| SignatureParseError::InvalidTimestamp)?,
                    );
                }
                "v1" => {
                    v1_signature = Some(
                        hex::decode(value.trim())
                            .map_err(|_| SignatureParseError::InvalidSignatureFormat)?,
                    );
                }
                "v0" => {
                    v0_signature = Some(
                        hex::decode(value.trim())
                            .map_err(|_| SignatureParseError::InvalidSignatureFormat)?,
                    );
                }
                _ => {
                    // Ignore unknown fields for forward compatibility
                }
            }
        }

        Ok(Self {
            timestamp: timestamp.ok_or(SignatureParseError::MissingTimestamp)?,
            v1_signature: v1_signature.ok_or(SignatureParseError::MissingV1Signature)?,
            v0_signature,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Stripe Event Types
// ════════════════════════════════════════════════════════════════════════════════

/// Raw Stripe webhook event as received from the API.
///
/// This represents the full event envelope containing metadata and payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeWebhookEvent {
    /// Unique event identifier (evt_...).
    pub id: String,

    /// Event type (e.g., "customer.subscription.updated").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp when the event was created.
    pub created: i64,

    /// Event payload containing the affected object.
    pub data: StripeEventData,

    /// Whether this is a live or test event.
    pub livemode: bool,

    /// Stripe API version used for this event.
    pub api_version: Option<String>,

    /// Number of pending webhook deliveries for this event.
    #[serde(default)]
    pub pending_webhooks: i32,
}

/// Event data container.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object affected by this event.
    pub object: serde_json::Value,

    /// Previous values for updated fields (on update events).
    pub previous_attributes: Option<serde_json::Value>,
}

impl StripeWebhookEvent {
    /// Convert the raw event into the domain's closed event set.
    ///
    /// Event types the engine handles get their embedded object parsed and
    /// narrowed; everything else becomes `VendorEvent::Ignored`.
    pub fn into_vendor_event(self) -> Result<VendorEvent, GatewayError> {
        match self.event_type.as_str() {
            "customer.subscription.created" => {
                Ok(VendorEvent::SubscriptionCreated(self.parse_subscription()?))
            }
            "customer.subscription.updated" => {
                Ok(VendorEvent::SubscriptionUpdated(self.parse_subscription()?))
            }
            "customer.subscription.deleted" => {
                Ok(VendorEvent::SubscriptionDeleted(self.parse_subscription()?))
            }
            "payment_intent.succeeded" => {
                Ok(VendorEvent::PaymentSucceeded(self.parse_payment_intent()?))
            }
            "payment_intent.payment_failed" => {
                Ok(VendorEvent::PaymentFailed(self.parse_payment_intent()?))
            }
            _ => Ok(VendorEvent::Ignored {
                event_type: self.event_type,
            }),
        }
    }

    fn parse_subscription(&self) -> Result<VendorSubscription, GatewayError> {
        let sub: StripeSubscription = serde_json::from_value(self.data.object.clone())
            .map_err(|e| GatewayError::invalid_payload(format!("Invalid subscription: {}", e)))?;
        Ok(sub.into_vendor())
    }

    fn parse_payment_intent(&self) -> Result<VendorPaymentIntent, GatewayError> {
        let intent: StripePaymentIntent = serde_json::from_value(self.data.object.clone())
            .map_err(|e| GatewayError::invalid_payload(format!("Invalid payment intent: {}", e)))?;
        Ok(intent.into_vendor())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Stripe Object Types
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe Subscription object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscription {
    /// Unique subscription identifier (sub_...).
    pub id: String,

    /// Customer ID owning this subscription.
    pub customer: String,

    /// Subscription status.
    pub status: String,

    /// Current period start (Unix timestamp).
    pub current_period_start: i64,

    /// Current period end (Unix timestamp).
    pub current_period_end: i64,

    /// Whether subscription cancels at period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,

    /// When cancellation was requested (Unix timestamp).
    pub canceled_at: Option<i64>,

    /// Custom metadata (carries the owning user id).
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, String>,

    /// Subscription items (price/quantity pairs).
    #[serde(default)]
    pub items: StripeSubscriptionItems,
}

impl StripeSubscription {
    /// Narrow to the domain's vendor subscription shape.
    ///
    /// The plan interval is read off the first line item, matching how the
    /// engine derives monthly/yearly.
    pub fn into_vendor(self) -> VendorSubscription {
        let plan_interval = self
            .items
            .data
            .first()
            .and_then(|item| item.price.recurring.as_ref())
            .map(|recurring| recurring.interval.clone());

        VendorSubscription {
            id: self.id,
            status: self.status,
            current_period_start: self.current_period_start,
            current_period_end: self.current_period_end,
            cancel_at_period_end: self.cancel_at_period_end,
            canceled_at: self.canceled_at,
            plan_interval,
            metadata: self.metadata,
        }
    }
}

/// Subscription items container.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeSubscriptionItems {
    /// List of subscription items.
    #[serde(default)]
    pub data: Vec<StripeSubscriptionItem>,
}

/// Single subscription item.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscriptionItem {
    /// Item ID.
    pub id: String,

    /// Price object.
    pub price: StripePrice,

    /// Item quantity.
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// Stripe Price object (embedded in subscription items).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePrice {
    /// Price ID.
    pub id: String,

    /// Unit amount in cents.
    pub unit_amount: Option<i64>,

    /// Currency (lowercase, e.g., "usd").
    pub currency: String,

    /// Recurring interval details.
    pub recurring: Option<StripePriceRecurring>,
}

/// Price recurring configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePriceRecurring {
    /// Billing interval (day, week, month, year).
    pub interval: String,

    /// Number of intervals between billings.
    #[serde(default = "default_interval_count")]
    pub interval_count: i32,
}

fn default_interval_count() -> i32 {
    1
}

/// Stripe PaymentIntent object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePaymentIntent {
    /// Unique payment intent identifier (pi_...).
    pub id: String,

    /// Customer ID if one is attached.
    pub customer: Option<String>,

    /// Payment intent status.
    pub status: String,

    /// Amount in the currency's minor units.
    pub amount: i64,

    /// Currency (lowercase).
    pub currency: String,

    /// Accepted payment method types.
    #[serde(default)]
    pub payment_method_types: Vec<String>,

    /// Custom metadata (carries the owning user id).
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, String>,
}

impl StripePaymentIntent {
    /// Narrow to the domain's vendor payment intent shape.
    pub fn into_vendor(self) -> VendorPaymentIntent {
        VendorPaymentIntent {
            id: self.id,
            status: self.status,
            amount: self.amount,
            currency: self.currency,
            payment_method_types: self.payment_method_types,
            metadata: self.metadata,
        }
    }
}
