//! Payment entity.
//!
//! One row per vendor payment intent. The write path is find-or-create by
//! the vendor payment-intent id; rows are never deleted by reconciliation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PaymentId, SubscriptionId, Timestamp, UserId};

use super::{PaymentStatus, VendorPaymentIntent};

/// Payment row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier for this payment.
    pub id: PaymentId,

    /// Vendor payment-intent id (pi_...).
    pub vendor_payment_intent_id: String,

    /// User who owns this payment.
    pub user_id: UserId,

    /// Amount in decimal currency units (vendor minor units / 100).
    pub amount: Decimal,

    /// Lowercase ISO currency code.
    pub currency: String,

    /// Payment status.
    pub status: PaymentStatus,

    /// The owner's latest subscription at reconcile time, when one existed.
    pub subscription_id: Option<SubscriptionId>,

    /// Free-form vendor metadata (e.g. payment method types).
    pub metadata: serde_json::Value,

    /// When the row was created.
    pub created_at: Timestamp,

    /// When the row was last written.
    pub updated_at: Timestamp,
}

impl Payment {
    /// Converts a vendor minor-unit amount into decimal currency units.
    ///
    /// The vendor reports amounts as integers in the currency's smallest
    /// denomination; two decimal places cover every currency the platform
    /// bills in.
    pub fn amount_from_minor_units(minor: i64) -> Decimal {
        Decimal::new(minor, 2)
    }

    /// Creates a new row from a vendor payment intent.
    pub fn from_vendor(
        id: PaymentId,
        user_id: UserId,
        vendor: &VendorPaymentIntent,
        status: PaymentStatus,
        subscription_id: Option<SubscriptionId>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            vendor_payment_intent_id: vendor.id.clone(),
            user_id,
            amount: Self::amount_from_minor_units(vendor.amount),
            currency: vendor.currency.clone(),
            status,
            subscription_id,
            metadata: Self::vendor_metadata(vendor),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites every vendor-mapped field from a fresh vendor object.
    ///
    /// Same last-event-wins contract as the subscription upsert.
    pub fn overwrite_from_vendor(
        &mut self,
        vendor: &VendorPaymentIntent,
        status: PaymentStatus,
        subscription_id: Option<SubscriptionId>,
    ) {
        self.amount = Self::amount_from_minor_units(vendor.amount);
        self.currency = vendor.currency.clone();
        self.status = status;
        self.subscription_id = subscription_id;
        self.metadata = Self::vendor_metadata(vendor);
        self.updated_at = Timestamp::now();
    }

    fn vendor_metadata(vendor: &VendorPaymentIntent) -> serde_json::Value {
        serde_json::json!({
            "payment_method_types": vendor.payment_method_types,
        })
    }
}
