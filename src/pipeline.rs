//! The shared verification pipeline.
//!
//! One orchestration procedure drives the fixed verification sequence
//! against any [`Gateway`] implementation, with the payment store and the
//! attempt limiter injected as ports. Each step's failure aborts the
//! sequence with exactly one error kind and nothing persisted.

use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::{KassaflowError, Result};
use crate::gateway::{Gateway, Notification};
use crate::ratelimit::AttemptLimiter;
use crate::store::PaymentStore;
use crate::validation;

/// Field carrying the gateway's raw status, read after schema validation.
const STATUS_FIELD: &str = "status";
/// Field carrying the amount the payer actually paid. Not every gateway
/// schema requires it; a missing value is treated as zero.
const AMOUNT_PAID_FIELD: &str = "amount_paid";

/// Acknowledgement returned for a fully verified notification.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub status: &'static str,
}

impl Ack {
    fn ok() -> Self {
        Self { status: "ok" }
    }
}

/// Drives the verification sequence for inbound notifications.
pub struct Processor {
    store: Arc<dyn PaymentStore>,
    limiter: Arc<dyn AttemptLimiter>,
}

impl Processor {
    pub fn new(store: Arc<dyn PaymentStore>, limiter: Arc<dyn AttemptLimiter>) -> Self {
        Self { store, limiter }
    }

    /// Verify a notification against its gateway and apply the status
    /// transition.
    ///
    /// Sequence: rate limit → schema validation → signature → merchant →
    /// load payment → amount → status mapping → persist. The attempt is
    /// counted first, so invalid payloads consume budget too.
    pub async fn process(&self, gateway: &dyn Gateway, notification: &Notification) -> Result<Ack> {
        self.limiter
            .try_acquire(gateway.kind(), gateway.attempts_per_day())
            .await?;

        validation::validate(notification, gateway.schema())?;

        let received = gateway.received_signature(notification)?;
        let expected = gateway.expected_signature(notification);
        if !signatures_match(&received, &expected) {
            return Err(KassaflowError::SignatureMismatch);
        }

        if gateway.merchant_id(notification)? != gateway.configured_merchant_id() {
            return Err(KassaflowError::MerchantMismatch);
        }

        let payment_id = gateway.payment_id(notification)?;
        let mut payment = self
            .store
            .find(payment_id)
            .await?
            .ok_or(KassaflowError::PaymentNotFound(payment_id))?;

        // The contracted amount is checked against the incoming *paid*
        // amount, not the notification's own `amount` field. Kept as the
        // upstream contract defines it; see DESIGN.md.
        let amount_paid = notification.decimal_field(AMOUNT_PAID_FIELD);
        if payment.amount != amount_paid.unwrap_or(Decimal::ZERO) {
            return Err(KassaflowError::AmountMismatch);
        }

        let raw_status = notification
            .str_field(STATUS_FIELD)
            .unwrap_or_default();
        let status = gateway
            .map_status(&raw_status)
            .ok_or_else(|| KassaflowError::UnknownStatus(raw_status.clone()))?;

        payment.status = status;
        payment.amount_paid = amount_paid;
        self.store.save(payment).await?;

        tracing::info!(
            gateway = %gateway.kind(),
            payment_id,
            status = %status,
            "Payment notification reconciled"
        );

        Ok(Ack::ok())
    }
}

/// Constant-time comparison of the hex signature strings.
///
/// Comparison is byte-exact and case-sensitive; `subtle` keeps the compare
/// resistant to timing attacks.
fn signatures_match(received: &str, expected: &str) -> bool {
    received.as_bytes().ct_eq(expected.as_bytes()).into()
}
