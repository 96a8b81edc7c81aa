//! MegaKassa gateway integration.
//!
//! JSON notifications signed in the body: all fields except `sign` sorted by
//! name, values joined with `:`, secret appended, SHA-256, lowercase hex.
//! The status vocabulary is the canonical one.

use sha2::{Digest, Sha256};
use std::str::FromStr;

use super::{require_int, to_hex, Gateway, GatewayKind, Notification};
use crate::config::GatewayConfig;
use crate::error::{KassaflowError, Result};
use crate::payment::PaymentStatus;
use crate::validation::{FieldKind, FieldRule};

const SCHEMA: &[FieldRule] = &[
    FieldRule::required("merchant_id", FieldKind::Integer),
    FieldRule::required("payment_id", FieldKind::Integer),
    FieldRule::required("status", FieldKind::Text),
    FieldRule::required("amount", FieldKind::Numeric),
    FieldRule::required("amount_paid", FieldKind::Numeric),
    FieldRule::required("timestamp", FieldKind::Integer),
    FieldRule::required("sign", FieldKind::Text),
];

pub struct MegaKassa {
    merchant_id: i64,
    secret: String,
    attempts_per_day: u32,
}

impl MegaKassa {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            merchant_id: config.merchant_id,
            secret: config.secret.clone(),
            attempts_per_day: config.attempts_per_day,
        }
    }
}

impl Gateway for MegaKassa {
    fn kind(&self) -> GatewayKind {
        GatewayKind::MegaKassa
    }

    fn attempts_per_day(&self) -> u32 {
        self.attempts_per_day
    }

    fn configured_merchant_id(&self) -> i64 {
        self.merchant_id
    }

    fn schema(&self) -> &'static [FieldRule] {
        SCHEMA
    }

    fn map_status(&self, raw: &str) -> Option<PaymentStatus> {
        PaymentStatus::from_str(raw).ok()
    }

    fn payment_id(&self, notification: &Notification) -> Result<i64> {
        require_int(notification, "payment_id")
    }

    fn merchant_id(&self, notification: &Notification) -> Result<i64> {
        require_int(notification, "merchant_id")
    }

    fn received_signature(&self, notification: &Notification) -> Result<String> {
        notification
            .str_field("sign")
            .ok_or(KassaflowError::SignatureMismatch)
    }

    fn expected_signature(&self, notification: &Notification) -> String {
        let mut input = notification.sign_string(':', Some("sign"));
        input.push_str(&self.secret);
        to_hex(&Sha256::digest(input.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> MegaKassa {
        MegaKassa::new(&GatewayConfig {
            merchant_id: 42,
            secret: "K".to_string(),
            attempts_per_day: 100,
        })
    }

    fn sha256_hex(input: &str) -> String {
        to_hex(&Sha256::digest(input.as_bytes()))
    }

    #[test]
    fn test_expected_signature_matches_reference_vector() {
        let n = Notification::from_json(
            br#"{"merchant_id": 42, "payment_id": 7, "status": "completed",
                 "amount": "100.00", "amount_paid": "100.00",
                 "timestamp": 1690000000, "sign": "ignored"}"#,
        );
        // Values sorted by field name, sign excluded, secret appended.
        let expected = sha256_hex("100.00:100.00:42:7:completed:1690000000K");
        assert_eq!(gateway().expected_signature(&n), expected);
    }

    #[test]
    fn test_signature_changes_when_any_field_changes() {
        let original = Notification::from_json(
            br#"{"merchant_id": 42, "payment_id": 7, "status": "completed",
                 "amount": "100.00", "amount_paid": "100.00",
                 "timestamp": 1690000000}"#,
        );
        let tampered = Notification::from_json(
            br#"{"merchant_id": 42, "payment_id": 7, "status": "completed",
                 "amount": "100.00", "amount_paid": "999.00",
                 "timestamp": 1690000000}"#,
        );
        let g = gateway();
        assert_ne!(g.expected_signature(&original), g.expected_signature(&tampered));
    }

    #[test]
    fn test_status_vocabulary_is_identity() {
        let g = gateway();
        assert_eq!(g.map_status("new"), Some(PaymentStatus::New));
        assert_eq!(g.map_status("pending"), Some(PaymentStatus::Pending));
        assert_eq!(g.map_status("completed"), Some(PaymentStatus::Completed));
        assert_eq!(g.map_status("expired"), Some(PaymentStatus::Expired));
        assert_eq!(g.map_status("rejected"), Some(PaymentStatus::Rejected));
        assert_eq!(g.map_status("paid"), None);
        assert_eq!(g.map_status(""), None);
    }

    #[test]
    fn test_field_extraction() {
        let n = Notification::from_json(
            br#"{"merchant_id": 42, "payment_id": 7, "sign": "abc"}"#,
        );
        let g = gateway();
        assert_eq!(g.payment_id(&n).unwrap(), 7);
        assert_eq!(g.merchant_id(&n).unwrap(), 42);
        assert_eq!(g.received_signature(&n).unwrap(), "abc");
    }

    #[test]
    fn test_schema_requires_all_seven_fields() {
        let g = gateway();
        assert_eq!(g.schema().len(), 7);
        assert!(g.schema().iter().all(|rule| rule.required));
    }
}
