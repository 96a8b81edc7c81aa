//! TopKassa gateway integration.
//!
//! Form-encoded notifications signed out-of-band: every body field sorted by
//! name, values joined with `.`, secret appended, MD5, lowercase hex,
//! delivered in the `Authorization` header. Uses its own status vocabulary.

use super::{require_int, Gateway, GatewayKind, Notification};
use crate::config::GatewayConfig;
use crate::error::{KassaflowError, Result};
use crate::payment::PaymentStatus;
use crate::validation::{FieldKind, FieldRule};

// amount_paid is intentionally absent here: the upstream contract does not
// require it even though the shared persistence step reads it. A missing
// paid amount is treated as zero by the pipeline.
const SCHEMA: &[FieldRule] = &[
    FieldRule::required("project", FieldKind::Integer),
    FieldRule::required("invoice", FieldKind::Integer),
    FieldRule::required("status", FieldKind::Text),
    FieldRule::required("amount", FieldKind::Numeric),
    FieldRule::required("rand", FieldKind::Text),
];

pub struct TopKassa {
    merchant_id: i64,
    secret: String,
    attempts_per_day: u32,
}

impl TopKassa {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            merchant_id: config.merchant_id,
            secret: config.secret.clone(),
            attempts_per_day: config.attempts_per_day,
        }
    }
}

impl Gateway for TopKassa {
    fn kind(&self) -> GatewayKind {
        GatewayKind::TopKassa
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
        match raw {
            "created" => Some(PaymentStatus::New),
            "inprogress" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Completed),
            "expired" => Some(PaymentStatus::Expired),
            "rejected" => Some(PaymentStatus::Rejected),
            _ => None,
        }
    }

    fn payment_id(&self, notification: &Notification) -> Result<i64> {
        require_int(notification, "invoice")
    }

    fn merchant_id(&self, notification: &Notification) -> Result<i64> {
        require_int(notification, "project")
    }

    fn received_signature(&self, notification: &Notification) -> Result<String> {
        notification
            .authorization()
            .map(str::to_string)
            .ok_or(KassaflowError::SignatureMismatch)
    }

    fn expected_signature(&self, notification: &Notification) -> String {
        // Unlike MegaKassa, no field is excluded from the sign string.
        let mut input = notification.sign_string('.', None);
        input.push_str(&self.secret);
        format!("{:x}", md5::compute(input.as_bytes()))
    }
}
