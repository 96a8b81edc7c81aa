//! Gateway integrations.
//!
//! Each supported payment gateway implements the [`Gateway`] trait: field
//! extraction, signing, status vocabulary and validation schema. The
//! orchestrator in [`crate::pipeline`] drives the same verification
//! sequence against any implementation.

pub mod detect;
pub mod megakassa;
pub mod notification;
pub mod topkassa;

pub use detect::detect;
pub use megakassa::MegaKassa;
pub use notification::{BodyKind, Notification};
pub use topkassa::TopKassa;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Config;
use crate::error::{KassaflowError, Result};
use crate::payment::PaymentStatus;
use crate::validation::FieldRule;

/// The supported gateway variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    MegaKassa,
    TopKassa,
}

impl GatewayKind {
    /// Stable identifier, used as the rate-limit counter key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MegaKassa => "megakassa",
            Self::TopKassa => "topkassa",
        }
    }
}

impl fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The capability set every concrete gateway must implement.
///
/// Implementations are pure with respect to the notification: extraction and
/// signing never touch the store or the rate limiter, which keeps each
/// variant unit-testable against this interface alone.
pub trait Gateway: Send + Sync {
    fn kind(&self) -> GatewayKind;

    /// Verification attempts allowed per rolling 24-hour window.
    fn attempts_per_day(&self) -> u32;

    /// Merchant id expected by configuration.
    fn configured_merchant_id(&self) -> i64;

    /// Validation schema for this gateway's notifications.
    fn schema(&self) -> &'static [FieldRule];

    /// Translate a gateway-native status string into the canonical status.
    /// Returns `None` for anything outside the closed vocabulary.
    fn map_status(&self, raw: &str) -> Option<PaymentStatus>;

    /// Payment identifier carried by the notification.
    fn payment_id(&self, notification: &Notification) -> Result<i64>;

    /// Merchant identifier carried by the notification.
    fn merchant_id(&self, notification: &Notification) -> Result<i64>;

    /// The signature the gateway attached to the notification.
    fn received_signature(&self, notification: &Notification) -> Result<String>;

    /// The signature this side computes from the notification's own fields
    /// and the shared secret. Deterministic.
    fn expected_signature(&self, notification: &Notification) -> String;
}

/// Build the concrete gateway for a detected variant from configuration.
pub fn for_kind(kind: GatewayKind, config: &Config) -> Box<dyn Gateway> {
    match kind {
        GatewayKind::MegaKassa => Box::new(MegaKassa::new(&config.gateways.megakassa)),
        GatewayKind::TopKassa => Box::new(TopKassa::new(&config.gateways.topkassa)),
    }
}

/// Lowercase hex rendering of a digest.
pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Extract a required integer field, reporting it as a field violation when
/// absent or malformed. The pipeline validates schemas first, so this only
/// trips when a gateway is exercised outside the normal sequence.
pub(crate) fn require_int(notification: &Notification, name: &'static str) -> Result<i64> {
    notification
        .int_field(name)
        .ok_or_else(|| KassaflowError::validation_field(name, format!("The {} field is required", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;

    #[test]
    fn test_kind_identifiers() {
        assert_eq!(GatewayKind::MegaKassa.as_str(), "megakassa");
        assert_eq!(GatewayKind::TopKassa.to_string(), "topkassa");
    }

    #[test]
    fn test_to_hex_is_lowercase() {
        assert_eq!(to_hex(&[0x00, 0xab, 0xff]), "00abff");
        assert_eq!(to_hex(&[]), "");
    }

    #[test]
    fn test_for_kind_builds_matching_variant() {
        let mut config = Config::default();
        config.gateways.megakassa = GatewayConfig {
            merchant_id: 42,
            secret: "K".to_string(),
            attempts_per_day: 10,
        };
        config.gateways.topkassa = GatewayConfig {
            merchant_id: 10,
            secret: "S".to_string(),
            attempts_per_day: 20,
        };

        let a = for_kind(GatewayKind::MegaKassa, &config);
        assert_eq!(a.kind(), GatewayKind::MegaKassa);
        assert_eq!(a.configured_merchant_id(), 42);
        assert_eq!(a.attempts_per_day(), 10);

        let b = for_kind(GatewayKind::TopKassa, &config);
        assert_eq!(b.kind(), GatewayKind::TopKassa);
        assert_eq!(b.configured_merchant_id(), 10);
        assert_eq!(b.attempts_per_day(), 20);
    }
}
