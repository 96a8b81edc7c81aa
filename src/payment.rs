//! The payment record reconciled by the webhook pipeline.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical payment status.
///
/// Every gateway's native status vocabulary is translated into one of these
/// five values before anything is persisted. Unmapped raw statuses are
/// rejected, never defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    New,
    Pending,
    Completed,
    Expired,
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "expired" => Ok(Self::Expired),
            "rejected" => Ok(Self::Rejected),
            _ => Err(()),
        }
    }
}

/// Supported settlement currency. Single value for now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    Usd,
}

/// A payment as stored locally, created before any notification arrives.
///
/// `amount` is the contracted amount and is never modified by the pipeline;
/// `amount_paid` is only ever set by a successfully verified notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub status: PaymentStatus,
    pub currency: Currency,
    pub amount: Decimal,
    pub amount_paid: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Create a fresh payment awaiting its first notification.
    pub fn new(id: i64, user_id: i64, amount: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            status: PaymentStatus::New,
            currency: Currency::default(),
            amount,
            amount_paid: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_round_trip() {
        for raw in ["new", "pending", "completed", "expired", "rejected"] {
            let status: PaymentStatus = raw.parse().unwrap();
            assert_eq!(status.as_str(), raw);
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(PaymentStatus::from_str("paid").is_err());
        assert!(PaymentStatus::from_str("COMPLETED").is_err());
        assert!(PaymentStatus::from_str("").is_err());
    }

    #[test]
    fn test_status_serde_uses_lowercase() {
        let json = serde_json::to_string(&PaymentStatus::Completed).unwrap();
        assert_eq!(json, r#""completed""#);

        let status: PaymentStatus = serde_json::from_str(r#""expired""#).unwrap();
        assert_eq!(status, PaymentStatus::Expired);
    }

    #[test]
    fn test_new_payment_defaults() {
        let payment = Payment::new(7, 1, dec!(100.00));
        assert_eq!(payment.status, PaymentStatus::New);
        assert_eq!(payment.currency, Currency::Usd);
        assert_eq!(payment.amount, dec!(100.00));
        assert!(payment.amount_paid.is_none());
        assert!(!payment.is_deleted());
    }
}
