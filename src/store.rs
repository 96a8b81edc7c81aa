//! Payment persistence port.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::payment::Payment;

/// Load-by-id and save of the payment record.
///
/// Saves are single-row upserts by id; concurrent notifications for the
/// same payment race under last-write-wins. Replays of the same valid
/// notification converge on the same final state.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Fetch a payment by id. Soft-deleted payments are not returned.
    async fn find(&self, id: i64) -> Result<Option<Payment>>;

    /// Persist a payment, refreshing its update timestamp.
    async fn save(&self, payment: Payment) -> Result<()>;
}

/// In-memory payment store for development and testing.
///
/// In production, back this port with the payment database.
#[derive(Default)]
pub struct InMemoryPaymentStore {
    payments: RwLock<HashMap<i64, Payment>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a payment record, bypassing the update-timestamp refresh.
    pub async fn insert(&self, payment: Payment) {
        let mut payments = self.payments.write().await;
        payments.insert(payment.id, payment);
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn find(&self, id: i64) -> Result<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(&id).filter(|p| !p.is_deleted()).cloned())
    }

    async fn save(&self, mut payment: Payment) -> Result<()> {
        payment.updated_at = Utc::now();
        let mut payments = self.payments.write().await;
        payments.insert(payment.id, payment);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::PaymentStatus;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryPaymentStore::new();
        store.insert(Payment::new(7, 1, dec!(100.00))).await;

        let found = store.find(7).await.unwrap().unwrap();
        assert_eq!(found.id, 7);
        assert_eq!(found.amount, dec!(100.00));

        assert!(store.find(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_and_touches_updated_at() {
        let store = InMemoryPaymentStore::new();
        let payment = Payment::new(7, 1, dec!(100.00));
        let created = payment.updated_at;
        store.insert(payment.clone()).await;

        let mut updated = payment;
        updated.status = PaymentStatus::Completed;
        updated.amount_paid = Some(dec!(100.00));
        store.save(updated).await.unwrap();

        let found = store.find(7).await.unwrap().unwrap();
        assert_eq!(found.status, PaymentStatus::Completed);
        assert_eq!(found.amount_paid, Some(dec!(100.00)));
        assert!(found.updated_at >= created);
    }

    #[tokio::test]
    async fn test_soft_deleted_payments_are_hidden() {
        let store = InMemoryPaymentStore::new();
        let mut payment = Payment::new(7, 1, dec!(100.00));
        payment.deleted_at = Some(Utc::now());
        store.insert(payment).await;

        assert!(store.find(7).await.unwrap().is_none());
    }
}
