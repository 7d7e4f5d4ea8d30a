//! In-memory ledger of purchases awaiting manual payment confirmation.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::PendingPayment;

/// Purchases paid through WhatsApp, waiting for an admin `/confirm`.
///
/// The whole ledger sits behind one mutex, so a confirmation removes a
/// user's entries in a single critical section: two concurrent confirms can
/// never both issue tickets for the same entry. Entries are lost on restart,
/// which is acceptable because the admin re-confirms from the WhatsApp
/// thread anyway.
#[derive(Clone, Default)]
pub struct PendingLedger {
    entries: Arc<Mutex<Vec<PendingPayment>>>,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a purchase as awaiting confirmation.
    pub async fn push(&self, payment: PendingPayment) {
        let mut entries = self.entries.lock().await;
        entries.push(payment);
    }

    /// Remove and return every pending payment for one user.
    pub async fn drain_for(&self, user_id: i64) -> Vec<PendingPayment> {
        let mut entries = self.entries.lock().await;
        let (drained, kept) = entries
            .drain(..)
            .partition(|payment| payment.user_id == user_id);
        *entries = kept;
        drained
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(user_id: i64, event_id: &str) -> PendingPayment {
        PendingPayment {
            user_id,
            event_id: event_id.to_string(),
            event_title: "Jazz Night".to_string(),
            qty: 2,
            total: 10_000,
        }
    }

    #[tokio::test]
    async fn test_drain_takes_only_the_users_entries() {
        let ledger = PendingLedger::new();
        ledger.push(payment(1, "a")).await;
        ledger.push(payment(2, "b")).await;
        ledger.push(payment(1, "c")).await;

        let drained = ledger.drain_for(1).await;
        assert_eq!(drained.len(), 2);
        assert!(drained.iter().all(|p| p.user_id == 1));

        // The other user's entry is untouched.
        assert_eq!(ledger.len().await, 1);

        // A second drain finds nothing: entries are issued at most once.
        assert!(ledger.drain_for(1).await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_drains_never_duplicate() {
        let ledger = PendingLedger::new();
        for i in 0..10 {
            ledger.push(payment(5, &format!("event-{i}"))).await;
        }

        let a = ledger.clone();
        let b = ledger.clone();
        let (first, second) = tokio::join!(
            tokio::spawn(async move { a.drain_for(5).await }),
            tokio::spawn(async move { b.drain_for(5).await }),
        );
        let first = first.expect("drain task panicked");
        let second = second.expect("drain task panicked");

        assert_eq!(first.len() + second.len(), 10);
        assert!(ledger.is_empty().await);
    }
}
