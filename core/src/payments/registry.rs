//! Payment reference registry.
//!
//! Maps an opaque reference token to the pending purchase intent. Created at
//! payment initiation, consulted at confirmation, garbage-collected after a
//! bounded TTL when the buyer abandons the flow.

use crate::error::{MarketError, MarketResult};
use crate::ledger::MAX_PURCHASE_QUANTITY;
use crate::metrics;
use crate::storage::IntentStore;
use crate::types::{EventId, Money, PaymentIntent, PaymentReference, WalletAddress};
use chrono::{Duration, Utc};
use std::sync::Arc;

/// The registry of pending payment intents.
pub struct PaymentReferenceRegistry {
    intents: Arc<dyn IntentStore>,
}

impl PaymentReferenceRegistry {
    /// Creates a registry over the given intent store.
    #[must_use]
    pub fn new(intents: Arc<dyn IntentStore>) -> Self {
        Self { intents }
    }

    /// Registers a purchase intent and returns it with a fresh reference.
    ///
    /// Has no side effect on inventory: availability is only checked and
    /// mutated at confirmation time, when the money has actually moved.
    ///
    /// # Errors
    ///
    /// `ClientInput` for a zero or oversized quantity, `Storage` when the
    /// store is unavailable.
    pub async fn create_intent(
        &self,
        event_id: EventId,
        quantity: u32,
        total_amount: Money,
        buyer_address: Option<WalletAddress>,
    ) -> MarketResult<PaymentIntent> {
        if quantity == 0 {
            return Err(MarketError::ClientInput(
                "quantity must be greater than zero".to_string(),
            ));
        }
        if quantity > MAX_PURCHASE_QUANTITY {
            return Err(MarketError::ClientInput(format!(
                "cannot purchase more than {MAX_PURCHASE_QUANTITY} tickets at once"
            )));
        }

        let intent = PaymentIntent {
            reference: PaymentReference::generate(),
            event_id,
            quantity,
            total_amount,
            buyer_address,
            created_at: Utc::now(),
        };
        self.intents.put(intent.clone()).await?;

        metrics::record_intent_created();
        tracing::info!(
            reference = %intent.reference,
            %event_id,
            quantity,
            total_amount = %total_amount,
            "Payment initiated"
        );
        Ok(intent)
    }

    /// Looks up a pending intent. Unknown references yield `None` rather
    /// than an error; the confirmation handler decides what that means.
    ///
    /// # Errors
    ///
    /// `Storage` when the store is unavailable.
    pub async fn lookup(
        &self,
        reference: &PaymentReference,
    ) -> MarketResult<Option<PaymentIntent>> {
        self.intents.get(reference).await
    }

    /// Drops intents older than `ttl`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// `Storage` when the store is unavailable.
    pub async fn purge_expired(&self, ttl: Duration) -> MarketResult<usize> {
        let cutoff = Utc::now() - ttl;
        let removed = self.intents.remove_created_before(cutoff).await?;
        if removed > 0 {
            metrics::record_intents_expired(removed);
            tracing::info!(removed, "Expired abandoned payment intents");
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryIntentStore;

    fn test_registry() -> PaymentReferenceRegistry {
        PaymentReferenceRegistry::new(Arc::new(MemoryIntentStore::new()))
    }

    #[tokio::test]
    async fn test_create_then_lookup_returns_same_intent() {
        let registry = test_registry();
        let event_id = EventId::new();

        let intent = registry
            .create_intent(event_id, 2, Money::from_cents(10_000), None)
            .await
            .unwrap();

        let found = registry.lookup(&intent.reference).await.unwrap().unwrap();
        assert_eq!(found, intent);
        assert_eq!(found.event_id, event_id);
        assert_eq!(found.quantity, 2);
        assert_eq!(found.total_amount, Money::from_cents(10_000));
    }

    #[tokio::test]
    async fn test_lookup_unknown_reference_is_none() {
        let registry = test_registry();
        let unknown = PaymentReference::generate();
        assert!(registry.lookup(&unknown).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_distinct_references_per_intent() {
        let registry = test_registry();
        let event_id = EventId::new();
        let first = registry
            .create_intent(event_id, 1, Money::from_cents(100), None)
            .await
            .unwrap();
        let second = registry
            .create_intent(event_id, 1, Money::from_cents(100), None)
            .await
            .unwrap();
        assert_ne!(first.reference, second.reference);
    }

    #[tokio::test]
    async fn test_create_intent_rejects_bad_quantity() {
        let registry = test_registry();
        assert!(matches!(
            registry
                .create_intent(EventId::new(), 0, Money::from_cents(100), None)
                .await,
            Err(MarketError::ClientInput(_))
        ));
        assert!(matches!(
            registry
                .create_intent(
                    EventId::new(),
                    MAX_PURCHASE_QUANTITY + 1,
                    Money::from_cents(100),
                    None
                )
                .await,
            Err(MarketError::ClientInput(_))
        ));
    }

    #[tokio::test]
    async fn test_purge_expired_leaves_fresh_intents() {
        let store = Arc::new(MemoryIntentStore::new());
        let registry = PaymentReferenceRegistry::new(Arc::clone(&store) as Arc<dyn IntentStore>);

        let fresh = registry
            .create_intent(EventId::new(), 1, Money::from_cents(100), None)
            .await
            .unwrap();

        // Backdate a second intent past the TTL.
        let mut stale = registry
            .create_intent(EventId::new(), 1, Money::from_cents(100), None)
            .await
            .unwrap();
        stale.created_at = Utc::now() - Duration::hours(2);
        store.put(stale.clone()).await.unwrap();

        let removed = registry.purge_expired(Duration::minutes(30)).await.unwrap();
        assert_eq!(removed, 1);
        assert!(registry.lookup(&fresh.reference).await.unwrap().is_some());
        assert!(registry.lookup(&stale.reference).await.unwrap().is_none());
    }
}
