//! In-memory store implementations.
//!
//! Back the reference single-process deployment and the test suite. Each
//! store keeps its records behind a standard library lock; critical sections
//! never await, so the locks are held only for the duration of the map
//! operation. A poisoned lock is reported as a storage failure rather than
//! propagating the panic.

use super::{BeginOutcome, DecrementOutcome, EventStore, IntentStore, TicketStore};
use crate::error::{MarketError, MarketResult};
use crate::types::{
    ConfirmationRecord, Event, EventId, PaymentIntent, PaymentReference, ResaleListing, Ticket,
    TicketId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

fn poisoned(what: &str) -> MarketError {
    MarketError::Storage(format!("{what} lock poisoned"))
}

/// In-memory [`EventStore`].
///
/// The conditional decrement runs entirely under the write lock, which is
/// what makes the check-then-mutate sequence indivisible.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: RwLock<HashMap<EventId, Event>>,
}

impl MemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, event: Event) -> MarketResult<()> {
        let mut events = self.events.write().map_err(|_| poisoned("events"))?;
        events.insert(event.id, event);
        Ok(())
    }

    async fn get(&self, id: EventId) -> MarketResult<Option<Event>> {
        let events = self.events.read().map_err(|_| poisoned("events"))?;
        Ok(events.get(&id).cloned())
    }

    async fn list(&self) -> MarketResult<Vec<Event>> {
        let events = self.events.read().map_err(|_| poisoned("events"))?;
        let mut all: Vec<Event> = events.values().cloned().collect();
        all.sort_by_key(|event| event.date);
        Ok(all)
    }

    async fn decrement_if_available(
        &self,
        id: EventId,
        quantity: u32,
    ) -> MarketResult<DecrementOutcome> {
        let mut events = self.events.write().map_err(|_| poisoned("events"))?;
        let Some(event) = events.get_mut(&id) else {
            return Ok(DecrementOutcome::NotFound);
        };
        let available = event.available_tickets();
        if available < quantity {
            return Ok(DecrementOutcome::Insufficient { available });
        }
        event.sold_tickets += quantity;
        event.updated_at = Utc::now();
        Ok(DecrementOutcome::Applied(event.clone()))
    }

    async fn release_tickets(&self, id: EventId, quantity: u32) -> MarketResult<()> {
        let mut events = self.events.write().map_err(|_| poisoned("events"))?;
        if let Some(event) = events.get_mut(&id) {
            event.sold_tickets = event.sold_tickets.saturating_sub(quantity);
            event.updated_at = Utc::now();
        }
        Ok(())
    }
}

/// In-memory [`TicketStore`].
#[derive(Debug, Default)]
pub struct MemoryTicketStore {
    tickets: RwLock<HashMap<TicketId, Ticket>>,
    listings: RwLock<Vec<ResaleListing>>,
}

impl MemoryTicketStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn insert_tickets(&self, issued: &[Ticket]) -> MarketResult<()> {
        let mut tickets = self.tickets.write().map_err(|_| poisoned("tickets"))?;
        for ticket in issued {
            tickets.insert(ticket.id, ticket.clone());
        }
        Ok(())
    }

    async fn get_ticket(&self, id: TicketId) -> MarketResult<Option<Ticket>> {
        let tickets = self.tickets.read().map_err(|_| poisoned("tickets"))?;
        Ok(tickets.get(&id).cloned())
    }

    async fn insert_listing(&self, listing: ResaleListing) -> MarketResult<()> {
        let mut listings = self.listings.write().map_err(|_| poisoned("listings"))?;
        listings.push(listing);
        Ok(())
    }

    async fn listings(&self) -> MarketResult<Vec<ResaleListing>> {
        let listings = self.listings.read().map_err(|_| poisoned("listings"))?;
        let mut all = listings.clone();
        all.sort_by(|a, b| b.listed_at.cmp(&a.listed_at));
        Ok(all)
    }

    async fn listing_for_ticket(&self, id: TicketId) -> MarketResult<Option<ResaleListing>> {
        let listings = self.listings.read().map_err(|_| poisoned("listings"))?;
        Ok(listings
            .iter()
            .find(|listing| listing.ticket_id == id)
            .cloned())
    }
}

#[derive(Debug, Default)]
struct IntentState {
    pending: HashMap<PaymentReference, PaymentIntent>,
    in_flight: HashSet<PaymentReference>,
    processed: HashMap<PaymentReference, ConfirmationRecord>,
}

/// In-memory [`IntentStore`].
///
/// A single mutex covers the pending map, the in-flight set, and the
/// processed map, so the claim in `begin_confirmation` is atomic with
/// respect to both replays and concurrent first deliveries.
#[derive(Debug, Default)]
pub struct MemoryIntentStore {
    state: Mutex<IntentState>,
}

impl MemoryIntentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IntentStore for MemoryIntentStore {
    async fn put(&self, intent: PaymentIntent) -> MarketResult<()> {
        let mut state = self.state.lock().map_err(|_| poisoned("intents"))?;
        state.pending.insert(intent.reference.clone(), intent);
        Ok(())
    }

    async fn get(&self, reference: &PaymentReference) -> MarketResult<Option<PaymentIntent>> {
        let state = self.state.lock().map_err(|_| poisoned("intents"))?;
        Ok(state.pending.get(reference).cloned())
    }

    async fn remove_created_before(&self, cutoff: DateTime<Utc>) -> MarketResult<usize> {
        let mut state = self.state.lock().map_err(|_| poisoned("intents"))?;
        let in_flight = state.in_flight.clone();
        let before = state.pending.len();
        state
            .pending
            .retain(|reference, intent| {
                intent.created_at >= cutoff || in_flight.contains(reference)
            });
        Ok(before - state.pending.len())
    }

    async fn begin_confirmation(
        &self,
        reference: &PaymentReference,
    ) -> MarketResult<BeginOutcome> {
        let mut state = self.state.lock().map_err(|_| poisoned("intents"))?;
        if let Some(record) = state.processed.get(reference) {
            return Ok(BeginOutcome::AlreadyProcessed(record.clone()));
        }
        if !state.in_flight.insert(reference.clone()) {
            return Ok(BeginOutcome::InFlight);
        }
        Ok(BeginOutcome::Claimed)
    }

    async fn record_confirmation(&self, record: ConfirmationRecord) -> MarketResult<()> {
        let mut state = self.state.lock().map_err(|_| poisoned("intents"))?;
        let reference = record.reference.clone();
        state.in_flight.remove(&reference);
        state.pending.remove(&reference);
        state.processed.insert(reference, record);
        Ok(())
    }

    async fn abort_confirmation(&self, reference: &PaymentReference) -> MarketResult<()> {
        let mut state = self.state.lock().map_err(|_| poisoned("intents"))?;
        state.in_flight.remove(reference);
        Ok(())
    }

    async fn processed(
        &self,
        reference: &PaymentReference,
    ) -> MarketResult<Option<ConfirmationRecord>> {
        let state = self.state.lock().map_err(|_| poisoned("intents"))?;
        Ok(state.processed.get(reference).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{EventCategory, Money};
    use chrono::Duration;

    fn sample_event(total: u32) -> Event {
        let now = Utc::now();
        Event {
            id: EventId::new(),
            name: "Tech Conference".to_string(),
            description: "Industry leaders and networking".to_string(),
            date: now + Duration::days(30),
            location: "Convention Center, San Francisco".to_string(),
            ticket_price: Money::from_cents(29_999),
            total_tickets: total,
            sold_tickets: 0,
            vendor: "conf-org".to_string(),
            event_type: EventCategory::Conference,
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_intent(reference: PaymentReference, created_at: DateTime<Utc>) -> PaymentIntent {
        PaymentIntent {
            reference,
            event_id: EventId::new(),
            quantity: 2,
            total_amount: Money::from_cents(10_000),
            buyer_address: None,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_decrement_stops_at_zero() {
        let store = MemoryEventStore::new();
        let event = sample_event(3);
        let id = event.id;
        store.insert(event).await.unwrap();

        let outcome = store.decrement_if_available(id, 3).await.unwrap();
        assert!(matches!(outcome, DecrementOutcome::Applied(_)));

        let outcome = store.decrement_if_available(id, 1).await.unwrap();
        assert_eq!(outcome, DecrementOutcome::Insufficient { available: 0 });

        let event = store.get(id).await.unwrap().unwrap();
        assert_eq!(event.sold_tickets, 3);
        assert_eq!(event.available_tickets(), 0);
    }

    #[tokio::test]
    async fn test_decrement_unknown_event() {
        let store = MemoryEventStore::new();
        let outcome = store
            .decrement_if_available(EventId::new(), 1)
            .await
            .unwrap();
        assert_eq!(outcome, DecrementOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_list_orders_by_date() {
        let store = MemoryEventStore::new();
        let mut early = sample_event(10);
        early.date = Utc::now() + Duration::days(1);
        let mut late = sample_event(10);
        late.date = Utc::now() + Duration::days(60);
        let early_id = early.id;
        store.insert(late).await.unwrap();
        store.insert(early).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all[0].id, early_id);
    }

    #[tokio::test]
    async fn test_begin_confirmation_claims_once() {
        let store = MemoryIntentStore::new();
        let reference = PaymentReference::generate();
        store
            .put(sample_intent(reference.clone(), Utc::now()))
            .await
            .unwrap();

        assert_eq!(
            store.begin_confirmation(&reference).await.unwrap(),
            BeginOutcome::Claimed
        );
        assert_eq!(
            store.begin_confirmation(&reference).await.unwrap(),
            BeginOutcome::InFlight
        );

        store
            .record_confirmation(ConfirmationRecord {
                reference: reference.clone(),
                tickets: vec![],
                minted: vec![],
                warning: None,
                confirmed_at: Utc::now(),
            })
            .await
            .unwrap();

        // Once recorded, later deliveries see the recorded outcome.
        assert!(matches!(
            store.begin_confirmation(&reference).await.unwrap(),
            BeginOutcome::AlreadyProcessed(_)
        ));
        // The pending intent was consumed.
        assert!(store.get(&reference).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_abort_releases_claim() {
        let store = MemoryIntentStore::new();
        let reference = PaymentReference::generate();

        assert_eq!(
            store.begin_confirmation(&reference).await.unwrap(),
            BeginOutcome::Claimed
        );
        store.abort_confirmation(&reference).await.unwrap();
        assert_eq!(
            store.begin_confirmation(&reference).await.unwrap(),
            BeginOutcome::Claimed
        );
    }

    #[tokio::test]
    async fn test_expiry_spares_in_flight_intents() {
        let store = MemoryIntentStore::new();
        let stale = PaymentReference::generate();
        let claimed = PaymentReference::generate();
        let old = Utc::now() - Duration::hours(2);
        store.put(sample_intent(stale, old)).await.unwrap();
        store.put(sample_intent(claimed.clone(), old)).await.unwrap();
        store.begin_confirmation(&claimed).await.unwrap();

        let removed = store
            .remove_created_before(Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(&claimed).await.unwrap().is_some());
    }
}
