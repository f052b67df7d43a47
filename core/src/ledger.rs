//! Inventory ledger for the marketplace.
//!
//! Owns each event's total/available accounting and the issued-ticket
//! collection, and decides whether a purchase request may be satisfied.
//!
//! **Concurrency**: the availability check and the count mutation execute as
//! one indivisible operation against the event store
//! ([`EventStore::decrement_if_available`]), so `available_tickets` can never
//! go below zero regardless of how many purchases race for the last seats.

use crate::error::{MarketError, MarketResult};
use crate::metrics;
use crate::storage::{DecrementOutcome, EventStore, TicketStore};
use crate::types::{
    Event, EventId, ListingId, Money, NewEvent, ResaleListing, Ticket, TicketId, WalletAddress,
};
use chrono::Utc;
use std::sync::Arc;

/// Maximum tickets per purchase, an anti-abuse cap on single requests.
/// Larger requests are client errors; buying more takes multiple purchases.
pub const MAX_PURCHASE_QUANTITY: u32 = 10;

/// Availability snapshot for an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Availability {
    /// Total capacity
    pub total: u32,
    /// Tickets sold
    pub sold: u32,
    /// Tickets still available
    pub available: u32,
}

/// The inventory ledger.
///
/// All purchase and resale mutations go through here; handlers never touch
/// the stores directly.
pub struct InventoryLedger {
    events: Arc<dyn EventStore>,
    tickets: Arc<dyn TicketStore>,
}

impl InventoryLedger {
    /// Creates a ledger over the given stores.
    #[must_use]
    pub fn new(events: Arc<dyn EventStore>, tickets: Arc<dyn TicketStore>) -> Self {
        Self { events, tickets }
    }

    /// Creates a new event record.
    ///
    /// # Errors
    ///
    /// `ClientInput` when the name is empty or the capacity is zero;
    /// `Storage` when the store is unavailable.
    pub async fn create_event(&self, new_event: NewEvent) -> MarketResult<Event> {
        if new_event.name.trim().is_empty() {
            return Err(MarketError::ClientInput(
                "event name must not be empty".to_string(),
            ));
        }
        if new_event.total_tickets == 0 {
            return Err(MarketError::ClientInput(
                "total tickets must be greater than zero".to_string(),
            ));
        }

        let now = Utc::now();
        let event = Event {
            id: EventId::new(),
            name: new_event.name,
            description: new_event.description,
            date: new_event.date,
            location: new_event.location,
            ticket_price: new_event.ticket_price,
            total_tickets: new_event.total_tickets,
            sold_tickets: 0,
            vendor: new_event.vendor,
            event_type: new_event.event_type,
            image_url: new_event.image_url,
            created_at: now,
            updated_at: now,
        };
        self.events.insert(event.clone()).await?;

        metrics::record_event_created();
        tracing::info!(
            event_id = %event.id,
            name = %event.name,
            total_tickets = event.total_tickets,
            "Event created"
        );
        Ok(event)
    }

    /// Purchases `quantity` tickets for an event and issues the records.
    ///
    /// The check and decrement are atomic per event; ticket issuance follows
    /// the decrement, so a successful return always corresponds to exactly
    /// `quantity` tickets removed from availability. If issuance fails, the
    /// decrement is compensated before the error surfaces: a failed purchase
    /// never holds tickets out of the pool.
    ///
    /// # Errors
    ///
    /// `ClientInput` for a zero or oversized quantity, `EventNotFound`,
    /// `InsufficientInventory` when fewer than `quantity` remain, `Storage`
    /// when a store is unavailable.
    pub async fn purchase(
        &self,
        event_id: EventId,
        quantity: u32,
        buyer: Option<WalletAddress>,
    ) -> MarketResult<Vec<Ticket>> {
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

        let event = match self
            .events
            .decrement_if_available(event_id, quantity)
            .await?
        {
            DecrementOutcome::Applied(event) => event,
            DecrementOutcome::Insufficient { available } => {
                tracing::warn!(
                    %event_id,
                    requested = quantity,
                    available,
                    "Purchase rejected: insufficient inventory"
                );
                return Err(MarketError::InsufficientInventory {
                    requested: quantity,
                    available,
                });
            }
            DecrementOutcome::NotFound => return Err(MarketError::EventNotFound(event_id)),
        };

        let purchased_at = Utc::now();
        let issued: Vec<Ticket> = (0..quantity)
            .map(|_| Ticket {
                id: TicketId::new(),
                event_id,
                price_paid: event.ticket_price,
                purchased_at,
                buyer: buyer.clone(),
            })
            .collect();
        if let Err(error) = self.tickets.insert_tickets(&issued).await {
            // The decrement must not outlive a purchase that issued nothing:
            // put the tickets back before reporting the failure, so a retry
            // of the same purchase starts from unchanged availability.
            if let Err(release_error) = self.events.release_tickets(event_id, quantity).await {
                tracing::error!(
                    %event_id,
                    quantity,
                    %release_error,
                    "Failed to release tickets after issuance failure"
                );
            }
            return Err(error);
        }

        let revenue = event
            .ticket_price
            .checked_mul(quantity)
            .map_or(0, |total| total.cents());
        metrics::record_tickets_sold(quantity, revenue);
        tracing::info!(
            %event_id,
            quantity,
            remaining = event.available_tickets(),
            "Tickets issued"
        );
        Ok(issued)
    }

    /// Lists an issued ticket for resale.
    ///
    /// The ticket must exist and must not already be listed.
    ///
    /// # Errors
    ///
    /// `ClientInput` when the ticket is unknown or already listed, `Storage`
    /// when a store is unavailable.
    pub async fn list_for_resale(
        &self,
        ticket_id: TicketId,
        asking_price: Money,
        seller: String,
    ) -> MarketResult<ResaleListing> {
        let Some(ticket) = self.tickets.get_ticket(ticket_id).await? else {
            return Err(MarketError::ClientInput(format!(
                "ticket {ticket_id} does not exist"
            )));
        };
        if self
            .tickets
            .listing_for_ticket(ticket_id)
            .await?
            .is_some()
        {
            return Err(MarketError::ClientInput(format!(
                "ticket {ticket_id} is already listed for resale"
            )));
        }

        let listing = ResaleListing {
            id: ListingId::new(),
            ticket_id,
            event_id: ticket.event_id,
            original_price: ticket.price_paid,
            asking_price,
            seller,
            listed_at: Utc::now(),
        };
        self.tickets.insert_listing(listing.clone()).await?;

        metrics::record_resale_listed();
        tracing::info!(
            %ticket_id,
            event_id = %listing.event_id,
            asking_price = %listing.asking_price,
            "Ticket listed for resale"
        );
        Ok(listing)
    }

    /// Fetches an event by id.
    ///
    /// # Errors
    ///
    /// `EventNotFound` for unknown ids, `Storage` when the store is
    /// unavailable.
    pub async fn event(&self, event_id: EventId) -> MarketResult<Event> {
        self.events
            .get(event_id)
            .await?
            .ok_or(MarketError::EventNotFound(event_id))
    }

    /// Lists all events ordered by date.
    ///
    /// # Errors
    ///
    /// `Storage` when the store is unavailable.
    pub async fn events(&self) -> MarketResult<Vec<Event>> {
        self.events.list().await
    }

    /// Availability snapshot for an event.
    ///
    /// # Errors
    ///
    /// `EventNotFound` for unknown ids, `Storage` when the store is
    /// unavailable.
    pub async fn availability(&self, event_id: EventId) -> MarketResult<Availability> {
        let event = self.event(event_id).await?;
        Ok(Availability {
            total: event.total_tickets,
            sold: event.sold_tickets,
            available: event.available_tickets(),
        })
    }

    /// All resale listings, newest first.
    ///
    /// # Errors
    ///
    /// `Storage` when the store is unavailable.
    pub async fn resale_listings(&self) -> MarketResult<Vec<ResaleListing>> {
        self.tickets.listings().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::memory::{MemoryEventStore, MemoryTicketStore};
    use crate::types::EventCategory;
    use chrono::Duration;

    fn test_ledger() -> InventoryLedger {
        InventoryLedger::new(
            Arc::new(MemoryEventStore::new()),
            Arc::new(MemoryTicketStore::new()),
        )
    }

    fn new_event(total: u32) -> NewEvent {
        NewEvent {
            name: "Comedy Night".to_string(),
            description: "An evening of laughter".to_string(),
            date: Utc::now() + Duration::days(14),
            location: "Comedy Club, Los Angeles".to_string(),
            ticket_price: Money::from_cents(7500),
            total_tickets: total,
            vendor: "club-owner".to_string(),
            event_type: EventCategory::Other,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_purchase_decrements_and_issues() {
        let ledger = test_ledger();
        let event = ledger.create_event(new_event(100)).await.unwrap();

        let tickets = ledger.purchase(event.id, 3, None).await.unwrap();
        assert_eq!(tickets.len(), 3);
        assert!(tickets.iter().all(|t| t.event_id == event.id));
        assert!(tickets.iter().all(|t| t.price_paid == event.ticket_price));

        let availability = ledger.availability(event.id).await.unwrap();
        assert_eq!(availability.sold, 3);
        assert_eq!(availability.available, 97);
    }

    #[tokio::test]
    async fn test_purchase_insufficient_inventory() {
        let ledger = test_ledger();
        let event = ledger.create_event(new_event(2)).await.unwrap();

        let err = ledger.purchase(event.id, 5, None).await.unwrap_err();
        assert_eq!(
            err,
            MarketError::InsufficientInventory {
                requested: 5,
                available: 2
            }
        );

        // Nothing was mutated.
        let availability = ledger.availability(event.id).await.unwrap();
        assert_eq!(availability.available, 2);
    }

    #[tokio::test]
    async fn test_purchase_unknown_event() {
        let ledger = test_ledger();
        let missing = EventId::new();
        let err = ledger.purchase(missing, 1, None).await.unwrap_err();
        assert_eq!(err, MarketError::EventNotFound(missing));
    }

    #[tokio::test]
    async fn test_purchase_rejects_zero_and_oversized_quantity() {
        let ledger = test_ledger();
        let event = ledger.create_event(new_event(100)).await.unwrap();

        assert!(matches!(
            ledger.purchase(event.id, 0, None).await,
            Err(MarketError::ClientInput(_))
        ));
        assert!(matches!(
            ledger
                .purchase(event.id, MAX_PURCHASE_QUANTITY + 1, None)
                .await,
            Err(MarketError::ClientInput(_))
        ));
    }

    #[tokio::test]
    async fn test_create_event_validation() {
        let ledger = test_ledger();

        let mut nameless = new_event(10);
        nameless.name = "  ".to_string();
        assert!(matches!(
            ledger.create_event(nameless).await,
            Err(MarketError::ClientInput(_))
        ));

        assert!(matches!(
            ledger.create_event(new_event(0)).await,
            Err(MarketError::ClientInput(_))
        ));
    }

    #[tokio::test]
    async fn test_resale_requires_existing_unlisted_ticket() {
        let ledger = test_ledger();
        let event = ledger.create_event(new_event(10)).await.unwrap();
        let tickets = ledger.purchase(event.id, 1, None).await.unwrap();
        let ticket_id = tickets[0].id;

        // Unknown ticket is rejected.
        assert!(matches!(
            ledger
                .list_for_resale(TicketId::new(), Money::from_cents(5000), "seller".into())
                .await,
            Err(MarketError::ClientInput(_))
        ));

        // First listing succeeds and carries the original price.
        let listing = ledger
            .list_for_resale(ticket_id, Money::from_cents(5000), "Sarah M.".into())
            .await
            .unwrap();
        assert_eq!(listing.original_price, event.ticket_price);
        assert_eq!(listing.event_id, event.id);

        // A second listing of the same ticket is rejected.
        assert!(matches!(
            ledger
                .list_for_resale(ticket_id, Money::from_cents(4000), "Sarah M.".into())
                .await,
            Err(MarketError::ClientInput(_))
        ));

        assert_eq!(ledger.resale_listings().await.unwrap().len(), 1);
    }

    /// Ticket store that refuses every issuance, simulating a storage
    /// outage between the decrement and the ticket append.
    struct FailingTicketStore;

    #[async_trait::async_trait]
    impl TicketStore for FailingTicketStore {
        async fn insert_tickets(&self, _issued: &[Ticket]) -> MarketResult<()> {
            Err(MarketError::Storage("ticket store unavailable".to_string()))
        }

        async fn get_ticket(&self, _id: TicketId) -> MarketResult<Option<Ticket>> {
            Ok(None)
        }

        async fn insert_listing(&self, _listing: ResaleListing) -> MarketResult<()> {
            Ok(())
        }

        async fn listings(&self) -> MarketResult<Vec<ResaleListing>> {
            Ok(Vec::new())
        }

        async fn listing_for_ticket(&self, _id: TicketId) -> MarketResult<Option<ResaleListing>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_failed_issuance_releases_the_decrement() {
        let events = Arc::new(MemoryEventStore::new());
        let ledger = InventoryLedger::new(
            Arc::clone(&events) as Arc<dyn EventStore>,
            Arc::new(FailingTicketStore),
        );
        let event = ledger.create_event(new_event(10)).await.unwrap();

        let err = ledger.purchase(event.id, 3, None).await.unwrap_err();
        assert!(matches!(err, MarketError::Storage(_)));

        // The decrement was compensated: the failed purchase left no trace,
        // so a retry starts from full availability.
        let availability = ledger.availability(event.id).await.unwrap();
        assert_eq!(availability.sold, 0);
        assert_eq!(availability.available, 10);
    }

    #[tokio::test]
    async fn test_last_ticket_race() {
        // Two buyers race for a single remaining ticket; exactly one wins.
        let ledger = Arc::new(test_ledger());
        let event = ledger.create_event(new_event(1)).await.unwrap();

        let first = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.purchase(event.id, 1, None).await })
        };
        let second = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.purchase(event.id, 1, None).await })
        };

        let results = [first.await.unwrap(), second.await.unwrap()];
        let winners = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(winners, 1);

        let availability = ledger.availability(event.id).await.unwrap();
        assert_eq!(availability.sold, 1);
        assert_eq!(availability.available, 0);
    }
}
