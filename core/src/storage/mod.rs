//! Record-store seams for the marketplace core.
//!
//! Persistence is an external collaborator: the core only requires CRUD plus
//! two operations with stronger contracts, the conditional inventory
//! decrement on [`EventStore`] and the atomic confirmation claim on
//! [`IntentStore`]. The in-memory implementations in [`memory`] back the
//! reference single-process deployment and the test suite; a multi-instance
//! deployment must provide the same contracts on a shared durable store.

pub mod memory;

use crate::error::MarketResult;
use crate::types::{
    ConfirmationRecord, Event, EventId, PaymentIntent, PaymentReference, ResaleListing, Ticket,
    TicketId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result of a conditional inventory decrement.
#[derive(Clone, Debug, PartialEq)]
pub enum DecrementOutcome {
    /// The decrement applied; carries the event snapshot after mutation.
    Applied(Event),
    /// Not enough tickets remained. Nothing was mutated.
    Insufficient {
        /// Tickets that were actually available
        available: u32,
    },
    /// No such event.
    NotFound,
}

/// Result of claiming a payment reference for confirmation processing.
#[derive(Clone, Debug, PartialEq)]
pub enum BeginOutcome {
    /// The caller owns processing for this reference.
    Claimed,
    /// Another confirmation for this reference is mid-flight.
    InFlight,
    /// The reference was already processed; carries the recorded outcome.
    AlreadyProcessed(ConfirmationRecord),
}

/// Store for event records, including the atomic sell operation.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Inserts a new event record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn insert(&self, event: Event) -> MarketResult<()>;

    /// Fetches an event by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn get(&self, id: EventId) -> MarketResult<Option<Event>>;

    /// Lists all events ordered by date ascending.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn list(&self) -> MarketResult<Vec<Event>>;

    /// Sells `quantity` tickets iff at least that many remain.
    ///
    /// The availability check and the `sold_tickets` increment MUST execute
    /// as one indivisible operation: no concurrent purchase may interleave
    /// between check and mutation for the same event.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn decrement_if_available(
        &self,
        id: EventId,
        quantity: u32,
    ) -> MarketResult<DecrementOutcome>;

    /// Returns `quantity` tickets to availability.
    ///
    /// Compensates a decrement whose follow-up work failed, so a failed
    /// purchase leaves no trace in the counts. Saturates at zero sold; a
    /// missing event is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn release_tickets(&self, id: EventId, quantity: u32) -> MarketResult<()>;
}

/// Store for issued tickets and resale listings.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Appends freshly issued tickets.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn insert_tickets(&self, tickets: &[Ticket]) -> MarketResult<()>;

    /// Fetches an issued ticket by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn get_ticket(&self, id: TicketId) -> MarketResult<Option<Ticket>>;

    /// Inserts a resale listing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn insert_listing(&self, listing: ResaleListing) -> MarketResult<()>;

    /// Lists all resale listings, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn listings(&self) -> MarketResult<Vec<ResaleListing>>;

    /// Finds the listing for a ticket, if any.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn listing_for_ticket(&self, id: TicketId) -> MarketResult<Option<ResaleListing>>;
}

/// Store for pending payment intents and processed confirmations.
///
/// `begin_confirmation` / `record_confirmation` / `abort_confirmation`
/// implement the at-most-once contract: for a given reference, only one
/// caller ever observes [`BeginOutcome::Claimed`] before an outcome is
/// recorded or the claim is aborted.
#[async_trait]
pub trait IntentStore: Send + Sync {
    /// Registers a pending intent keyed by its reference.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn put(&self, intent: PaymentIntent) -> MarketResult<()>;

    /// Looks up a pending intent. Unknown references yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn get(&self, reference: &PaymentReference) -> MarketResult<Option<PaymentIntent>>;

    /// Removes pending intents created before `cutoff`, returning how many
    /// were dropped. Processed confirmations are never removed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn remove_created_before(&self, cutoff: DateTime<Utc>) -> MarketResult<usize>;

    /// Atomically claims a reference for confirmation processing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn begin_confirmation(
        &self,
        reference: &PaymentReference,
    ) -> MarketResult<BeginOutcome>;

    /// Records the outcome for a claimed reference and consumes the pending
    /// intent.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn record_confirmation(&self, record: ConfirmationRecord) -> MarketResult<()>;

    /// Releases a claim without recording an outcome, so a later retry can
    /// process the reference again.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn abort_confirmation(&self, reference: &PaymentReference) -> MarketResult<()>;

    /// Returns the recorded outcome for a reference, if it was processed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MarketError::Storage`] when the store is
    /// unavailable.
    async fn processed(
        &self,
        reference: &PaymentReference,
    ) -> MarketResult<Option<ConfirmationRecord>>;
}
