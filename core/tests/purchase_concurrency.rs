//! Concurrency tests for the purchase and confirmation paths.
//!
//! Simulates flash-sale load: many buyers racing for limited inventory, and
//! duplicate webhook deliveries racing each other.
//!
//! Run with: `cargo test --test purchase_concurrency`

#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::{Duration, Utc};
use std::sync::Arc;
use ticketmarket_core::ledger::InventoryLedger;
use ticketmarket_core::payments::{ConfirmationHandler, PaymentReferenceRegistry};
use ticketmarket_core::storage::memory::{
    MemoryEventStore, MemoryIntentStore, MemoryTicketStore,
};
use ticketmarket_core::storage::IntentStore;
use ticketmarket_core::types::{EventCategory, EventId, Money, NewEvent};
use ticketmarket_core::{Confirmation, MarketError, PaymentResult};

fn build_ledger() -> Arc<InventoryLedger> {
    Arc::new(InventoryLedger::new(
        Arc::new(MemoryEventStore::new()),
        Arc::new(MemoryTicketStore::new()),
    ))
}

async fn seed_event(ledger: &InventoryLedger, total: u32) -> EventId {
    ledger
        .create_event(NewEvent {
            name: "NBA Finals Game 7".to_string(),
            description: "The most anticipated game of the year".to_string(),
            date: Utc::now() + Duration::days(3),
            location: "Madison Square Garden, New York".to_string(),
            ticket_price: Money::from_cents(45_000),
            total_tickets: total,
            vendor: "arena".to_string(),
            event_type: EventCategory::Sport,
            image_url: None,
        })
        .await
        .unwrap()
        .id
}

/// N concurrent purchases of Q tickets each, with N*Q well beyond capacity:
/// exactly `capacity` tickets sell, never more.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_purchases_never_oversell() {
    const CAPACITY: u32 = 10;
    const BUYERS: usize = 40;
    const QUANTITY: u32 = 2;

    let ledger = build_ledger();
    let event_id = seed_event(&ledger, CAPACITY).await;

    let mut handles = Vec::with_capacity(BUYERS);
    for _ in 0..BUYERS {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            ledger.purchase(event_id, QUANTITY, None).await
        }));
    }

    let mut sold = 0u32;
    let mut rejections = 0usize;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(tickets) => {
                assert_eq!(tickets.len() as u32, QUANTITY);
                sold += QUANTITY;
            }
            Err(MarketError::InsufficientInventory { available, .. }) => {
                assert!(available < QUANTITY);
                rejections += 1;
            }
            Err(other) => panic!("unexpected purchase error: {other}"),
        }
    }

    // Capacity divides the per-buyer quantity, so the event sells out
    // exactly and everyone else is turned away.
    assert_eq!(sold, CAPACITY);
    assert_eq!(rejections, BUYERS - (CAPACITY / QUANTITY) as usize);

    let availability = ledger.availability(event_id).await.unwrap();
    assert_eq!(availability.sold, CAPACITY);
    assert_eq!(availability.available, 0);
}

/// Concurrent duplicate deliveries of the same confirmation decrement
/// inventory exactly once. Losers of the claim race either observe the
/// recorded outcome (a replay) or are told the confirmation is in flight;
/// none of them touch inventory.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_confirmations_decrement_once() {
    const DELIVERIES: usize = 12;

    let intents = Arc::new(MemoryIntentStore::new());
    let ledger = build_ledger();
    let event_id = seed_event(&ledger, 50).await;
    let registry = PaymentReferenceRegistry::new(Arc::clone(&intents) as Arc<dyn IntentStore>);
    let intent = registry
        .create_intent(event_id, 3, Money::from_cents(135_000), None)
        .await
        .unwrap();
    let handler = Arc::new(ConfirmationHandler::new(
        Arc::clone(&ledger),
        Arc::clone(&intents) as Arc<dyn IntentStore>,
        None,
        None,
    ));

    let mut handles = Vec::with_capacity(DELIVERIES);
    for _ in 0..DELIVERIES {
        let handler = Arc::clone(&handler);
        let reference = intent.reference.as_str().to_string();
        handles.push(tokio::spawn(async move {
            handler
                .confirm(PaymentResult {
                    reference,
                    status: "success".to_string(),
                    transaction: None,
                })
                .await
        }));
    }

    let mut fresh = 0usize;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(Confirmation::Confirmed { replayed: false, .. }) => fresh += 1,
            Ok(Confirmation::Confirmed { replayed: true, .. })
            | Err(MarketError::ClientInput(_)) => {}
            other => panic!("unexpected confirmation outcome: {other:?}"),
        }
    }
    assert_eq!(fresh, 1);

    let availability = ledger.availability(event_id).await.unwrap();
    assert_eq!(availability.sold, 3);
    assert_eq!(availability.available, 47);
}
