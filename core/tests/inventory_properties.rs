//! Property tests for the inventory invariant.
//!
//! For all events, at all times: `0 <= available <= total`, and the sold
//! count equals exactly the sum of successfully purchased quantities.
//!
//! Run with: `cargo test --test inventory_properties`

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use proptest::prelude::*;
use std::sync::Arc;
use ticketmarket_core::ledger::InventoryLedger;
use ticketmarket_core::storage::memory::{MemoryEventStore, MemoryTicketStore};
use ticketmarket_core::types::{EventCategory, Money, NewEvent};

fn new_event(total: u32) -> NewEvent {
    NewEvent {
        name: "Property Night".to_string(),
        description: "Randomly generated purchase load".to_string(),
        date: Utc::now() + Duration::days(1),
        location: "Anywhere".to_string(),
        ticket_price: Money::from_cents(1000),
        total_tickets: total,
        vendor: "prop-vendor".to_string(),
        event_type: EventCategory::Other,
        image_url: None,
    }
}

proptest! {
    /// Any sequence of purchase requests leaves the counts consistent:
    /// sold never exceeds total, available is exactly the complement, and
    /// every issued ticket corresponds to a successful request.
    #[test]
    fn purchase_sequences_preserve_inventory_bounds(
        total in 1u32..200,
        quantities in proptest::collection::vec(1u32..12, 0..64),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let ledger = InventoryLedger::new(
                Arc::new(MemoryEventStore::new()),
                Arc::new(MemoryTicketStore::new()),
            );
            let event = ledger.create_event(new_event(total)).await.unwrap();

            let mut issued = 0u32;
            for quantity in quantities {
                if let Ok(tickets) = ledger.purchase(event.id, quantity, None).await {
                    prop_assert_eq!(tickets.len() as u32, quantity);
                    issued += quantity;
                }

                let availability = ledger.availability(event.id).await.unwrap();
                prop_assert!(availability.sold <= availability.total);
                prop_assert_eq!(
                    availability.available,
                    availability.total - availability.sold
                );
                prop_assert_eq!(availability.sold, issued);
            }
            Ok(())
        })?;
    }

    /// A request can only succeed when enough tickets remain, so the total
    /// issued never exceeds capacity even when requests keep coming after
    /// sellout.
    #[test]
    fn oversubscribed_events_never_oversell(
        total in 1u32..50,
        quantities in proptest::collection::vec(1u32..8, 16..48),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let ledger = InventoryLedger::new(
                Arc::new(MemoryEventStore::new()),
                Arc::new(MemoryTicketStore::new()),
            );
            let event = ledger.create_event(new_event(total)).await.unwrap();

            for quantity in quantities {
                let _ = ledger.purchase(event.id, quantity, None).await;
            }

            let availability = ledger.availability(event.id).await.unwrap();
            prop_assert!(availability.sold <= total);
            Ok(())
        })?;
    }
}
