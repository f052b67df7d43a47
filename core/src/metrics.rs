//! Business metrics for the marketplace core.
//!
//! Counters and gauges for the purchase and confirmation paths:
//!
//! - `market_events_created_total` - Events created
//! - `market_tickets_sold_total` - Tickets issued by the ledger
//! - `market_ticket_revenue_cents_total` - Revenue from issued tickets
//! - `market_payments_confirmed_total{outcome}` - Confirmations by outcome
//!   (confirmed, not_confirmed, replayed, rejected)
//! - `market_mint_failures_total` - Fulfillment calls that failed
//! - `market_resale_listings_total` - Resale listings created
//! - `market_intents_expired_total` - Payment intents garbage-collected
//! - `market_pending_intents` - Currently pending payment intents; grows at
//!   initiation, shrinks when a confirmation consumes the intent or the TTL
//!   sweep expires it

use metrics::{describe_counter, describe_gauge};

/// Register metric descriptions. Call once at startup, before recording.
pub fn register_business_metrics() {
    describe_counter!(
        "market_events_created_total",
        "Total number of events created"
    );
    describe_counter!(
        "market_tickets_sold_total",
        "Total number of tickets issued by the inventory ledger"
    );
    describe_counter!(
        "market_ticket_revenue_cents_total",
        "Total revenue from issued tickets in cents"
    );
    describe_counter!(
        "market_payments_confirmed_total",
        "Total payment confirmations by outcome (confirmed, not_confirmed, replayed, rejected)"
    );
    describe_counter!(
        "market_mint_failures_total",
        "Total fulfillment (NFT mint) calls that failed after a confirmed payment"
    );
    describe_counter!(
        "market_resale_listings_total",
        "Total resale listings created"
    );
    describe_counter!(
        "market_intents_expired_total",
        "Total payment intents removed by TTL garbage collection"
    );
    describe_gauge!(
        "market_pending_intents",
        "Payment intents currently awaiting confirmation"
    );

    tracing::info!("Business metrics registered");
}

/// Record an event creation.
pub fn record_event_created() {
    metrics::counter!("market_events_created_total").increment(1);
}

/// Record tickets issued by a successful purchase.
pub fn record_tickets_sold(quantity: u32, revenue_cents: u64) {
    metrics::counter!("market_tickets_sold_total").increment(u64::from(quantity));
    metrics::counter!("market_ticket_revenue_cents_total").increment(revenue_cents);
    tracing::debug!(quantity, revenue_cents, "Recorded tickets_sold metric");
}

/// Record a confirmation outcome.
pub fn record_confirmation(outcome: &'static str) {
    metrics::counter!("market_payments_confirmed_total", "outcome" => outcome).increment(1);
}

/// Record a failed fulfillment call.
pub fn record_mint_failure() {
    metrics::counter!("market_mint_failures_total").increment(1);
}

/// Record a resale listing creation.
pub fn record_resale_listed() {
    metrics::counter!("market_resale_listings_total").increment(1);
}

/// Record a payment intent registered with the registry.
pub fn record_intent_created() {
    metrics::gauge!("market_pending_intents").increment(1.0);
}

/// Record a pending intent consumed by a processed confirmation.
pub fn record_intent_consumed() {
    metrics::gauge!("market_pending_intents").decrement(1.0);
}

/// Record intents dropped by the TTL sweep.
pub fn record_intents_expired(count: usize) {
    metrics::counter!("market_intents_expired_total").increment(count as u64);
    #[allow(clippy::cast_precision_loss)]
    metrics::gauge!("market_pending_intents").decrement(count as f64);
}
