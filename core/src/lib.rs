//! Domain core for the ticketmarket backend.
//!
//! Implements the parts of the marketplace with invariants to preserve: the
//! ticket-inventory consistency mechanism and the payment-confirmation
//! protocol. Everything presentational, plus the persistence engine and the
//! wallet/verifier/chain services, lives outside this crate behind traits.
//!
//! # Architecture
//!
//! ```text
//!                 ┌───────────────────────┐
//!                 │  Verification Gate    │  session-scoped, consulted
//!                 │  (verification)       │  before initiation
//!                 └──────────┬────────────┘
//!                            │
//!  initiate ──────▶ ┌────────▼────────────┐
//!                   │  Reference Registry │  token → PaymentIntent, TTL GC
//!                   │  (payments)         │
//!                   └────────┬────────────┘
//!                            │ external wallet pays
//!  confirm ───────▶ ┌────────▼────────────┐      ┌──────────────────┐
//!                   │ Confirmation Handler│─────▶│ Inventory Ledger │
//!                   │  (payments)         │      │  (ledger)        │
//!                   └────────┬────────────┘      └──────────────────┘
//!                            │ after decrement, never blocking it
//!                   ┌────────▼────────────┐
//!                   │ Fulfillment Trigger │  NFT mint, failure = warning
//!                   │  (fulfillment)      │
//!                   └─────────────────────┘
//! ```
//!
//! # Key invariants
//!
//! - For every event, `0 ≤ available ≤ total` at all times; the availability
//!   check and decrement are one indivisible store operation.
//! - A confirmed payment is always acknowledged, even when inventory or
//!   fulfillment fails afterwards; partial failures ride the warning
//!   channel.
//! - Confirmation processing is at-most-once per reference: replays return
//!   the recorded outcome.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod fulfillment;
pub mod ledger;
pub mod metrics;
pub mod payments;
pub mod storage;
pub mod types;
pub mod verification;

pub use error::{MarketError, MarketResult};
pub use fulfillment::{HttpTicketMinter, MintRequest, MockTicketMinter, TicketMinter};
pub use ledger::{Availability, InventoryLedger, MAX_PURCHASE_QUANTITY};
pub use payments::{
    Confirmation, ConfirmationHandler, PaymentReferenceRegistry, PaymentResult,
    TransactionDetails,
};
pub use types::*;
pub use verification::{
    IdentityVerifier, MockIdentityVerifier, PortalIdentityVerifier, VerificationGate,
    VerificationProof,
};
