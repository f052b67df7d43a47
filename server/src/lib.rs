//! Ticketmarket HTTP server.
//!
//! Exposes the marketplace core over a JSON API:
//!
//! - event creation, browsing, and availability queries
//! - identity verification gating payment initiation
//! - the payment initiate/confirm protocol
//! - resale listings
//!
//! The domain logic lives in `ticketmarket-core`; this crate only validates
//! payloads at the boundary, maps domain errors onto HTTP statuses, and
//! wires the collaborators configured through the environment.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod server;

pub use config::Config;
pub use server::{build_router, AppState};
