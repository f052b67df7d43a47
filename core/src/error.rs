//! Error taxonomy for the marketplace core.
//!
//! Payment confirmation is the integrity boundary: once the external
//! processor reports a payment as cleared, downstream failures (inventory,
//! fulfillment) surface as warnings on a successful confirmation rather than
//! as errors. The variants here cover everything that genuinely rejects a
//! request.

use crate::types::{EventId, PaymentReference};
use thiserror::Error;

/// Errors produced by the marketplace core.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MarketError {
    /// Malformed or missing client input. Rejected before any mutation.
    #[error("invalid request: {0}")]
    ClientInput(String),

    /// The referenced event does not exist.
    #[error("event {0} not found")]
    EventNotFound(EventId),

    /// The requested quantity exceeds what remains.
    #[error("insufficient inventory: requested {requested}, available {available}")]
    InsufficientInventory {
        /// Tickets requested
        requested: u32,
        /// Tickets actually available
        available: u32,
    },

    /// A confirmation arrived for a reference the registry has never seen.
    #[error("unknown payment reference {0}")]
    UnknownReference(PaymentReference),

    /// Payment initiation was attempted by a session that has not passed
    /// identity verification.
    #[error("identity verification required")]
    VerificationRequired,

    /// An external collaborator (verifier, payment processor, mint service)
    /// failed or timed out. Never assumed successful.
    #[error("external service '{service}' failed: {message}")]
    ExternalService {
        /// Which collaborator failed
        service: &'static str,
        /// What it reported
        message: String,
    },

    /// The backing store is unavailable. Fatal for the current request; the
    /// caller should retry.
    #[error("storage unavailable: {0}")]
    Storage(String),
}

impl MarketError {
    /// Shorthand for an [`MarketError::ExternalService`] value.
    #[must_use]
    pub fn external(service: &'static str, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service,
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the core.
pub type MarketResult<T> = Result<T, MarketError>;
