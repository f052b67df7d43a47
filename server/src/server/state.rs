//! Application state for the ticketmarket HTTP server.
//!
//! Contains all shared resources needed by HTTP handlers: the inventory
//! ledger, the payment reference registry, the confirmation handler, the
//! verification gate, and the external verifier client. It's cloned
//! (cheaply via Arc) for each request.

use crate::config::Config;
use std::sync::Arc;
use std::time::Duration;
use ticketmarket_core::payments::{PaymentProcessor, PortalPaymentProcessor};
use ticketmarket_core::storage::memory::{
    MemoryEventStore, MemoryIntentStore, MemoryTicketStore,
};
use ticketmarket_core::storage::IntentStore;
use ticketmarket_core::{
    ConfirmationHandler, HttpTicketMinter, IdentityVerifier, InventoryLedger,
    PaymentReferenceRegistry, PortalIdentityVerifier, TicketMinter, VerificationGate,
};

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Inventory ledger (events, tickets, resale listings)
    pub ledger: Arc<InventoryLedger>,
    /// Payment reference registry
    pub registry: Arc<PaymentReferenceRegistry>,
    /// Payment confirmation handler
    pub confirmations: Arc<ConfirmationHandler>,
    /// Session-scoped verification gate
    pub gate: Arc<VerificationGate>,
    /// External identity verifier
    pub verifier: Arc<dyn IdentityVerifier>,
    /// Action identifier proofs must be bound to
    pub verify_action: String,
}

impl AppState {
    /// Create a new application state from explicit components.
    ///
    /// Used directly by tests to inject mock collaborators.
    #[must_use]
    pub fn new(
        ledger: Arc<InventoryLedger>,
        registry: Arc<PaymentReferenceRegistry>,
        confirmations: Arc<ConfirmationHandler>,
        gate: Arc<VerificationGate>,
        verifier: Arc<dyn IdentityVerifier>,
        verify_action: String,
    ) -> Self {
        Self {
            ledger,
            registry,
            confirmations,
            gate,
            verifier,
            verify_action,
        }
    }

    /// Assemble the reference deployment: in-memory stores, portal-backed
    /// verifier, and — when configured — the processor re-query client and
    /// the HTTP mint client.
    ///
    /// # Errors
    ///
    /// Returns an error when an HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let intents = Arc::new(MemoryIntentStore::new());
        let ledger = Arc::new(InventoryLedger::new(
            Arc::new(MemoryEventStore::new()),
            Arc::new(MemoryTicketStore::new()),
        ));
        let registry = Arc::new(PaymentReferenceRegistry::new(
            Arc::clone(&intents) as Arc<dyn IntentStore>
        ));

        let portal_timeout = Duration::from_secs(config.portal.timeout);
        let processor: Option<Arc<dyn PaymentProcessor>> = match &config.portal.api_key {
            Some(api_key) => Some(Arc::new(PortalPaymentProcessor::new(
                config.portal.base_url.clone(),
                config.portal.app_id.clone(),
                api_key.clone(),
                portal_timeout,
            )?)),
            None => {
                tracing::warn!(
                    "No portal API key configured; trusting wallet-supplied payment status (test mode)"
                );
                None
            }
        };

        let minter: Option<Arc<dyn TicketMinter>> = match &config.minter.endpoint {
            Some(endpoint) => Some(Arc::new(HttpTicketMinter::new(
                endpoint.clone(),
                Duration::from_secs(config.minter.timeout),
            )?)),
            None => {
                tracing::info!("No mint endpoint configured; NFT fulfillment disabled");
                None
            }
        };

        let confirmations = Arc::new(ConfirmationHandler::new(
            Arc::clone(&ledger),
            Arc::clone(&intents) as Arc<dyn IntentStore>,
            processor,
            minter,
        ));

        let verifier: Arc<dyn IdentityVerifier> = Arc::new(PortalIdentityVerifier::new(
            config.portal.base_url.clone(),
            config.portal.app_id.clone(),
            portal_timeout,
        )?);

        Ok(Self::new(
            ledger,
            registry,
            confirmations,
            Arc::new(VerificationGate::new()),
            verifier,
            config.portal.verify_action.clone(),
        ))
    }
}
