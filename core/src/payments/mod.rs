//! The payment protocol: reference registry, processor re-query, and the
//! confirmation state machine.
//!
//! Flow: [`registry::PaymentReferenceRegistry::create_intent`] hands the
//! wallet a reference token; the wallet pays out-of-band; the external
//! notification lands in
//! [`confirmation::ConfirmationHandler::confirm`], which validates it,
//! enforces at-most-once processing, mutates inventory, and triggers
//! fulfillment.

pub mod confirmation;
pub mod processor;
pub mod registry;

pub use confirmation::{Confirmation, ConfirmationHandler, PaymentResult, TransactionDetails};
pub use processor::{MockPaymentProcessor, PaymentProcessor, PortalPaymentProcessor};
pub use registry::PaymentReferenceRegistry;
