//! Authoritative payment-status lookup.
//!
//! A wallet notification carries a client-supplied `status` field, which by
//! itself is not trustworthy. When a transaction id accompanies the
//! notification, the confirmation handler re-queries the payment processor's
//! developer portal for the authoritative transaction record and matches it
//! against the supplied reference before trusting `success`.

use crate::error::{MarketError, MarketResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

/// The processor's authoritative view of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ProcessorTransaction {
    /// The reference the transaction was initiated with
    pub reference: String,
    /// Processor-side status (`pending`, `mined`, `failed`, ...)
    pub status: String,
}

/// Abstraction over the payment processor's transaction API.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Fetches the authoritative record for a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ExternalService`] when the processor cannot be
    /// reached, times out, or does not know the transaction. A failure here
    /// must never be treated as a successful payment.
    async fn transaction_status(&self, transaction_id: &str)
        -> MarketResult<ProcessorTransaction>;
}

/// HTTP processor client backed by the developer portal.
pub struct PortalPaymentProcessor {
    client: reqwest::Client,
    base_url: String,
    app_id: String,
    api_key: String,
}

impl PortalPaymentProcessor {
    /// Creates a processor client for `app_id`, authenticating with
    /// `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ExternalService`] when the HTTP client cannot
    /// be constructed.
    pub fn new(
        base_url: impl Into<String>,
        app_id: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> MarketResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MarketError::external("payment-processor", e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            app_id: app_id.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl PaymentProcessor for PortalPaymentProcessor {
    async fn transaction_status(
        &self,
        transaction_id: &str,
    ) -> MarketResult<ProcessorTransaction> {
        let url = format!(
            "{}/api/v2/minikit/transaction/{transaction_id}?app_id={}",
            self.base_url, self.app_id
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| MarketError::external("payment-processor", e.to_string()))?;

        if !response.status().is_success() {
            return Err(MarketError::external(
                "payment-processor",
                format!("transaction lookup returned {}", response.status()),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| MarketError::external("payment-processor", e.to_string()))
    }
}

/// Mock processor for development and testing.
///
/// Knows only the transactions registered through
/// [`MockPaymentProcessor::register`]; everything else is a lookup failure,
/// matching the portal's behaviour for unknown ids.
#[derive(Debug, Default)]
pub struct MockPaymentProcessor {
    transactions: RwLock<HashMap<String, ProcessorTransaction>>,
}

impl MockPaymentProcessor {
    /// Creates an empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an authoritative transaction record.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (test-only type).
    #[allow(clippy::unwrap_used)]
    pub fn register(&self, transaction_id: impl Into<String>, reference: impl Into<String>, status: impl Into<String>) {
        self.transactions.write().unwrap().insert(
            transaction_id.into(),
            ProcessorTransaction {
                reference: reference.into(),
                status: status.into(),
            },
        );
    }
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
    async fn transaction_status(
        &self,
        transaction_id: &str,
    ) -> MarketResult<ProcessorTransaction> {
        let transactions = self
            .transactions
            .read()
            .map_err(|_| MarketError::external("payment-processor", "lock poisoned"))?;
        transactions.get(transaction_id).cloned().ok_or_else(|| {
            MarketError::external(
                "payment-processor",
                format!("unknown transaction {transaction_id}"),
            )
        })
    }
}
