//! Post-payment fulfillment: NFT ticket minting.
//!
//! Fulfillment issues a durable on-chain ticket artifact after a payment has
//! been confirmed and inventory decremented. It is the slowest external call
//! in the system (block-confirmation latency) and runs strictly after, and
//! independently of, the inventory mutation: a mint failure is reported as a
//! warning and never reverses the purchase.

use crate::error::{MarketError, MarketResult};
use crate::types::{EventId, MintedTicket, Money, PaymentReference, WalletAddress};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A mint request for a confirmed purchase.
#[derive(Clone, Debug, PartialEq)]
pub struct MintRequest {
    /// Event the tickets belong to
    pub event_id: EventId,
    /// How many tickets to mint
    pub quantity: u32,
    /// Recipient wallet
    pub buyer_address: WalletAddress,
    /// Total amount paid, used by the contract for pricing
    pub total_amount: Money,
    /// The confirmed payment reference, for traceability
    pub payment_reference: PaymentReference,
}

/// Abstraction over the mint service that writes ticket tokens to the chain.
#[async_trait]
pub trait TicketMinter: Send + Sync {
    /// Mints `quantity` ticket tokens for the buyer.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ExternalService`] when the service fails,
    /// rejects the request, or times out. Timeouts are failures; a mint is
    /// never assumed successful.
    async fn mint(&self, request: &MintRequest) -> MarketResult<Vec<MintedTicket>>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MintWireRequest<'a> {
    event_id: String,
    quantity: u32,
    buyer_address: &'a str,
    #[serde(rename = "totalAmountUSD")]
    total_amount_usd: f64,
    payment_reference: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MintWireTicket {
    ticket_id: String,
    transaction_hash: String,
    // The mint service serializes block numbers as decimal strings.
    block_number: String,
}

#[derive(Debug, Deserialize)]
struct MintWireResponse {
    success: bool,
    #[serde(rename = "ticketIds", default)]
    ticket_ids: Vec<MintWireTicket>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the mint service.
pub struct HttpTicketMinter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTicketMinter {
    /// Creates a minter targeting `endpoint` with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ExternalService`] when the HTTP client cannot
    /// be constructed.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> MarketResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MarketError::external("mint-service", e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl TicketMinter for HttpTicketMinter {
    async fn mint(&self, request: &MintRequest) -> MarketResult<Vec<MintedTicket>> {
        let body = MintWireRequest {
            event_id: request.event_id.to_string(),
            quantity: request.quantity,
            buyer_address: request.buyer_address.as_str(),
            total_amount_usd: request.total_amount.as_usd(),
            payment_reference: request.payment_reference.as_str(),
        };

        tracing::info!(
            event_id = %request.event_id,
            quantity = request.quantity,
            buyer = %request.buyer_address,
            reference = %request.payment_reference,
            "Requesting NFT ticket mint"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| MarketError::external("mint-service", e.to_string()))?;
        let response: MintWireResponse = response
            .json()
            .await
            .map_err(|e| MarketError::external("mint-service", e.to_string()))?;

        if !response.success {
            let message = response
                .error
                .unwrap_or_else(|| "mint service reported failure".to_string());
            return Err(MarketError::external("mint-service", message));
        }

        response
            .ticket_ids
            .into_iter()
            .map(|ticket| {
                let block_number = ticket.block_number.parse().map_err(|_| {
                    MarketError::external(
                        "mint-service",
                        format!("malformed block number '{}'", ticket.block_number),
                    )
                })?;
                Ok(MintedTicket {
                    ticket_id: ticket.ticket_id,
                    transaction_hash: ticket.transaction_hash,
                    block_number,
                })
            })
            .collect()
    }
}

/// Mock minter for development and testing.
///
/// Succeeds with synthetic ticket tokens by default; construct with
/// [`MockTicketMinter::failing`] to simulate a mint-service outage.
#[derive(Debug, Default)]
pub struct MockTicketMinter {
    failure: Option<String>,
}

impl MockTicketMinter {
    /// Creates a minter that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a minter that always fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl TicketMinter for MockTicketMinter {
    async fn mint(&self, request: &MintRequest) -> MarketResult<Vec<MintedTicket>> {
        if let Some(message) = &self.failure {
            return Err(MarketError::external("mint-service", message.clone()));
        }
        let minted = (0..request.quantity)
            .map(|index| MintedTicket {
                ticket_id: format!("mock-{}-{index}", request.payment_reference),
                transaction_hash: format!("0x{:064x}", rand::random::<u128>()),
                block_number: 1 + u64::from(index),
            })
            .collect();
        Ok(minted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_request() -> MintRequest {
        MintRequest {
            event_id: EventId::new(),
            quantity: 2,
            buyer_address: WalletAddress::parse("0xabcdef0123456789abcdef0123456789abcdef01")
                .unwrap(),
            total_amount: Money::from_cents(10_000),
            payment_reference: PaymentReference::generate(),
        }
    }

    #[tokio::test]
    async fn test_mock_minter_mints_requested_quantity() {
        let minter = MockTicketMinter::new();
        let minted = minter.mint(&sample_request()).await.unwrap();
        assert_eq!(minted.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_minter_failure() {
        let minter = MockTicketMinter::failing("rpc unreachable");
        let err = minter.mint(&sample_request()).await.unwrap_err();
        assert!(matches!(err, MarketError::ExternalService { .. }));
    }
}
