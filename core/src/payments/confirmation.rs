//! Payment confirmation handler.
//!
//! Drives the per-reference state machine `Initiated → Confirmed →
//! Fulfilled` / `Initiated → Rejected` when the external wallet delivers a
//! payment result.
//!
//! Two rules shape every branch here:
//!
//! 1. Payment confirmation is the integrity boundary. Once the processor
//!    reports a payment cleared, the response acknowledges it even when the
//!    inventory decrement or the NFT mint fails afterwards; those surface on
//!    the warning channel, never as a dropped payment.
//! 2. Delivery is at-least-once. The handler claims each reference before
//!    touching inventory and records the outcome, so a re-delivered
//!    notification returns the recorded outcome instead of decrementing
//!    twice.

use crate::error::{MarketError, MarketResult};
use crate::fulfillment::{MintRequest, TicketMinter};
use crate::ledger::InventoryLedger;
use crate::metrics;
use crate::payments::processor::PaymentProcessor;
use crate::storage::{BeginOutcome, IntentStore};
use crate::types::{
    ConfirmationRecord, MintedTicket, PaymentIntent, PaymentReference, Ticket, WalletAddress,
};
use chrono::Utc;
use std::sync::Arc;

/// The status string wallets send for a completed payment.
const STATUS_SUCCESS: &str = "success";

/// The processor status that marks a transaction as definitively failed.
const PROCESSOR_STATUS_FAILED: &str = "failed";

/// An externally-supplied payment result.
#[derive(Clone, Debug)]
pub struct PaymentResult {
    /// Reference token from the original initiation
    pub reference: String,
    /// Wallet-reported status; only `success` proceeds
    pub status: String,
    /// Optional transaction details from the wallet
    pub transaction: Option<TransactionDetails>,
}

/// Transaction details accompanying a wallet notification.
#[derive(Clone, Debug, Default)]
pub struct TransactionDetails {
    /// Processor-side transaction id, used for the authoritative re-query
    pub id: Option<String>,
    /// Paying wallet address
    pub from: Option<String>,
}

/// Outcome of handling a payment result.
#[derive(Clone, Debug, PartialEq)]
pub enum Confirmation {
    /// The wallet reported a non-success status. Expected for cancelled or
    /// declined payments; nothing was mutated.
    NotConfirmed,
    /// The payment is confirmed. Inventory and fulfillment results are in
    /// the record; `replayed` marks a re-delivered notification.
    Confirmed {
        /// The processed outcome
        record: ConfirmationRecord,
        /// Whether this delivery was a replay of an already-processed one
        replayed: bool,
    },
}

/// Handles external payment confirmations.
pub struct ConfirmationHandler {
    ledger: Arc<InventoryLedger>,
    intents: Arc<dyn IntentStore>,
    processor: Option<Arc<dyn PaymentProcessor>>,
    minter: Option<Arc<dyn TicketMinter>>,
}

impl ConfirmationHandler {
    /// Creates a handler.
    ///
    /// `processor` enables the authoritative transaction re-query; without
    /// it the wallet-supplied status is trusted (test mode). `minter`
    /// enables NFT fulfillment; without it confirmed purchases issue ledger
    /// tickets only.
    #[must_use]
    pub fn new(
        ledger: Arc<InventoryLedger>,
        intents: Arc<dyn IntentStore>,
        processor: Option<Arc<dyn PaymentProcessor>>,
        minter: Option<Arc<dyn TicketMinter>>,
    ) -> Self {
        Self {
            ledger,
            intents,
            processor,
            minter,
        }
    }

    /// Processes an external payment result.
    ///
    /// # Errors
    ///
    /// `ClientInput` for a missing reference, a concurrent duplicate
    /// delivery, or a notification contradicted by the processor's
    /// authoritative record; `UnknownReference` for references the registry
    /// has never seen; `ExternalService` when the processor re-query fails;
    /// `Storage` when the backing store is unavailable. None of these
    /// mutate inventory.
    pub async fn confirm(&self, result: PaymentResult) -> MarketResult<Confirmation> {
        let Some(reference) = PaymentReference::parse(result.reference.clone()) else {
            metrics::record_confirmation("rejected");
            return Err(MarketError::ClientInput(
                "missing payment reference".to_string(),
            ));
        };

        if result.status != STATUS_SUCCESS {
            tracing::info!(
                %reference,
                status = %result.status,
                "Payment not confirmed; leaving inventory untouched"
            );
            metrics::record_confirmation("not_confirmed");
            return Ok(Confirmation::NotConfirmed);
        }

        match self.intents.begin_confirmation(&reference).await? {
            BeginOutcome::AlreadyProcessed(record) => {
                tracing::info!(%reference, "Replayed confirmation; returning recorded outcome");
                metrics::record_confirmation("replayed");
                return Ok(Confirmation::Confirmed {
                    record,
                    replayed: true,
                });
            }
            BeginOutcome::InFlight => {
                return Err(MarketError::ClientInput(format!(
                    "confirmation for {reference} is already being processed"
                )));
            }
            BeginOutcome::Claimed => {}
        }

        // The claim is held from here on: release it on any rejection so a
        // retry can process the reference, keep it once an outcome is
        // recorded.
        match self.process_claimed(&reference, &result).await {
            Ok(record) => {
                metrics::record_confirmation("confirmed");
                Ok(Confirmation::Confirmed {
                    record,
                    replayed: false,
                })
            }
            Err(error) => {
                metrics::record_confirmation("rejected");
                if let Err(abort_error) = self.intents.abort_confirmation(&reference).await {
                    tracing::error!(
                        %reference,
                        error = %abort_error,
                        "Failed to release confirmation claim"
                    );
                }
                Err(error)
            }
        }
    }

    async fn process_claimed(
        &self,
        reference: &PaymentReference,
        result: &PaymentResult,
    ) -> MarketResult<ConfirmationRecord> {
        let Some(intent) = self.intents.get(reference).await? else {
            tracing::warn!(%reference, "Confirmation for unknown payment reference");
            return Err(MarketError::UnknownReference(reference.clone()));
        };

        self.verify_with_processor(reference, result).await?;

        let buyer = Self::buyer_address(&intent, result);
        let (tickets, mut warning) = self.apply_purchase(&intent, buyer.clone()).await?;
        let minted = if warning.is_none() {
            self.fulfill(&intent, buyer, &tickets, &mut warning).await
        } else {
            Vec::new()
        };

        let record = ConfirmationRecord {
            reference: reference.clone(),
            tickets,
            minted,
            warning,
            confirmed_at: Utc::now(),
        };
        self.intents.record_confirmation(record.clone()).await?;
        metrics::record_intent_consumed();

        tracing::info!(
            %reference,
            tickets = record.tickets.len(),
            minted = record.minted.len(),
            warning = record.warning.as_deref().unwrap_or("none"),
            "Payment confirmed"
        );
        Ok(record)
    }

    /// Re-queries the processor's authoritative transaction record when both
    /// a processor client and a transaction id are available.
    async fn verify_with_processor(
        &self,
        reference: &PaymentReference,
        result: &PaymentResult,
    ) -> MarketResult<()> {
        let transaction_id = result
            .transaction
            .as_ref()
            .and_then(|transaction| transaction.id.as_deref());
        let (Some(processor), Some(transaction_id)) = (&self.processor, transaction_id) else {
            return Ok(());
        };

        let transaction = processor.transaction_status(transaction_id).await?;
        if transaction.reference != reference.as_str()
            || transaction.status == PROCESSOR_STATUS_FAILED
        {
            tracing::warn!(
                %reference,
                transaction_id,
                authoritative_reference = %transaction.reference,
                authoritative_status = %transaction.status,
                "Notification contradicted by processor record"
            );
            return Err(MarketError::ClientInput(
                "payment could not be verified against the processor's record".to_string(),
            ));
        }
        Ok(())
    }

    /// Runs the inventory mutation. Ledger rejections become warnings: the
    /// payment has already cleared, so the response must still acknowledge
    /// it while making the partial failure visible.
    async fn apply_purchase(
        &self,
        intent: &PaymentIntent,
        buyer: Option<WalletAddress>,
    ) -> MarketResult<(Vec<Ticket>, Option<String>)> {
        match self
            .ledger
            .purchase(intent.event_id, intent.quantity, buyer)
            .await
        {
            Ok(tickets) => Ok((tickets, None)),
            Err(MarketError::InsufficientInventory {
                requested,
                available,
            }) => {
                tracing::error!(
                    reference = %intent.reference,
                    event_id = %intent.event_id,
                    requested,
                    available,
                    "Payment cleared but inventory is insufficient"
                );
                Ok((
                    Vec::new(),
                    Some(format!(
                        "payment confirmed but only {available} of {requested} tickets remain; no tickets were issued"
                    )),
                ))
            }
            Err(MarketError::EventNotFound(event_id)) => {
                tracing::error!(
                    reference = %intent.reference,
                    %event_id,
                    "Payment cleared but the event no longer exists"
                );
                Ok((
                    Vec::new(),
                    Some("payment confirmed but the event no longer exists".to_string()),
                ))
            }
            Err(other) => Err(other),
        }
    }

    /// Requests the NFT mint. Failures are logged and surfaced as warnings;
    /// they never reverse the confirmed payment or the inventory decrement.
    async fn fulfill(
        &self,
        intent: &PaymentIntent,
        buyer: Option<WalletAddress>,
        tickets: &[Ticket],
        warning: &mut Option<String>,
    ) -> Vec<MintedTicket> {
        let Some(minter) = &self.minter else {
            return Vec::new();
        };
        if tickets.is_empty() {
            return Vec::new();
        }
        let Some(buyer_address) = buyer else {
            *warning = Some(
                "payment confirmed but no buyer wallet address was available for minting"
                    .to_string(),
            );
            return Vec::new();
        };

        let request = MintRequest {
            event_id: intent.event_id,
            quantity: intent.quantity,
            buyer_address,
            total_amount: intent.total_amount,
            payment_reference: intent.reference.clone(),
        };
        match minter.mint(&request).await {
            Ok(minted) => {
                tracing::info!(
                    reference = %intent.reference,
                    minted = minted.len(),
                    "NFT tickets minted"
                );
                minted
            }
            Err(error) => {
                metrics::record_mint_failure();
                tracing::error!(
                    reference = %intent.reference,
                    %error,
                    "Payment confirmed but NFT minting failed"
                );
                *warning = Some(format!("payment confirmed but NFT minting failed: {error}"));
                Vec::new()
            }
        }
    }

    /// The buyer address for ticket issuance and minting: the intent's, or
    /// the paying wallet from the transaction details.
    fn buyer_address(intent: &PaymentIntent, result: &PaymentResult) -> Option<WalletAddress> {
        intent.buyer_address.clone().or_else(|| {
            result
                .transaction
                .as_ref()
                .and_then(|transaction| transaction.from.as_deref())
                .and_then(|from| WalletAddress::parse(from).ok())
        })
    }
}
