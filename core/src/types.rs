//! Domain types for the ticketing marketplace.
//!
//! Value objects (identifiers, money, wallet addresses, the payment reference
//! token) and the entities the core operates on: events, issued tickets,
//! resale listings, and pending payment intents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an issued ticket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Creates a new random `TicketId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `TicketId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a resale listing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(Uuid);

impl ListingId {
    /// Creates a new random `ListingId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque client session identifier.
///
/// Verification success is tracked per session and never persisted beyond the
/// running process.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a raw session token. Returns `None` for an empty token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// The raw token
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Payment reference token
// ============================================================================

/// Opaque token correlating a payment initiation with its later confirmation.
///
/// Generated as a 128-bit random value rendered as 32 lowercase hex digits
/// with no separators, so the token survives naive URL and form encoding.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentReference(String);

impl PaymentReference {
    /// Generates a fresh reference. Collision probability is negligible.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{:032x}", rand::random::<u128>()))
    }

    /// Wraps an externally supplied token. Returns `None` for an empty token.
    #[must_use]
    pub fn parse(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// The raw token
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money
// ============================================================================

/// Monetary amount in USD cents.
///
/// Stored as whole cents to avoid floating point drift in inventory and
/// payment accounting. Amounts are non-negative by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole dollars with overflow checking
    #[must_use]
    pub const fn checked_from_dollars(dollars: u64) -> Option<Self> {
        match dollars.checked_mul(100) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Converts a USD amount carried as a JSON number into cents.
    ///
    /// Returns `None` for negative, non-finite, or out-of-range values.
    #[must_use]
    pub fn from_usd(amount: f64) -> Option<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return None;
        }
        let cents = (amount * 100.0).round();
        if cents > u64::MAX as f64 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let cents = cents as u64;
        Some(Self(cents))
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount as a USD JSON number
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_usd(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Multiplies by a ticket quantity with overflow checking
    #[must_use]
    pub const fn checked_mul(&self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Wallet address
// ============================================================================

/// A 20-byte chain address in 0x-prefixed hex form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parses and normalizes an address.
    ///
    /// Accepts an optional `0x` prefix and exactly 40 hex digits; the stored
    /// form is always lowercase with the prefix.
    ///
    /// # Errors
    ///
    /// Returns a description of the malformed input.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if hex.len() != 40 {
            return Err(format!(
                "wallet address must be 40 hex digits, got {}",
                hex.len()
            ));
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("wallet address contains non-hex characters".to_string());
        }
        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }

    /// The normalized 0x-prefixed form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(address: WalletAddress) -> Self {
        address.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Events
// ============================================================================

/// Event category, matching the persisted record's enumerated `event_type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventCategory {
    /// Sporting event
    Sport,
    /// Concert or music festival
    Concert,
    /// Hackathon
    Hackathon,
    /// Conference
    Conference,
    /// Anything else
    Other,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sport => "Sport",
            Self::Concert => "Concert",
            Self::Hackathon => "Hackathon",
            Self::Conference => "Conference",
            Self::Other => "Other",
        };
        write!(f, "{name}")
    }
}

/// A ticketed event.
///
/// `total_tickets` is immutable after creation; `sold_tickets` only ever
/// grows, and only through the ledger's atomic purchase path. Available
/// tickets are derived, never stored, so the count cannot drift.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Display name
    pub name: String,
    /// Long-form description
    pub description: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Venue / location
    pub location: String,
    /// Primary ticket price
    pub ticket_price: Money,
    /// Total capacity, fixed at creation
    pub total_tickets: u32,
    /// Tickets sold so far
    pub sold_tickets: u32,
    /// Vendor identity (organizer name or wallet address)
    pub vendor: String,
    /// Category
    pub event_type: EventCategory,
    /// Optional poster image
    pub image_url: Option<String>,
    /// Record creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Tickets still available for purchase
    #[must_use]
    pub const fn available_tickets(&self) -> u32 {
        self.total_tickets.saturating_sub(self.sold_tickets)
    }
}

/// Fields required to create an event.
#[derive(Clone, Debug, Deserialize)]
pub struct NewEvent {
    /// Display name
    pub name: String,
    /// Long-form description
    pub description: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Venue / location
    pub location: String,
    /// Primary ticket price
    pub ticket_price: Money,
    /// Total capacity
    pub total_tickets: u32,
    /// Vendor identity
    pub vendor: String,
    /// Category
    pub event_type: EventCategory,
    /// Optional poster image
    pub image_url: Option<String>,
}

// ============================================================================
// Tickets and resale listings
// ============================================================================

/// An issued ticket record.
///
/// Created only as a side effect of a successful purchase and immutable
/// thereafter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket identifier
    pub id: TicketId,
    /// Owning event
    pub event_id: EventId,
    /// Price paid at purchase time
    pub price_paid: Money,
    /// Purchase timestamp
    pub purchased_at: DateTime<Utc>,
    /// Buyer wallet address, when the purchase came through the wallet flow
    pub buyer: Option<WalletAddress>,
}

/// A resale listing referencing (not owning) an issued ticket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResaleListing {
    /// Listing identifier
    pub id: ListingId,
    /// The listed ticket
    pub ticket_id: TicketId,
    /// Original event
    pub event_id: EventId,
    /// Price the seller originally paid
    pub original_price: Money,
    /// Seller's asking price
    pub asking_price: Money,
    /// Seller identity
    pub seller: String,
    /// Listing timestamp
    pub listed_at: DateTime<Utc>,
}

// ============================================================================
// Payment intents and confirmation records
// ============================================================================

/// A pending purchase intent, registered at payment initiation and consulted
/// at confirmation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Correlation token handed to the wallet
    pub reference: PaymentReference,
    /// Event being purchased
    pub event_id: EventId,
    /// Requested quantity
    pub quantity: u32,
    /// Total amount the wallet was asked to pay
    pub total_amount: Money,
    /// Buyer wallet address, when known at initiation
    pub buyer_address: Option<WalletAddress>,
    /// Creation time, used for TTL expiry
    pub created_at: DateTime<Utc>,
}

/// A blockchain-minted ticket token returned by the fulfillment service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MintedTicket {
    /// On-chain ticket identifier
    pub ticket_id: String,
    /// Mint transaction hash
    pub transaction_hash: String,
    /// Block the transaction was confirmed in
    pub block_number: u64,
}

/// The durable outcome of a processed payment confirmation.
///
/// Stored keyed by reference so a re-delivered notification returns the
/// recorded outcome instead of mutating inventory a second time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRecord {
    /// The confirmed reference
    pub reference: PaymentReference,
    /// Tickets issued by the ledger (empty when inventory was insufficient)
    pub tickets: Vec<Ticket>,
    /// NFT tickets minted by fulfillment (empty when skipped or failed)
    pub minted: Vec<MintedTicket>,
    /// Partial-failure warning, when payment cleared but something downstream
    /// did not
    pub warning: Option<String>,
    /// When the confirmation was processed
    pub confirmed_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_reference_format() {
        let reference = PaymentReference::generate();
        assert_eq!(reference.as_str().len(), 32);
        assert!(reference.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_payment_reference_rejects_empty() {
        assert!(PaymentReference::parse("").is_none());
        assert!(PaymentReference::parse("   ").is_none());
    }

    #[test]
    fn test_money_from_usd() {
        assert_eq!(Money::from_usd(89.99).unwrap().cents(), 8999);
        assert_eq!(Money::from_usd(0.0).unwrap().cents(), 0);
        assert!(Money::from_usd(-1.0).is_none());
        assert!(Money::from_usd(f64::NAN).is_none());
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(8999).to_string(), "$89.99");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
    }

    #[test]
    fn test_wallet_address_normalization() {
        let address = WalletAddress::parse("ABCDEF0123456789abcdef0123456789ABCDEF01").unwrap();
        assert_eq!(
            address.as_str(),
            "0xabcdef0123456789abcdef0123456789abcdef01"
        );
        let same = WalletAddress::parse("0xabcdef0123456789abcdef0123456789abcdef01").unwrap();
        assert_eq!(address, same);
    }

    #[test]
    fn test_wallet_address_rejects_malformed() {
        assert!(WalletAddress::parse("0x1234").is_err());
        assert!(WalletAddress::parse("0xzzzdef0123456789abcdef0123456789abcdef01").is_err());
    }

    #[test]
    fn test_available_tickets_never_underflows() {
        let mut event = sample_event();
        event.sold_tickets = event.total_tickets + 5;
        assert_eq!(event.available_tickets(), 0);
    }

    fn sample_event() -> Event {
        Event {
            id: EventId::new(),
            name: "Summer Music Festival".to_string(),
            description: "An unforgettable night of music".to_string(),
            date: Utc::now(),
            location: "Central Park, New York".to_string(),
            ticket_price: Money::from_cents(8999),
            total_tickets: 5000,
            sold_tickets: 0,
            vendor: "festival-co".to_string(),
            event_type: EventCategory::Concert,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
