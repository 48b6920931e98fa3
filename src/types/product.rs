//! Product snapshot types for the settlement engine
//!
//! A snapshot is the locally cached copy of a product's authoritative state,
//! pulled from the owning remote service on a cache miss or pushed in by a
//! product-change notification. The settlement core never creates product
//! records; it only reads snapshots and commits balance mutations back to
//! the source of truth.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product type discriminant, used as part of the cache key and in error
/// context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductKind {
    Account,
    Credit,
    CreditCard,
    DebitCard,
}

/// Deposit account flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Savings,
    Checking,
    FixedTerm,
}

/// Deposit account snapshot
///
/// Carries the fee policy consulted by the account settlement path: once
/// `max_free_transactions` deposits/withdrawals have been logged against the
/// account, each further one is charged `transaction_cost` on top of its
/// amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    /// Ownership key: the sole predicate for ownership validation
    pub customer_id: String,
    pub account_type: AccountType,
    pub balance: Decimal,
    /// Number of free deposits/withdrawals before the commission applies
    pub max_free_transactions: u32,
    /// Commission charged once the free allowance is exceeded
    pub transaction_cost: Decimal,
}

/// Credit line status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditStatus {
    Active,
    Finished,
}

/// Payment schedule status for credits and credit cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Finished,
}

/// Credit line snapshot
///
/// Credit settlements commit the whole mutated record (balance, statuses,
/// schedule) back to the credit service, not just the balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credit {
    pub id: String,
    pub customer_id: String,
    /// Outstanding debt; the credit is finished once this reaches zero
    pub remaining_balance: Decimal,
    /// Minimum amount a payment must reach to advance the schedule
    pub minimum_payment: Decimal,
    pub credit_status: CreditStatus,
    pub payment_status: PaymentStatus,
    pub next_payment_date: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Card status, shared by credit and debit cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardStatus {
    Active,
    Blocked,
    Expired,
}

/// Credit card snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCard {
    pub id: String,
    pub customer_id: String,
    pub credit_limit: Decimal,
    /// Credit still available for purchases; restored by payments
    pub available_balance: Decimal,
    pub status: CardStatus,
    pub payment_status: PaymentStatus,
    pub minimum_payment: Decimal,
}

/// Debit card snapshot
///
/// A debit card has no balance of its own; settlements are resolved against
/// the primary account first and then the associated accounts in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebitCard {
    pub id: String,
    pub card_number: String,
    pub customer_id: String,
    /// Must be [`CardStatus::Active`] for the card to be usable
    pub status: CardStatus,
    /// Preferred settlement account, always tried first
    pub primary_account_id: String,
    /// Fallback pool, tried in original relative order
    pub associated_account_ids: Vec<String>,
}

/// A cached product snapshot of any cacheable type
///
/// Debit cards are deliberately absent: the orchestrator always fetches them
/// directly from the card service, so they never enter the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProductSnapshot {
    Account(Account),
    Credit(Credit),
    CreditCard(CreditCard),
}

impl ProductSnapshot {
    /// Product identifier of the wrapped snapshot
    pub fn id(&self) -> &str {
        match self {
            ProductSnapshot::Account(account) => &account.id,
            ProductSnapshot::Credit(credit) => &credit.id,
            ProductSnapshot::CreditCard(card) => &card.id,
        }
    }

    /// Ownership key of the wrapped snapshot
    pub fn customer_id(&self) -> &str {
        match self {
            ProductSnapshot::Account(account) => &account.customer_id,
            ProductSnapshot::Credit(credit) => &credit.customer_id,
            ProductSnapshot::CreditCard(card) => &card.customer_id,
        }
    }

    /// Product type discriminant of the wrapped snapshot
    pub fn kind(&self) -> ProductKind {
        match self {
            ProductSnapshot::Account(_) => ProductKind::Account,
            ProductSnapshot::Credit(_) => ProductKind::Credit,
            ProductSnapshot::CreditCard(_) => ProductKind::CreditCard,
        }
    }
}
