//! Core trait abstractions for remote collaborators
//!
//! Every authoritative store the engine talks to lives behind one of these
//! traits: the four remote product services, the cache store and the durable
//! transaction log. Implementations are injected into the components that
//! need them, so tests can substitute in-memory stubs for the real remote
//! services.
//!
//! Every method on the remote services is a suspension point and can fail
//! with [`SettlementError::ServiceUnavailable`] at any time; the external
//! resilience wrapper short-circuits calls when a downstream is judged
//! unhealthy, and the engine treats that identically to any other remote
//! failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::types::{
    Account, Credit, CreditCard, DebitCard, ProductKind, ProductSnapshot, SettlementError,
    Transaction,
};

/// Remote deposit-account service
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Fetch an account snapshot from the source of truth
    async fn fetch_by_id(&self, account_id: &str) -> Result<Account, SettlementError>;

    /// Commit a new balance to the source of truth, returning the updated
    /// snapshot
    async fn update_balance(
        &self,
        account_id: &str,
        new_balance: Decimal,
    ) -> Result<Account, SettlementError>;
}

/// Remote credit-line service
#[async_trait]
pub trait CreditService: Send + Sync {
    /// Fetch a credit snapshot from the source of truth
    async fn fetch_by_id(&self, credit_id: &str) -> Result<Credit, SettlementError>;

    /// Commit a fully mutated credit record (balance, statuses, schedule)
    async fn update(&self, credit: &Credit) -> Result<Credit, SettlementError>;
}

/// Remote credit-card service
#[async_trait]
pub trait CreditCardService: Send + Sync {
    /// Fetch a credit-card snapshot from the source of truth
    async fn fetch_by_id(&self, card_id: &str) -> Result<CreditCard, SettlementError>;

    /// Commit a new available balance to the source of truth
    async fn update_balance(
        &self,
        card_id: &str,
        new_balance: Decimal,
    ) -> Result<CreditCard, SettlementError>;
}

/// Remote debit-card service
///
/// Debit cards are never cached; the orchestrator always goes to this
/// service directly.
#[async_trait]
pub trait DebitCardService: Send + Sync {
    /// Fetch a debit card by its id
    async fn fetch_by_id(&self, card_id: &str) -> Result<DebitCard, SettlementError>;

    /// Fetch a debit card by its printed card number
    async fn fetch_by_card_number(&self, card_number: &str) -> Result<DebitCard, SettlementError>;

    /// Fetch all debit cards whose primary account is the given account
    ///
    /// Used to address balance-changed notifications to the affected cards.
    async fn fetch_by_primary_account_id(
        &self,
        account_id: &str,
    ) -> Result<Vec<DebitCard>, SettlementError>;
}

/// Raw key-value store backing the product state cache
///
/// Implementations may fail; the [`ProductStateCache`] wrapper degrades any
/// failure on the read path to a miss and swallows write failures, so the
/// rest of the engine never observes cache errors.
///
/// [`ProductStateCache`]: crate::core::cache::ProductStateCache
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a snapshot by product kind and id
    async fn get(
        &self,
        kind: ProductKind,
        id: &str,
    ) -> Result<Option<ProductSnapshot>, SettlementError>;

    /// Store a snapshot under its kind and id, overwriting any previous
    /// entry (last write wins)
    async fn put(
        &self,
        kind: ProductKind,
        id: &str,
        snapshot: ProductSnapshot,
    ) -> Result<(), SettlementError>;
}

/// Durable, append-only transaction log
///
/// `save` is the only mutating operation; all `find_*` methods are read
/// paths used by fee counting, validation and reporting.
#[async_trait]
pub trait TransactionLog: Send + Sync {
    /// Persist a transaction, assigning its id, and return the stored value
    async fn save(&self, transaction: Transaction) -> Result<Transaction, SettlementError>;

    /// Look up a transaction by its id
    async fn find_by_id(&self, id: &str) -> Result<Option<Transaction>, SettlementError>;

    /// All transactions of a customer
    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Vec<Transaction>, SettlementError>;

    /// All transactions against a product
    async fn find_by_product_id(
        &self,
        product_id: &str,
    ) -> Result<Vec<Transaction>, SettlementError>;

    /// All transactions of a customer against one product
    async fn find_by_customer_and_product(
        &self,
        customer_id: &str,
        product_id: &str,
    ) -> Result<Vec<Transaction>, SettlementError>;

    /// All transactions committed within `[start, end]`
    async fn find_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, SettlementError>;
}
