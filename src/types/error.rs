//! Error types for the settlement engine
//!
//! This module defines all error kinds a settlement can surface to its
//! caller. Every failure carries a stable machine-checkable variant plus a
//! human-readable message.
//!
//! # Error Categories
//!
//! - **Validation errors**: negative amount, wrong transaction type for the
//!   category, missing destination, inactive card. Reported to the caller,
//!   never retried.
//! - **Funds errors**: insufficient funds on a single product, or across all
//!   candidate accounts of a debit card. Reported, not retried at this layer.
//! - **Remote errors**: product not found at its source of truth, or a
//!   remote call failed (including a tripped resilience wrapper). Reported
//!   as a final failure; no automatic retry of a failed mutation.

use rust_decimal::Decimal;
use thiserror::Error;

use super::product::{CardStatus, ProductKind};
use super::transaction::{ProductCategory, TransactionType};

/// Main error type for the settlement engine
///
/// Each variant includes the context needed to diagnose the failure without
/// consulting remote state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettlementError {
    /// Transaction amount is negative
    ///
    /// Rejected before any balance is read or mutated.
    #[error("Transaction amount cannot be negative: {amount}")]
    NegativeAmount {
        /// The offending amount
        amount: Decimal,
    },

    /// Transaction type is not valid for the product category
    #[error("Invalid transaction type {tx_type:?} for {category:?}")]
    InvalidTransactionType {
        /// The rejected transaction type
        tx_type: TransactionType,
        /// Category the transaction was dispatched to
        category: ProductCategory,
    },

    /// Product category string could not be parsed
    ///
    /// Only reachable at the event/API boundary; the internal enum cannot
    /// hold an unknown category.
    #[error("Invalid product category '{category}'")]
    InvalidProductCategory {
        /// The unrecognized category string
        category: String,
    },

    /// Balance does not cover the requested amount
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Balance-like field of the governing product
        available: Decimal,
        /// Requested amount (fee included where one applies)
        requested: Decimal,
    },

    /// No candidate account of a debit card could cover the amount
    ///
    /// Produced by the settlement resolver after exhausting the primary and
    /// every associated account.
    #[error("Insufficient funds in all accounts associated with card {card_id}: requested {requested}")]
    InsufficientFundsAllAccounts {
        /// The debit card whose candidates were exhausted
        card_id: String,
        /// Requested amount
        requested: Decimal,
    },

    /// Transfer without a destination account
    #[error("A destination account is required for a transfer")]
    DestinationRequired,

    /// Debit card is not usable
    #[error("Debit card {card_id} is not active (status {status:?})")]
    CardInactive {
        /// The card id
        card_id: String,
        /// Its current status
        status: CardStatus,
    },

    /// Product does not exist at its source of truth
    #[error("{kind:?} {id} not found")]
    ProductNotFound {
        /// Product type that was looked up
        kind: ProductKind,
        /// The id that was not found
        id: String,
    },

    /// Transaction does not exist in the durable log
    #[error("Transaction {id} does not exist")]
    TransactionNotFound {
        /// The transaction id that was looked up
        id: String,
    },

    /// A remote collaborator failed or its circuit is open
    ///
    /// Every remote call site can produce this failure at any time.
    #[error("{service} is unavailable: {message}")]
    ServiceUnavailable {
        /// Name of the failing collaborator
        service: &'static str,
        /// Description of the failure
        message: String,
    },

    /// Cache store I/O failed
    ///
    /// Never surfaced by the read path, which degrades any cache failure to
    /// a miss; only cache-store implementations produce it.
    #[error("Cache error: {message}")]
    CacheError {
        /// Description of the cache failure
        message: String,
    },
}

// Helper functions for creating common errors

impl SettlementError {
    /// Create a NegativeAmount error
    pub fn negative_amount(amount: Decimal) -> Self {
        SettlementError::NegativeAmount { amount }
    }

    /// Create an InvalidTransactionType error
    pub fn invalid_transaction_type(tx_type: TransactionType, category: ProductCategory) -> Self {
        SettlementError::InvalidTransactionType { tx_type, category }
    }

    /// Create an InvalidProductCategory error
    pub fn invalid_product_category(category: &str) -> Self {
        SettlementError::InvalidProductCategory {
            category: category.to_string(),
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(available: Decimal, requested: Decimal) -> Self {
        SettlementError::InsufficientFunds {
            available,
            requested,
        }
    }

    /// Create an InsufficientFundsAllAccounts error
    pub fn insufficient_funds_all_accounts(card_id: &str, requested: Decimal) -> Self {
        SettlementError::InsufficientFundsAllAccounts {
            card_id: card_id.to_string(),
            requested,
        }
    }

    /// Create a CardInactive error
    pub fn card_inactive(card_id: &str, status: CardStatus) -> Self {
        SettlementError::CardInactive {
            card_id: card_id.to_string(),
            status,
        }
    }

    /// Create a ProductNotFound error
    pub fn product_not_found(kind: ProductKind, id: &str) -> Self {
        SettlementError::ProductNotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Create a TransactionNotFound error
    pub fn transaction_not_found(id: &str) -> Self {
        SettlementError::TransactionNotFound { id: id.to_string() }
    }

    /// Create a ServiceUnavailable error
    pub fn service_unavailable(service: &'static str, message: impl Into<String>) -> Self {
        SettlementError::ServiceUnavailable {
            service,
            message: message.into(),
        }
    }

    /// Create a CacheError
    pub fn cache_error(message: impl Into<String>) -> Self {
        SettlementError::CacheError {
            message: message.into(),
        }
    }

    /// Whether this failure was produced before any remote mutation
    /// (validation of the request itself)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SettlementError::NegativeAmount { .. }
                | SettlementError::InvalidTransactionType { .. }
                | SettlementError::InvalidProductCategory { .. }
                | SettlementError::DestinationRequired
                | SettlementError::CardInactive { .. }
        )
    }
}
