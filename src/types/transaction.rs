//! Transaction-related types for the settlement engine
//!
//! This module defines the transaction value written to the durable log,
//! together with the category/sub-type/transaction-type enums used to
//! classify it. A `Transaction` is written once at commit time and never
//! mutated after persistence.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::SettlementError;

/// Product category a transaction settles against
///
/// Each category is governed by a different remote source of truth and is
/// dispatched to a dedicated handler by the orchestrator. Unknown categories
/// cannot be represented; parsing an unknown category string at the event or
/// API boundary fails with [`SettlementError::InvalidProductCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    /// Deposit account (savings, checking, fixed term)
    Account,
    /// Credit line with a remaining balance and payment schedule
    Credit,
    /// Credit card with an available balance against a credit limit
    CreditCard,
    /// Debit card settled against a pool of linked deposit accounts
    DebitCard,
}

impl TryFrom<&str> for ProductCategory {
    type Error = SettlementError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "ACCOUNT" => Ok(ProductCategory::Account),
            "CREDIT" => Ok(ProductCategory::Credit),
            "CREDIT_CARD" => Ok(ProductCategory::CreditCard),
            "DEBIT_CARD" => Ok(ProductCategory::DebitCard),
            other => Err(SettlementError::invalid_product_category(other)),
        }
    }
}

/// Product sub-type, affecting fee-exemption rules only
///
/// `Yanki` and `BootCoin` movements never count toward a commission once the
/// free-transaction allowance is exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductSubType {
    Savings,
    Checking,
    FixedTerm,
    Yanki,
    BootCoin,
}

impl ProductSubType {
    /// Whether movements of this sub-type are exempt from the per-account
    /// transaction commission
    pub fn is_fee_exempt(&self) -> bool {
        matches!(self, ProductSubType::Yanki | ProductSubType::BootCoin)
    }
}

/// Transaction types supported by the settlement engine
///
/// Validity is category-specific: deposit/withdrawal/transfer settle against
/// accounts, credit payments against credits (and credit cards), purchases
/// against credit cards, and the two card operations against debit cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Credit funds to a deposit account
    Deposit,
    /// Debit funds from a deposit account (requires sufficient balance)
    Withdrawal,
    /// Move funds between two deposit accounts
    Transfer,
    /// Pay down a credit line or restore available credit-card balance
    CreditPayment,
    /// Consume available credit-card balance
    CreditCardPurchase,
    /// Debit-card purchase settled against a linked account
    DebitCardPayment,
    /// Debit-card cash withdrawal settled against a linked account
    DebitCardWithdrawal,
}

impl TransactionType {
    /// Whether this type counts toward an account's free-transaction
    /// allowance (only plain deposits and withdrawals do)
    pub fn is_account_movement(&self) -> bool {
        matches!(self, TransactionType::Deposit | TransactionType::Withdrawal)
    }
}

/// A settled financial transaction
///
/// Built from an inbound request (or synthesized from an asynchronous
/// transfer/payment event), completed by the orchestrator, and persisted to
/// the durable transaction log as the final step of settlement. Nothing is
/// persisted for failed settlements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Identifier assigned by the log store at persistence time
    pub id: Option<String>,

    /// Owner of the governing product
    ///
    /// For debit-card transactions this is overwritten from the card's
    /// owner before settlement.
    pub customer_id: String,

    /// Identifier of the product record governing this transaction
    pub product_id: String,

    /// Category used to dispatch to the per-category handler
    pub product_category: ProductCategory,

    /// Optional sub-type, consulted by the fee-exemption rule only
    pub product_sub_type: Option<ProductSubType>,

    /// Category-specific operation
    pub transaction_type: TransactionType,

    /// Non-negative transaction amount
    ///
    /// When a commission applies, the persisted amount includes the
    /// surcharge recorded in `commissions`.
    pub amount: Decimal,

    /// Set at commit time, not request time
    pub transaction_date: Option<DateTime<Utc>>,

    /// Required iff `transaction_type` is [`TransactionType::Transfer`]
    pub destination_account_id: Option<String>,

    /// Populated only by the settlement resolver for card transactions,
    /// identifying which candidate account was actually debited
    pub source_account_id: Option<String>,

    /// Commission added on top of `amount` once the free-transaction
    /// allowance is exceeded
    pub commissions: Option<Decimal>,
}

impl Transaction {
    /// Create a transaction request with the mandatory fields
    ///
    /// Optional fields start empty and are filled in by the caller
    /// (destination account, sub-type) or by the engine (id, date,
    /// source account, commissions).
    pub fn new(
        customer_id: impl Into<String>,
        product_id: impl Into<String>,
        product_category: ProductCategory,
        transaction_type: TransactionType,
        amount: Decimal,
    ) -> Self {
        Transaction {
            id: None,
            customer_id: customer_id.into(),
            product_id: product_id.into(),
            product_category,
            product_sub_type: None,
            transaction_type,
            amount,
            transaction_date: None,
            destination_account_id: None,
            source_account_id: None,
            commissions: None,
        }
    }

    /// Set the product sub-type
    pub fn with_sub_type(mut self, sub_type: ProductSubType) -> Self {
        self.product_sub_type = Some(sub_type);
        self
    }

    /// Set the destination account for a transfer
    pub fn with_destination(mut self, destination_account_id: impl Into<String>) -> Self {
        self.destination_account_id = Some(destination_account_id.into());
        self
    }
}
