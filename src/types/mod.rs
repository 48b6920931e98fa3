//! Types module
//!
//! Contains core data structures used throughout the engine.
//! This module organizes types into logical submodules:
//! - `transaction`: the transaction value and its classification enums
//! - `product`: cached product snapshots and their status enums
//! - `error`: error types for the settlement engine

pub mod error;
pub mod product;
pub mod transaction;

pub use error::SettlementError;
pub use product::{
    Account, AccountType, CardStatus, Credit, CreditCard, CreditStatus, DebitCard, PaymentStatus,
    ProductKind, ProductSnapshot,
};
pub use transaction::{ProductCategory, ProductSubType, Transaction, TransactionType};
