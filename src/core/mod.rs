//! Core settlement logic module
//!
//! This module contains the transaction settlement components:
//! - `traits` - Trait abstractions over remote product services and stores
//! - `balance` - Pure balance calculation per product category
//! - `cache` - Cache-aside product state cache
//! - `ownership` - Cascading customer-to-product ownership validation
//! - `resolver` - Fallback settlement search over a card's candidate accounts
//! - `orchestrator` - Per-category settlement orchestration and queries
//! - `transaction_log` - In-memory transaction log implementation

pub mod balance;
pub mod cache;
pub mod orchestrator;
pub mod ownership;
pub mod resolver;
pub mod traits;
pub mod transaction_log;

pub use cache::{InMemoryCacheStore, ProductStateCache};
pub use orchestrator::{Settlement, TransactionOrchestrator};
pub use ownership::OwnershipValidator;
pub use resolver::{ResolvedDebit, SettlementResolver};
pub use transaction_log::InMemoryTransactionLog;
