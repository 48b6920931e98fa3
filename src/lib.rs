//! Settlement Engine Library
//! # Overview
//!
//! This library settles bank transactions against remote product services
//! while keeping account, credit and credit-card state consistent. It owns
//! the durable transaction log and reacts to product changes and payment
//! requests arriving over a message bus.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Transaction, product snapshots, errors)
//! - [`config`] - Runtime configuration
//! - [`core`] - Settlement logic:
//!   - [`core::balance`] - Pure balance calculation per product category
//!   - [`core::cache`] - Cache-aside product state cache
//!   - [`core::ownership`] - Cascading ownership validation
//!   - [`core::resolver`] - Card settlement over candidate accounts
//!   - [`core::orchestrator`] - Per-category settlement and queries
//! - [`events`] - Message-bus surface (inbound handlers, outbound dispatch)
//!
//! # Settlement Flow
//!
//! Every transaction names a product category, and each category has its own
//! settlement path:
//!
//! - **Account**: deposit, withdrawal or two-legged transfer, with a
//!   commission charged once the free-movement allowance is spent
//! - **Credit**: a payment against the remaining balance, advancing the
//!   payment schedule and possibly finishing the credit
//! - **Credit card**: a payment against or a consumption of the available
//!   balance
//! - **Debit card**: a payment or withdrawal settled against the card's
//!   candidate accounts, primary first
//!
//! A settlement either commits fully and lands in the transaction log, or
//! fails without writing a log entry.

// Module declarations
pub mod config;
pub mod core;
pub mod events;
pub mod types;

// Re-export main public API
pub use config::{CacheConfig, EngineConfig};
pub use core::{
    InMemoryCacheStore, InMemoryTransactionLog, OwnershipValidator, ProductStateCache,
    ResolvedDebit, Settlement, SettlementResolver, TransactionOrchestrator,
};
pub use events::{
    CoinTransferHandler, EventDispatcher, EventPublisher, OutboundEvent, P2pPaymentHandler,
    ProductChangeHandler, TransferRequestHandler,
};
pub use types::{
    Account, Credit, CreditCard, DebitCard, ProductCategory, ProductKind, ProductSnapshot,
    ProductSubType, SettlementError, Transaction, TransactionType,
};
