//! Event integration module
//!
//! This module contains the engine's message-bus surface:
//! - `outbound` - Events the engine publishes and their dispatcher
//! - `inbound` - Handlers for events the engine consumes

pub mod inbound;
pub mod outbound;

pub use inbound::{
    CoinTransferHandler, CoinTransferRequested, P2pPaymentHandler, P2pPaymentRequested,
    ProductChangeHandler, ProductChanged, TransferRequestHandler, TransferRequested,
};
pub use outbound::{
    BalanceUpdated, CoinTransferProcessed, EventDispatcher, EventPublisher, OutboundEvent,
    P2pPaymentProcessed, P2pStatus, TransferCompleted,
};
