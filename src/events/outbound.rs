//! Outbound event construction and dispatch
//!
//! Event construction is pure: settlement code builds [`OutboundEvent`]
//! values and returns them alongside the committed transaction. Transmission
//! is a separate, effectful step owned by the [`EventDispatcher`], so the
//! settlement logic is verifiable without a message-bus double.
//!
//! Dispatch is fire-and-forget with respect to settlement: by the time an
//! event exists, its transaction is already committed and persisted, so a
//! publish failure is logged but never propagated.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::types::SettlementError;

/// Notification that an account balance changed
///
/// Emitted once per debit card whose primary account is the mutated account,
/// carrying the card number so card-side projections can update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceUpdated {
    pub account_id: String,
    pub new_balance: Decimal,
    pub card_number: String,
}

/// Acknowledgment of an asynchronous transfer request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferCompleted {
    /// Id of the originating request, echoed back to the requester
    pub transaction_id: String,
    pub accepted: bool,
}

/// Outcome of an asynchronous coin transfer between two accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinTransferProcessed {
    /// Id of the originating purchase, echoed back to the requester
    pub purchase_id: String,
    pub success: bool,
    /// Human-readable outcome, carrying the failure reason when unsuccessful
    pub message: String,
}

/// Outcome of an asynchronous peer-to-peer payment request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum P2pStatus {
    Success,
    Failed,
}

/// Acknowledgment of an asynchronous peer-to-peer payment request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct P2pPaymentProcessed {
    pub transaction_id: String,
    pub sender_phone_number: String,
    pub receiver_phone_number: String,
    pub amount: Decimal,
    pub status: P2pStatus,
    /// Failure reason, present iff `status` is [`P2pStatus::Failed`]
    pub reason: Option<String>,
    pub processed_at: DateTime<Utc>,
}

/// Every event the engine publishes to the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutboundEvent {
    BalanceUpdated(BalanceUpdated),
    TransferCompleted(TransferCompleted),
    CoinTransferProcessed(CoinTransferProcessed),
    P2pPaymentProcessed(P2pPaymentProcessed),
}

impl OutboundEvent {
    /// Bus topic this event is published to
    pub fn topic(&self) -> &'static str {
        match self {
            OutboundEvent::BalanceUpdated(_) => "bank.account.balance.updated",
            OutboundEvent::TransferCompleted(_) => "bank.transfer.request.completed",
            OutboundEvent::CoinTransferProcessed(_) => "bootcoin.transaction.processed",
            OutboundEvent::P2pPaymentProcessed(_) => "bank.p2p.payment.processed",
        }
    }
}

/// Transport used to publish events to the bus
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event to its topic
    async fn publish(&self, event: &OutboundEvent) -> Result<(), SettlementError>;
}

/// Thin dispatcher draining pending events to a publisher
#[derive(Clone)]
pub struct EventDispatcher {
    publisher: Arc<dyn EventPublisher>,
}

impl EventDispatcher {
    /// Create a dispatcher over the given publisher
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    /// Publish a batch of pending events, logging failures
    pub async fn dispatch_all(&self, events: &[OutboundEvent]) {
        let sends = events.iter().map(|event| self.dispatch(event));
        futures::future::join_all(sends).await;
    }

    /// Publish one event, logging failure
    pub async fn dispatch(&self, event: &OutboundEvent) {
        match self.publisher.publish(event).await {
            Ok(()) => debug!(topic = event.topic(), "event published"),
            Err(err) => error!(topic = event.topic(), %err, "event publish failed"),
        }
    }
}
