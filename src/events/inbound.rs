//! Inbound event handling
//!
//! Four kinds of events reach the engine from the bus:
//!
//! - **Product-change notifications** (account/credit/credit-card created or
//!   updated): written through to the product state cache, keeping snapshots
//!   fresh without a TTL.
//! - **Transfer requests**: validated for ownership, synthesized into a
//!   withdrawal transaction and settled, then acknowledged with an
//!   accepted/rejected completion event.
//! - **Coin transfer requests**: synthesized into a transfer from the
//!   buyer's account to the seller's and acknowledged with a success flag
//!   and message.
//! - **Peer-to-peer payment requests**: either side may have a linked debit
//!   card; the carded sides are settled against the cards' primary accounts
//!   and the request is acknowledged with a processed event.
//!
//! Handlers never propagate failures to the bus consumer: a failed request
//! is acknowledged as rejected/failed with a reason, and a failed cache
//! write is logged and dropped.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::core::cache::ProductStateCache;
use crate::core::orchestrator::{Settlement, TransactionOrchestrator};
use crate::core::traits::DebitCardService;
use crate::events::outbound::{
    CoinTransferProcessed, EventDispatcher, OutboundEvent, P2pPaymentProcessed, P2pStatus,
    TransferCompleted,
};
use crate::types::{
    Account, Credit, CreditCard, ProductCategory, ProductSnapshot, ProductSubType, SettlementError,
    Transaction, TransactionType,
};

/// A product-created or product-updated notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProductChanged {
    Account(Account),
    Credit(Credit),
    CreditCard(CreditCard),
}

/// Writes product-change notifications through to the cache
pub struct ProductChangeHandler {
    cache: Arc<ProductStateCache>,
}

impl ProductChangeHandler {
    pub fn new(cache: Arc<ProductStateCache>) -> Self {
        Self { cache }
    }

    /// Overwrite the cached snapshot with the notified state
    pub async fn handle(&self, event: ProductChanged) {
        let snapshot = match event {
            ProductChanged::Account(account) => ProductSnapshot::Account(account),
            ProductChanged::Credit(credit) => ProductSnapshot::Credit(credit),
            ProductChanged::CreditCard(card) => ProductSnapshot::CreditCard(card),
        };
        info!(kind = ?snapshot.kind(), id = snapshot.id(), "product change received");
        self.cache.put(snapshot).await;
    }
}

/// An asynchronous transfer request ("buy with bank funds")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequested {
    /// Requester-side id, echoed back in the completion event
    pub transaction_id: String,
    pub buyer_customer_id: String,
    pub buyer_account_id: String,
    pub amount: Decimal,
}

/// Settles transfer requests and acknowledges them on the bus
pub struct TransferRequestHandler {
    orchestrator: Arc<TransactionOrchestrator>,
    dispatcher: EventDispatcher,
}

impl TransferRequestHandler {
    pub fn new(orchestrator: Arc<TransactionOrchestrator>, dispatcher: EventDispatcher) -> Self {
        Self {
            orchestrator,
            dispatcher,
        }
    }

    /// Validate, settle and acknowledge one transfer request
    pub async fn handle(&self, event: TransferRequested) {
        let accepted = self.process(&event).await;
        self.dispatcher
            .dispatch(&OutboundEvent::TransferCompleted(TransferCompleted {
                transaction_id: event.transaction_id.clone(),
                accepted,
            }))
            .await;
    }

    async fn process(&self, event: &TransferRequested) -> bool {
        if !self
            .orchestrator
            .validate_ownership(&event.buyer_customer_id, &event.buyer_account_id)
            .await
        {
            error!(
                customer_id = %event.buyer_customer_id,
                account_id = %event.buyer_account_id,
                "transfer request rejected: account does not belong to buyer"
            );
            return false;
        }

        let transaction = Transaction::new(
            event.buyer_customer_id.clone(),
            event.buyer_account_id.clone(),
            ProductCategory::Account,
            TransactionType::Withdrawal,
            event.amount,
        )
        .with_sub_type(ProductSubType::BootCoin);

        match self.orchestrator.settle(transaction).await {
            Ok(settlement) => {
                self.dispatcher.dispatch_all(&settlement.notifications).await;
                true
            }
            Err(err) => {
                error!(transaction_id = %event.transaction_id, %err, "transfer request failed");
                false
            }
        }
    }
}

/// An asynchronous coin transfer between two accounts
///
/// Unlike [`TransferRequested`], which debits the buyer in favour of the
/// bank, this moves the funds straight from the buyer's account to the
/// seller's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinTransferRequested {
    /// Requester-side purchase id, echoed back in the processed event
    pub purchase_id: String,
    pub buyer_customer_id: String,
    pub buyer_account_id: String,
    pub seller_account_id: String,
    pub amount: Decimal,
}

/// Settles account-to-account coin transfers and acknowledges them
pub struct CoinTransferHandler {
    orchestrator: Arc<TransactionOrchestrator>,
    dispatcher: EventDispatcher,
}

impl CoinTransferHandler {
    pub fn new(orchestrator: Arc<TransactionOrchestrator>, dispatcher: EventDispatcher) -> Self {
        Self {
            orchestrator,
            dispatcher,
        }
    }

    /// Settle one coin transfer and acknowledge the outcome
    pub async fn handle(&self, event: CoinTransferRequested) {
        let (success, message) = match self.process(&event).await {
            Ok(()) => (true, "transfer completed".to_string()),
            Err(err) => (false, err.to_string()),
        };
        self.dispatcher
            .dispatch(&OutboundEvent::CoinTransferProcessed(CoinTransferProcessed {
                purchase_id: event.purchase_id.clone(),
                success,
                message,
            }))
            .await;
    }

    async fn process(&self, event: &CoinTransferRequested) -> Result<(), SettlementError> {
        let transaction = Transaction::new(
            event.buyer_customer_id.clone(),
            event.buyer_account_id.clone(),
            ProductCategory::Account,
            TransactionType::Transfer,
            event.amount,
        )
        .with_sub_type(ProductSubType::BootCoin)
        .with_destination(event.seller_account_id.clone());

        let settlement = self.orchestrator.settle(transaction).await?;
        self.dispatcher.dispatch_all(&settlement.notifications).await;
        Ok(())
    }
}

/// An asynchronous peer-to-peer payment request
///
/// Sender and receiver are wallet users identified by phone number; either
/// may have a linked debit card, identified by card number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct P2pPaymentRequested {
    pub transaction_id: String,
    pub sender_phone_number: String,
    pub receiver_phone_number: String,
    pub sender_card_number: Option<String>,
    pub receiver_card_number: Option<String>,
    pub amount: Decimal,
}

/// Settles peer-to-peer payment requests and acknowledges them on the bus
pub struct P2pPaymentHandler {
    orchestrator: Arc<TransactionOrchestrator>,
    debit_cards: Arc<dyn DebitCardService>,
    dispatcher: EventDispatcher,
}

impl P2pPaymentHandler {
    pub fn new(
        orchestrator: Arc<TransactionOrchestrator>,
        debit_cards: Arc<dyn DebitCardService>,
        dispatcher: EventDispatcher,
    ) -> Self {
        Self {
            orchestrator,
            debit_cards,
            dispatcher,
        }
    }

    /// Settle one payment request and acknowledge the outcome
    pub async fn handle(&self, event: P2pPaymentRequested) {
        let outcome = self.process(&event).await;
        let (status, reason) = match outcome {
            Ok(()) => (P2pStatus::Success, None),
            Err(err) => (P2pStatus::Failed, Some(err.to_string())),
        };
        self.dispatcher
            .dispatch(&OutboundEvent::P2pPaymentProcessed(P2pPaymentProcessed {
                transaction_id: event.transaction_id.clone(),
                sender_phone_number: event.sender_phone_number.clone(),
                receiver_phone_number: event.receiver_phone_number.clone(),
                amount: event.amount,
                status,
                reason,
                processed_at: Utc::now(),
            }))
            .await;
    }

    async fn process(&self, event: &P2pPaymentRequested) -> Result<(), SettlementError> {
        match (&event.sender_card_number, &event.receiver_card_number) {
            // Both sides are wallet-only: nothing touches a bank account.
            (None, None) => {
                info!(
                    transaction_id = %event.transaction_id,
                    "both users are wallet-only, payment processed internally"
                );
                Ok(())
            }
            // Only the sender has a card: debit the sender's bank account.
            (Some(sender_card), None) => {
                let card = self.debit_cards.fetch_by_card_number(sender_card).await?;
                let transaction = Transaction::new(
                    card.customer_id.clone(),
                    card.primary_account_id.clone(),
                    ProductCategory::Account,
                    TransactionType::Withdrawal,
                    event.amount,
                )
                .with_sub_type(ProductSubType::Yanki);
                self.settle_and_dispatch(transaction).await
            }
            // Only the receiver has a card: the wallet debits internally and
            // the receiver's bank account is credited.
            (None, Some(receiver_card)) => {
                let card = self.debit_cards.fetch_by_card_number(receiver_card).await?;
                let transaction = Transaction::new(
                    card.customer_id.clone(),
                    card.primary_account_id.clone(),
                    ProductCategory::Account,
                    TransactionType::Deposit,
                    event.amount,
                )
                .with_sub_type(ProductSubType::Yanki);
                self.settle_and_dispatch(transaction).await
            }
            // Both have cards: a bank-side transfer between the two primary
            // accounts.
            (Some(sender_card), Some(receiver_card)) => {
                let sender = self.debit_cards.fetch_by_card_number(sender_card).await?;
                let receiver = self.debit_cards.fetch_by_card_number(receiver_card).await?;
                let transaction = Transaction::new(
                    sender.customer_id.clone(),
                    sender.primary_account_id.clone(),
                    ProductCategory::Account,
                    TransactionType::Transfer,
                    event.amount,
                )
                .with_sub_type(ProductSubType::Yanki)
                .with_destination(receiver.primary_account_id.clone());
                self.settle_and_dispatch(transaction).await
            }
        }
    }

    async fn settle_and_dispatch(
        &self,
        transaction: Transaction,
    ) -> Result<(), SettlementError> {
        let Settlement { notifications, .. } = self.orchestrator.settle(transaction).await?;
        self.dispatcher.dispatch_all(&notifications).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::core::cache::InMemoryCacheStore;
    use crate::core::traits::{
        AccountService, CacheStore, CreditCardService, CreditService, TransactionLog,
    };
    use crate::core::transaction_log::InMemoryTransactionLog;
    use crate::events::outbound::EventPublisher;
    use crate::types::{AccountType, CardStatus, DebitCard, ProductKind};
    use async_trait::async_trait;
    use dashmap::DashMap;
    use std::sync::Mutex;

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 2)
    }

    fn account(id: &str, customer_id: &str, balance: Decimal) -> Account {
        Account {
            id: id.to_string(),
            customer_id: customer_id.to_string(),
            account_type: AccountType::Checking,
            balance,
            max_free_transactions: 100,
            transaction_cost: dec(5_00),
        }
    }

    fn card(number: &str, customer_id: &str, primary: &str) -> DebitCard {
        DebitCard {
            id: format!("card-{number}"),
            card_number: number.to_string(),
            customer_id: customer_id.to_string(),
            status: CardStatus::Active,
            primary_account_id: primary.to_string(),
            associated_account_ids: Vec::new(),
        }
    }

    struct StubAccounts {
        accounts: DashMap<String, Account>,
    }

    #[async_trait]
    impl AccountService for StubAccounts {
        async fn fetch_by_id(&self, account_id: &str) -> Result<Account, SettlementError> {
            self.accounts
                .get(account_id)
                .map(|entry| entry.value().clone())
                .ok_or_else(|| {
                    SettlementError::product_not_found(ProductKind::Account, account_id)
                })
        }

        async fn update_balance(
            &self,
            account_id: &str,
            new_balance: Decimal,
        ) -> Result<Account, SettlementError> {
            let mut entry = self.accounts.get_mut(account_id).ok_or_else(|| {
                SettlementError::product_not_found(ProductKind::Account, account_id)
            })?;
            entry.value_mut().balance = new_balance;
            Ok(entry.value().clone())
        }
    }

    struct NoCredits;

    #[async_trait]
    impl CreditService for NoCredits {
        async fn fetch_by_id(&self, credit_id: &str) -> Result<Credit, SettlementError> {
            Err(SettlementError::product_not_found(
                ProductKind::Credit,
                credit_id,
            ))
        }

        async fn update(&self, credit: &Credit) -> Result<Credit, SettlementError> {
            Ok(credit.clone())
        }
    }

    struct NoCreditCards;

    #[async_trait]
    impl CreditCardService for NoCreditCards {
        async fn fetch_by_id(&self, card_id: &str) -> Result<CreditCard, SettlementError> {
            Err(SettlementError::product_not_found(
                ProductKind::CreditCard,
                card_id,
            ))
        }

        async fn update_balance(
            &self,
            card_id: &str,
            _new_balance: Decimal,
        ) -> Result<CreditCard, SettlementError> {
            Err(SettlementError::product_not_found(
                ProductKind::CreditCard,
                card_id,
            ))
        }
    }

    struct StubDebitCards {
        cards: Vec<DebitCard>,
    }

    #[async_trait]
    impl DebitCardService for StubDebitCards {
        async fn fetch_by_id(&self, card_id: &str) -> Result<DebitCard, SettlementError> {
            self.cards
                .iter()
                .find(|c| c.id == card_id)
                .cloned()
                .ok_or_else(|| SettlementError::product_not_found(ProductKind::DebitCard, card_id))
        }

        async fn fetch_by_card_number(
            &self,
            card_number: &str,
        ) -> Result<DebitCard, SettlementError> {
            self.cards
                .iter()
                .find(|c| c.card_number == card_number)
                .cloned()
                .ok_or_else(|| {
                    SettlementError::product_not_found(ProductKind::DebitCard, card_number)
                })
        }

        async fn fetch_by_primary_account_id(
            &self,
            account_id: &str,
        ) -> Result<Vec<DebitCard>, SettlementError> {
            Ok(self
                .cards
                .iter()
                .filter(|c| c.primary_account_id == account_id)
                .cloned()
                .collect())
        }
    }

    struct RecordingPublisher {
        published: Mutex<Vec<OutboundEvent>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, event: &OutboundEvent) -> Result<(), SettlementError> {
            self.published
                .lock()
                .expect("Mutex poisoned")
                .push(event.clone());
            Ok(())
        }
    }

    struct Fixture {
        cache: Arc<ProductStateCache>,
        accounts: Arc<StubAccounts>,
        debit_cards: Arc<StubDebitCards>,
        orchestrator: Arc<TransactionOrchestrator>,
        publisher: Arc<RecordingPublisher>,
        log: Arc<InMemoryTransactionLog>,
    }

    impl Fixture {
        fn dispatcher(&self) -> EventDispatcher {
            EventDispatcher::new(Arc::clone(&self.publisher) as Arc<dyn EventPublisher>)
        }

        fn published(&self) -> Vec<OutboundEvent> {
            self.publisher.published.lock().unwrap().clone()
        }
    }

    fn fixture(accounts: Vec<Account>, cards: Vec<DebitCard>) -> Fixture {
        let store: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
        let cache = Arc::new(ProductStateCache::new(store, &CacheConfig::default()));
        let accounts = Arc::new(StubAccounts {
            accounts: accounts.into_iter().map(|a| (a.id.clone(), a)).collect(),
        });
        let debit_cards = Arc::new(StubDebitCards { cards });
        let log = Arc::new(InMemoryTransactionLog::new());
        let orchestrator = Arc::new(TransactionOrchestrator::new(
            Arc::clone(&cache),
            Arc::clone(&accounts) as Arc<dyn AccountService>,
            Arc::new(NoCredits),
            Arc::new(NoCreditCards),
            Arc::clone(&debit_cards) as Arc<dyn DebitCardService>,
            Arc::clone(&log) as Arc<dyn TransactionLog>,
        ));
        let publisher = Arc::new(RecordingPublisher {
            published: Mutex::new(Vec::new()),
        });
        Fixture {
            cache,
            accounts,
            debit_cards,
            orchestrator,
            publisher,
            log,
        }
    }

    #[tokio::test]
    async fn test_product_change_overwrites_cache() {
        let f = fixture(vec![], vec![]);
        let handler = ProductChangeHandler::new(Arc::clone(&f.cache));

        handler
            .handle(ProductChanged::Account(account("acc-1", "cust-1", dec(100_00))))
            .await;
        assert_eq!(
            f.cache.get_account("acc-1").await.map(|a| a.balance),
            Some(dec(100_00))
        );

        handler
            .handle(ProductChanged::Account(account("acc-1", "cust-1", dec(70_00))))
            .await;
        assert_eq!(
            f.cache.get_account("acc-1").await.map(|a| a.balance),
            Some(dec(70_00))
        );
    }

    #[tokio::test]
    async fn test_transfer_request_settles_and_acknowledges() {
        let f = fixture(vec![account("acc-1", "buyer", dec(500_00))], vec![]);
        let handler = TransferRequestHandler::new(Arc::clone(&f.orchestrator), f.dispatcher());

        handler
            .handle(TransferRequested {
                transaction_id: "req-1".to_string(),
                buyer_customer_id: "buyer".to_string(),
                buyer_account_id: "acc-1".to_string(),
                amount: dec(100_00),
            })
            .await;

        assert_eq!(
            f.accounts.fetch_by_id("acc-1").await.unwrap().balance,
            dec(400_00)
        );
        assert_eq!(
            f.published(),
            vec![OutboundEvent::TransferCompleted(TransferCompleted {
                transaction_id: "req-1".to_string(),
                accepted: true,
            })]
        );
        let logged = f.log.find_by_product_id("acc-1").await.unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].product_sub_type, Some(ProductSubType::BootCoin));
    }

    #[tokio::test]
    async fn test_transfer_request_rejects_foreign_account() {
        let f = fixture(vec![account("acc-1", "owner", dec(500_00))], vec![]);
        let handler = TransferRequestHandler::new(Arc::clone(&f.orchestrator), f.dispatcher());

        handler
            .handle(TransferRequested {
                transaction_id: "req-1".to_string(),
                buyer_customer_id: "intruder".to_string(),
                buyer_account_id: "acc-1".to_string(),
                amount: dec(100_00),
            })
            .await;

        // Nothing debited, request acknowledged as rejected.
        assert_eq!(
            f.accounts.fetch_by_id("acc-1").await.unwrap().balance,
            dec(500_00)
        );
        assert_eq!(
            f.published(),
            vec![OutboundEvent::TransferCompleted(TransferCompleted {
                transaction_id: "req-1".to_string(),
                accepted: false,
            })]
        );
    }

    #[tokio::test]
    async fn test_coin_transfer_moves_funds_to_seller_and_acknowledges() {
        let f = fixture(
            vec![
                account("acc-1", "buyer", dec(500_00)),
                account("acc-2", "seller", dec(100_00)),
            ],
            vec![],
        );
        let handler = CoinTransferHandler::new(Arc::clone(&f.orchestrator), f.dispatcher());

        handler
            .handle(CoinTransferRequested {
                purchase_id: "purchase-1".to_string(),
                buyer_customer_id: "buyer".to_string(),
                buyer_account_id: "acc-1".to_string(),
                seller_account_id: "acc-2".to_string(),
                amount: dec(150_00),
            })
            .await;

        assert_eq!(
            f.accounts.fetch_by_id("acc-1").await.unwrap().balance,
            dec(350_00)
        );
        assert_eq!(
            f.accounts.fetch_by_id("acc-2").await.unwrap().balance,
            dec(250_00)
        );
        assert_eq!(
            f.published(),
            vec![OutboundEvent::CoinTransferProcessed(CoinTransferProcessed {
                purchase_id: "purchase-1".to_string(),
                success: true,
                message: "transfer completed".to_string(),
            })]
        );

        let logged = f.log.find_by_product_id("acc-1").await.unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].transaction_type, TransactionType::Transfer);
        assert_eq!(logged[0].destination_account_id.as_deref(), Some("acc-2"));
        assert_eq!(logged[0].product_sub_type, Some(ProductSubType::BootCoin));
    }

    #[tokio::test]
    async fn test_coin_transfer_failure_is_acknowledged_with_message() {
        let f = fixture(
            vec![
                account("acc-1", "buyer", dec(50_00)),
                account("acc-2", "seller", dec(100_00)),
            ],
            vec![],
        );
        let handler = CoinTransferHandler::new(Arc::clone(&f.orchestrator), f.dispatcher());

        handler
            .handle(CoinTransferRequested {
                purchase_id: "purchase-1".to_string(),
                buyer_customer_id: "buyer".to_string(),
                buyer_account_id: "acc-1".to_string(),
                seller_account_id: "acc-2".to_string(),
                amount: dec(150_00),
            })
            .await;

        // Nothing moved, nothing logged, and the ack carries the reason.
        assert_eq!(
            f.accounts.fetch_by_id("acc-1").await.unwrap().balance,
            dec(50_00)
        );
        assert_eq!(
            f.accounts.fetch_by_id("acc-2").await.unwrap().balance,
            dec(100_00)
        );
        assert!(f.log.find_by_product_id("acc-1").await.unwrap().is_empty());
        let message = f.published().iter().find_map(|event| match event {
            OutboundEvent::CoinTransferProcessed(ack) if !ack.success => {
                Some(ack.message.clone())
            }
            _ => None,
        });
        assert!(message.unwrap().contains("Insufficient funds"));
    }

    fn p2p_event(
        sender_card: Option<&str>,
        receiver_card: Option<&str>,
        amount: Decimal,
    ) -> P2pPaymentRequested {
        P2pPaymentRequested {
            transaction_id: "p2p-1".to_string(),
            sender_phone_number: "999-111".to_string(),
            receiver_phone_number: "999-222".to_string(),
            sender_card_number: sender_card.map(|s| s.to_string()),
            receiver_card_number: receiver_card.map(|s| s.to_string()),
            amount,
        }
    }

    fn p2p_status(events: &[OutboundEvent]) -> Option<P2pStatus> {
        events.iter().find_map(|event| match event {
            OutboundEvent::P2pPaymentProcessed(ack) => Some(ack.status),
            _ => None,
        })
    }

    #[tokio::test]
    async fn test_p2p_wallet_only_is_acknowledged_without_settlement() {
        let f = fixture(vec![], vec![]);
        let handler = P2pPaymentHandler::new(
            Arc::clone(&f.orchestrator),
            Arc::clone(&f.debit_cards) as Arc<dyn DebitCardService>,
            f.dispatcher(),
        );

        handler.handle(p2p_event(None, None, dec(50_00))).await;

        assert_eq!(p2p_status(&f.published()), Some(P2pStatus::Success));
    }

    #[tokio::test]
    async fn test_p2p_carded_sender_debits_primary_account() {
        let f = fixture(
            vec![account("acc-1", "sender", dec(500_00))],
            vec![card("4000-1", "sender", "acc-1")],
        );
        let handler = P2pPaymentHandler::new(
            Arc::clone(&f.orchestrator),
            Arc::clone(&f.debit_cards) as Arc<dyn DebitCardService>,
            f.dispatcher(),
        );

        handler.handle(p2p_event(Some("4000-1"), None, dec(50_00))).await;

        assert_eq!(
            f.accounts.fetch_by_id("acc-1").await.unwrap().balance,
            dec(450_00)
        );
        let published = f.published();
        assert_eq!(p2p_status(&published), Some(P2pStatus::Success));
        // The mutated account is the card's primary, so a balance
        // notification went out as well.
        assert!(published
            .iter()
            .any(|e| matches!(e, OutboundEvent::BalanceUpdated(_))));
    }

    #[tokio::test]
    async fn test_p2p_both_carded_becomes_bank_transfer() {
        let f = fixture(
            vec![
                account("acc-1", "sender", dec(500_00)),
                account("acc-2", "receiver", dec(100_00)),
            ],
            vec![
                card("4000-1", "sender", "acc-1"),
                card("4000-2", "receiver", "acc-2"),
            ],
        );
        let handler = P2pPaymentHandler::new(
            Arc::clone(&f.orchestrator),
            Arc::clone(&f.debit_cards) as Arc<dyn DebitCardService>,
            f.dispatcher(),
        );

        handler
            .handle(p2p_event(Some("4000-1"), Some("4000-2"), dec(50_00)))
            .await;

        assert_eq!(
            f.accounts.fetch_by_id("acc-1").await.unwrap().balance,
            dec(450_00)
        );
        assert_eq!(
            f.accounts.fetch_by_id("acc-2").await.unwrap().balance,
            dec(150_00)
        );
        let logged = f.log.find_by_product_id("acc-1").await.unwrap();
        assert_eq!(logged[0].transaction_type, TransactionType::Transfer);
        assert_eq!(logged[0].destination_account_id.as_deref(), Some("acc-2"));
    }

    #[tokio::test]
    async fn test_p2p_failure_is_acknowledged_with_reason() {
        let f = fixture(
            vec![account("acc-1", "sender", dec(10_00))],
            vec![card("4000-1", "sender", "acc-1")],
        );
        let handler = P2pPaymentHandler::new(
            Arc::clone(&f.orchestrator),
            Arc::clone(&f.debit_cards) as Arc<dyn DebitCardService>,
            f.dispatcher(),
        );

        handler.handle(p2p_event(Some("4000-1"), None, dec(50_00))).await;

        let published = f.published();
        assert_eq!(p2p_status(&published), Some(P2pStatus::Failed));
        let reason = published.iter().find_map(|event| match event {
            OutboundEvent::P2pPaymentProcessed(ack) => ack.reason.clone(),
            _ => None,
        });
        assert!(reason.unwrap().contains("Insufficient funds"));
        // The failed payment was never logged.
        assert!(f.log.find_by_product_id("acc-1").await.unwrap().is_empty());
    }
}
