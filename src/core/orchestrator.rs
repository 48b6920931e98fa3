//! Transaction settlement orchestration
//!
//! The [`TransactionOrchestrator`] is the engine's top-level entry point.
//! For each request it classifies the transaction by product category,
//! dispatches to the category handler, commits the balance mutation to the
//! owning remote service, and persists the transaction record. Terminal
//! states are SUCCESS (persisted) or FAILED (nothing persisted, nothing
//! further mutated).
//!
//! # Ordering and consistency
//!
//! Within one settlement the steps run strictly in sequence; in particular a
//! transfer's source debit completes before the destination credit is
//! attempted. Across concurrent settlements on the same product no mutual
//! exclusion is enforced: the cache and the remote services are last-write-
//! wins, and a failed second step of a transfer is not compensated. The log
//! entry is only written after every mutation succeeded, so no transaction
//! is ever partially logged.
//!
//! # Notifications
//!
//! Successful settlements return the committed transaction together with the
//! pending balance-changed notifications; the caller hands those to an
//! [`EventDispatcher`](crate::events::outbound::EventDispatcher). Event
//! construction here is pure apart from the card-number lookup, and a failed
//! lookup degrades to "no notification" rather than failing a settlement
//! whose mutations already committed.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::core::balance;
use crate::core::cache::ProductStateCache;
use crate::core::ownership::OwnershipValidator;
use crate::core::resolver::SettlementResolver;
use crate::core::traits::{
    AccountService, CreditCardService, CreditService, DebitCardService, TransactionLog,
};
use crate::events::outbound::{BalanceUpdated, OutboundEvent};
use crate::types::{
    Account, CardStatus, Credit, CreditCard, CreditStatus, PaymentStatus, ProductCategory,
    ProductSnapshot, SettlementError, Transaction, TransactionType,
};

/// New minimum payment after an on-schedule credit payment: 10% of the
/// remaining balance
const MINIMUM_PAYMENT_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// A committed settlement: the persisted transaction plus the notifications
/// pending dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub transaction: Transaction,
    pub notifications: Vec<OutboundEvent>,
}

/// Top-level settlement entry point
///
/// Owns the per-category handlers and shares the cache, the remote product
/// services and the durable log with the ownership validator and the
/// settlement resolver it constructs.
pub struct TransactionOrchestrator {
    cache: Arc<ProductStateCache>,
    accounts: Arc<dyn AccountService>,
    credits: Arc<dyn CreditService>,
    credit_cards: Arc<dyn CreditCardService>,
    debit_cards: Arc<dyn DebitCardService>,
    log: Arc<dyn TransactionLog>,
    resolver: SettlementResolver,
    ownership: OwnershipValidator,
}

impl TransactionOrchestrator {
    /// Wire an orchestrator over the shared collaborators
    pub fn new(
        cache: Arc<ProductStateCache>,
        accounts: Arc<dyn AccountService>,
        credits: Arc<dyn CreditService>,
        credit_cards: Arc<dyn CreditCardService>,
        debit_cards: Arc<dyn DebitCardService>,
        log: Arc<dyn TransactionLog>,
    ) -> Self {
        let resolver = SettlementResolver::new(Arc::clone(&accounts));
        let ownership = OwnershipValidator::new(
            Arc::clone(&cache),
            Arc::clone(&accounts),
            Arc::clone(&credits),
            Arc::clone(&credit_cards),
        );
        Self {
            cache,
            accounts,
            credits,
            credit_cards,
            debit_cards,
            log,
            resolver,
            ownership,
        }
    }

    /// Settle one transaction request
    ///
    /// On success the transaction is stamped with the commit time, persisted
    /// to the log, and returned with its pending notifications. On failure
    /// nothing is persisted.
    pub async fn settle(&self, transaction: Transaction) -> Result<Settlement, SettlementError> {
        let mut notifications = Vec::new();
        let result = match transaction.product_category {
            ProductCategory::Account => {
                self.settle_account(transaction, &mut notifications).await
            }
            ProductCategory::Credit => self.settle_credit(transaction).await,
            ProductCategory::CreditCard => self.settle_credit_card(transaction).await,
            ProductCategory::DebitCard => {
                self.settle_debit_card(transaction, &mut notifications).await
            }
        };
        let mut transaction = match result {
            Ok(transaction) => transaction,
            Err(err) => {
                error!(%err, "settlement failed");
                return Err(err);
            }
        };

        transaction.transaction_date = Some(Utc::now());
        let stored = self.log.save(transaction).await?;
        info!(
            id = stored.id.as_deref().unwrap_or_default(),
            product_id = %stored.product_id,
            tx_type = ?stored.transaction_type,
            "transaction settled"
        );
        Ok(Settlement {
            transaction: stored,
            notifications,
        })
    }

    /// Deposit-account settlement, including the commission rule and the
    /// transfer double-commit
    async fn settle_account(
        &self,
        mut transaction: Transaction,
        notifications: &mut Vec<OutboundEvent>,
    ) -> Result<Transaction, SettlementError> {
        let account = self.account_snapshot(&transaction.product_id).await?;

        // Validate type and amount against the cached balance before any
        // fee is considered.
        let mut new_balance = balance::next_account_balance(
            account.balance,
            transaction.transaction_type,
            transaction.amount,
        )?;

        // Commission: once the free allowance of deposits/withdrawals is
        // used up, the surcharge is folded into the amount and recomputed,
        // so the debit (or credit) moves amount + cost.
        if self.commission_applies(&account, &transaction).await? {
            let charged_amount = transaction.amount + account.transaction_cost;
            new_balance = balance::next_account_balance(
                account.balance,
                transaction.transaction_type,
                charged_amount,
            )?;
            transaction.amount = charged_amount;
            transaction.commissions = Some(account.transaction_cost);
        }

        // A transfer must name its destination before the source is touched.
        let destination_id = match transaction.transaction_type {
            TransactionType::Transfer => Some(
                transaction
                    .destination_account_id
                    .clone()
                    .ok_or(SettlementError::DestinationRequired)?,
            ),
            _ => None,
        };

        let committed = self
            .accounts
            .update_balance(&transaction.product_id, new_balance)
            .await?;
        self.cache.put(ProductSnapshot::Account(committed)).await;
        self.push_balance_notifications(&transaction.product_id, new_balance, notifications)
            .await;

        if let Some(destination_id) = destination_id {
            let destination = self.accounts.fetch_by_id(&destination_id).await?;
            let destination_balance = destination.balance + transaction.amount;
            let committed = self
                .accounts
                .update_balance(&destination_id, destination_balance)
                .await?;
            self.cache.put(ProductSnapshot::Account(committed)).await;
            self.push_balance_notifications(&destination_id, destination_balance, notifications)
                .await;
        }

        Ok(transaction)
    }

    /// Whether the per-transaction commission applies to this request
    async fn commission_applies(
        &self,
        account: &Account,
        transaction: &Transaction,
    ) -> Result<bool, SettlementError> {
        if !transaction.transaction_type.is_account_movement() {
            return Ok(false);
        }
        if transaction
            .product_sub_type
            .is_some_and(|sub| sub.is_fee_exempt())
        {
            return Ok(false);
        }
        // Prior movements are counted from the durable log, not the cache.
        let prior_movements = self
            .log
            .find_by_product_id(&transaction.product_id)
            .await?
            .iter()
            .filter(|tx| tx.transaction_type.is_account_movement())
            .count();
        Ok(prior_movements as u64 >= u64::from(account.max_free_transactions))
    }

    /// Credit-line settlement: only payments are valid, and the whole
    /// mutated record is committed back
    async fn settle_credit(
        &self,
        transaction: Transaction,
    ) -> Result<Transaction, SettlementError> {
        let credit = self.credit_snapshot(&transaction.product_id).await?;

        let new_remaining = balance::next_credit_balance(
            credit.remaining_balance,
            transaction.transaction_type,
            transaction.amount,
        )?;

        let mut updated = credit.clone();
        if new_remaining <= Decimal::ZERO {
            updated.credit_status = CreditStatus::Finished;
            updated.payment_status = PaymentStatus::Finished;
        } else if transaction.amount >= credit.minimum_payment {
            updated.payment_status = PaymentStatus::Paid;
            updated.next_payment_date = credit.next_payment_date + Duration::days(30);
            updated.minimum_payment = new_remaining * MINIMUM_PAYMENT_RATE;
        } else {
            updated.payment_status = PaymentStatus::Pending;
        }
        updated.remaining_balance = new_remaining;
        updated.modified_at = Some(Utc::now());

        let committed = self.credits.update(&updated).await?;
        self.cache.put(ProductSnapshot::Credit(committed)).await;
        Ok(transaction)
    }

    /// Credit-card settlement: purchases consume available balance, payments
    /// restore it
    async fn settle_credit_card(
        &self,
        transaction: Transaction,
    ) -> Result<Transaction, SettlementError> {
        let card = self.credit_card_snapshot(&transaction.product_id).await?;

        let new_available = balance::next_credit_card_balance(
            card.available_balance,
            transaction.transaction_type,
            transaction.amount,
        )?;

        let committed = self
            .credit_cards
            .update_balance(&transaction.product_id, new_available)
            .await?;
        self.cache.put(ProductSnapshot::CreditCard(committed)).await;
        Ok(transaction)
    }

    /// Debit-card settlement: always fetched straight from the card service,
    /// then delegated to the fallback resolver
    async fn settle_debit_card(
        &self,
        mut transaction: Transaction,
        notifications: &mut Vec<OutboundEvent>,
    ) -> Result<Transaction, SettlementError> {
        let card = self.debit_cards.fetch_by_id(&transaction.product_id).await?;

        if card.status != CardStatus::Active {
            return Err(SettlementError::card_inactive(&card.id, card.status));
        }
        if !matches!(
            transaction.transaction_type,
            TransactionType::DebitCardPayment | TransactionType::DebitCardWithdrawal
        ) {
            return Err(SettlementError::invalid_transaction_type(
                transaction.transaction_type,
                ProductCategory::DebitCard,
            ));
        }
        // The resolver only compares balances; negative amounts are rejected
        // here, before any candidate account is touched.
        if transaction.amount.is_sign_negative() {
            return Err(SettlementError::negative_amount(transaction.amount));
        }

        // The card's owner governs the transaction, whatever the request said.
        transaction.customer_id = card.customer_id.clone();

        let resolved = self.resolver.resolve(&card, transaction.amount).await?;
        transaction.source_account_id = Some(resolved.account_id.clone());
        if resolved.used_primary {
            self.push_balance_notifications(
                &resolved.account_id,
                resolved.new_balance,
                notifications,
            )
            .await;
        }
        Ok(transaction)
    }

    /// Cache-aside fetch of an account snapshot
    async fn account_snapshot(&self, id: &str) -> Result<Account, SettlementError> {
        if let Some(account) = self.cache.get_account(id).await {
            return Ok(account);
        }
        let account = self.accounts.fetch_by_id(id).await?;
        self.cache
            .put(ProductSnapshot::Account(account.clone()))
            .await;
        Ok(account)
    }

    /// Cache-aside fetch of a credit snapshot
    async fn credit_snapshot(&self, id: &str) -> Result<Credit, SettlementError> {
        if let Some(credit) = self.cache.get_credit(id).await {
            return Ok(credit);
        }
        let credit = self.credits.fetch_by_id(id).await?;
        self.cache.put(ProductSnapshot::Credit(credit.clone())).await;
        Ok(credit)
    }

    /// Cache-aside fetch of a credit-card snapshot
    async fn credit_card_snapshot(&self, id: &str) -> Result<CreditCard, SettlementError> {
        if let Some(card) = self.cache.get_credit_card(id).await {
            return Ok(card);
        }
        let card = self.credit_cards.fetch_by_id(id).await?;
        self.cache
            .put(ProductSnapshot::CreditCard(card.clone()))
            .await;
        Ok(card)
    }

    /// Build one balance-changed notification per debit card whose primary
    /// account is the mutated account
    ///
    /// The card lookup happens after the mutation committed, so a failure
    /// here only costs the notification, never the settlement.
    async fn push_balance_notifications(
        &self,
        account_id: &str,
        new_balance: Decimal,
        notifications: &mut Vec<OutboundEvent>,
    ) {
        match self
            .debit_cards
            .fetch_by_primary_account_id(account_id)
            .await
        {
            Ok(cards) => {
                for card in cards {
                    notifications.push(OutboundEvent::BalanceUpdated(BalanceUpdated {
                        account_id: account_id.to_string(),
                        new_balance,
                        card_number: card.card_number,
                    }));
                }
            }
            Err(err) => {
                warn!(account_id, %err, "card lookup for balance notification failed");
            }
        }
    }

    /// Whether the product identified by `product_id` belongs to
    /// `customer_id` (cascading, never fails)
    pub async fn validate_ownership(&self, customer_id: &str, product_id: &str) -> bool {
        self.ownership.validate(customer_id, product_id).await
    }

    /// Look up a transaction, failing if it does not exist
    pub async fn transaction_by_id(&self, id: &str) -> Result<Transaction, SettlementError> {
        self.log
            .find_by_id(id)
            .await?
            .ok_or_else(|| SettlementError::transaction_not_found(id))
    }

    /// All transactions of a customer
    pub async fn transactions_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Vec<Transaction>, SettlementError> {
        self.log.find_by_customer_id(customer_id).await
    }

    /// All transactions against a product
    pub async fn transactions_by_product(
        &self,
        product_id: &str,
    ) -> Result<Vec<Transaction>, SettlementError> {
        self.log.find_by_product_id(product_id).await
    }

    /// A customer's transactions against one product
    ///
    /// Gated by the ownership validator: when the product does not belong to
    /// the customer the result is empty, never an error.
    pub async fn transactions_by_customer_and_product(
        &self,
        customer_id: &str,
        product_id: &str,
    ) -> Result<Vec<Transaction>, SettlementError> {
        if !self.ownership.validate(customer_id, product_id).await {
            warn!(customer_id, product_id, "ownership check failed for query");
            return Ok(Vec::new());
        }
        self.log
            .find_by_customer_and_product(customer_id, product_id)
            .await
    }

    /// All transactions committed within the given range
    pub async fn transactions_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, SettlementError> {
        self.log.find_by_date_range(start, end).await
    }
}
