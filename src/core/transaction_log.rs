//! In-memory transaction log
//!
//! An implementation of [`TransactionLog`] over a mutex-guarded vector,
//! preserving insertion order. Useful for tests and for running the engine
//! without a durable store; the production log lives behind the same trait
//! in its own adapter.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::traits::TransactionLog;
use crate::types::{SettlementError, Transaction};

/// In-memory, insertion-ordered transaction log
#[derive(Debug, Default)]
pub struct InMemoryTransactionLog {
    transactions: RwLock<Vec<Transaction>>,
}

impl InMemoryTransactionLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self {
            transactions: RwLock::new(Vec::new()),
        }
    }

    fn filter<F>(&self, predicate: F) -> Vec<Transaction>
    where
        F: Fn(&Transaction) -> bool,
    {
        self.transactions
            .read()
            .expect("RwLock poisoned")
            .iter()
            .filter(|tx| predicate(tx))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TransactionLog for InMemoryTransactionLog {
    async fn save(&self, mut transaction: Transaction) -> Result<Transaction, SettlementError> {
        if transaction.id.is_none() {
            transaction.id = Some(Uuid::new_v4().to_string());
        }
        self.transactions
            .write()
            .expect("RwLock poisoned")
            .push(transaction.clone());
        Ok(transaction)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Transaction>, SettlementError> {
        Ok(self
            .filter(|tx| tx.id.as_deref() == Some(id))
            .into_iter()
            .next())
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Vec<Transaction>, SettlementError> {
        Ok(self.filter(|tx| tx.customer_id == customer_id))
    }

    async fn find_by_product_id(
        &self,
        product_id: &str,
    ) -> Result<Vec<Transaction>, SettlementError> {
        Ok(self.filter(|tx| tx.product_id == product_id))
    }

    async fn find_by_customer_and_product(
        &self,
        customer_id: &str,
        product_id: &str,
    ) -> Result<Vec<Transaction>, SettlementError> {
        Ok(self.filter(|tx| tx.customer_id == customer_id && tx.product_id == product_id))
    }

    async fn find_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, SettlementError> {
        Ok(self.filter(|tx| {
            tx.transaction_date
                .is_some_and(|date| date >= start && date <= end)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProductCategory, TransactionType};
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn tx(customer: &str, product: &str) -> Transaction {
        Transaction::new(
            customer,
            product,
            ProductCategory::Account,
            TransactionType::Deposit,
            Decimal::new(10_000, 2),
        )
    }

    #[tokio::test]
    async fn test_save_assigns_id() {
        let log = InMemoryTransactionLog::new();
        let stored = log.save(tx("cust-1", "acc-1")).await.unwrap();
        assert!(stored.id.is_some());

        let found = log.find_by_id(stored.id.as_deref().unwrap()).await.unwrap();
        assert_eq!(found, Some(stored));
    }

    #[tokio::test]
    async fn test_find_by_customer_and_product() {
        let log = InMemoryTransactionLog::new();
        log.save(tx("cust-1", "acc-1")).await.unwrap();
        log.save(tx("cust-1", "acc-2")).await.unwrap();
        log.save(tx("cust-2", "acc-1")).await.unwrap();

        assert_eq!(log.find_by_customer_id("cust-1").await.unwrap().len(), 2);
        assert_eq!(log.find_by_product_id("acc-1").await.unwrap().len(), 2);
        assert_eq!(
            log.find_by_customer_and_product("cust-1", "acc-1")
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_find_by_date_range() {
        let log = InMemoryTransactionLog::new();
        let now = Utc::now();

        let mut dated = tx("cust-1", "acc-1");
        dated.transaction_date = Some(now);
        log.save(dated).await.unwrap();

        let mut old = tx("cust-1", "acc-1");
        old.transaction_date = Some(now - Duration::days(40));
        log.save(old).await.unwrap();

        // Undated entries never match a range query.
        log.save(tx("cust-1", "acc-1")).await.unwrap();

        let found = log
            .find_by_date_range(now - Duration::days(7), now + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
