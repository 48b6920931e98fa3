//! Ownership validation
//!
//! Determines whether a product id belongs to a given customer by cascading
//! across the cacheable product types in a fixed order: account, then
//! credit, then credit card. Each type is consulted cache-first with a
//! source-of-truth fallback.
//!
//! The cascade short-circuits on the first definitive answer, in either
//! direction: a snapshot owned by the customer ends the search with `true`,
//! and a snapshot owned by someone else ends it with `false`; the id is
//! unambiguously taken, so later types are not tried. A remote error or a
//! remote "not found" merely means "not found under this type" and the
//! search continues. Ownership checks never fail the caller; the worst
//! outcome is a negative determination.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::cache::ProductStateCache;
use crate::core::traits::{AccountService, CreditCardService, CreditService};
use crate::types::{ProductKind, ProductSnapshot};

/// Cascading ownership validator over the cacheable product types
pub struct OwnershipValidator {
    cache: Arc<ProductStateCache>,
    accounts: Arc<dyn AccountService>,
    credits: Arc<dyn CreditService>,
    credit_cards: Arc<dyn CreditCardService>,
}

impl OwnershipValidator {
    /// Create a validator over the shared cache and remote services
    pub fn new(
        cache: Arc<ProductStateCache>,
        accounts: Arc<dyn AccountService>,
        credits: Arc<dyn CreditService>,
        credit_cards: Arc<dyn CreditCardService>,
    ) -> Self {
        Self {
            cache,
            accounts,
            credits,
            credit_cards,
        }
    }

    /// Whether the product identified by `id` belongs to `customer_id`
    ///
    /// Returns `false` when the id is not found under any product type, and
    /// also when it is found but owned by a different customer.
    pub async fn validate(&self, customer_id: &str, id: &str) -> bool {
        const ORDER: [ProductKind; 3] = [
            ProductKind::Account,
            ProductKind::Credit,
            ProductKind::CreditCard,
        ];
        for kind in ORDER {
            if let Some(snapshot) = self.lookup(kind, id).await {
                let owned = snapshot.customer_id() == customer_id;
                debug!(?kind, id, customer_id, owned, "ownership resolved");
                return owned;
            }
        }
        debug!(id, customer_id, "product not found under any type");
        false
    }

    /// Cache-aside lookup of one product type
    ///
    /// On a cache miss the source of truth is consulted and a successful
    /// fetch is written back before returning. Remote failures are reported
    /// as "not found under this type".
    async fn lookup(&self, kind: ProductKind, id: &str) -> Option<ProductSnapshot> {
        if let Some(snapshot) = self.cache.get(kind, id).await {
            return Some(snapshot);
        }
        let fetched = match kind {
            ProductKind::Account => self
                .accounts
                .fetch_by_id(id)
                .await
                .map(ProductSnapshot::Account),
            ProductKind::Credit => self
                .credits
                .fetch_by_id(id)
                .await
                .map(ProductSnapshot::Credit),
            ProductKind::CreditCard => self
                .credit_cards
                .fetch_by_id(id)
                .await
                .map(ProductSnapshot::CreditCard),
            // Debit cards are not cacheable and take no part in the cascade.
            ProductKind::DebitCard => return None,
        };
        match fetched {
            Ok(snapshot) => {
                self.cache.put(snapshot.clone()).await;
                Some(snapshot)
            }
            Err(error) => {
                warn!(?kind, id, %error, "ownership lookup failed, trying next product type");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::core::cache::InMemoryCacheStore;
    use crate::types::{
        Account, AccountType, Credit, CreditCard, CreditStatus, PaymentStatus, SettlementError,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn account(id: &str, customer_id: &str) -> Account {
        Account {
            id: id.to_string(),
            customer_id: customer_id.to_string(),
            account_type: AccountType::Checking,
            balance: Decimal::new(100_000, 2),
            max_free_transactions: 3,
            transaction_cost: Decimal::new(500, 2),
        }
    }

    fn credit(id: &str, customer_id: &str) -> Credit {
        Credit {
            id: id.to_string(),
            customer_id: customer_id.to_string(),
            remaining_balance: Decimal::new(50_000, 2),
            minimum_payment: Decimal::new(5_000, 2),
            credit_status: CreditStatus::Active,
            payment_status: PaymentStatus::Pending,
            next_payment_date: Utc::now(),
            modified_at: None,
        }
    }

    /// Account service that knows a fixed set of accounts
    struct StubAccounts(Vec<Account>);

    #[async_trait]
    impl AccountService for StubAccounts {
        async fn fetch_by_id(&self, account_id: &str) -> Result<Account, SettlementError> {
            self.0
                .iter()
                .find(|a| a.id == account_id)
                .cloned()
                .ok_or_else(|| {
                    SettlementError::product_not_found(ProductKind::Account, account_id)
                })
        }

        async fn update_balance(
            &self,
            account_id: &str,
            _new_balance: Decimal,
        ) -> Result<Account, SettlementError> {
            self.fetch_by_id(account_id).await
        }
    }

    /// Credit service that knows a fixed set of credits
    struct StubCredits(Vec<Credit>);

    #[async_trait]
    impl CreditService for StubCredits {
        async fn fetch_by_id(&self, credit_id: &str) -> Result<Credit, SettlementError> {
            self.0
                .iter()
                .find(|c| c.id == credit_id)
                .cloned()
                .ok_or_else(|| SettlementError::product_not_found(ProductKind::Credit, credit_id))
        }

        async fn update(&self, credit: &Credit) -> Result<Credit, SettlementError> {
            Ok(credit.clone())
        }
    }

    /// Credit-card service with no cards
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

    fn validator(
        accounts: Vec<Account>,
        credits: Vec<Credit>,
    ) -> (OwnershipValidator, Arc<ProductStateCache>) {
        let cache = Arc::new(ProductStateCache::new(
            Arc::new(InMemoryCacheStore::new()),
            &CacheConfig::default(),
        ));
        let validator = OwnershipValidator::new(
            Arc::clone(&cache),
            Arc::new(StubAccounts(accounts)),
            Arc::new(StubCredits(credits)),
            Arc::new(NoCreditCards),
        );
        (validator, cache)
    }

    #[tokio::test]
    async fn test_matching_account_short_circuits() {
        let (validator, _) = validator(vec![account("p-1", "cust-1")], vec![credit("p-2", "x")]);
        assert!(validator.validate("cust-1", "p-1").await);
    }

    #[tokio::test]
    async fn test_mismatch_does_not_fall_through() {
        // p-1 exists as an account owned by someone else AND as a credit
        // owned by the requester; the account mismatch must win.
        let (validator, _) = validator(
            vec![account("p-1", "someone-else")],
            vec![credit("p-1", "cust-1")],
        );
        assert!(!validator.validate("cust-1", "p-1").await);
    }

    #[tokio::test]
    async fn test_cascades_to_credit_when_account_missing() {
        let (validator, _) = validator(vec![], vec![credit("p-1", "cust-1")]);
        assert!(validator.validate("cust-1", "p-1").await);
    }

    #[tokio::test]
    async fn test_unknown_id_is_false() {
        let (validator, _) = validator(vec![], vec![]);
        assert!(!validator.validate("cust-1", "ghost").await);
    }

    #[tokio::test]
    async fn test_successful_fetch_populates_cache() {
        let (validator, cache) = validator(vec![account("p-1", "cust-1")], vec![]);
        assert!(validator.validate("cust-1", "p-1").await);
        assert!(cache.get_account("p-1").await.is_some());
    }

    /// Account service that always fails, as if its circuit were open
    struct UnavailableAccounts;

    #[async_trait]
    impl AccountService for UnavailableAccounts {
        async fn fetch_by_id(&self, _account_id: &str) -> Result<Account, SettlementError> {
            Err(SettlementError::service_unavailable(
                "account service",
                "circuit open",
            ))
        }

        async fn update_balance(
            &self,
            _account_id: &str,
            _new_balance: Decimal,
        ) -> Result<Account, SettlementError> {
            Err(SettlementError::service_unavailable(
                "account service",
                "circuit open",
            ))
        }
    }

    #[tokio::test]
    async fn test_remote_error_continues_cascade() {
        let cache = Arc::new(ProductStateCache::new(
            Arc::new(InMemoryCacheStore::new()),
            &CacheConfig::default(),
        ));
        let validator = OwnershipValidator::new(
            cache,
            Arc::new(UnavailableAccounts),
            Arc::new(StubCredits(vec![credit("p-1", "cust-1")])),
            Arc::new(NoCreditCards),
        );
        // The account service is down; the credit match must still be found.
        assert!(validator.validate("cust-1", "p-1").await);
    }
}
