//! Settlement resolution for card transactions
//!
//! A debit card settles against an ordered pool of candidate accounts: the
//! primary account first, then the associated accounts in their original
//! relative order (duplicates of the primary removed). The resolver walks
//! that list sequentially and debits the first account that can cover the
//! amount.
//!
//! The walk is an explicit loop, not recursion, and "try the next candidate"
//! is a single visible branch covering both insufficient funds and a failed
//! remote call; a transient error on one candidate must not abort the whole
//! resolution. No mutation is issued until a sufficient candidate is found,
//! so there is nothing to roll back on failure.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::core::traits::AccountService;
use crate::types::{DebitCard, SettlementError};

/// Outcome of a successful card settlement
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDebit {
    /// The candidate account that was actually debited
    pub account_id: String,
    /// Its balance after the debit
    pub new_balance: Decimal,
    /// Whether the debited account is the card's primary account
    pub used_primary: bool,
}

/// Fallback search over a debit card's candidate accounts
pub struct SettlementResolver {
    accounts: Arc<dyn AccountService>,
}

impl SettlementResolver {
    /// Create a resolver over the remote account service
    pub fn new(accounts: Arc<dyn AccountService>) -> Self {
        Self { accounts }
    }

    /// Debit `amount` from the first candidate account that can cover it
    ///
    /// Commits the balance mutation on the chosen account and reports which
    /// account was debited. Fails with `InsufficientFundsAllAccounts` only
    /// after every candidate has been tried.
    pub async fn resolve(
        &self,
        card: &DebitCard,
        amount: Decimal,
    ) -> Result<ResolvedDebit, SettlementError> {
        let candidates = candidate_accounts(card);

        for (index, account_id) in candidates.iter().enumerate() {
            // Fetch failure and insufficient funds are treated identically:
            // advance to the next candidate.
            let account = match self.accounts.fetch_by_id(account_id).await {
                Ok(account) => account,
                Err(error) => {
                    warn!(account_id, %error, "candidate fetch failed, trying next account");
                    continue;
                }
            };
            if account.balance < amount {
                debug!(
                    account_id,
                    balance = %account.balance,
                    %amount,
                    "candidate has insufficient funds, trying next account"
                );
                continue;
            }

            let new_balance = account.balance - amount;
            match self.accounts.update_balance(account_id, new_balance).await {
                Ok(_) => {
                    return Ok(ResolvedDebit {
                        account_id: account_id.clone(),
                        new_balance,
                        used_primary: index == 0,
                    });
                }
                Err(error) => {
                    warn!(account_id, %error, "candidate debit failed, trying next account");
                    continue;
                }
            }
        }

        Err(SettlementError::insufficient_funds_all_accounts(
            &card.id, amount,
        ))
    }
}

/// Candidate order: primary first, then the associated accounts in their
/// original relative order, with duplicates of the primary removed
fn candidate_accounts(card: &DebitCard) -> Vec<String> {
    let mut candidates = vec![card.primary_account_id.clone()];
    candidates.extend(
        card.associated_account_ids
            .iter()
            .filter(|id| **id != card.primary_account_id)
            .cloned(),
    );
    candidates
}
