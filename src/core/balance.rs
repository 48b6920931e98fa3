//! Balance calculation rules
//!
//! Pure functions mapping (current balance, transaction type, amount) to a
//! new balance or a validation failure. These are the only places numeric
//! business rules live; no other component duplicates them, and none of them
//! performs I/O or mutates anything.
//!
//! All three entry points reject a negative amount up front with
//! [`SettlementError::NegativeAmount`], before any balance is inspected.

use rust_decimal::Decimal;

use crate::types::{ProductCategory, SettlementError, TransactionType};

/// Next balance for a deposit account
///
/// - `Deposit` adds the amount.
/// - `Withdrawal` and `Transfer` subtract it, failing with
///   `InsufficientFunds` when the amount exceeds the current balance.
/// - Any other transaction type fails with `InvalidTransactionType`.
pub fn next_account_balance(
    current_balance: Decimal,
    tx_type: TransactionType,
    amount: Decimal,
) -> Result<Decimal, SettlementError> {
    if amount.is_sign_negative() {
        return Err(SettlementError::negative_amount(amount));
    }
    match tx_type {
        TransactionType::Deposit => Ok(current_balance + amount),
        TransactionType::Withdrawal | TransactionType::Transfer => {
            if amount > current_balance {
                return Err(SettlementError::insufficient_funds(current_balance, amount));
            }
            Ok(current_balance - amount)
        }
        other => Err(SettlementError::invalid_transaction_type(
            other,
            ProductCategory::Account,
        )),
    }
}

/// Next remaining balance for a credit line
///
/// Only `CreditPayment` is valid; it subtracts the amount from the
/// outstanding debt. The result may go negative (an overpayment), which the
/// orchestrator treats as the credit being finished.
pub fn next_credit_balance(
    current_remaining: Decimal,
    tx_type: TransactionType,
    amount: Decimal,
) -> Result<Decimal, SettlementError> {
    if amount.is_sign_negative() {
        return Err(SettlementError::negative_amount(amount));
    }
    match tx_type {
        TransactionType::CreditPayment => Ok(current_remaining - amount),
        other => Err(SettlementError::invalid_transaction_type(
            other,
            ProductCategory::Credit,
        )),
    }
}

/// Next available balance for a credit card
///
/// - `CreditCardPurchase` subtracts the amount, failing with
///   `InsufficientFunds` when it exceeds the available balance.
/// - `CreditPayment` adds it back, restoring available credit.
/// - Any other transaction type fails with `InvalidTransactionType`.
pub fn next_credit_card_balance(
    current_available: Decimal,
    tx_type: TransactionType,
    amount: Decimal,
) -> Result<Decimal, SettlementError> {
    if amount.is_sign_negative() {
        return Err(SettlementError::negative_amount(amount));
    }
    match tx_type {
        TransactionType::CreditCardPurchase => {
            if amount > current_available {
                return Err(SettlementError::insufficient_funds(
                    current_available,
                    amount,
                ));
            }
            Ok(current_available - amount)
        }
        TransactionType::CreditPayment => Ok(current_available + amount),
        other => Err(SettlementError::invalid_transaction_type(
            other,
            ProductCategory::CreditCard,
        )),
    }
}
