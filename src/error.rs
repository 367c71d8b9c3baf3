// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Typed outcome of every ledger, investment and budget operation.
///
/// Store failures are folded into [`LedgerError::Internal`]; its message is
/// generic and the underlying `rusqlite` error is only reachable through
/// `source()` and the log.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Account not found")]
    AccountNotFound,
    #[error("Investment not found")]
    InvestmentNotFound,
    #[error("Insufficient account balance")]
    InsufficientBalance,
    #[error("Insufficient shares for this sale")]
    InsufficientShares,
    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,
    #[error("Transaction not found")]
    TransactionNotFound,
    #[error("This transaction type cannot be edited")]
    TransactionNotEditable,
    #[error("Cannot change transaction type to or from transfer/investment")]
    InvalidTypeChange,
    #[error("Category not found")]
    CategoryNotFound,
    #[error("Budget not found")]
    BudgetNotFound,
    #[error("Security not found")]
    SecurityNotFound,
    #[error("A security with this symbol and exchange already exists")]
    DuplicateSecurity,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("An internal error occurred")]
    Internal(#[source] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        LedgerError::InvalidInput(msg.into())
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            LedgerError::InvestmentNotFound => "INVESTMENT_NOT_FOUND",
            LedgerError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            LedgerError::InsufficientShares => "INSUFFICIENT_SHARES",
            LedgerError::SameAccountTransfer => "SAME_ACCOUNT_TRANSFER",
            LedgerError::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            LedgerError::TransactionNotEditable => "TRANSACTION_NOT_EDITABLE",
            LedgerError::InvalidTypeChange => "INVALID_TYPE_CHANGE",
            LedgerError::CategoryNotFound => "CATEGORY_NOT_FOUND",
            LedgerError::BudgetNotFound => "BUDGET_NOT_FOUND",
            LedgerError::SecurityNotFound => "SECURITY_NOT_FOUND",
            LedgerError::DuplicateSecurity => "DUPLICATE_SECURITY",
            LedgerError::InvalidInput(_) => "INVALID_INPUT",
            LedgerError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        tracing::error!(error = %e, "store failure");
        LedgerError::Internal(e)
    }
}

/// Maps "no row" to the given not-found kind and everything else to `Internal`.
pub(crate) fn not_found_as(kind: LedgerError) -> impl FnOnce(rusqlite::Error) -> LedgerError {
    move |e| match e {
        rusqlite::Error::QueryReturnedNoRows => kind,
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn internal_error_hides_cause_but_keeps_source() {
        let err: LedgerError = rusqlite::Error::InvalidQuery.into();
        assert_eq!(err.to_string(), "An internal error occurred");
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert!(err.source().is_some());
    }

    #[test]
    fn missing_row_maps_to_requested_kind() {
        let err = not_found_as(LedgerError::BudgetNotFound)(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, LedgerError::BudgetNotFound));
    }
}
