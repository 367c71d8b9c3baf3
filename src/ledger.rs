// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ledger core: the only code that records money movement.
//!
//! Every mutation validates its arguments first, then runs one unit of work
//! that reads the affected accounts, writes the transaction row and applies
//! the matching balance change. Nothing is visible unless all of it commits.

use crate::accounts::{adjust_balance, balance_delta, load_account};
use crate::categories::get_category;
use crate::db::unit_of_work;
use crate::error::{LedgerError, Result, not_found_as};
use crate::models::{Account, AccountType, Transaction, TransactionType};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

const TXN_COLUMNS: &str =
    "id, user_id, account_id, to_account_id, category_id, type, amount, description, date";

fn map_transaction(r: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        user_id: r.get(1)?,
        account_id: r.get(2)?,
        to_account_id: r.get(3)?,
        category_id: r.get(4)?,
        r#type: r.get(5)?,
        amount: r.get(6)?,
        description: r.get(7)?,
        date: r.get(8)?,
    })
}

/// Fields of an income/expense transaction that may be edited in place.
/// `category_id: Some(None)` clears the category.
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub account_id: Option<i64>,
    pub kind: Option<TransactionType>,
    pub amount: Option<i64>,
    pub category_id: Option<Option<i64>>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Matches either side of a transfer.
    pub account_id: Option<i64>,
    pub kind: Option<TransactionType>,
    pub category_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub min_amount: Option<i64>,
    pub max_amount: Option<i64>,
    pub limit: Option<usize>,
}

fn require_positive(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(LedgerError::invalid("amount must be greater than zero"));
    }
    Ok(())
}

fn require_ledger_account(account: &Account) -> Result<()> {
    if account.r#type == AccountType::Investment {
        return Err(LedgerError::invalid(
            "investment account balances are derived from holdings",
        ));
    }
    Ok(())
}

fn load_transaction(conn: &Connection, user: &str, id: i64) -> Result<Transaction> {
    conn.query_row(
        &format!(
            "SELECT {TXN_COLUMNS} FROM transactions WHERE id=?1 AND user_id=?2 AND deleted_at IS NULL"
        ),
        params![id, user],
        map_transaction,
    )
    .map_err(not_found_as(LedgerError::TransactionNotFound))
}

pub fn get_transaction(conn: &Connection, user: &str, id: i64) -> Result<Transaction> {
    load_transaction(conn, user, id)
}

/// Records an income, expense or investment entry and applies its balance
/// effect to the account atomically.
#[allow(clippy::too_many_arguments)]
pub fn apply_transaction(
    conn: &mut Connection,
    user: &str,
    account_id: i64,
    kind: TransactionType,
    amount: i64,
    category_id: Option<i64>,
    description: &str,
    date: NaiveDate,
) -> Result<Transaction> {
    require_positive(amount)?;
    if kind == TransactionType::Transfer {
        return Err(LedgerError::invalid(
            "transfers must name a destination account",
        ));
    }

    let txn = unit_of_work(conn, |tx| {
        let account = load_account(tx, user, account_id)?;
        require_ledger_account(&account)?;
        if let Some(cat) = category_id {
            get_category(tx, user, cat)?;
        }
        tx.execute(
            "INSERT INTO transactions(user_id, account_id, category_id, type, amount, description, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![user, account_id, category_id, kind, amount, description, date],
        )?;
        let id = tx.last_insert_rowid();
        adjust_balance(tx, account_id, balance_delta(account.r#type, kind, amount))?;
        load_transaction(tx, user, id)
    })?;

    tracing::info!(
        user,
        transaction_id = txn.id,
        account_id,
        kind = %kind,
        amount,
        "transaction applied"
    );
    Ok(txn)
}

/// Moves `amount` from one account to another as a single transfer record.
/// The source may not go below zero unless it is a credit card.
pub fn apply_transfer(
    conn: &mut Connection,
    user: &str,
    from_account_id: i64,
    to_account_id: i64,
    amount: i64,
    description: &str,
    date: NaiveDate,
) -> Result<Transaction> {
    if from_account_id == to_account_id {
        return Err(LedgerError::SameAccountTransfer);
    }
    require_positive(amount)?;

    let txn = unit_of_work(conn, |tx| {
        let from = load_account(tx, user, from_account_id)?;
        let to = load_account(tx, user, to_account_id)?;
        require_ledger_account(&from)?;
        require_ledger_account(&to)?;
        if from.r#type != AccountType::CreditCard && from.balance < amount {
            tracing::warn!(
                user,
                from_account_id,
                balance = from.balance,
                amount,
                "transfer rejected: insufficient balance"
            );
            return Err(LedgerError::InsufficientBalance);
        }

        tx.execute(
            "INSERT INTO transactions(user_id, account_id, to_account_id, type, amount, description, date)
             VALUES (?1, ?2, ?3, 'transfer', ?4, ?5, ?6)",
            params![user, from_account_id, to_account_id, amount, description, date],
        )?;
        let id = tx.last_insert_rowid();
        adjust_balance(
            tx,
            from_account_id,
            balance_delta(from.r#type, TransactionType::Expense, amount),
        )?;
        adjust_balance(
            tx,
            to_account_id,
            balance_delta(to.r#type, TransactionType::Income, amount),
        )?;
        load_transaction(tx, user, id)
    })?;

    tracing::info!(
        user,
        transaction_id = txn.id,
        from_account_id,
        to_account_id,
        amount,
        "transfer applied"
    );
    Ok(txn)
}

/// Undoes the balance effect of a transaction and soft-deletes it.
pub fn reverse_transaction(conn: &mut Connection, user: &str, id: i64) -> Result<()> {
    let txn = unit_of_work(conn, |tx| {
        let txn = load_transaction(tx, user, id)?;
        match txn.r#type {
            TransactionType::Income | TransactionType::Expense => {
                let account = load_account(tx, user, txn.account_id)?;
                adjust_balance(
                    tx,
                    account.id,
                    -balance_delta(account.r#type, txn.r#type, txn.amount),
                )?;
            }
            TransactionType::Transfer => {
                let to_id = txn.to_account_id.ok_or_else(|| {
                    LedgerError::invalid("transfer is missing its destination account")
                })?;
                let from = load_account(tx, user, txn.account_id)?;
                let to = load_account(tx, user, to_id)?;
                adjust_balance(
                    tx,
                    from.id,
                    -balance_delta(from.r#type, TransactionType::Expense, txn.amount),
                )?;
                adjust_balance(
                    tx,
                    to.id,
                    -balance_delta(to.r#type, TransactionType::Income, txn.amount),
                )?;
            }
            TransactionType::Investment => {}
        }
        tx.execute(
            "UPDATE transactions SET deleted_at=?1 WHERE id=?2 AND deleted_at IS NULL",
            params![Utc::now(), txn.id],
        )?;
        Ok::<_, LedgerError>(txn)
    })?;

    tracing::info!(
        user,
        transaction_id = txn.id,
        kind = %txn.r#type,
        amount = txn.amount,
        "transaction reversed"
    );
    Ok(())
}

/// Edits an income/expense transaction: the old effect is reversed and the
/// new one applied in the same unit of work.
pub fn update_transaction(
    conn: &mut Connection,
    user: &str,
    id: i64,
    update: &TransactionUpdate,
) -> Result<Transaction> {
    if let Some(amount) = update.amount {
        require_positive(amount)?;
    }

    let txn = unit_of_work(conn, |tx| {
        let old = load_transaction(tx, user, id)?;
        if matches!(
            old.r#type,
            TransactionType::Transfer | TransactionType::Investment
        ) {
            return Err(LedgerError::TransactionNotEditable);
        }
        if matches!(
            update.kind,
            Some(TransactionType::Transfer | TransactionType::Investment)
        ) {
            return Err(LedgerError::InvalidTypeChange);
        }

        let new_account_id = update.account_id.unwrap_or(old.account_id);
        let new_kind = update.kind.unwrap_or(old.r#type);
        let new_amount = update.amount.unwrap_or(old.amount);
        let new_category = update.category_id.unwrap_or(old.category_id);

        let old_account = load_account(tx, user, old.account_id)?;
        let new_account = if new_account_id == old.account_id {
            old_account.clone()
        } else {
            let acct = load_account(tx, user, new_account_id)?;
            require_ledger_account(&acct)?;
            acct
        };
        if let Some(cat) = new_category {
            if Some(cat) != old.category_id {
                get_category(tx, user, cat)?;
            }
        }

        adjust_balance(
            tx,
            old_account.id,
            -balance_delta(old_account.r#type, old.r#type, old.amount),
        )?;
        tx.execute(
            "UPDATE transactions
             SET account_id=?1, type=?2, amount=?3, category_id=?4, description=?5, date=?6
             WHERE id=?7",
            params![
                new_account_id,
                new_kind,
                new_amount,
                new_category,
                update.description.as_deref().unwrap_or(&old.description),
                update.date.unwrap_or(old.date),
                old.id
            ],
        )?;
        adjust_balance(
            tx,
            new_account.id,
            balance_delta(new_account.r#type, new_kind, new_amount),
        )?;
        load_transaction(tx, user, old.id)
    })?;

    tracing::info!(
        user,
        transaction_id = txn.id,
        account_id = txn.account_id,
        kind = %txn.r#type,
        amount = txn.amount,
        "transaction updated"
    );
    Ok(txn)
}

/// Non-deleted transactions of `user`, newest first.
pub fn list_transactions(
    conn: &Connection,
    user: &str,
    filter: &TransactionFilter,
) -> Result<Vec<Transaction>> {
    let mut sql = format!(
        "SELECT {TXN_COLUMNS} FROM transactions WHERE user_id=? AND deleted_at IS NULL"
    );
    let mut values: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user.to_string())];

    if let Some(acct) = filter.account_id {
        sql.push_str(" AND (account_id=? OR to_account_id=?)");
        values.push(Box::new(acct));
        values.push(Box::new(acct));
    }
    if let Some(kind) = filter.kind {
        sql.push_str(" AND type=?");
        values.push(Box::new(kind));
    }
    if let Some(cat) = filter.category_id {
        sql.push_str(" AND category_id=?");
        values.push(Box::new(cat));
    }
    if let Some(from) = filter.from {
        sql.push_str(" AND date>=?");
        values.push(Box::new(from));
    }
    if let Some(to) = filter.to {
        sql.push_str(" AND date<=?");
        values.push(Box::new(to));
    }
    if let Some(min) = filter.min_amount {
        sql.push_str(" AND amount>=?");
        values.push(Box::new(min));
    }
    if let Some(max) = filter.max_amount {
        sql.push_str(" AND amount<=?");
        values.push(Box::new(max));
    }
    sql.push_str(" ORDER BY date DESC, id DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        values.push(Box::new(limit as i64));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())),
        map_transaction,
    )?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
