// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Account lifecycle and the single balance write path.
//!
//! Cash and credit-card balances change only through [`adjust_balance`],
//! which ledger code calls inside the same unit of work that persists the
//! paired transaction. Investment balances are never written; they are
//! derived from holdings at read time.

use crate::db::unit_of_work;
use crate::error::{LedgerError, Result, not_found_as};
use crate::models::{Account, AccountType, TransactionType};
use crate::prices::{PriceLookup, StoredPrices};
use crate::utils::mul_cents;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;

const ACCOUNT_COLUMNS: &str = "id, user_id, name, type, description, balance, currency, is_active, \
     broker, account_number, credit_limit, interest_rate, due_date";

fn map_account(r: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        r#type: r.get(3)?,
        description: r.get(4)?,
        balance: r.get(5)?,
        currency: r.get(6)?,
        is_active: r.get(7)?,
        broker: r.get(8)?,
        account_number: r.get(9)?,
        credit_limit: r.get(10)?,
        interest_rate: r.get(11)?,
        due_date: r.get(12)?,
    })
}

#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub broker: Option<String>,
    pub account_number: Option<String>,
    pub credit_limit: Option<i64>,
    pub interest_rate: Option<f64>,
    pub due_date: Option<NaiveDate>,
}

fn normalize_currency(currency: &str) -> String {
    match currency.trim() {
        "" => "USD".to_string(),
        c => c.to_uppercase(),
    }
}

fn require_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::invalid("account name is required"));
    }
    Ok(name)
}

/// Creates a cash account. A positive opening balance is booked as an
/// "Initial balance" income transaction in the same unit of work.
pub fn create_cash_account(
    conn: &mut Connection,
    user: &str,
    name: &str,
    description: &str,
    currency: &str,
    initial_balance: i64,
    opened_on: NaiveDate,
) -> Result<Account> {
    let name = require_name(name)?;
    if initial_balance < 0 {
        return Err(LedgerError::invalid("initial balance must not be negative"));
    }
    let currency = normalize_currency(currency);
    let id = unit_of_work(conn, |tx| {
        tx.execute(
            "INSERT INTO accounts(user_id, name, type, description, balance, currency)
             VALUES (?1, ?2, 'cash', ?3, ?4, ?5)",
            params![user, name, description, initial_balance, currency],
        )?;
        let id = tx.last_insert_rowid();
        if initial_balance > 0 {
            tx.execute(
                "INSERT INTO transactions(user_id, account_id, type, amount, description, date)
                 VALUES (?1, ?2, 'income', ?3, 'Initial balance', ?4)",
                params![user, id, initial_balance, opened_on],
            )?;
        }
        Ok::<_, LedgerError>(id)
    })?;
    tracing::info!(user, account_id = id, initial_balance, "cash account created");
    get_account(conn, user, id)
}

pub fn create_investment_account(
    conn: &Connection,
    user: &str,
    name: &str,
    description: &str,
    currency: &str,
    broker: Option<&str>,
    account_number: Option<&str>,
) -> Result<Account> {
    let name = require_name(name)?;
    conn.execute(
        "INSERT INTO accounts(user_id, name, type, description, currency, broker, account_number)
         VALUES (?1, ?2, 'investment', ?3, ?4, ?5, ?6)",
        params![
            user,
            name,
            description,
            normalize_currency(currency),
            broker,
            account_number
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(user, account_id = id, "investment account created");
    get_account(conn, user, id)
}

#[allow(clippy::too_many_arguments)]
pub fn create_credit_card_account(
    conn: &Connection,
    user: &str,
    name: &str,
    description: &str,
    currency: &str,
    credit_limit: i64,
    interest_rate: f64,
    due_date: Option<NaiveDate>,
) -> Result<Account> {
    let name = require_name(name)?;
    if credit_limit < 0 {
        return Err(LedgerError::invalid("credit limit must not be negative"));
    }
    if !interest_rate.is_finite() || interest_rate < 0.0 {
        return Err(LedgerError::invalid("interest rate must be a non-negative number"));
    }
    conn.execute(
        "INSERT INTO accounts(user_id, name, type, description, currency, credit_limit, interest_rate, due_date)
         VALUES (?1, ?2, 'credit_card', ?3, ?4, ?5, ?6, ?7)",
        params![
            user,
            name,
            description,
            normalize_currency(currency),
            credit_limit,
            interest_rate,
            due_date
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(user, account_id = id, "credit card account created");
    get_account(conn, user, id)
}

/// Loads an active account of `user` exactly as stored (no derived balance).
pub(crate) fn load_account(conn: &Connection, user: &str, id: i64) -> Result<Account> {
    conn.query_row(
        &format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id=?1 AND user_id=?2 AND is_active=1"
        ),
        params![id, user],
        map_account,
    )
    .map_err(not_found_as(LedgerError::AccountNotFound))
}

/// Active account of `user`; investment accounts carry their market value.
pub fn get_account(conn: &Connection, user: &str, id: i64) -> Result<Account> {
    let mut accounts = vec![load_account(conn, user, id)?];
    enrich_investment_balances(conn, &StoredPrices::new(conn), &mut accounts)?;
    Ok(accounts.remove(0))
}

pub fn list_accounts(conn: &Connection, user: &str) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id=?1 AND is_active=1 ORDER BY name, id"
    ))?;
    let rows = stmt.query_map(params![user], map_account)?;
    let mut accounts = Vec::new();
    for row in rows {
        accounts.push(row?);
    }
    enrich_investment_balances(conn, &StoredPrices::new(conn), &mut accounts)?;
    Ok(accounts)
}

/// Replaces the balance of investment accounts with `Σ quantity × latest price`.
pub fn enrich_investment_balances(
    conn: &Connection,
    prices: &dyn PriceLookup,
    accounts: &mut [Account],
) -> Result<()> {
    let ids: Vec<i64> = accounts
        .iter()
        .filter(|a| a.r#type == AccountType::Investment)
        .map(|a| a.id)
        .collect();
    if ids.is_empty() {
        return Ok(());
    }

    let mut holdings: Vec<(i64, i64, f64)> = Vec::new();
    let mut stmt =
        conn.prepare_cached("SELECT account_id, security_id, quantity FROM investments WHERE account_id=?1")?;
    for id in &ids {
        let rows = stmt.query_map(params![id], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?;
        for row in rows {
            holdings.push(row?);
        }
    }

    let mut security_ids: Vec<i64> = holdings.iter().map(|h| h.1).collect();
    security_ids.sort_unstable();
    security_ids.dedup();
    let latest = prices.latest_prices(&security_ids, None)?;

    let mut values: HashMap<i64, i64> = HashMap::new();
    for (account_id, security_id, quantity) in holdings {
        let price = latest.get(&security_id).copied().unwrap_or(0);
        *values.entry(account_id).or_insert(0) += mul_cents(quantity, price);
    }
    for account in accounts.iter_mut() {
        if account.r#type == AccountType::Investment {
            account.balance = values.get(&account.id).copied().unwrap_or(0);
        }
    }
    Ok(())
}

/// Signed balance effect of a ledger entry on an account.
///
/// Credit-card balances are amounts owed: spending raises them and income
/// (a payment) lowers them. Only income and expense move money.
pub fn balance_delta(account_type: AccountType, kind: TransactionType, amount: i64) -> i64 {
    let signed = match kind {
        TransactionType::Income => amount,
        TransactionType::Expense => -amount,
        TransactionType::Transfer | TransactionType::Investment => 0,
    };
    if account_type == AccountType::CreditCard {
        -signed
    } else {
        signed
    }
}

/// The only writer of `accounts.balance`. Callers must be inside
/// the unit of work that also persists the paired transaction row.
pub(crate) fn adjust_balance(conn: &Connection, account_id: i64, delta: i64) -> Result<()> {
    if delta == 0 {
        return Ok(());
    }
    let current: i64 = conn
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1 AND type != 'investment'",
            params![account_id],
            |r| r.get(0),
        )
        .optional()?
        .ok_or(LedgerError::AccountNotFound)?;
    let next = current
        .checked_add(delta)
        .ok_or_else(|| LedgerError::invalid("amount would overflow the account balance"))?;
    conn.execute(
        "UPDATE accounts SET balance=?1 WHERE id=?2",
        params![next, account_id],
    )?;
    Ok(())
}

pub fn update_account(
    conn: &Connection,
    user: &str,
    id: i64,
    fields: &AccountUpdate,
) -> Result<Account> {
    let account = load_account(conn, user, id)?;

    let mut sets: Vec<&str> = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(name) = fields.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        sets.push("name");
        values.push(Box::new(name.to_string()));
    }
    if let Some(desc) = &fields.description {
        sets.push("description");
        values.push(Box::new(desc.clone()));
    }
    if let Some(active) = fields.is_active {
        sets.push("is_active");
        values.push(Box::new(active));
    }
    match account.r#type {
        AccountType::Investment => {
            if let Some(b) = &fields.broker {
                sets.push("broker");
                values.push(Box::new(b.clone()));
            }
            if let Some(n) = &fields.account_number {
                sets.push("account_number");
                values.push(Box::new(n.clone()));
            }
        }
        AccountType::CreditCard => {
            if let Some(limit) = fields.credit_limit {
                if limit < 0 {
                    return Err(LedgerError::invalid("credit limit must not be negative"));
                }
                sets.push("credit_limit");
                values.push(Box::new(limit));
            }
            if let Some(rate) = fields.interest_rate {
                if !rate.is_finite() || rate < 0.0 {
                    return Err(LedgerError::invalid("interest rate must be a non-negative number"));
                }
                sets.push("interest_rate");
                values.push(Box::new(rate));
            }
            if let Some(due) = fields.due_date {
                sets.push("due_date");
                values.push(Box::new(due));
            }
        }
        AccountType::Cash => {}
    }

    if sets.is_empty() {
        return get_account(conn, user, id);
    }

    let assignments: Vec<String> = sets
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{}=?{}", col, i + 1))
        .collect();
    let sql = format!(
        "UPDATE accounts SET {} WHERE id=?{}",
        assignments.join(", "),
        sets.len() + 1
    );
    values.push(Box::new(id));
    conn.execute(
        &sql,
        rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())),
    )?;
    tracing::info!(user, account_id = id, fields = ?sets, "account updated");

    if fields.is_active == Some(false) {
        // Deactivated accounts are invisible to reads; return the stored row.
        return conn
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id=?1"),
                params![id],
                map_account,
            )
            .map_err(LedgerError::from);
    }
    get_account(conn, user, id)
}
