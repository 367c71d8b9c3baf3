// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, TransactionBehavior};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Pocketledger", "pocketledger"));

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn default_db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("pocketledger.sqlite"))
}

pub fn open_or_init(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Create data dir {}", parent.display()))?;
        }
    }
    let conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Runs `f` inside one IMMEDIATE transaction.
///
/// The write lock is taken at BEGIN, so every balance or quantity read made by
/// `f` is serialized against other writers. The transaction commits only when
/// `f` returns `Ok`; an `Err` drops it and SQLite rolls everything back.
pub fn unit_of_work<T, E, F>(conn: &mut Connection, f: F) -> std::result::Result<T, E>
where
    F: FnOnce(&rusqlite::Transaction<'_>) -> std::result::Result<T, E>,
    E: From<rusqlite::Error>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let out = f(&tx)?;
    tx.commit()?;
    Ok(out)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('cash','investment','credit_card')),
        description TEXT NOT NULL DEFAULT '',
        balance INTEGER NOT NULL DEFAULT 0, -- cents
        currency TEXT NOT NULL DEFAULT 'USD',
        is_active INTEGER NOT NULL DEFAULT 1,
        broker TEXT,
        account_number TEXT,
        credit_limit INTEGER,
        interest_rate REAL,
        due_date TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_accounts_user ON accounts(user_id);

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        parent_id INTEGER,
        UNIQUE(user_id, name),
        FOREIGN KEY(parent_id) REFERENCES categories(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        account_id INTEGER NOT NULL,
        to_account_id INTEGER,
        category_id INTEGER,
        type TEXT NOT NULL CHECK(type IN ('income','expense','transfer','investment')),
        amount INTEGER NOT NULL CHECK(amount > 0), -- cents
        description TEXT NOT NULL DEFAULT '',
        date TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        deleted_at TEXT,
        CHECK(type != 'transfer' OR (to_account_id IS NOT NULL AND to_account_id != account_id)),
        FOREIGN KEY(account_id) REFERENCES accounts(id),
        FOREIGN KEY(to_account_id) REFERENCES accounts(id),
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date);

    CREATE TABLE IF NOT EXISTS budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        category_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        amount INTEGER NOT NULL, -- cents
        period TEXT NOT NULL CHECK(period IN ('monthly','yearly')),
        start_date TEXT NOT NULL,
        end_date TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        deleted_at TEXT,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS securities(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        symbol TEXT NOT NULL,
        name TEXT NOT NULL,
        asset_type TEXT NOT NULL,
        currency TEXT NOT NULL DEFAULT 'USD',
        exchange TEXT NOT NULL DEFAULT '',
        UNIQUE(symbol, exchange)
    );

    CREATE TABLE IF NOT EXISTS security_prices(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        security_id INTEGER NOT NULL,
        price INTEGER NOT NULL, -- cents
        recorded_at TEXT NOT NULL,
        UNIQUE(security_id, recorded_at),
        FOREIGN KEY(security_id) REFERENCES securities(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS investments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL,
        security_id INTEGER NOT NULL,
        quantity REAL NOT NULL DEFAULT 0 CHECK(quantity >= 0),
        cost_basis INTEGER NOT NULL DEFAULT 0 CHECK(cost_basis >= 0),
        realized_gain_loss INTEGER NOT NULL DEFAULT 0,
        wallet_address TEXT,
        UNIQUE(account_id, security_id),
        FOREIGN KEY(account_id) REFERENCES accounts(id),
        FOREIGN KEY(security_id) REFERENCES securities(id)
    );

    CREATE TABLE IF NOT EXISTS investment_transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        investment_id INTEGER NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('buy','sell','dividend','split')),
        date TEXT NOT NULL,
        quantity REAL NOT NULL DEFAULT 0,
        price_per_unit INTEGER NOT NULL DEFAULT 0,
        fee INTEGER NOT NULL DEFAULT 0,
        total_amount INTEGER NOT NULL DEFAULT 0,
        realized_gain_loss INTEGER NOT NULL DEFAULT 0,
        split_ratio REAL,
        dividend_type TEXT,
        notes TEXT NOT NULL DEFAULT '',
        FOREIGN KEY(investment_id) REFERENCES investments(id)
    );
    CREATE INDEX IF NOT EXISTS idx_inv_tx_investment ON investment_transactions(investment_id, date);

    -- Net-worth time series, one row per user per snapshot tick
    CREATE TABLE IF NOT EXISTS portfolio_snapshots(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        recorded_at TEXT NOT NULL,
        total_net_worth INTEGER NOT NULL,
        cash_balance INTEGER NOT NULL,
        investment_value INTEGER NOT NULL,
        debt_balance INTEGER NOT NULL,
        UNIQUE(user_id, recorded_at)
    );
    "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    #[test]
    fn unit_of_work_rolls_back_on_error() {
        let mut conn = open_in_memory().unwrap();
        let res: std::result::Result<(), rusqlite::Error> = unit_of_work(&mut conn, |tx| {
            tx.execute(
                "INSERT INTO settings(key, value) VALUES (?1, ?2)",
                params!["k", "v"],
            )?;
            Err(rusqlite::Error::QueryReturnedNoRows)
        });
        assert!(res.is_err());
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM settings", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn schema_init_is_idempotent() {
        let conn = open_in_memory().unwrap();
        init_schema(&conn).unwrap();
    }
}
