// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, Result, not_found_as};
use crate::models::{AssetType, Security, SecurityPrice};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, params};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityPriceInput {
    pub security_id: i64,
    pub price: i64,
    pub recorded_at: DateTime<Utc>,
}

fn map_security(r: &rusqlite::Row<'_>) -> rusqlite::Result<Security> {
    Ok(Security {
        id: r.get(0)?,
        symbol: r.get(1)?,
        name: r.get(2)?,
        asset_type: r.get(3)?,
        currency: r.get(4)?,
        exchange: r.get(5)?,
    })
}

pub fn create_security(
    conn: &Connection,
    symbol: &str,
    name: &str,
    asset_type: AssetType,
    currency: &str,
    exchange: &str,
) -> Result<Security> {
    let symbol = symbol.trim().to_uppercase();
    let name = name.trim();
    if symbol.is_empty() {
        return Err(LedgerError::invalid("symbol is required"));
    }
    if name.is_empty() {
        return Err(LedgerError::invalid("name is required"));
    }
    let currency = match currency.trim() {
        "" => "USD".to_string(),
        c => c.to_uppercase(),
    };
    let exchange = exchange.trim().to_uppercase();

    let res = conn.execute(
        "INSERT INTO securities(symbol, name, asset_type, currency, exchange) VALUES (?1,?2,?3,?4,?5)",
        params![symbol, name, asset_type, currency, exchange],
    );
    match res {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            return Err(LedgerError::DuplicateSecurity);
        }
        Err(e) => return Err(e.into()),
    }
    let id = conn.last_insert_rowid();
    tracing::info!(security_id = id, %symbol, "security created");
    get_security(conn, id)
}

pub fn get_security(conn: &Connection, id: i64) -> Result<Security> {
    conn.query_row(
        "SELECT id, symbol, name, asset_type, currency, exchange FROM securities WHERE id=?1",
        params![id],
        map_security,
    )
    .map_err(not_found_as(LedgerError::SecurityNotFound))
}

pub fn list_securities(conn: &Connection) -> Result<Vec<Security>> {
    let mut stmt = conn.prepare(
        "SELECT id, symbol, name, asset_type, currency, exchange FROM securities ORDER BY symbol, exchange",
    )?;
    let rows = stmt.query_map([], map_security)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Inserts prices, skipping entries already recorded for the same instant.
/// Returns how many rows were new.
pub fn record_prices(conn: &mut Connection, prices: &[SecurityPriceInput]) -> Result<usize> {
    if prices.is_empty() {
        return Err(LedgerError::invalid("prices array is empty"));
    }
    if let Some(bad) = prices.iter().find(|p| p.price < 0) {
        return Err(LedgerError::invalid(format!(
            "price for security {} must not be negative",
            bad.security_id
        )));
    }
    let inserted = crate::db::unit_of_work(conn, |tx| {
        let mut count = 0;
        let mut insert = tx.prepare_cached(
            "INSERT OR IGNORE INTO security_prices(security_id, price, recorded_at) VALUES (?1, ?2, ?3)",
        )?;
        for p in prices {
            get_security(tx, p.security_id)?;
            count += insert.execute(params![p.security_id, p.price, p.recorded_at])?;
        }
        Ok::<_, LedgerError>(count)
    })?;
    tracing::info!(inserted, submitted = prices.len(), "prices recorded");
    Ok(inserted)
}

pub fn price_history(
    conn: &Connection,
    security_id: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<SecurityPrice>> {
    get_security(conn, security_id)?;
    let mut stmt = conn.prepare(
        "SELECT id, security_id, price, recorded_at FROM security_prices
         WHERE security_id=?1 AND recorded_at>=?2 AND recorded_at<=?3
         ORDER BY recorded_at DESC",
    )?;
    let rows = stmt.query_map(params![security_id, from, to], |r| {
        Ok(SecurityPrice {
            id: r.get(0)?,
            security_id: r.get(1)?,
            price: r.get(2)?,
            recorded_at: r.get(3)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
