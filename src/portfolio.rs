// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only valuation of holdings and the net-worth time series.

use crate::error::Result;
use crate::models::{AssetType, PortfolioSnapshot};
use crate::prices::PriceLookup;
use crate::utils::mul_cents;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSummary {
    pub value: i64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_value: i64,
    pub total_cost_basis: i64,
    /// Unrealized: `total_value - total_cost_basis`.
    pub total_gain_loss: i64,
    pub gain_loss_pct: f64,
    pub total_realized_gain_loss: i64,
    pub holdings_by_type: BTreeMap<AssetType, TypeSummary>,
}

struct HeldPosition {
    security_id: i64,
    asset_type: AssetType,
    quantity: f64,
    cost_basis: i64,
    realized_gain_loss: i64,
}

fn positions_of(conn: &Connection, user: &str) -> Result<Vec<HeldPosition>> {
    let mut stmt = conn.prepare_cached(
        "SELECT i.security_id, s.asset_type, i.quantity, i.cost_basis, i.realized_gain_loss
         FROM investments i
         JOIN accounts a ON a.id = i.account_id
         JOIN securities s ON s.id = i.security_id
         WHERE a.user_id=?1 AND a.type='investment' AND a.is_active=1",
    )?;
    let rows = stmt.query_map(params![user], |r| {
        Ok(HeldPosition {
            security_id: r.get(0)?,
            asset_type: r.get(1)?,
            quantity: r.get(2)?,
            cost_basis: r.get(3)?,
            realized_gain_loss: r.get(4)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn market_values(
    positions: &[HeldPosition],
    prices: &dyn PriceLookup,
    as_of: Option<DateTime<Utc>>,
) -> Result<Vec<i64>> {
    let mut ids: Vec<i64> = positions.iter().map(|p| p.security_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let latest = prices.latest_prices(&ids, as_of)?;
    Ok(positions
        .iter()
        .map(|p| mul_cents(p.quantity, latest.get(&p.security_id).copied().unwrap_or(0)))
        .collect())
}

/// Values every holding in the user's active investment accounts at the
/// latest known price. Recomputed on each call.
pub fn get_portfolio(
    conn: &Connection,
    user: &str,
    prices: &dyn PriceLookup,
) -> Result<PortfolioSummary> {
    let positions = positions_of(conn, user)?;
    let values = market_values(&positions, prices, None)?;

    let mut summary = PortfolioSummary::default();
    for (pos, value) in positions.iter().zip(values) {
        summary.total_value += value;
        summary.total_cost_basis += pos.cost_basis;
        summary.total_realized_gain_loss += pos.realized_gain_loss;
        let entry = summary.holdings_by_type.entry(pos.asset_type).or_default();
        entry.value += value;
        entry.count += 1;
    }
    summary.total_gain_loss = summary.total_value - summary.total_cost_basis;
    if summary.total_cost_basis != 0 {
        summary.gain_loss_pct =
            summary.total_gain_loss as f64 / summary.total_cost_basis as f64 * 100.0;
    }
    Ok(summary)
}

fn sum_balances(conn: &Connection, user: &str, account_type: &str) -> Result<i64> {
    let total = conn.query_row(
        "SELECT COALESCE(SUM(balance), 0) FROM accounts WHERE user_id=?1 AND type=?2 AND is_active=1",
        params![user, account_type],
        |r| r.get(0),
    )?;
    Ok(total)
}

fn compute_snapshot(
    conn: &Connection,
    user: &str,
    prices: &dyn PriceLookup,
    as_of: DateTime<Utc>,
) -> Result<PortfolioSnapshot> {
    let cash_balance = sum_balances(conn, user, "cash")?;
    let debt_balance = sum_balances(conn, user, "credit_card")?;
    let positions = positions_of(conn, user)?;
    let investment_value: i64 = market_values(&positions, prices, Some(as_of))?.iter().sum();
    Ok(PortfolioSnapshot {
        id: 0,
        user_id: user.to_string(),
        recorded_at: as_of,
        total_net_worth: cash_balance + investment_value - debt_balance,
        cash_balance,
        investment_value,
        debt_balance,
    })
}

/// Writes one net-worth snapshot per owner of an active account. Running it
/// again for the same `as_of` overwrites that tick. Returns the number of
/// users snapshotted.
pub fn compute_and_record_snapshots(
    conn: &Connection,
    prices: &dyn PriceLookup,
    as_of: DateTime<Utc>,
) -> Result<usize> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT user_id FROM accounts WHERE is_active=1 ORDER BY user_id")?;
    let users = stmt
        .query_map([], |r| r.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut count = 0;
    for user in &users {
        let snap = compute_snapshot(conn, user, prices, as_of)?;
        conn.execute(
            "INSERT INTO portfolio_snapshots(
                 user_id, recorded_at, total_net_worth, cash_balance, investment_value, debt_balance)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id, recorded_at) DO UPDATE SET
                 total_net_worth=excluded.total_net_worth,
                 cash_balance=excluded.cash_balance,
                 investment_value=excluded.investment_value,
                 debt_balance=excluded.debt_balance",
            params![
                snap.user_id,
                snap.recorded_at,
                snap.total_net_worth,
                snap.cash_balance,
                snap.investment_value,
                snap.debt_balance
            ],
        )?;
        tracing::debug!(user = %user, net_worth = snap.total_net_worth, "snapshot written");
        count += 1;
    }
    tracing::info!(count, recorded_at = %as_of, "portfolio snapshots recorded");
    Ok(count)
}

/// Snapshots of `user` between `from` and `to` inclusive, newest first.
pub fn list_snapshots(
    conn: &Connection,
    user: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<PortfolioSnapshot>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, recorded_at, total_net_worth, cash_balance, investment_value, debt_balance
         FROM portfolio_snapshots
         WHERE user_id=?1 AND recorded_at>=?2 AND recorded_at<=?3
         ORDER BY recorded_at DESC",
    )?;
    let rows = stmt.query_map(params![user, from, to], |r| {
        Ok(PortfolioSnapshot {
            id: r.get(0)?,
            user_id: r.get(1)?,
            recorded_at: r.get(2)?,
            total_net_worth: r.get(3)?,
            cash_balance: r.get(4)?,
            investment_value: r.get(5)?,
            debt_balance: r.get(6)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
