// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Average-cost investment accounting.
//!
//! A holding is one running aggregate per `(account, security)`: quantity,
//! cost basis of what is still held, and cumulative realized gain/loss.
//! [`Holding`] holds the arithmetic; the `record_*` functions load the row,
//! apply one event and append the matching `investment_transactions` row in
//! a single unit of work.

use crate::accounts::load_account;
use crate::db::unit_of_work;
use crate::error::{LedgerError, Result, not_found_as};
use crate::models::{AccountType, Investment, InvestmentTransaction, InvestmentTransactionType};
use crate::prices::{PriceLookup, StoredPrices};
use crate::securities::get_security;
use crate::utils::checked_mul_cents;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};

/// Remaining quantities at or below this are a fully closed position.
pub const QUANTITY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Holding {
    pub quantity: f64,
    pub cost_basis: i64,
    pub realized_gain_loss: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SellOutcome {
    /// Proceeds net of fee.
    pub total_amount: i64,
    pub cost_basis_reduction: i64,
    pub realized: i64,
}

impl Holding {
    /// Returns the new state and the amount paid (`quantity × price + fee`).
    pub fn buy(&self, quantity: f64, price_per_unit: i64, fee: i64) -> Result<(Holding, i64)> {
        let total = checked_mul_cents(quantity, price_per_unit)
            .and_then(|gross| gross.checked_add(fee))
            .ok_or_else(trade_out_of_range)?;
        let next = Holding {
            quantity: self.quantity + quantity,
            cost_basis: self.cost_basis.checked_add(total).ok_or_else(trade_out_of_range)?,
            realized_gain_loss: self.realized_gain_loss,
        };
        Ok((next, total))
    }

    pub fn sell(
        &self,
        quantity: f64,
        price_per_unit: i64,
        fee: i64,
    ) -> Result<(Holding, SellOutcome)> {
        if quantity > self.quantity + QUANTITY_EPSILON {
            return Err(LedgerError::InsufficientShares);
        }
        let total_amount = checked_mul_cents(quantity, price_per_unit)
            .and_then(|gross| gross.checked_sub(fee))
            .ok_or_else(trade_out_of_range)?;
        let remaining = self.quantity - quantity;

        let (quantity_after, cost_basis_reduction) = if remaining.abs() < QUANTITY_EPSILON {
            (0.0, self.cost_basis)
        } else {
            let reduction = (self.cost_basis as f64 * quantity / self.quantity).round() as i64;
            (remaining, reduction.min(self.cost_basis).max(0))
        };
        let realized = total_amount
            .checked_sub(cost_basis_reduction)
            .ok_or_else(trade_out_of_range)?;

        let next = Holding {
            quantity: quantity_after,
            cost_basis: self.cost_basis - cost_basis_reduction,
            realized_gain_loss: self
                .realized_gain_loss
                .checked_add(realized)
                .ok_or_else(trade_out_of_range)?,
        };
        Ok((
            next,
            SellOutcome {
                total_amount,
                cost_basis_reduction,
                realized,
            },
        ))
    }

    /// Scales quantity by `ratio`; cost basis is untouched.
    pub fn split(&self, ratio: f64) -> Holding {
        Holding {
            quantity: self.quantity * ratio,
            ..*self
        }
    }
}

fn trade_out_of_range() -> LedgerError {
    LedgerError::invalid("trade amount is out of range")
}

/// Arguments of a buy or sell.
#[derive(Debug, Clone)]
pub struct Trade<'a> {
    pub date: NaiveDate,
    pub quantity: f64,
    pub price_per_unit: i64,
    pub fee: i64,
    pub notes: &'a str,
}

impl Trade<'_> {
    fn validate(&self) -> Result<()> {
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(LedgerError::invalid("quantity must be greater than zero"));
        }
        if self.price_per_unit <= 0 {
            return Err(LedgerError::invalid("price per unit must be greater than zero"));
        }
        if self.fee < 0 {
            return Err(LedgerError::invalid("fee must not be negative"));
        }
        Ok(())
    }
}

/// Opening purchase of a security in an investment account.
#[derive(Debug, Clone)]
pub struct NewInvestment<'a> {
    pub account_id: i64,
    pub security_id: i64,
    pub trade: Trade<'a>,
    pub wallet_address: Option<&'a str>,
}

const INVESTMENT_COLUMNS: &str =
    "i.id, i.account_id, i.security_id, i.quantity, i.cost_basis, i.realized_gain_loss, i.wallet_address";

fn map_investment(r: &rusqlite::Row<'_>) -> rusqlite::Result<Investment> {
    Ok(Investment {
        id: r.get(0)?,
        account_id: r.get(1)?,
        security_id: r.get(2)?,
        quantity: r.get(3)?,
        cost_basis: r.get(4)?,
        realized_gain_loss: r.get(5)?,
        wallet_address: r.get(6)?,
        current_price: 0,
    })
}

fn map_event(r: &rusqlite::Row<'_>) -> rusqlite::Result<InvestmentTransaction> {
    Ok(InvestmentTransaction {
        id: r.get(0)?,
        investment_id: r.get(1)?,
        r#type: r.get(2)?,
        date: r.get(3)?,
        quantity: r.get(4)?,
        price_per_unit: r.get(5)?,
        fee: r.get(6)?,
        total_amount: r.get(7)?,
        realized_gain_loss: r.get(8)?,
        split_ratio: r.get(9)?,
        dividend_type: r.get(10)?,
        notes: r.get(11)?,
    })
}

fn holding_of(inv: &Investment) -> Holding {
    Holding {
        quantity: inv.quantity,
        cost_basis: inv.cost_basis,
        realized_gain_loss: inv.realized_gain_loss,
    }
}

/// A holding whose account belongs to `user`.
fn load_owned(conn: &Connection, user: &str, id: i64) -> Result<Investment> {
    conn.query_row(
        &format!(
            "SELECT {INVESTMENT_COLUMNS} FROM investments i
             JOIN accounts a ON a.id = i.account_id
             WHERE i.id=?1 AND a.user_id=?2"
        ),
        params![id, user],
        map_investment,
    )
    .map_err(not_found_as(LedgerError::InvestmentNotFound))
}

fn store_holding(conn: &Connection, id: i64, h: &Holding) -> Result<()> {
    conn.execute(
        "UPDATE investments SET quantity=?1, cost_basis=?2, realized_gain_loss=?3 WHERE id=?4",
        params![h.quantity, h.cost_basis, h.realized_gain_loss, id],
    )?;
    Ok(())
}

fn append_event(conn: &Connection, mut ev: InvestmentTransaction) -> Result<InvestmentTransaction> {
    conn.execute(
        "INSERT INTO investment_transactions(
             investment_id, type, date, quantity, price_per_unit, fee, total_amount,
             realized_gain_loss, split_ratio, dividend_type, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            ev.investment_id,
            ev.r#type,
            ev.date,
            ev.quantity,
            ev.price_per_unit,
            ev.fee,
            ev.total_amount,
            ev.realized_gain_loss,
            ev.split_ratio,
            ev.dividend_type,
            ev.notes
        ],
    )?;
    ev.id = conn.last_insert_rowid();
    Ok(ev)
}

fn buy_in_place(
    conn: &Connection,
    inv: &Investment,
    trade: &Trade<'_>,
) -> Result<InvestmentTransaction> {
    let (next, total) = holding_of(inv).buy(trade.quantity, trade.price_per_unit, trade.fee)?;
    store_holding(conn, inv.id, &next)?;
    append_event(
        conn,
        InvestmentTransaction {
            id: 0,
            investment_id: inv.id,
            r#type: InvestmentTransactionType::Buy,
            date: trade.date,
            quantity: trade.quantity,
            price_per_unit: trade.price_per_unit,
            fee: trade.fee,
            total_amount: total,
            realized_gain_loss: 0,
            split_ratio: None,
            dividend_type: None,
            notes: trade.notes.to_string(),
        },
    )
}

/// Opens a position, or buys into the existing one for the same security in
/// the same account.
pub fn add_investment(
    conn: &mut Connection,
    user: &str,
    new: &NewInvestment<'_>,
) -> Result<Investment> {
    new.trade.validate()?;
    let notes = match new.trade.notes.trim() {
        "" => "Initial purchase",
        n => n,
    };
    let trade = Trade {
        notes,
        ..new.trade.clone()
    };

    let id = unit_of_work(conn, |tx| {
        let account = load_account(tx, user, new.account_id)?;
        if account.r#type != AccountType::Investment {
            return Err(LedgerError::invalid("account is not an investment account"));
        }
        get_security(tx, new.security_id)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM investments WHERE account_id=?1 AND security_id=?2",
                params![new.account_id, new.security_id],
                |r| r.get(0),
            )
            .optional()?;
        let id = match existing {
            Some(id) => id,
            None => {
                tx.execute(
                    "INSERT INTO investments(account_id, security_id, wallet_address) VALUES (?1, ?2, ?3)",
                    params![new.account_id, new.security_id, new.wallet_address],
                )?;
                tx.last_insert_rowid()
            }
        };
        let inv = load_owned(tx, user, id)?;
        buy_in_place(tx, &inv, &trade)?;
        Ok(id)
    })?;

    tracing::info!(
        user,
        investment_id = id,
        account_id = new.account_id,
        security_id = new.security_id,
        quantity = trade.quantity,
        "investment added"
    );
    get_investment(conn, user, id)
}

pub fn record_buy(
    conn: &mut Connection,
    user: &str,
    investment_id: i64,
    trade: &Trade<'_>,
) -> Result<InvestmentTransaction> {
    trade.validate()?;
    let ev = unit_of_work(conn, |tx| {
        let inv = load_owned(tx, user, investment_id)?;
        buy_in_place(tx, &inv, trade)
    })?;
    tracing::info!(
        user,
        investment_id,
        quantity = trade.quantity,
        total = ev.total_amount,
        "buy recorded"
    );
    Ok(ev)
}

/// Sells part or all of a holding under the average-cost method.
pub fn record_sell(
    conn: &mut Connection,
    user: &str,
    investment_id: i64,
    trade: &Trade<'_>,
) -> Result<InvestmentTransaction> {
    trade.validate()?;
    let ev = unit_of_work(conn, |tx| {
        let inv = load_owned(tx, user, investment_id)?;
        let (next, outcome) = holding_of(&inv)
            .sell(trade.quantity, trade.price_per_unit, trade.fee)
            .inspect_err(|_| {
                tracing::warn!(
                    user,
                    investment_id,
                    held = inv.quantity,
                    requested = trade.quantity,
                    "sell rejected: insufficient shares"
                );
            })?;
        store_holding(tx, inv.id, &next)?;
        append_event(
            tx,
            InvestmentTransaction {
                id: 0,
                investment_id: inv.id,
                r#type: InvestmentTransactionType::Sell,
                date: trade.date,
                quantity: trade.quantity,
                price_per_unit: trade.price_per_unit,
                fee: trade.fee,
                total_amount: outcome.total_amount,
                realized_gain_loss: outcome.realized,
                split_ratio: None,
                dividend_type: None,
                notes: trade.notes.to_string(),
            },
        )
    })?;
    tracing::info!(
        user,
        investment_id,
        quantity = trade.quantity,
        proceeds = ev.total_amount,
        realized = ev.realized_gain_loss,
        "sell recorded"
    );
    Ok(ev)
}

/// Records cash income from a holding. The position itself is unchanged.
pub fn record_dividend(
    conn: &mut Connection,
    user: &str,
    investment_id: i64,
    date: NaiveDate,
    amount: i64,
    dividend_type: Option<&str>,
    notes: &str,
) -> Result<InvestmentTransaction> {
    if amount <= 0 {
        return Err(LedgerError::invalid("dividend amount must be greater than zero"));
    }
    let ev = unit_of_work(conn, |tx| {
        let inv = load_owned(tx, user, investment_id)?;
        append_event(
            tx,
            InvestmentTransaction {
                id: 0,
                investment_id: inv.id,
                r#type: InvestmentTransactionType::Dividend,
                date,
                quantity: 0.0,
                price_per_unit: 0,
                fee: 0,
                total_amount: amount,
                realized_gain_loss: 0,
                split_ratio: None,
                dividend_type: dividend_type
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                notes: notes.to_string(),
            },
        )
    })?;
    tracing::info!(user, investment_id, amount, "dividend recorded");
    Ok(ev)
}

/// Applies a split (or reverse split when `ratio < 1`). The event stores the
/// pre-split quantity.
pub fn record_split(
    conn: &mut Connection,
    user: &str,
    investment_id: i64,
    date: NaiveDate,
    ratio: f64,
    notes: &str,
) -> Result<InvestmentTransaction> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(LedgerError::invalid("split ratio must be a positive number"));
    }
    let ev = unit_of_work(conn, |tx| {
        let inv = load_owned(tx, user, investment_id)?;
        let next = holding_of(&inv).split(ratio);
        store_holding(tx, inv.id, &next)?;
        append_event(
            tx,
            InvestmentTransaction {
                id: 0,
                investment_id: inv.id,
                r#type: InvestmentTransactionType::Split,
                date,
                quantity: inv.quantity,
                price_per_unit: 0,
                fee: 0,
                total_amount: 0,
                realized_gain_loss: 0,
                split_ratio: Some(ratio),
                dividend_type: None,
                notes: notes.to_string(),
            },
        )
    })?;
    tracing::info!(user, investment_id, ratio, "split recorded");
    Ok(ev)
}

pub fn get_investment(conn: &Connection, user: &str, id: i64) -> Result<Investment> {
    let mut inv = load_owned(conn, user, id)?;
    inv.current_price = StoredPrices::new(conn)
        .latest_price(inv.security_id, None)?
        .unwrap_or(0);
    Ok(inv)
}

/// Holdings in the user's active investment accounts, optionally narrowed to one account.
pub fn list_investments(
    conn: &Connection,
    user: &str,
    account_id: Option<i64>,
) -> Result<Vec<Investment>> {
    if let Some(acct) = account_id {
        load_account(conn, user, acct)?;
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT {INVESTMENT_COLUMNS} FROM investments i
         JOIN accounts a ON a.id = i.account_id
         WHERE a.user_id=?1 AND a.is_active=1 AND a.type='investment'
           AND (?2 IS NULL OR i.account_id=?2)
         ORDER BY i.account_id, i.id"
    ))?;
    let rows = stmt.query_map(params![user, account_id], map_investment)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }

    let mut ids: Vec<i64> = out.iter().map(|i| i.security_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let latest = StoredPrices::new(conn).latest_prices(&ids, None)?;
    for inv in &mut out {
        inv.current_price = latest.get(&inv.security_id).copied().unwrap_or(0);
    }
    Ok(out)
}

/// Event history of one holding, newest first.
pub fn list_investment_transactions(
    conn: &Connection,
    user: &str,
    investment_id: i64,
) -> Result<Vec<InvestmentTransaction>> {
    load_owned(conn, user, investment_id)?;
    let mut stmt = conn.prepare(
        "SELECT id, investment_id, type, date, quantity, price_per_unit, fee, total_amount,
                realized_gain_loss, split_ratio, dividend_type, notes
         FROM investment_transactions
         WHERE investment_id=?1
         ORDER BY date DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![investment_id], map_event)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
