// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{date_or_today, opt, opt_cents, req};
use crate::investments::{self, NewInvestment, Trade};
use crate::models::InvestmentTransaction;
use crate::utils::{
    fmt_cents, id_for_account, id_for_security, maybe_print_json, mul_cents, parse_cents,
    parse_quantity, pretty_table,
};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, user, sub)?,
        Some(("buy", sub)) => {
            let id = investment_id(sub)?;
            let notes = opt(sub, "notes").unwrap_or_default();
            let ev = investments::record_buy(conn, user, id, &trade_from_args(sub, notes)?)?;
            print_event("Bought", &ev);
        }
        Some(("sell", sub)) => {
            let id = investment_id(sub)?;
            let notes = opt(sub, "notes").unwrap_or_default();
            let ev = investments::record_sell(conn, user, id, &trade_from_args(sub, notes)?)?;
            print_event("Sold", &ev);
            println!("Realized gain/loss: {}", fmt_cents(ev.realized_gain_loss));
        }
        Some(("dividend", sub)) => {
            let ev = investments::record_dividend(
                conn,
                user,
                investment_id(sub)?,
                date_or_today(sub, "date")?,
                parse_cents(req(sub, "amount")?)?,
                opt(sub, "kind"),
                opt(sub, "notes").unwrap_or_default(),
            )?;
            println!(
                "Dividend of {} recorded for investment {}",
                fmt_cents(ev.total_amount),
                ev.investment_id
            );
        }
        Some(("split", sub)) => {
            let raw = req(sub, "ratio")?;
            let ratio: f64 = raw
                .parse()
                .with_context(|| format!("Invalid split ratio '{}'", raw))?;
            let ev = investments::record_split(
                conn,
                user,
                investment_id(sub)?,
                date_or_today(sub, "date")?,
                ratio,
                opt(sub, "notes").unwrap_or_default(),
            )?;
            println!(
                "Split {}x applied to investment {} ({} units before)",
                ratio, ev.investment_id, ev.quantity
            );
        }
        Some(("list", sub)) => list(conn, user, sub)?,
        Some(("history", sub)) => {
            let data = investments::list_investment_transactions(conn, user, investment_id(sub)?)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|e| {
                        vec![
                            e.id.to_string(),
                            e.date.to_string(),
                            e.r#type.to_string(),
                            e.quantity.to_string(),
                            fmt_cents(e.price_per_unit),
                            fmt_cents(e.fee),
                            fmt_cents(e.total_amount),
                            fmt_cents(e.realized_gain_loss),
                            e.notes.clone(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Date", "Type", "Qty", "Price", "Fee", "Total", "Realized", "Notes"],
                        rows
                    )
                );
            }
        }
        _ => {}
    }
    Ok(())
}

fn investment_id(sub: &clap::ArgMatches) -> Result<i64> {
    sub.get_one::<i64>("ID").copied().context("Missing investment id")
}

fn trade_from_args<'a>(sub: &clap::ArgMatches, notes: &'a str) -> Result<Trade<'a>> {
    Ok(Trade {
        date: date_or_today(sub, "date")?,
        quantity: parse_quantity(req(sub, "quantity")?)?,
        price_per_unit: parse_cents(req(sub, "price")?)?,
        fee: opt_cents(sub, "fee")?.unwrap_or(0),
        notes,
    })
}

fn add(conn: &mut Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let account_id = id_for_account(conn, user, req(sub, "account")?)?;
    let symbol = req(sub, "symbol")?;
    let security_id = id_for_security(conn, symbol)?;
    let notes = opt(sub, "notes").unwrap_or_default();
    let new = NewInvestment {
        account_id,
        security_id,
        trade: trade_from_args(sub, notes)?,
        wallet_address: opt(sub, "wallet"),
    };
    let inv = investments::add_investment(conn, user, &new)?;
    println!(
        "Holding {} in {}: {} units, cost basis {} (investment id {})",
        symbol.to_uppercase(),
        req(sub, "account")?,
        inv.quantity,
        fmt_cents(inv.cost_basis),
        inv.id
    );
    Ok(())
}

fn list(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let account = opt(sub, "account")
        .map(|a| id_for_account(conn, user, a))
        .transpose()?;
    let data = investments::list_investments(conn, user, account)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let symbols: std::collections::HashMap<i64, String> = crate::securities::list_securities(conn)?
        .into_iter()
        .map(|s| (s.id, s.symbol))
        .collect();
    let rows = data
        .iter()
        .map(|i| {
            let value = mul_cents(i.quantity, i.current_price);
            vec![
                i.id.to_string(),
                symbols.get(&i.security_id).cloned().unwrap_or_default(),
                i.quantity.to_string(),
                fmt_cents(i.cost_basis),
                fmt_cents(i.current_price),
                fmt_cents(value),
                fmt_cents(value - i.cost_basis),
                fmt_cents(i.realized_gain_loss),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Symbol", "Qty", "Cost basis", "Price", "Value", "Unrealized", "Realized"],
            rows
        )
    );
    Ok(())
}

fn print_event(verb: &str, ev: &InvestmentTransaction) {
    println!(
        "{} {} units @ {} (fee {}, total {}) for investment {}",
        verb,
        ev.quantity,
        fmt_cents(ev.price_per_unit),
        fmt_cents(ev.fee),
        fmt_cents(ev.total_amount),
        ev.investment_id
    );
}
