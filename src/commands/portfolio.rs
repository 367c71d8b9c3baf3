// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::opt;
use crate::portfolio;
use crate::prices::StoredPrices;
use crate::utils::{fmt_cents, maybe_print_json, parse_timestamp, pretty_table};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(conn, user, sub)?,
        Some(("snapshot", sub)) => {
            let at = match opt(sub, "at") {
                Some(at) => parse_timestamp(at)?,
                None => Utc::now(),
            };
            let count =
                portfolio::compute_and_record_snapshots(conn, &StoredPrices::new(conn), at)?;
            println!("Recorded {} snapshot(s) at {}", count, at.to_rfc3339());
        }
        Some(("snapshots", sub)) => {
            let from = opt(sub, "from")
                .map(parse_timestamp)
                .transpose()?
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            let to = opt(sub, "to")
                .map(parse_timestamp)
                .transpose()?
                .unwrap_or_else(Utc::now);
            let data = portfolio::list_snapshots(conn, user, from, to)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|s| {
                        vec![
                            s.recorded_at.to_rfc3339(),
                            fmt_cents(s.cash_balance),
                            fmt_cents(s.investment_value),
                            fmt_cents(s.debt_balance),
                            fmt_cents(s.total_net_worth),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Recorded at", "Cash", "Investments", "Debt", "Net worth"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}

fn summary(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let s = portfolio::get_portfolio(conn, user, &StoredPrices::new(conn))?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        return Ok(());
    }
    let totals = vec![vec![
        fmt_cents(s.total_value),
        fmt_cents(s.total_cost_basis),
        fmt_cents(s.total_gain_loss),
        format!("{:.2}%", s.gain_loss_pct),
        fmt_cents(s.total_realized_gain_loss),
    ]];
    println!(
        "{}",
        pretty_table(
            &["Value", "Cost basis", "Unrealized", "Unrealized %", "Realized"],
            totals
        )
    );
    let by_type = s
        .holdings_by_type
        .iter()
        .map(|(t, v)| vec![t.to_string(), v.count.to_string(), fmt_cents(v.value)])
        .collect();
    println!("{}", pretty_table(&["Asset type", "Holdings", "Value"], by_type));
    Ok(())
}
