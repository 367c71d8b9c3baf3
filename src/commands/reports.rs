// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{opt_date, today};
use crate::reports;
use crate::utils::{fmt_cents, maybe_print_json, month_start, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("monthly", sub)) => monthly(conn, user, sub)?,
        Some(("spending", sub)) => spending(conn, user, sub)?,
        _ => {}
    }
    Ok(())
}

fn monthly(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let months: u32 = *sub.get_one::<u32>("months").unwrap_or(&6);
    let data = reports::monthly_summary(conn, user, months, today())?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|m| {
                vec![
                    m.month.clone(),
                    fmt_cents(m.income),
                    fmt_cents(m.expenses),
                    fmt_cents(m.income - m.expenses),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Month", "Income", "Expenses", "Net"], rows));
    }
    Ok(())
}

fn spending(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let to = opt_date(sub, "to")?.unwrap_or_else(today);
    let from = opt_date(sub, "from")?.unwrap_or_else(|| month_start(to));
    let data = reports::spending_by_category(conn, user, from, to)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let mut rows: Vec<Vec<String>> = data
            .items
            .iter()
            .map(|i| vec![i.category_name.clone(), fmt_cents(i.total)])
            .collect();
        rows.push(vec!["Total".into(), fmt_cents(data.total_spent)]);
        println!("{} to {}", data.from, data.to);
        println!("{}", pretty_table(&["Category", "Spent"], rows));
    }
    Ok(())
}
