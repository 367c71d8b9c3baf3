// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{date_or_today, opt, opt_cents, opt_date, parse_enum, req};
use crate::budgets::{self, BudgetUpdate};
use crate::models::BudgetPeriod;
use crate::utils::{fmt_cents, id_for_category, maybe_print_json, parse_cents, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, user, sub)?,
        Some(("list", sub)) => list(conn, user, sub)?,
        Some(("edit", sub)) => edit(conn, user, sub)?,
        Some(("progress", sub)) => progress(conn, user, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("ID").context("Missing budget id")?;
            budgets::delete_budget(conn, user, id)?;
            println!("Removed budget {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let category_id = id_for_category(conn, user, req(sub, "category")?)?;
    let amount = parse_cents(req(sub, "amount")?)?;
    let period: BudgetPeriod = parse_enum(req(sub, "period")?)?;
    let start = date_or_today(sub, "start")?;
    let budget = budgets::create_budget(
        conn,
        user,
        category_id,
        req(sub, "name")?,
        amount,
        period,
        start,
        opt_date(sub, "end")?,
    )?;
    println!(
        "Budget '{}' (id {}) set to {} {}",
        budget.name,
        budget.id,
        fmt_cents(budget.amount),
        budget.period
    );
    Ok(())
}

fn list(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let active = if sub.get_flag("active") {
        Some(true)
    } else if sub.get_flag("inactive") {
        Some(false)
    } else {
        None
    };
    let period = opt(sub, "period").map(parse_enum::<BudgetPeriod>).transpose()?;
    let data = budgets::list_budgets(conn, user, active, period)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|b| {
                vec![
                    b.id.to_string(),
                    b.name.clone(),
                    b.period.to_string(),
                    fmt_cents(b.amount),
                    b.start_date.to_string(),
                    b.end_date.map(|d| d.to_string()).unwrap_or_default(),
                    if b.is_active { "yes" } else { "no" }.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Name", "Period", "Amount", "Start", "End", "Active"],
                rows
            )
        );
    }
    Ok(())
}

fn edit(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("ID").context("Missing budget id")?;
    let end_date = if sub.get_flag("no-end") {
        Some(None)
    } else {
        opt_date(sub, "end")?.map(Some)
    };
    let update = BudgetUpdate {
        name: opt(sub, "name").map(str::to_string),
        amount: opt_cents(sub, "amount")?,
        period: opt(sub, "period").map(parse_enum::<BudgetPeriod>).transpose()?,
        end_date,
        is_active: sub.get_one::<bool>("active").copied(),
    };
    let budget = budgets::update_budget(conn, user, id, &update)?;
    println!("Updated budget '{}' (id {})", budget.name, budget.id);
    Ok(())
}

fn progress(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("ID").context("Missing budget id")?;
    let p = match opt_date(sub, "date")? {
        Some(d) => budgets::budget_progress_at(conn, user, id, d)?,
        None => budgets::budget_progress(conn, user, id)?,
    };
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &p)? {
        let rows = vec![vec![
            fmt_cents(p.budgeted),
            fmt_cents(p.spent),
            fmt_cents(p.remaining),
            format!("{:.1}%", p.percentage),
        ]];
        println!(
            "{}",
            pretty_table(&["Budgeted", "Spent", "Remaining", "Used"], rows)
        );
    }
    Ok(())
}
