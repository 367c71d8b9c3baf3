// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{date_or_today, opt, opt_cents, opt_date, parse_enum, req};
use crate::ledger::{self, TransactionFilter, TransactionUpdate};
use crate::models::TransactionType;
use crate::utils::{
    fmt_cents, id_for_account, id_for_category, maybe_print_json, parse_cents, pretty_table,
};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(conn: &mut Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, user, sub)?,
        Some(("transfer", sub)) => transfer(conn, user, sub)?,
        Some(("edit", sub)) => edit(conn, user, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("ID").context("Missing transaction id")?;
            ledger::reverse_transaction(conn, user, id)?;
            println!("Deleted transaction {} and reversed its effect", id);
        }
        Some(("list", sub)) => list(conn, user, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let account_name = req(sub, "account")?;
    let account_id = id_for_account(conn, user, account_name)?;
    let kind: TransactionType = parse_enum(req(sub, "type")?)?;
    let amount = parse_cents(req(sub, "amount")?)?;
    let category_id = opt(sub, "category")
        .map(|c| id_for_category(conn, user, c))
        .transpose()?;
    let date = date_or_today(sub, "date")?;
    let description = opt(sub, "description").unwrap_or_default();

    let txn = ledger::apply_transaction(
        conn,
        user,
        account_id,
        kind,
        amount,
        category_id,
        description,
        date,
    )?;
    println!(
        "Recorded {} {} on {} (acct: {}, id {})",
        txn.r#type,
        fmt_cents(txn.amount),
        txn.date,
        account_name,
        txn.id
    );
    Ok(())
}

fn transfer(conn: &mut Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let from_name = req(sub, "from")?;
    let to_name = req(sub, "to")?;
    let from = id_for_account(conn, user, from_name)?;
    let to = id_for_account(conn, user, to_name)?;
    let amount = parse_cents(req(sub, "amount")?)?;
    let date = date_or_today(sub, "date")?;
    let description = opt(sub, "description").unwrap_or_default();

    let txn = ledger::apply_transfer(conn, user, from, to, amount, description, date)?;
    println!(
        "Transferred {} from '{}' to '{}' on {} (id {})",
        fmt_cents(txn.amount),
        from_name,
        to_name,
        txn.date,
        txn.id
    );
    Ok(())
}

fn edit(conn: &mut Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("ID").context("Missing transaction id")?;
    let category_id = if sub.get_flag("clear-category") {
        Some(None)
    } else {
        opt(sub, "category")
            .map(|c| id_for_category(conn, user, c))
            .transpose()?
            .map(Some)
    };
    let update = TransactionUpdate {
        account_id: opt(sub, "account")
            .map(|a| id_for_account(conn, user, a))
            .transpose()?,
        kind: opt(sub, "type").map(parse_enum::<TransactionType>).transpose()?,
        amount: opt_cents(sub, "amount")?,
        category_id,
        description: opt(sub, "description").map(str::to_string),
        date: opt_date(sub, "date")?,
    };
    let txn = ledger::update_transaction(conn, user, id, &update)?;
    println!(
        "Updated transaction {}: {} {} on {}",
        txn.id,
        txn.r#type,
        fmt_cents(txn.amount),
        txn.date
    );
    Ok(())
}

fn list(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, user, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                let account = match &r.to_account {
                    Some(to) => format!("{} -> {}", r.account, to),
                    None => r.account.clone(),
                };
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    account,
                    r.r#type.clone(),
                    r.amount.clone(),
                    r.category.clone(),
                    r.description.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Account", "Type", "Amount", "Category", "Description"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub account: String,
    pub to_account: Option<String>,
    pub r#type: String,
    pub amount: String,
    pub category: String,
    pub description: String,
}

pub fn filter_from_args(
    conn: &Connection,
    user: &str,
    sub: &clap::ArgMatches,
) -> Result<TransactionFilter> {
    Ok(TransactionFilter {
        account_id: opt(sub, "account")
            .map(|a| id_for_account(conn, user, a))
            .transpose()?,
        kind: opt(sub, "type").map(parse_enum::<TransactionType>).transpose()?,
        category_id: opt(sub, "category")
            .map(|c| id_for_category(conn, user, c))
            .transpose()?,
        from: opt_date(sub, "from")?,
        to: opt_date(sub, "to")?,
        min_amount: opt_cents(sub, "min")?,
        max_amount: opt_cents(sub, "max")?,
        limit: sub.get_one::<usize>("limit").copied(),
    })
}

pub fn query_rows(
    conn: &Connection,
    user: &str,
    sub: &clap::ArgMatches,
) -> Result<Vec<TransactionRow>> {
    let filter = filter_from_args(conn, user, sub)?;
    let txns = ledger::list_transactions(conn, user, &filter)?;

    // Names of closed accounts still show up in history.
    let mut accounts: HashMap<i64, String> = HashMap::new();
    let mut stmt = conn.prepare("SELECT id, name FROM accounts WHERE user_id=?1")?;
    for row in stmt.query_map(params![user], |r| Ok((r.get(0)?, r.get(1)?)))? {
        let (id, name) = row?;
        accounts.insert(id, name);
    }
    let categories: HashMap<i64, String> = crate::categories::list_categories(conn, user)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let name_of = |id: i64| accounts.get(&id).cloned().unwrap_or_else(|| id.to_string());
    Ok(txns
        .into_iter()
        .map(|t| TransactionRow {
            id: t.id,
            date: t.date.to_string(),
            account: name_of(t.account_id),
            to_account: t.to_account_id.map(name_of),
            r#type: t.r#type.to_string(),
            amount: fmt_cents(t.amount),
            category: t
                .category_id
                .and_then(|c| categories.get(&c).cloned())
                .unwrap_or_default(),
            description: t.description,
        })
        .collect())
}
