// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{date_or_today, opt, opt_cents, opt_date, parse_enum, req};
use crate::accounts::{self, AccountUpdate};
use crate::models::{Account, AccountType};
use crate::utils::{fmt_cents, id_for_account, maybe_print_json, parse_cents, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, user, sub)?,
        Some(("list", sub)) => {
            let data = accounts::list_accounts(conn, user)?;
            print_accounts(sub, &data)?;
        }
        Some(("show", sub)) => {
            let id = id_for_account(conn, user, req(sub, "NAME")?)?;
            let account = accounts::get_account(conn, user, id)?;
            print_accounts(sub, std::slice::from_ref(&account))?;
        }
        Some(("edit", sub)) => edit(conn, user, sub)?,
        Some(("close", sub)) => {
            let name = req(sub, "NAME")?;
            let id = id_for_account(conn, user, name)?;
            let fields = AccountUpdate {
                is_active: Some(false),
                ..Default::default()
            };
            accounts::update_account(conn, user, id, &fields)?;
            println!("Closed account '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let name = req(sub, "name")?;
    let kind: AccountType = parse_enum(req(sub, "type")?)?;
    let currency = match opt(sub, "currency") {
        Some(c) => c.to_string(),
        None => crate::config::default_currency(conn)?,
    };
    let description = opt(sub, "description").unwrap_or_default();

    let account = match kind {
        AccountType::Cash => {
            let initial = opt_cents(sub, "initial")?.unwrap_or(0);
            let opened = date_or_today(sub, "date")?;
            accounts::create_cash_account(conn, user, name, description, &currency, initial, opened)?
        }
        AccountType::Investment => accounts::create_investment_account(
            conn,
            user,
            name,
            description,
            &currency,
            opt(sub, "broker"),
            opt(sub, "number"),
        )?,
        AccountType::CreditCard => {
            let limit = opt_cents(sub, "limit")?.unwrap_or(0);
            let rate = match opt(sub, "rate") {
                Some(r) => r
                    .parse::<f64>()
                    .with_context(|| format!("Invalid interest rate '{}'", r))?,
                None => 0.0,
            };
            accounts::create_credit_card_account(
                conn,
                user,
                name,
                description,
                &currency,
                limit,
                rate,
                opt_date(sub, "due")?,
            )?
        }
    };
    println!(
        "Added account '{}' (id {}, {}, {}, balance {})",
        account.name,
        account.id,
        account.r#type,
        account.currency,
        fmt_cents(account.balance)
    );
    Ok(())
}

fn edit(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let name = req(sub, "NAME")?;
    let id = id_for_account(conn, user, name)?;
    let fields = AccountUpdate {
        name: opt(sub, "rename").map(str::to_string),
        description: opt(sub, "description").map(str::to_string),
        is_active: None,
        broker: opt(sub, "broker").map(str::to_string),
        account_number: opt(sub, "number").map(str::to_string),
        credit_limit: opt(sub, "limit").map(parse_cents).transpose()?,
        interest_rate: opt(sub, "rate")
            .map(|r| r.parse::<f64>().with_context(|| format!("Invalid interest rate '{}'", r)))
            .transpose()?,
        due_date: opt_date(sub, "due")?,
    };
    let account = accounts::update_account(conn, user, id, &fields)?;
    println!("Updated account '{}' (id {})", account.name, account.id);
    Ok(())
}

fn print_accounts(sub: &clap::ArgMatches, data: &[Account]) -> Result<()> {
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let rows = data
        .iter()
        .map(|a| {
            let extra = match a.r#type {
                AccountType::CreditCard => format!(
                    "limit {}",
                    fmt_cents(a.credit_limit.unwrap_or(0))
                ),
                AccountType::Investment => a.broker.clone().unwrap_or_default(),
                AccountType::Cash => String::new(),
            };
            vec![
                a.id.to_string(),
                a.name.clone(),
                a.r#type.to_string(),
                a.currency.clone(),
                fmt_cents(a.balance),
                extra,
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "Name", "Type", "CCY", "Balance", "Details"], rows)
    );
    Ok(())
}
