// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::req;
use super::transactions::{TransactionRow, query_rows};
use anyhow::{Result, bail};
use rusqlite::Connection;

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, user, sub),
        _ => Ok(()),
    }
}

fn export_transactions(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = req(sub, "format")?.to_lowercase();
    let out = req(sub, "out")?;

    // Oldest first; listing order is newest first.
    let mut rows: Vec<TransactionRow> = query_rows(conn, user, sub)?;
    rows.reverse();

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "id",
                "date",
                "account",
                "to_account",
                "type",
                "amount",
                "category",
                "description",
            ])?;
            for r in rows {
                wtr.write_record([
                    r.id.to_string(),
                    r.date,
                    r.account,
                    r.to_account.unwrap_or_default(),
                    r.r#type,
                    r.amount,
                    r.category,
                    r.description,
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&rows)?)?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    tracing::info!(user, path = out, format = %fmt, "transactions exported");
    println!("Exported transactions to {}", out);
    Ok(())
}
