// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{opt, parse_enum, req};
use crate::models::AssetType;
use crate::securities::{self, SecurityPriceInput};
use crate::utils::{
    fmt_cents, id_for_security, maybe_print_json, parse_cents, parse_timestamp, pretty_table,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let asset_type: AssetType = parse_enum(req(sub, "type")?)?;
            let sec = securities::create_security(
                conn,
                req(sub, "symbol")?,
                req(sub, "name")?,
                asset_type,
                opt(sub, "currency").unwrap_or_default(),
                opt(sub, "exchange").unwrap_or_default(),
            )?;
            println!("Added security {} ({}) id {}", sec.symbol, sec.name, sec.id);
        }
        Some(("list", sub)) => {
            let data = securities::list_securities(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|s| {
                        vec![
                            s.id.to_string(),
                            s.symbol.clone(),
                            s.name.clone(),
                            s.asset_type.to_string(),
                            s.currency.clone(),
                            s.exchange.clone(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Symbol", "Name", "Type", "CCY", "Exchange"], rows)
                );
            }
        }
        Some(("price", sub)) => {
            let symbol = req(sub, "symbol")?;
            let input = SecurityPriceInput {
                security_id: id_for_security(conn, symbol)?,
                price: parse_cents(req(sub, "price")?)?,
                recorded_at: match opt(sub, "at") {
                    Some(at) => parse_timestamp(at)?,
                    None => Utc::now(),
                },
            };
            let inserted = securities::record_prices(conn, std::slice::from_ref(&input))?;
            if inserted == 0 {
                println!("Price for {} at {} already recorded", symbol, input.recorded_at);
            } else {
                println!(
                    "Recorded {} = {} at {}",
                    symbol,
                    fmt_cents(input.price),
                    input.recorded_at
                );
            }
        }
        Some(("prices", sub)) => {
            let id = id_for_security(conn, req(sub, "symbol")?)?;
            let from = opt(sub, "from")
                .map(parse_timestamp)
                .transpose()?
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            let to = opt(sub, "to")
                .map(parse_timestamp)
                .transpose()?
                .unwrap_or_else(Utc::now);
            let data = securities::price_history(conn, id, from, to)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|p| vec![p.recorded_at.to_rfc3339(), fmt_cents(p.price)])
                    .collect();
                println!("{}", pretty_table(&["Recorded at", "Price"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
