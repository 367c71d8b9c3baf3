// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{opt, parse_enum, req};
use crate::categories;
use crate::models::CategoryType;
use crate::utils::{id_for_category, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use std::collections::HashMap;

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = req(sub, "name")?;
            let kind: CategoryType = parse_enum(req(sub, "type")?)?;
            let parent = opt(sub, "parent")
                .map(|p| id_for_category(conn, user, p))
                .transpose()?;
            let cat = categories::create_category(conn, user, name, kind, parent)?;
            println!("Added category '{}' (id {}, {})", cat.name, cat.id, cat.r#type);
        }
        Some(("list", sub)) => {
            let data = categories::list_categories(conn, user)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let names: HashMap<i64, &str> =
                    data.iter().map(|c| (c.id, c.name.as_str())).collect();
                let rows = data
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            c.name.clone(),
                            c.r#type.to_string(),
                            c.parent_id
                                .and_then(|p| names.get(&p).copied())
                                .unwrap_or("")
                                .to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["ID", "Category", "Type", "Parent"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
