// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::req;
use crate::config::{self, Config, SETTING_KEYS};
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, cfg: &Config, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let key = req(sub, "KEY")?;
            match config::get_setting(conn, key)? {
                Some(v) => println!("{}", v),
                None => println!("{} is not set", key),
            }
        }
        Some(("set", sub)) => {
            let key = req(sub, "KEY")?;
            config::set_setting(conn, key, req(sub, "VALUE")?)?;
            println!("{} updated", key);
        }
        _ => {
            let mut rows = vec![
                vec!["database".to_string(), cfg.db_path.display().to_string()],
                vec!["log filter".to_string(), cfg.log_filter.clone()],
                vec!["acting user".to_string(), user.to_string()],
            ];
            for key in SETTING_KEYS {
                rows.push(vec![
                    key.to_string(),
                    config::get_setting(conn, key)?.unwrap_or_default(),
                ]);
            }
            println!("{}", pretty_table(&["Setting", "Value"], rows));
        }
    }
    Ok(())
}
