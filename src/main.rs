// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use pocketledger::{cli, commands, config, db, logging};

fn main() -> Result<()> {
    let cfg = config::Config::from_env()?;
    logging::init_logging(&cfg.log_filter);

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init(&cfg.db_path)?;
    let user = config::resolve_user(
        &conn,
        matches.get_one::<String>("user").map(String::as_str),
        &cfg,
    )?;
    tracing::debug!(user = %user, db = %cfg.db_path.display(), "starting");

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", cfg.db_path.display());
        }
        Some(("config", sub)) => commands::settings::handle(&conn, &cfg, &user, sub)?,
        Some(("account", sub)) => commands::accounts::handle(&mut conn, &user, sub)?,
        Some(("category", sub)) => commands::categories::handle(&conn, &user, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut conn, &user, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, &user, sub)?,
        Some(("security", sub)) => commands::securities::handle(&mut conn, sub)?,
        Some(("invest", sub)) => commands::investments::handle(&mut conn, &user, sub)?,
        Some(("portfolio", sub)) => commands::portfolio::handle(&conn, &user, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, &user, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, &user, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
