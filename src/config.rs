// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::PathBuf;

pub const DB_ENV: &str = "POCKETLEDGER_DB";
pub const LOG_ENV: &str = "POCKETLEDGER_LOG";
pub const USER_ENV: &str = "POCKETLEDGER_USER";

pub const DEFAULT_LOG_FILTER: &str = "warn";
pub const DEFAULT_USER: &str = "default";
pub const DEFAULT_CURRENCY: &str = "USD";

/// Settings keys understood by `config get/set`.
pub const SETTING_KEYS: &[&str] = &["default_user", "default_currency"];

/// Process-level configuration read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_filter: String,
    pub user: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. `RUST_LOG` wins
    /// over `POCKETLEDGER_LOG`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let db_path = match non_empty(DB_ENV) {
            Some(p) => PathBuf::from(p),
            None => crate::db::default_db_path()?,
        };
        let log_filter = non_empty("RUST_LOG")
            .or_else(|| non_empty(LOG_ENV))
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Ok(Self {
            db_path,
            log_filter,
            user: non_empty(USER_ENV),
        })
    }
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| r.get(0))
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    if !SETTING_KEYS.contains(&key) {
        anyhow::bail!("Unknown setting '{}' (known: {})", key, SETTING_KEYS.join(", "));
    }
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value.trim()],
    )?;
    tracing::info!(key, "setting updated");
    Ok(())
}

pub fn default_currency(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, "default_currency")?.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()))
}

/// Acting user: explicit flag, then environment, then stored default.
pub fn resolve_user(conn: &Connection, flag: Option<&str>, cfg: &Config) -> Result<String> {
    if let Some(u) = flag.map(str::trim).filter(|u| !u.is_empty()) {
        return Ok(u.to_string());
    }
    if let Some(u) = &cfg.user {
        return Ok(u.clone());
    }
    Ok(get_setting(conn, "default_user")?.unwrap_or_else(|| DEFAULT_USER.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned()).unwrap()
    }

    #[test]
    fn env_overrides() {
        let c = cfg(&[
            (DB_ENV, "/tmp/ledger.sqlite"),
            (LOG_ENV, "debug"),
            (USER_ENV, "alice"),
        ]);
        assert_eq!(c.db_path, PathBuf::from("/tmp/ledger.sqlite"));
        assert_eq!(c.log_filter, "debug");
        assert_eq!(c.user.as_deref(), Some("alice"));

        let c = cfg(&[(DB_ENV, "x.db"), (LOG_ENV, "debug"), ("RUST_LOG", "trace")]);
        assert_eq!(c.log_filter, "trace");
        assert_eq!(c.user, None);
    }

    #[test]
    fn user_resolution_order() {
        let conn = crate::db::open_in_memory().unwrap();
        let mut c = cfg(&[(DB_ENV, "x.db")]);
        assert_eq!(resolve_user(&conn, None, &c).unwrap(), DEFAULT_USER);

        set_setting(&conn, "default_user", "carol").unwrap();
        assert_eq!(resolve_user(&conn, None, &c).unwrap(), "carol");

        c.user = Some("bob".into());
        assert_eq!(resolve_user(&conn, None, &c).unwrap(), "bob");
        assert_eq!(resolve_user(&conn, Some("dave"), &c).unwrap(), "dave");
        assert_eq!(resolve_user(&conn, Some("  "), &c).unwrap(), "bob");
    }

    #[test]
    fn unknown_setting_is_rejected() {
        let conn = crate::db::open_in_memory().unwrap();
        assert!(set_setting(&conn, "colour", "blue").is_err());
        assert_eq!(default_currency(&conn).unwrap(), "USD");
        set_setting(&conn, "default_currency", "EUR").unwrap();
        assert_eq!(default_currency(&conn).unwrap(), "EUR");
    }
}
