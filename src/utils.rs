// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Accepts RFC 3339 (`2025-03-01T16:00:00Z`) or a bare date, read as midnight UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    let d = parse_date(s)
        .with_context(|| format!("Invalid timestamp '{}', expected RFC 3339 or YYYY-MM-DD", s))?;
    Ok(d.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Parses a major-unit amount ("25.50") into cents without going through floats.
pub fn parse_cents(s: &str) -> Result<i64> {
    let d = s
        .trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid amount '{}'", s))?;
    if d.normalize().scale() > 2 {
        return Err(anyhow!("Amount '{}' has more than two decimal places", s));
    }
    (d * Decimal::ONE_HUNDRED)
        .trunc()
        .to_i64()
        .ok_or_else(|| anyhow!("Amount '{}' is out of range", s))
}

pub fn parse_quantity(s: &str) -> Result<f64> {
    let q: f64 = s
        .trim()
        .parse()
        .with_context(|| format!("Invalid quantity '{}'", s))?;
    if !q.is_finite() {
        return Err(anyhow!("Invalid quantity '{}'", s));
    }
    Ok(q)
}

pub fn fmt_cents(cents: i64) -> String {
    format!("{:.2}", Decimal::new(cents, 2))
}

/// `quantity × unit_price` rounded half away from zero to whole cents, or
/// `None` when the product is not finite or does not fit in an `i64`.
pub fn checked_mul_cents(quantity: f64, unit_price: i64) -> Option<i64> {
    let product = (quantity * unit_price as f64).round();
    if !product.is_finite() || product < i64::MIN as f64 || product >= i64::MAX as f64 {
        return None;
    }
    Some(product as i64)
}

/// Valuation variant of [`checked_mul_cents`]; out-of-range products saturate.
pub fn mul_cents(quantity: f64, unit_price: i64) -> i64 {
    (quantity * unit_price as f64).round() as i64
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // Arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn id_for_account(conn: &Connection, user: &str, name: &str) -> Result<i64> {
    let mut stmt =
        conn.prepare("SELECT id FROM accounts WHERE user_id=?1 AND name=?2 AND is_active=1")?;
    let id: i64 = stmt
        .query_row(params![user, name.trim()], |r| r.get(0))
        .with_context(|| format!("Account '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_category(conn: &Connection, user: &str, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE user_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![user, name.trim()], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_security(conn: &Connection, symbol: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM securities WHERE symbol=?1 ORDER BY id LIMIT 1")?;
    let id: i64 = stmt
        .query_row(params![symbol.trim().to_uppercase()], |r| r.get(0))
        .with_context(|| format!("Security '{}' not found", symbol))?;
    Ok(id)
}

pub fn month_start(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

pub fn month_end(d: NaiveDate) -> NaiveDate {
    let (y, m) = if d.month() == 12 {
        (d.year() + 1, 1)
    } else {
        (d.year(), d.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .unwrap_or(d)
}

pub fn year_window(d: NaiveDate) -> (NaiveDate, NaiveDate) {
    let y = d.year();
    (
        NaiveDate::from_ymd_opt(y, 1, 1).unwrap_or(d),
        NaiveDate::from_ymd_opt(y, 12, 31).unwrap_or(d),
    )
}
