// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod categories;
pub mod transactions;
pub mod budgets;
pub mod securities;
pub mod investments;
pub mod portfolio;
pub mod reports;
pub mod exporter;
pub mod doctor;
pub mod settings;

use crate::utils::{parse_cents, parse_date};
use anyhow::{Result, anyhow};
use chrono::{Local, NaiveDate};

pub(crate) fn req<'a>(m: &'a clap::ArgMatches, id: &str) -> Result<&'a str> {
    m.get_one::<String>(id)
        .map(|s| s.trim())
        .ok_or_else(|| anyhow!("Missing required argument '{}'", id))
}

pub(crate) fn opt<'a>(m: &'a clap::ArgMatches, id: &str) -> Option<&'a str> {
    m.get_one::<String>(id).map(|s| s.trim())
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn date_or_today(m: &clap::ArgMatches, id: &str) -> Result<NaiveDate> {
    match opt(m, id) {
        Some(d) => parse_date(d),
        None => Ok(today()),
    }
}

pub(crate) fn opt_cents(m: &clap::ArgMatches, id: &str) -> Result<Option<i64>> {
    opt(m, id).map(parse_cents).transpose()
}

pub(crate) fn opt_date(m: &clap::ArgMatches, id: &str) -> Result<Option<NaiveDate>> {
    opt(m, id).map(parse_date).transpose()
}

pub(crate) fn parse_enum<T>(raw: &str) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse::<T>().map_err(|e| anyhow!(e))
}
