// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod doctor;
pub mod error;
pub mod investments;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod portfolio;
pub mod prices;
pub mod reports;
pub mod securities;
pub mod utils;

pub use error::{LedgerError, Result};
