// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Consistency checks over stored state.

use crate::accounts::balance_delta;
use crate::error::Result;
use crate::investments::QUANTITY_EPSILON;
use crate::models::{AccountType, TransactionType};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

/// Replays the live ledger of every cash and credit-card account and checks
/// holdings for impossible states. An empty result means the store is sound.
pub fn check(conn: &Connection) -> Result<Vec<Issue>> {
    let mut issues = balance_mismatches(conn)?;
    issues.extend(holding_anomalies(conn)?);
    if issues.is_empty() {
        tracing::debug!("doctor: no issues");
    } else {
        tracing::warn!(count = issues.len(), "doctor found issues");
    }
    Ok(issues)
}

fn balance_mismatches(conn: &Connection) -> Result<Vec<Issue>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, type, balance FROM accounts WHERE type != 'investment' ORDER BY id",
    )?;
    let accounts = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, AccountType>(2)?,
                r.get::<_, i64>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let types: HashMap<i64, AccountType> = accounts.iter().map(|a| (a.0, a.2)).collect();

    let mut replayed: HashMap<i64, i64> = HashMap::new();
    let mut txns = conn.prepare(
        "SELECT account_id, to_account_id, type, amount FROM transactions WHERE deleted_at IS NULL",
    )?;
    let mut rows = txns.query([])?;
    while let Some(r) = rows.next()? {
        let account_id: i64 = r.get(0)?;
        let to_account_id: Option<i64> = r.get(1)?;
        let kind: TransactionType = r.get(2)?;
        let amount: i64 = r.get(3)?;

        let (source_kind, dest) = match kind {
            TransactionType::Transfer => (TransactionType::Expense, to_account_id),
            other => (other, None),
        };
        if let Some(&t) = types.get(&account_id) {
            *replayed.entry(account_id).or_insert(0) += balance_delta(t, source_kind, amount);
        }
        if let Some(dest) = dest {
            if let Some(&t) = types.get(&dest) {
                *replayed.entry(dest).or_insert(0) +=
                    balance_delta(t, TransactionType::Income, amount);
            }
        }
    }

    let mut issues = Vec::new();
    for (id, name, _, stored) in accounts {
        let expected = replayed.get(&id).copied().unwrap_or(0);
        if expected != stored {
            issues.push(Issue {
                kind: "balance_mismatch",
                detail: format!(
                    "account {} '{}': stored {} but ledger gives {}",
                    id, name, stored, expected
                ),
            });
        }
    }
    Ok(issues)
}

fn holding_anomalies(conn: &Connection) -> Result<Vec<Issue>> {
    let mut stmt =
        conn.prepare("SELECT id, quantity, cost_basis FROM investments ORDER BY id")?;
    let mut rows = stmt.query([])?;
    let mut issues = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let quantity: f64 = r.get(1)?;
        let cost_basis: i64 = r.get(2)?;
        if quantity < 0.0 {
            issues.push(Issue {
                kind: "negative_quantity",
                detail: format!("investment {}: quantity {}", id, quantity),
            });
        }
        if cost_basis < 0 {
            issues.push(Issue {
                kind: "negative_cost_basis",
                detail: format!("investment {}: cost basis {}", id, cost_basis),
            });
        }
        if quantity.abs() < QUANTITY_EPSILON && cost_basis != 0 {
            issues.push(Issue {
                kind: "residual_cost_basis",
                detail: format!("investment {}: closed position keeps {}", id, cost_basis),
            });
        }
    }
    Ok(issues)
}
