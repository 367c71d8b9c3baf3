// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only income/expense rollups over the ledger.

use crate::error::{LedgerError, Result};
use crate::utils::{month_end, month_start};
use chrono::{Months, NaiveDate};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummaryItem {
    /// `YYYY-MM`
    pub month: String,
    pub income: i64,
    pub expenses: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub category_id: Option<i64>,
    pub category_name: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingByCategory {
    pub items: Vec<CategorySpend>,
    pub total_spent: i64,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Income and expense totals for the `months` calendar months ending with the
/// month of `today`, oldest first. Months without activity report zeros.
pub fn monthly_summary(
    conn: &Connection,
    user: &str,
    months: u32,
    today: NaiveDate,
) -> Result<Vec<MonthlySummaryItem>> {
    if months == 0 {
        return Err(LedgerError::invalid("months must be at least 1"));
    }
    let first = month_start(today)
        .checked_sub_months(Months::new(months - 1))
        .ok_or_else(|| LedgerError::invalid("months reaches before the supported date range"))?;

    let mut stmt = conn.prepare_cached(
        "SELECT COALESCE(SUM(CASE WHEN type='income' THEN amount END), 0),
                COALESCE(SUM(CASE WHEN type='expense' THEN amount END), 0)
         FROM transactions
         WHERE user_id=?1 AND deleted_at IS NULL AND date BETWEEN ?2 AND ?3",
    )?;

    let mut items = Vec::with_capacity(months as usize);
    let mut start = first;
    for _ in 0..months {
        let end = month_end(start);
        let (income, expenses): (i64, i64) =
            stmt.query_row(params![user, start, end], |r| Ok((r.get(0)?, r.get(1)?)))?;
        items.push(MonthlySummaryItem {
            month: start.format("%Y-%m").to_string(),
            income,
            expenses,
        });
        start = match start.checked_add_months(Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(items)
}

/// Expense totals per category between `from` and `to` inclusive, largest first.
pub fn spending_by_category(
    conn: &Connection,
    user: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<SpendingByCategory> {
    if from > to {
        return Err(LedgerError::invalid("from date must not be after to date"));
    }
    let mut stmt = conn.prepare(
        "SELECT t.category_id, c.name, SUM(t.amount) AS total
         FROM transactions t
         LEFT JOIN categories c ON c.id = t.category_id
         WHERE t.user_id=?1 AND t.type='expense' AND t.deleted_at IS NULL
           AND t.date BETWEEN ?2 AND ?3
         GROUP BY t.category_id
         ORDER BY total DESC, c.name",
    )?;
    let rows = stmt.query_map(params![user, from, to], |r| {
        let category_id: Option<i64> = r.get(0)?;
        let name: Option<String> = r.get(1)?;
        Ok(CategorySpend {
            category_id,
            category_name: match (category_id, name) {
                (_, Some(n)) => n,
                (Some(_), None) => "Unknown Category".to_string(),
                (None, None) => "Uncategorized".to_string(),
            },
            total: r.get(2)?,
        })
    })?;
    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }
    let total_spent = items.iter().map(|i| i.total).sum();
    Ok(SpendingByCategory {
        items,
        total_spent,
        from,
        to,
    })
}
