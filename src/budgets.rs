// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::categories::get_category;
use crate::error::{LedgerError, Result, not_found_as};
use crate::models::{Budget, BudgetPeriod};
use crate::utils::{month_end, month_start, year_window};
use chrono::{Local, NaiveDate, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

const BUDGET_COLUMNS: &str =
    "id, user_id, category_id, name, amount, period, start_date, end_date, is_active";

fn map_budget(r: &rusqlite::Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: r.get(0)?,
        user_id: r.get(1)?,
        category_id: r.get(2)?,
        name: r.get(3)?,
        amount: r.get(4)?,
        period: r.get(5)?,
        start_date: r.get(6)?,
        end_date: r.get(7)?,
        is_active: r.get(8)?,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub budget_id: i64,
    pub budgeted: i64,
    pub spent: i64,
    /// Negative when overspent.
    pub remaining: i64,
    pub percentage: f64,
}

/// `end_date: Some(None)` clears the end date.
#[derive(Debug, Clone, Default)]
pub struct BudgetUpdate {
    pub name: Option<String>,
    pub amount: Option<i64>,
    pub period: Option<BudgetPeriod>,
    pub end_date: Option<Option<NaiveDate>>,
    pub is_active: Option<bool>,
}

#[allow(clippy::too_many_arguments)]
pub fn create_budget(
    conn: &Connection,
    user: &str,
    category_id: i64,
    name: &str,
    amount: i64,
    period: BudgetPeriod,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> Result<Budget> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::invalid("budget name is required"));
    }
    if amount < 0 {
        return Err(LedgerError::invalid("budget amount must not be negative"));
    }
    if end_date.is_some_and(|end| end < start_date) {
        return Err(LedgerError::invalid("end date must not precede start date"));
    }
    get_category(conn, user, category_id)?;
    conn.execute(
        "INSERT INTO budgets(user_id, category_id, name, amount, period, start_date, end_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![user, category_id, name, amount, period, start_date, end_date],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(user, budget_id = id, category_id, amount, period = %period, "budget created");
    get_budget(conn, user, id)
}

pub fn get_budget(conn: &Connection, user: &str, id: i64) -> Result<Budget> {
    conn.query_row(
        &format!(
            "SELECT {BUDGET_COLUMNS} FROM budgets WHERE id=?1 AND user_id=?2 AND deleted_at IS NULL"
        ),
        params![id, user],
        map_budget,
    )
    .map_err(not_found_as(LedgerError::BudgetNotFound))
}

pub fn list_budgets(
    conn: &Connection,
    user: &str,
    is_active: Option<bool>,
    period: Option<BudgetPeriod>,
) -> Result<Vec<Budget>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BUDGET_COLUMNS} FROM budgets
         WHERE user_id=?1 AND deleted_at IS NULL
           AND (?2 IS NULL OR is_active=?2)
           AND (?3 IS NULL OR period=?3)
         ORDER BY name, id"
    ))?;
    let rows = stmt.query_map(params![user, is_active, period], map_budget)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn update_budget(
    conn: &Connection,
    user: &str,
    id: i64,
    update: &BudgetUpdate,
) -> Result<Budget> {
    let budget = get_budget(conn, user, id)?;
    if update.amount.is_some_and(|a| a < 0) {
        return Err(LedgerError::invalid("budget amount must not be negative"));
    }
    let end_date = update.end_date.unwrap_or(budget.end_date);
    if end_date.is_some_and(|end| end < budget.start_date) {
        return Err(LedgerError::invalid("end date must not precede start date"));
    }
    let name = update
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(&budget.name);
    conn.execute(
        "UPDATE budgets SET name=?1, amount=?2, period=?3, end_date=?4, is_active=?5 WHERE id=?6",
        params![
            name,
            update.amount.unwrap_or(budget.amount),
            update.period.unwrap_or(budget.period),
            end_date,
            update.is_active.unwrap_or(budget.is_active),
            id
        ],
    )?;
    tracing::info!(user, budget_id = id, "budget updated");
    get_budget(conn, user, id)
}

/// Soft delete; the row stays for history but is invisible to reads.
pub fn delete_budget(conn: &Connection, user: &str, id: i64) -> Result<()> {
    get_budget(conn, user, id)?;
    conn.execute(
        "UPDATE budgets SET deleted_at=?1 WHERE id=?2",
        params![Utc::now(), id],
    )?;
    tracing::info!(user, budget_id = id, "budget deleted");
    Ok(())
}

/// First and last day of the period containing `today`.
pub fn period_window(period: BudgetPeriod, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match period {
        BudgetPeriod::Monthly => (month_start(today), month_end(today)),
        BudgetPeriod::Yearly => year_window(today),
    }
}

/// Progress for the period containing the local current date.
pub fn budget_progress(conn: &Connection, user: &str, id: i64) -> Result<BudgetProgress> {
    budget_progress_at(conn, user, id, Local::now().date_naive())
}

/// Spending against the budget in the period window around `today`. The
/// budget's own start and end dates do not narrow the window.
pub fn budget_progress_at(
    conn: &Connection,
    user: &str,
    id: i64,
    today: NaiveDate,
) -> Result<BudgetProgress> {
    let budget = get_budget(conn, user, id)?;
    let (start, end) = period_window(budget.period, today);
    let spent: i64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM transactions
         WHERE user_id=?1 AND category_id=?2 AND type='expense' AND deleted_at IS NULL
           AND date BETWEEN ?3 AND ?4",
        params![user, budget.category_id, start, end],
        |r| r.get(0),
    )?;
    let percentage = if budget.amount > 0 {
        spent as f64 / budget.amount as f64 * 100.0
    } else {
        0.0
    };
    Ok(BudgetProgress {
        budget_id: budget.id,
        budgeted: budget.amount,
        spent,
        remaining: budget.amount - spent,
        percentage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_cover_whole_periods() {
        let d = NaiveDate::from_ymd_opt(2025, 4, 17).unwrap();
        assert_eq!(
            period_window(BudgetPeriod::Monthly, d),
            (
                NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 4, 30).unwrap()
            )
        );
        assert_eq!(
            period_window(BudgetPeriod::Yearly, d),
            (
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
            )
        );
    }
}
