// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, Result, not_found_as};
use crate::models::{Category, CategoryType};
use rusqlite::{Connection, params};

fn map_category(r: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        r#type: r.get(3)?,
        parent_id: r.get(4)?,
    })
}

pub fn create_category(
    conn: &Connection,
    user: &str,
    name: &str,
    kind: CategoryType,
    parent_id: Option<i64>,
) -> Result<Category> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::invalid("category name is required"));
    }
    if let Some(parent) = parent_id {
        get_category(conn, user, parent)?;
    }
    conn.execute(
        "INSERT INTO categories(user_id, name, type, parent_id) VALUES (?1, ?2, ?3, ?4)",
        params![user, name, kind, parent_id],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(user, category_id = id, "category created");
    get_category(conn, user, id)
}

pub fn get_category(conn: &Connection, user: &str, id: i64) -> Result<Category> {
    conn.query_row(
        "SELECT id, user_id, name, type, parent_id FROM categories WHERE id=?1 AND user_id=?2",
        params![id, user],
        map_category,
    )
    .map_err(not_found_as(LedgerError::CategoryNotFound))
}

pub fn list_categories(conn: &Connection, user: &str) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, type, parent_id FROM categories WHERE user_id=?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![user], map_category)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
