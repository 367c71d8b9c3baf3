// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read side of the pricing collaborator.
//!
//! The accounting core only ever asks for the latest price at or before a
//! point in time. A missing price is `None` and valuation code treats it as 0.

use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::{HashMap, HashSet};

pub trait PriceLookup {
    /// Latest price in cents recorded at or before `as_of` (or ever, when `None`).
    fn latest_price(&self, security_id: i64, as_of: Option<DateTime<Utc>>) -> Result<Option<i64>>;

    /// Batch form of [`PriceLookup::latest_price`]. Securities without a price
    /// are absent from the map.
    fn latest_prices(
        &self,
        security_ids: &[i64],
        as_of: Option<DateTime<Utc>>,
    ) -> Result<HashMap<i64, i64>> {
        let mut out = HashMap::with_capacity(security_ids.len());
        for &id in security_ids {
            if let Some(p) = self.latest_price(id, as_of)? {
                out.insert(id, p);
            }
        }
        Ok(out)
    }
}

/// Prices recorded in the `security_prices` table.
pub struct StoredPrices<'c> {
    conn: &'c Connection,
}

impl<'c> StoredPrices<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl PriceLookup for StoredPrices<'_> {
    fn latest_price(&self, security_id: i64, as_of: Option<DateTime<Utc>>) -> Result<Option<i64>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT price FROM security_prices
             WHERE security_id=?1 AND (?2 IS NULL OR recorded_at<=?2)
             ORDER BY recorded_at DESC, id DESC LIMIT 1",
        )?;
        let price = stmt
            .query_row(params![security_id, as_of], |r| r.get(0))
            .optional()?;
        Ok(price)
    }

    fn latest_prices(
        &self,
        security_ids: &[i64],
        as_of: Option<DateTime<Utc>>,
    ) -> Result<HashMap<i64, i64>> {
        if security_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let wanted: HashSet<i64> = security_ids.iter().copied().collect();
        let mut stmt = self.conn.prepare_cached(
            "SELECT security_id, price FROM (
                 SELECT security_id,
                        price,
                        ROW_NUMBER() OVER (
                            PARTITION BY security_id
                            ORDER BY recorded_at DESC, id DESC
                        ) AS rn
                 FROM security_prices
                 WHERE (?1 IS NULL OR recorded_at<=?1)
             ) WHERE rn = 1",
        )?;
        let rows = stmt.query_map(params![as_of], |r| {
            Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?))
        })?;
        let mut out = HashMap::with_capacity(wanted.len());
        for row in rows {
            let (id, price) = row?;
            if wanted.contains(&id) {
                out.insert(id, price);
            }
        }
        Ok(out)
    }
}

/// Fixed price table, handy for callers that already hold quotes in memory.
impl PriceLookup for HashMap<i64, i64> {
    fn latest_price(&self, security_id: i64, _as_of: Option<DateTime<Utc>>) -> Result<Option<i64>> {
        Ok(self.get(&security_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::TimeZone;

    fn ts(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, 16, 0, 0).unwrap()
    }

    fn setup() -> Connection {
        let conn = db::open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO securities(id, symbol, name, asset_type) VALUES (1,'ABC','ABC Corp','stock'), (2,'XYZ','XYZ Corp','etf')",
            [],
        )
        .unwrap();
        for (d, p) in [(1, 1000), (3, 1200), (5, 1100)] {
            conn.execute(
                "INSERT INTO security_prices(security_id, price, recorded_at) VALUES (1, ?1, ?2)",
                params![p, ts(d)],
            )
            .unwrap();
        }
        conn
    }

    #[test]
    fn latest_price_respects_as_of() {
        let conn = setup();
        let prices = StoredPrices::new(&conn);
        assert_eq!(prices.latest_price(1, None).unwrap(), Some(1100));
        assert_eq!(prices.latest_price(1, Some(ts(4))).unwrap(), Some(1200));
        assert_eq!(prices.latest_price(1, Some(ts(3))).unwrap(), Some(1200));
        assert_eq!(
            prices
                .latest_price(1, Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()))
                .unwrap(),
            None
        );
        assert_eq!(prices.latest_price(2, None).unwrap(), None);
    }

    #[test]
    fn batch_lookup_omits_unpriced_securities() {
        let conn = setup();
        let prices = StoredPrices::new(&conn);
        let map = prices.latest_prices(&[1, 2], Some(ts(2))).unwrap();
        assert_eq!(map.get(&1), Some(&1000));
        assert!(!map.contains_key(&2));
    }
}
