// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Row types shared by the ledger, investment and budget modules.
//!
//! Money is always `i64` cents. Quantities, split ratios and interest rates
//! are `f64`.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a string-backed enum stored as TEXT.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "Unknown {} '{}'",
                        stringify!($name),
                        other
                    )),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let s = value.as_str()?;
                s.parse().map_err(|e: String| FromSqlError::Other(e.into()))
            }
        }
    };
}

text_enum!(AccountType {
    Cash => "cash",
    Investment => "investment",
    CreditCard => "credit_card",
});

text_enum!(TransactionType {
    Income => "income",
    Expense => "expense",
    Transfer => "transfer",
    Investment => "investment",
});

text_enum!(CategoryType {
    Income => "income",
    Expense => "expense",
});

text_enum!(BudgetPeriod {
    Monthly => "monthly",
    Yearly => "yearly",
});

text_enum!(AssetType {
    Stock => "stock",
    Etf => "etf",
    Bond => "bond",
    Crypto => "crypto",
    Reit => "reit",
});

text_enum!(InvestmentTransactionType {
    Buy => "buy",
    Sell => "sell",
    Dividend => "dividend",
    Split => "split",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub r#type: AccountType,
    pub description: String,
    /// Cents. Derived from holdings for investment accounts.
    pub balance: i64,
    pub currency: String,
    pub is_active: bool,
    pub broker: Option<String>,
    pub account_number: Option<String>,
    pub credit_limit: Option<i64>,
    pub interest_rate: Option<f64>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub r#type: CategoryType,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub account_id: i64,
    /// Set only for transfers; the credited side.
    pub to_account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub r#type: TransactionType,
    pub amount: i64,
    pub description: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: String,
    pub category_id: i64,
    pub name: String,
    pub amount: i64,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Security {
    pub id: i64,
    pub symbol: String,
    pub name: String,
    pub asset_type: AssetType,
    pub currency: String,
    pub exchange: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityPrice {
    pub id: i64,
    pub security_id: i64,
    pub price: i64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: i64,
    pub account_id: i64,
    pub security_id: i64,
    pub quantity: f64,
    pub cost_basis: i64,
    pub realized_gain_loss: i64,
    pub wallet_address: Option<String>,
    /// Latest known price, filled at read time; 0 when none is known.
    pub current_price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentTransaction {
    pub id: i64,
    pub investment_id: i64,
    pub r#type: InvestmentTransactionType,
    pub date: NaiveDate,
    pub quantity: f64,
    pub price_per_unit: i64,
    pub fee: i64,
    pub total_amount: i64,
    pub realized_gain_loss: i64,
    pub split_ratio: Option<f64>,
    pub dividend_type: Option<String>,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub id: i64,
    pub user_id: String,
    pub recorded_at: DateTime<Utc>,
    pub total_net_worth: i64,
    pub cash_balance: i64,
    pub investment_value: i64,
    pub debt_balance: i64,
}
