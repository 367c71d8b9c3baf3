// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketledger::accounts;
use pocketledger::db;
use pocketledger::investments::{self, NewInvestment, Trade};
use pocketledger::models::{AssetType, InvestmentTransactionType};
use pocketledger::securities;
use pocketledger::LedgerError;
use rusqlite::Connection;

const USER: &str = "alice";

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

fn trade(quantity: f64, price_per_unit: i64, fee: i64) -> Trade<'static> {
    Trade {
        date: day(2),
        quantity,
        price_per_unit,
        fee,
        notes: "",
    }
}

struct Fixture {
    conn: Connection,
    broker: i64,
    aapl: i64,
}

fn setup() -> Fixture {
    let conn = db::open_in_memory().unwrap();
    let broker = accounts::create_investment_account(&conn, USER, "Broker", "", "USD", None, None)
        .unwrap()
        .id;
    let aapl = securities::create_security(&conn, "aapl", "Apple Inc.", AssetType::Stock, "USD", "NASDAQ")
        .unwrap()
        .id;
    Fixture { conn, broker, aapl }
}

fn open(fx: &mut Fixture, quantity: f64, price: i64) -> i64 {
    investments::add_investment(
        &mut fx.conn,
        USER,
        &NewInvestment {
            account_id: fx.broker,
            security_id: fx.aapl,
            trade: trade(quantity, price, 0),
            wallet_address: None,
        },
    )
    .unwrap()
    .id
}

#[test]
fn buy_then_partial_sell_uses_average_cost() {
    let mut fx = setup();
    let id = open(&mut fx, 10.0, 15000);

    let inv = investments::get_investment(&fx.conn, USER, id).unwrap();
    assert_eq!(inv.quantity, 10.0);
    assert_eq!(inv.cost_basis, 150000);

    let sell = investments::record_sell(&mut fx.conn, USER, id, &trade(4.0, 17500, 0)).unwrap();
    assert_eq!(sell.r#type, InvestmentTransactionType::Sell);
    assert_eq!(sell.total_amount, 70000);
    assert_eq!(sell.realized_gain_loss, 10000);

    let inv = investments::get_investment(&fx.conn, USER, id).unwrap();
    assert!((inv.quantity - 6.0).abs() < 1e-12);
    assert_eq!(inv.cost_basis, 90000);
    assert_eq!(inv.realized_gain_loss, 10000);
}

#[test]
fn adding_same_security_again_buys_into_the_position() {
    let mut fx = setup();
    let first = open(&mut fx, 2.0, 10000);
    let second = open(&mut fx, 2.0, 20000);
    assert_eq!(first, second);

    let inv = investments::get_investment(&fx.conn, USER, first).unwrap();
    assert_eq!(inv.quantity, 4.0);
    assert_eq!(inv.cost_basis, 60000);

    let history = investments::list_investment_transactions(&fx.conn, USER, first).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|e| e.notes == "Initial purchase"));
}

#[test]
fn fees_raise_cost_and_lower_proceeds() {
    let mut fx = setup();
    let id = open(&mut fx, 1.0, 1000);
    let buy = investments::record_buy(&mut fx.conn, USER, id, &trade(1.0, 1000, 50)).unwrap();
    assert_eq!(buy.total_amount, 1050);
    assert_eq!(investments::get_investment(&fx.conn, USER, id).unwrap().cost_basis, 2050);

    let sell = investments::record_sell(&mut fx.conn, USER, id, &trade(2.0, 1500, 100)).unwrap();
    assert_eq!(sell.total_amount, 2900);
    assert_eq!(sell.realized_gain_loss, 850);

    let inv = investments::get_investment(&fx.conn, USER, id).unwrap();
    assert_eq!(inv.quantity, 0.0);
    assert_eq!(inv.cost_basis, 0);
}

#[test]
fn oversell_changes_nothing() {
    let mut fx = setup();
    let id = open(&mut fx, 3.0, 1000);
    let err = investments::record_sell(&mut fx.conn, USER, id, &trade(3.5, 1000, 0)).unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientShares));
    assert_eq!(err.code(), "INSUFFICIENT_SHARES");

    let inv = investments::get_investment(&fx.conn, USER, id).unwrap();
    assert_eq!(inv.quantity, 3.0);
    assert_eq!(inv.cost_basis, 3000);
    let history = investments::list_investment_transactions(&fx.conn, USER, id).unwrap();
    assert_eq!(history.len(), 1);
}

#[test]
fn sell_reduction_rounds_half_up_to_whole_cents() {
    let mut fx = setup();
    let id = investments::add_investment(
        &mut fx.conn,
        USER,
        &NewInvestment {
            account_id: fx.broker,
            security_id: fx.aapl,
            trade: trade(3.0, 1000, 2),
            wallet_address: None,
        },
    )
    .unwrap()
    .id;
    let inv = investments::get_investment(&fx.conn, USER, id).unwrap();
    assert_eq!(inv.cost_basis, 3002);

    let sell = investments::record_sell(&mut fx.conn, USER, id, &trade(1.0, 1200, 0)).unwrap();
    assert_eq!(sell.total_amount, 1200);
    assert_eq!(sell.realized_gain_loss, 199);
    let inv = investments::get_investment(&fx.conn, USER, id).unwrap();
    assert_eq!(inv.cost_basis, 2001);
    assert_eq!(inv.realized_gain_loss, 199);
}

#[test]
fn overflowing_buy_is_rejected_without_writing() {
    let mut fx = setup();
    let id = open(&mut fx, 1.0, 100);
    let err = investments::record_buy(&mut fx.conn, USER, id, &trade(1e300, 100, 5)).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));

    let inv = investments::get_investment(&fx.conn, USER, id).unwrap();
    assert_eq!(inv.quantity, 1.0);
    assert_eq!(inv.cost_basis, 100);
    assert_eq!(investments::list_investment_transactions(&fx.conn, USER, id).unwrap().len(), 1);
}

#[test]
fn invalid_trades_are_rejected() {
    let mut fx = setup();
    let id = open(&mut fx, 1.0, 1000);
    for bad in [trade(0.0, 1000, 0), trade(1.0, 0, 0), trade(1.0, 1000, -1), trade(f64::NAN, 1000, 0)] {
        let err = investments::record_buy(&mut fx.conn, USER, id, &bad).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
    }
}

#[test]
fn dividend_leaves_position_untouched() {
    let mut fx = setup();
    let id = open(&mut fx, 5.0, 2000);
    let ev = investments::record_dividend(&mut fx.conn, USER, id, day(20), 125, Some("qualified"), "Q2")
        .unwrap();
    assert_eq!(ev.r#type, InvestmentTransactionType::Dividend);
    assert_eq!(ev.total_amount, 125);
    assert_eq!(ev.dividend_type.as_deref(), Some("qualified"));

    let inv = investments::get_investment(&fx.conn, USER, id).unwrap();
    assert_eq!(inv.quantity, 5.0);
    assert_eq!(inv.cost_basis, 10000);

    let err = investments::record_dividend(&mut fx.conn, USER, id, day(20), 0, None, "").unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));
}

#[test]
fn split_scales_quantity_and_keeps_cost() {
    let mut fx = setup();
    let id = open(&mut fx, 5.0, 2000);
    let ev = investments::record_split(&mut fx.conn, USER, id, day(15), 2.0, "2-for-1").unwrap();
    assert_eq!(ev.split_ratio, Some(2.0));
    assert_eq!(ev.quantity, 5.0);

    let inv = investments::get_investment(&fx.conn, USER, id).unwrap();
    assert_eq!(inv.quantity, 10.0);
    assert_eq!(inv.cost_basis, 10000);

    let err = investments::record_split(&mut fx.conn, USER, id, day(15), 0.0, "").unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));
}

#[test]
fn history_is_newest_first() {
    let mut fx = setup();
    let id = open(&mut fx, 5.0, 2000);
    investments::record_dividend(&mut fx.conn, USER, id, day(10), 100, None, "").unwrap();
    investments::record_split(&mut fx.conn, USER, id, day(20), 2.0, "").unwrap();
    let kinds: Vec<_> = investments::list_investment_transactions(&fx.conn, USER, id)
        .unwrap()
        .into_iter()
        .map(|e| e.r#type)
        .collect();
    assert_eq!(
        kinds,
        vec![
            InvestmentTransactionType::Split,
            InvestmentTransactionType::Dividend,
            InvestmentTransactionType::Buy
        ]
    );
}

#[test]
fn holdings_need_an_investment_account_and_a_known_security() {
    let mut fx = setup();
    let checking = accounts::create_cash_account(&mut fx.conn, USER, "Checking", "", "USD", 0, day(1))
        .unwrap()
        .id;
    let err = investments::add_investment(
        &mut fx.conn,
        USER,
        &NewInvestment {
            account_id: checking,
            security_id: fx.aapl,
            trade: trade(1.0, 100, 0),
            wallet_address: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));

    let err = investments::add_investment(
        &mut fx.conn,
        USER,
        &NewInvestment {
            account_id: fx.broker,
            security_id: 9999,
            trade: trade(1.0, 100, 0),
            wallet_address: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::SecurityNotFound));
    assert!(investments::list_investments(&fx.conn, USER, None).unwrap().is_empty());
}

#[test]
fn other_users_cannot_touch_a_holding() {
    let mut fx = setup();
    let id = open(&mut fx, 1.0, 1000);
    let err = investments::record_buy(&mut fx.conn, "mallory", id, &trade(1.0, 1000, 0)).unwrap_err();
    assert!(matches!(err, LedgerError::InvestmentNotFound));
    assert!(matches!(
        investments::list_investment_transactions(&fx.conn, "mallory", id),
        Err(LedgerError::InvestmentNotFound)
    ));
    assert!(investments::list_investments(&fx.conn, "mallory", None).unwrap().is_empty());
}

#[test]
fn listed_holdings_carry_latest_price_and_account_value() {
    let mut fx = setup();
    let id = open(&mut fx, 4.0, 1000);
    securities::record_prices(
        &mut fx.conn,
        &[
            securities::SecurityPriceInput {
                security_id: fx.aapl,
                price: 1100,
                recorded_at: day(3).and_hms_opt(16, 0, 0).unwrap().and_utc(),
            },
            securities::SecurityPriceInput {
                security_id: fx.aapl,
                price: 1250,
                recorded_at: day(4).and_hms_opt(16, 0, 0).unwrap().and_utc(),
            },
        ],
    )
    .unwrap();

    let listed = investments::list_investments(&fx.conn, USER, Some(fx.broker)).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].current_price, 1250);

    let account = accounts::get_account(&fx.conn, USER, fx.broker).unwrap();
    assert_eq!(account.balance, 5000);
}
