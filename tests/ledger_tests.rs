// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketledger::accounts::{self, AccountUpdate};
use pocketledger::categories;
use pocketledger::db;
use pocketledger::ledger::{self, TransactionFilter, TransactionUpdate};
use pocketledger::models::{CategoryType, TransactionType};
use pocketledger::reports;
use pocketledger::LedgerError;
use rusqlite::Connection;

const USER: &str = "alice";

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn setup() -> Connection {
    db::open_in_memory().unwrap()
}

fn cash(conn: &mut Connection, name: &str, initial: i64) -> i64 {
    accounts::create_cash_account(conn, USER, name, "", "USD", initial, day(1))
        .unwrap()
        .id
}

fn card(conn: &Connection, name: &str) -> i64 {
    accounts::create_credit_card_account(conn, USER, name, "", "USD", 500000, 19.99, None)
        .unwrap()
        .id
}

fn balance(conn: &Connection, id: i64) -> i64 {
    conn.query_row("SELECT balance FROM accounts WHERE id=?1", [id], |r| r.get(0))
        .unwrap()
}

fn live_txn_count(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE deleted_at IS NULL",
        [],
        |r| r.get(0),
    )
    .unwrap()
}

#[test]
fn income_then_expense_returns_to_zero() {
    let mut conn = setup();
    let acct = cash(&mut conn, "Wallet", 0);
    ledger::apply_transaction(&mut conn, USER, acct, TransactionType::Income, 2550, None, "pay", day(2))
        .unwrap();
    assert_eq!(balance(&conn, acct), 2550);
    ledger::apply_transaction(&mut conn, USER, acct, TransactionType::Expense, 2550, None, "lunch", day(3))
        .unwrap();
    assert_eq!(balance(&conn, acct), 0);
}

#[test]
fn opening_balance_is_booked_as_income() {
    let mut conn = setup();
    let acct = cash(&mut conn, "Checking", 100000);
    assert_eq!(balance(&conn, acct), 100000);
    let txns = ledger::list_transactions(&conn, USER, &TransactionFilter::default()).unwrap();
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].r#type, TransactionType::Income);
    assert_eq!(txns[0].description, "Initial balance");
    assert!(pocketledger::doctor::check(&conn).unwrap().is_empty());
}

#[test]
fn non_positive_amounts_are_rejected_before_writing() {
    let mut conn = setup();
    let acct = cash(&mut conn, "Wallet", 0);
    for amount in [0, -5] {
        let err = ledger::apply_transaction(
            &mut conn,
            USER,
            acct,
            TransactionType::Income,
            amount,
            None,
            "",
            day(2),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
    }
    assert_eq!(live_txn_count(&conn), 0);
}

#[test]
fn foreign_account_is_not_found() {
    let mut conn = setup();
    let acct = cash(&mut conn, "Wallet", 0);
    let err = ledger::apply_transaction(
        &mut conn,
        "mallory",
        acct,
        TransactionType::Income,
        100,
        None,
        "",
        day(2),
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound));
    assert_eq!(err.code(), "ACCOUNT_NOT_FOUND");
    assert_eq!(balance(&conn, acct), 0);
}

#[test]
fn foreign_category_is_not_found() {
    let mut conn = setup();
    let acct = cash(&mut conn, "Wallet", 0);
    let cat = categories::create_category(&conn, "bob", "Food", CategoryType::Expense, None)
        .unwrap();
    let err = ledger::apply_transaction(
        &mut conn,
        USER,
        acct,
        TransactionType::Expense,
        100,
        Some(cat.id),
        "",
        day(2),
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::CategoryNotFound));
    assert_eq!(live_txn_count(&conn), 0);
    assert_eq!(balance(&conn, acct), 0);
}

#[test]
fn transfer_moves_money_and_preserves_sum() {
    let mut conn = setup();
    let a = cash(&mut conn, "A", 10000);
    let b = cash(&mut conn, "B", 500);
    let txn = ledger::apply_transfer(&mut conn, USER, a, b, 4000, "rent pot", day(5)).unwrap();
    assert_eq!(txn.r#type, TransactionType::Transfer);
    assert_eq!(txn.to_account_id, Some(b));
    assert_eq!(balance(&conn, a), 6000);
    assert_eq!(balance(&conn, b), 4500);
    assert_eq!(balance(&conn, a) + balance(&conn, b), 10500);
}

#[test]
fn transfer_to_same_account_mutates_nothing() {
    let mut conn = setup();
    let a = cash(&mut conn, "A", 10000);
    let before = live_txn_count(&conn);
    let err = ledger::apply_transfer(&mut conn, USER, a, a, 100, "", day(5)).unwrap_err();
    assert!(matches!(err, LedgerError::SameAccountTransfer));
    assert_eq!(balance(&conn, a), 10000);
    assert_eq!(live_txn_count(&conn), before);
}

#[test]
fn overdraft_transfer_mutates_nothing() {
    let mut conn = setup();
    let a = cash(&mut conn, "A", 1000);
    let b = cash(&mut conn, "B", 0);
    let before = live_txn_count(&conn);
    let err = ledger::apply_transfer(&mut conn, USER, a, b, 1001, "", day(5)).unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance));
    assert_eq!(balance(&conn, a), 1000);
    assert_eq!(balance(&conn, b), 0);
    assert_eq!(live_txn_count(&conn), before);

    // Exactly the balance is allowed.
    ledger::apply_transfer(&mut conn, USER, a, b, 1000, "", day(5)).unwrap();
    assert_eq!(balance(&conn, a), 0);
    assert_eq!(balance(&conn, b), 1000);
}

#[test]
fn balance_overflow_is_rejected_and_rolled_back() {
    let mut conn = setup();
    let wallet = cash(&mut conn, "Wallet", 100);
    let before = live_txn_count(&conn);
    let err = ledger::apply_transaction(&mut conn, USER, wallet, TransactionType::Income, i64::MAX, None, "", day(5))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));
    assert_eq!(accounts::get_account(&conn, USER, wallet).unwrap().balance, 100);
    assert_eq!(live_txn_count(&conn), before);

    // The credit leg of a transfer overflows after the debit leg has run.
    let full = cash(&mut conn, "Full", i64::MAX - 10);
    let before = live_txn_count(&conn);
    let err = ledger::apply_transfer(&mut conn, USER, wallet, full, 50, "", day(6)).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));
    assert_eq!(balance(&conn, wallet), 100);
    assert_eq!(balance(&conn, full), i64::MAX - 10);
    assert_eq!(live_txn_count(&conn), before);
}

#[test]
fn credit_card_balance_tracks_amount_owed() {
    let mut conn = setup();
    let checking = cash(&mut conn, "Checking", 50000);
    let visa = card(&conn, "Visa");
    ledger::apply_transaction(&mut conn, USER, visa, TransactionType::Expense, 12000, None, "groceries", day(3))
        .unwrap();
    assert_eq!(balance(&conn, visa), 12000);

    // Paying the card lowers both sides.
    ledger::apply_transfer(&mut conn, USER, checking, visa, 10000, "payment", day(20)).unwrap();
    assert_eq!(balance(&conn, checking), 40000);
    assert_eq!(balance(&conn, visa), 2000);

    // Drawing cash from a card is not limited by its owed balance.
    ledger::apply_transfer(&mut conn, USER, visa, checking, 5000, "cash advance", day(21)).unwrap();
    assert_eq!(balance(&conn, visa), 7000);
    assert_eq!(balance(&conn, checking), 45000);
    assert!(pocketledger::doctor::check(&conn).unwrap().is_empty());
}

#[test]
fn reversing_restores_prior_balances() {
    let mut conn = setup();
    let a = cash(&mut conn, "A", 10000);
    let b = cash(&mut conn, "B", 0);

    let inc = ledger::apply_transaction(&mut conn, USER, a, TransactionType::Income, 700, None, "", day(2))
        .unwrap();
    let exp = ledger::apply_transaction(&mut conn, USER, a, TransactionType::Expense, 300, None, "", day(2))
        .unwrap();
    let xfer = ledger::apply_transfer(&mut conn, USER, a, b, 2500, "", day(3)).unwrap();
    assert_eq!(balance(&conn, a), 7900);
    assert_eq!(balance(&conn, b), 2500);

    ledger::reverse_transaction(&mut conn, USER, xfer.id).unwrap();
    assert_eq!(balance(&conn, a), 10400);
    assert_eq!(balance(&conn, b), 0);

    ledger::reverse_transaction(&mut conn, USER, exp.id).unwrap();
    assert_eq!(balance(&conn, a), 10700);
    ledger::reverse_transaction(&mut conn, USER, inc.id).unwrap();
    assert_eq!(balance(&conn, a), 10000);

    // A reversed transaction is gone for good.
    let err = ledger::reverse_transaction(&mut conn, USER, inc.id).unwrap_err();
    assert!(matches!(err, LedgerError::TransactionNotFound));
    assert!(matches!(
        ledger::get_transaction(&conn, USER, inc.id),
        Err(LedgerError::TransactionNotFound)
    ));
    assert!(pocketledger::doctor::check(&conn).unwrap().is_empty());
}

#[test]
fn edit_reverses_old_effect_and_applies_new() {
    let mut conn = setup();
    let a = cash(&mut conn, "A", 0);
    let b = cash(&mut conn, "B", 0);
    let t = ledger::apply_transaction(&mut conn, USER, a, TransactionType::Income, 1000, None, "salary", day(2))
        .unwrap();

    let updated = ledger::update_transaction(
        &mut conn,
        USER,
        t.id,
        &TransactionUpdate {
            amount: Some(1500),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(updated.amount, 1500);
    assert_eq!(balance(&conn, a), 1500);

    ledger::update_transaction(
        &mut conn,
        USER,
        t.id,
        &TransactionUpdate {
            kind: Some(TransactionType::Expense),
            account_id: Some(b),
            description: Some("refund".into()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(balance(&conn, a), 0);
    assert_eq!(balance(&conn, b), -1500);
    assert!(pocketledger::doctor::check(&conn).unwrap().is_empty());
}

#[test]
fn transfers_are_not_editable_and_types_are_guarded() {
    let mut conn = setup();
    let a = cash(&mut conn, "A", 5000);
    let b = cash(&mut conn, "B", 0);
    let xfer = ledger::apply_transfer(&mut conn, USER, a, b, 100, "", day(3)).unwrap();
    let err = ledger::update_transaction(
        &mut conn,
        USER,
        xfer.id,
        &TransactionUpdate {
            amount: Some(200),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::TransactionNotEditable));

    let inc = ledger::apply_transaction(&mut conn, USER, a, TransactionType::Income, 100, None, "", day(3))
        .unwrap();
    let err = ledger::update_transaction(
        &mut conn,
        USER,
        inc.id,
        &TransactionUpdate {
            kind: Some(TransactionType::Transfer),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTypeChange));
    assert_eq!(balance(&conn, a), 5000);
    assert_eq!(balance(&conn, b), 100);
}

#[test]
fn investment_accounts_reject_direct_ledger_writes() {
    let mut conn = setup();
    let broker = accounts::create_investment_account(&conn, USER, "Broker", "", "USD", Some("IBKR"), None)
        .unwrap()
        .id;
    let err = ledger::apply_transaction(&mut conn, USER, broker, TransactionType::Income, 100, None, "", day(2))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));
    let err = ledger::apply_transaction(&mut conn, USER, broker, TransactionType::Transfer, 100, None, "", day(2))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));
}

#[test]
fn closed_accounts_are_hidden() {
    let mut conn = setup();
    let a = cash(&mut conn, "A", 0);
    let closed = accounts::update_account(
        &conn,
        USER,
        a,
        &AccountUpdate {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(!closed.is_active);
    assert!(accounts::list_accounts(&conn, USER).unwrap().is_empty());
    let err = ledger::apply_transaction(&mut conn, USER, a, TransactionType::Income, 100, None, "", day(2))
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound));
}

#[test]
fn list_filters_and_orders_newest_first() {
    let mut conn = setup();
    let a = cash(&mut conn, "A", 0);
    let b = cash(&mut conn, "B", 0);
    let food = categories::create_category(&conn, USER, "Food", CategoryType::Expense, None).unwrap();
    ledger::apply_transaction(&mut conn, USER, a, TransactionType::Income, 10000, None, "pay", day(1)).unwrap();
    ledger::apply_transaction(&mut conn, USER, a, TransactionType::Expense, 1200, Some(food.id), "", day(4)).unwrap();
    ledger::apply_transaction(&mut conn, USER, a, TransactionType::Expense, 300, Some(food.id), "", day(9)).unwrap();
    ledger::apply_transfer(&mut conn, USER, a, b, 1000, "", day(10)).unwrap();

    let all = ledger::list_transactions(&conn, USER, &TransactionFilter::default()).unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].date, day(10));

    let food_only = ledger::list_transactions(
        &conn,
        USER,
        &TransactionFilter {
            category_id: Some(food.id),
            min_amount: Some(500),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(food_only.len(), 1);
    assert_eq!(food_only[0].amount, 1200);

    let into_b = ledger::list_transactions(
        &conn,
        USER,
        &TransactionFilter {
            account_id: Some(b),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(into_b.len(), 1);

    let window = ledger::list_transactions(
        &conn,
        USER,
        &TransactionFilter {
            from: Some(day(2)),
            to: Some(day(9)),
            limit: Some(1),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].date, day(9));
}

#[test]
fn reports_skip_deleted_rows() {
    let mut conn = setup();
    let a = cash(&mut conn, "A", 0);
    let food = categories::create_category(&conn, USER, "Food", CategoryType::Expense, None).unwrap();
    let fun = categories::create_category(&conn, USER, "Fun", CategoryType::Expense, None).unwrap();
    ledger::apply_transaction(&mut conn, USER, a, TransactionType::Income, 50000, None, "", day(1)).unwrap();
    ledger::apply_transaction(&mut conn, USER, a, TransactionType::Expense, 800, Some(food.id), "", day(2)).unwrap();
    ledger::apply_transaction(&mut conn, USER, a, TransactionType::Expense, 2000, Some(fun.id), "", day(3)).unwrap();
    ledger::apply_transaction(&mut conn, USER, a, TransactionType::Expense, 150, None, "", day(3)).unwrap();
    let gone = ledger::apply_transaction(&mut conn, USER, a, TransactionType::Expense, 9999, Some(food.id), "", day(4))
        .unwrap();
    ledger::reverse_transaction(&mut conn, USER, gone.id).unwrap();

    let spend = reports::spending_by_category(&conn, USER, day(1), day(31)).unwrap();
    assert_eq!(spend.total_spent, 2950);
    let names: Vec<&str> = spend.items.iter().map(|i| i.category_name.as_str()).collect();
    assert_eq!(names, vec!["Fun", "Food", "Uncategorized"]);

    let months = reports::monthly_summary(&conn, USER, 3, day(15)).unwrap();
    assert_eq!(months.len(), 3);
    assert_eq!(months[0].month, "2025-01");
    assert_eq!(months[2].month, "2025-03");
    assert_eq!(months[2].income, 50000);
    assert_eq!(months[2].expenses, 2950);
    assert_eq!(months[0].income, 0);
}
