// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, arg, value_parser};

fn output_flags(cmd: Command) -> Command {
    cmd.arg(arg!(--json "Print as pretty JSON").action(ArgAction::SetTrue))
        .arg(arg!(--jsonl "Print one JSON object per line").action(ArgAction::SetTrue))
}

fn trade_args(cmd: Command) -> Command {
    cmd.arg(arg!(--quantity <QTY> "Units traded").required(true))
        .arg(arg!(--price <PRICE> "Price per unit, e.g. 150.00").required(true))
        .arg(arg!(--fee <FEE> "Fee, e.g. 4.95").required(false))
        .arg(arg!(--date <DATE> "YYYY-MM-DD, defaults to today").required(false))
        .arg(arg!(--notes <NOTES>).required(false))
}

fn txn_filter_args(cmd: Command) -> Command {
    cmd.arg(arg!(--account <ACCOUNT>).required(false))
        .arg(arg!(--type <TYPE>).required(false))
        .arg(arg!(--category <CATEGORY>).required(false))
        .arg(arg!(--from <DATE>).required(false))
        .arg(arg!(--to <DATE>).required(false))
        .arg(arg!(--min <AMOUNT> "Smallest amount").required(false))
        .arg(arg!(--max <AMOUNT> "Largest amount").required(false))
        .arg(
            arg!(--limit <N>)
                .required(false)
                .value_parser(value_parser!(usize)),
        )
}

fn investment_id() -> Arg {
    arg!(<ID> "Investment id").value_parser(value_parser!(i64))
}

pub fn build_cli() -> Command {
    Command::new("pocketledger")
        .about("Personal ledger: accounts, transfers, investments, budgets")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(arg!(--user <USER> "Act as this user").global(true))
        .subcommand(Command::new("init").about("Create the database if missing"))
        .subcommand(
            Command::new("config")
                .about("Show or change settings")
                .subcommand(Command::new("show"))
                .subcommand(Command::new("get").arg(arg!(<KEY>)))
                .subcommand(Command::new("set").arg(arg!(<KEY>)).arg(arg!(<VALUE>))),
        )
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(
                            arg!(--type <TYPE> "cash | investment | credit_card")
                                .required(true),
                        )
                        .arg(arg!(--currency <CCY>).required(false))
                        .arg(arg!(--description <TEXT>).required(false))
                        .arg(arg!(--initial <AMOUNT> "Opening balance (cash)").required(false))
                        .arg(arg!(--broker <BROKER>).required(false))
                        .arg(arg!(--number <NUMBER> "Account number").required(false))
                        .arg(arg!(--limit <AMOUNT> "Credit limit").required(false))
                        .arg(arg!(--rate <RATE> "Interest rate, percent").required(false))
                        .arg(arg!(--due <DATE> "Payment due date").required(false))
                        .arg(arg!(--date <DATE> "Opening date").required(false)),
                )
                .subcommand(output_flags(Command::new("list")))
                .subcommand(output_flags(Command::new("show").arg(arg!(<NAME>))))
                .subcommand(
                    Command::new("edit")
                        .arg(arg!(<NAME>))
                        .arg(arg!(--rename <NAME>).required(false))
                        .arg(arg!(--description <TEXT>).required(false))
                        .arg(arg!(--broker <BROKER>).required(false))
                        .arg(arg!(--number <NUMBER>).required(false))
                        .arg(arg!(--limit <AMOUNT>).required(false))
                        .arg(arg!(--rate <RATE>).required(false))
                        .arg(arg!(--due <DATE>).required(false)),
                )
                .subcommand(Command::new("close").arg(arg!(<NAME>))),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--type <TYPE> "income | expense").required(true))
                        .arg(arg!(--parent <NAME>).required(false)),
                )
                .subcommand(output_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and inspect ledger transactions")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--account <ACCOUNT>).required(true))
                        .arg(arg!(--type <TYPE> "income | expense | investment").required(true))
                        .arg(arg!(--amount <AMOUNT> "e.g. 25.50").required(true))
                        .arg(arg!(--category <CATEGORY>).required(false))
                        .arg(arg!(--description <TEXT>).required(false))
                        .arg(arg!(--date <DATE>).required(false)),
                )
                .subcommand(
                    Command::new("transfer")
                        .arg(arg!(--from <ACCOUNT>).required(true))
                        .arg(arg!(--to <ACCOUNT>).required(true))
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(arg!(--description <TEXT>).required(false))
                        .arg(arg!(--date <DATE>).required(false)),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(arg!(<ID>).value_parser(value_parser!(i64)))
                        .arg(arg!(--account <ACCOUNT>).required(false))
                        .arg(arg!(--type <TYPE>).required(false))
                        .arg(arg!(--amount <AMOUNT>).required(false))
                        .arg(arg!(--category <CATEGORY>).required(false))
                        .arg(
                            arg!(--"clear-category")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("category"),
                        )
                        .arg(arg!(--description <TEXT>).required(false))
                        .arg(arg!(--date <DATE>).required(false)),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a transaction and reverse its effect")
                        .arg(arg!(<ID>).value_parser(value_parser!(i64))),
                )
                .subcommand(output_flags(txn_filter_args(Command::new("list")))),
        )
        .subcommand(
            Command::new("budget")
                .about("Spending caps per category")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--category <CATEGORY>).required(true))
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(arg!(--period <PERIOD> "monthly | yearly").required(true))
                        .arg(arg!(--start <DATE>).required(false))
                        .arg(arg!(--end <DATE>).required(false)),
                )
                .subcommand(output_flags(
                    Command::new("list")
                        .arg(arg!(--active).action(ArgAction::SetTrue))
                        .arg(arg!(--inactive).action(ArgAction::SetTrue).conflicts_with("active"))
                        .arg(arg!(--period <PERIOD>).required(false)),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(arg!(<ID>).value_parser(value_parser!(i64)))
                        .arg(arg!(--name <NAME>).required(false))
                        .arg(arg!(--amount <AMOUNT>).required(false))
                        .arg(arg!(--period <PERIOD>).required(false))
                        .arg(arg!(--end <DATE>).required(false))
                        .arg(arg!(--"no-end").action(ArgAction::SetTrue).conflicts_with("end"))
                        .arg(arg!(--active <BOOL>).required(false).value_parser(value_parser!(bool))),
                )
                .subcommand(output_flags(
                    Command::new("progress")
                        .arg(arg!(<ID>).value_parser(value_parser!(i64)))
                        .arg(arg!(--date <DATE> "Reference date, defaults to today").required(false)),
                ))
                .subcommand(Command::new("rm").arg(arg!(<ID>).value_parser(value_parser!(i64)))),
        )
        .subcommand(
            Command::new("security")
                .about("Instruments and their prices")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--symbol <SYMBOL>).required(true))
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--type <TYPE> "stock | etf | bond | crypto | reit").required(true))
                        .arg(arg!(--currency <CCY>).required(false))
                        .arg(arg!(--exchange <EXCHANGE>).required(false)),
                )
                .subcommand(output_flags(Command::new("list")))
                .subcommand(
                    Command::new("price")
                        .about("Record a price")
                        .arg(arg!(--symbol <SYMBOL>).required(true))
                        .arg(arg!(--price <PRICE>).required(true))
                        .arg(arg!(--at <WHEN> "RFC 3339 timestamp or YYYY-MM-DD").required(false)),
                )
                .subcommand(output_flags(
                    Command::new("prices")
                        .arg(arg!(--symbol <SYMBOL>).required(true))
                        .arg(arg!(--from <WHEN>).required(false))
                        .arg(arg!(--to <WHEN>).required(false)),
                )),
        )
        .subcommand(
            Command::new("invest")
                .about("Investment holdings")
                .subcommand(trade_args(
                    Command::new("add")
                        .arg(arg!(--account <ACCOUNT>).required(true))
                        .arg(arg!(--symbol <SYMBOL>).required(true))
                        .arg(arg!(--wallet <ADDRESS>).required(false)),
                ))
                .subcommand(trade_args(Command::new("buy").arg(investment_id())))
                .subcommand(trade_args(Command::new("sell").arg(investment_id())))
                .subcommand(
                    Command::new("dividend")
                        .arg(investment_id())
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(arg!(--kind <KIND> "e.g. qualified, ordinary").required(false))
                        .arg(arg!(--date <DATE>).required(false))
                        .arg(arg!(--notes <NOTES>).required(false)),
                )
                .subcommand(
                    Command::new("split")
                        .arg(investment_id())
                        .arg(arg!(--ratio <RATIO> "2 for 2-for-1, 0.5 for 1-for-2").required(true))
                        .arg(arg!(--date <DATE>).required(false))
                        .arg(arg!(--notes <NOTES>).required(false)),
                )
                .subcommand(output_flags(
                    Command::new("list").arg(arg!(--account <ACCOUNT>).required(false)),
                ))
                .subcommand(output_flags(Command::new("history").arg(investment_id()))),
        )
        .subcommand(
            Command::new("portfolio")
                .about("Valuation and net worth")
                .subcommand(output_flags(Command::new("summary")))
                .subcommand(
                    Command::new("snapshot")
                        .about("Record net-worth snapshots for every user")
                        .arg(arg!(--at <WHEN>).required(false)),
                )
                .subcommand(output_flags(
                    Command::new("snapshots")
                        .arg(arg!(--from <WHEN>).required(false))
                        .arg(arg!(--to <WHEN>).required(false)),
                )),
        )
        .subcommand(
            Command::new("report")
                .about("Income and spending reports")
                .subcommand(output_flags(
                    Command::new("monthly").arg(
                        arg!(--months <N>)
                            .required(false)
                            .value_parser(value_parser!(u32))
                            .default_value("6"),
                    ),
                ))
                .subcommand(output_flags(
                    Command::new("spending")
                        .arg(arg!(--from <DATE>).required(false))
                        .arg(arg!(--to <DATE>).required(false)),
                )),
        )
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                txn_filter_args(Command::new("transactions"))
                    .arg(arg!(--format <FORMAT> "csv | json").required(true))
                    .arg(arg!(--out <PATH>).required(true)),
            ),
        )
        .subcommand(Command::new("doctor").about("Check ledger consistency"))
}
