// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use dealflow::error::DealflowError;
use dealflow::store::deals::{company_history, get_deal, load_deals};
use dealflow::{cli, commands::deals, db};
use rusqlite::Connection;

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn run_deal(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["dealflow", "deal"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("deal", deal_m)) = matches.subcommand() {
        deals::handle(conn, deal_m)
    } else {
        panic!("no deal subcommand");
    }
}

fn search(conn: &Connection, args: &[&str]) -> Vec<String> {
    let mut argv = vec!["dealflow", "deal", "search"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let Some(("deal", deal_m)) = matches.subcommand() else {
        panic!("no deal subcommand");
    };
    let Some(("search", sub)) = deal_m.subcommand() else {
        panic!("no search subcommand");
    };
    deals::query_search(conn, sub)
        .unwrap()
        .into_iter()
        .map(|d| d.deal_id)
        .collect()
}

fn seed(conn: &Connection) {
    let rows = [
        ("D-1", "Acme Robotics", "Globex", "120", "2025-01-10", "Technology"),
        ("D-2", "Initech", "Acme Holdings", "$1,500", "2025-03-05", "Technology"),
        ("D-3", "Umbrella Bio", "Wayne Pharma", "75.5", "2025-02-20", "Healthcare"),
        ("D-4", "Stark Grid", "Oscorp", "", "", "Energy"),
    ];
    for (id, target, acquirer, value, date, industry) in rows {
        let mut args = vec![
            "add", "--deal-id", id, "--target", target, "--acquirer", acquirer, "--industry",
            industry,
        ];
        if !value.is_empty() {
            args.extend(["--value", value]);
        }
        if !date.is_empty() {
            args.extend(["--date", date]);
        }
        run_deal(conn, &args).unwrap();
    }
}

#[test]
fn added_deals_round_trip() {
    let conn = base_conn();
    seed(&conn);
    let all = load_deals(&conn).unwrap();
    let d2 = all.iter().find(|d| d.deal_id == "D-2").unwrap();
    let fetched = get_deal(&conn, d2.id).unwrap();
    assert_eq!(&fetched, d2);
    assert_eq!(fetched.deal_value, Some(1500.0));
    assert_eq!(fetched.announcement_date, NaiveDate::from_ymd_opt(2025, 3, 5));
    assert_eq!(fetched.source, "Manual Entry");
}

#[test]
fn newest_first_with_undated_last() {
    let conn = base_conn();
    seed(&conn);
    let ids: Vec<String> = load_deals(&conn).unwrap().into_iter().map(|d| d.deal_id).collect();
    assert_eq!(ids, vec!["D-2", "D-3", "D-1", "D-4"]);
}

#[test]
fn keyword_search_checks_both_names_ignoring_case() {
    let conn = base_conn();
    seed(&conn);
    assert_eq!(search(&conn, &["--keywords", "ACME"]), vec!["D-2", "D-1"]);
    assert_eq!(search(&conn, &["--keywords", "wayne, stark"]), vec!["D-3", "D-4"]);
}

#[test]
fn filters_combine() {
    let conn = base_conn();
    seed(&conn);
    assert_eq!(
        search(&conn, &["--industries", "technology", "--min-value", "200"]),
        vec!["D-2"]
    );
    assert_eq!(
        search(&conn, &["--from", "2025-02-01", "--to", "2025-02-28"]),
        vec!["D-3"]
    );
    assert_eq!(search(&conn, &["--max-value", "100"]), vec!["D-3"]);
    assert_eq!(search(&conn, &["--limit", "1"]), vec!["D-2"]);
}

#[test]
fn wildcards_in_keywords_are_literal() {
    let conn = base_conn();
    seed(&conn);
    assert!(search(&conn, &["--keywords", "%"]).is_empty());
}

#[test]
fn history_finds_target_and_acquirer_roles() {
    let conn = base_conn();
    seed(&conn);
    let ids: Vec<String> = company_history(&conn, "acme")
        .unwrap()
        .into_iter()
        .map(|d| d.deal_id)
        .collect();
    assert_eq!(ids, vec!["D-2", "D-1"]);
}

#[test]
fn negative_values_and_bad_dates_are_refused() {
    let conn = base_conn();
    let err = run_deal(
        &conn,
        &["add", "--target", "A", "--acquirer", "B", "--value=-5"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("negative"));
    let err = run_deal(
        &conn,
        &["add", "--target", "A", "--acquirer", "B", "--date", "03/05/2025"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("Invalid date"));
    assert!(load_deals(&conn).unwrap().is_empty());
}

#[test]
fn removing_an_unknown_deal_fails() {
    let conn = base_conn();
    seed(&conn);
    run_deal(&conn, &["rm", "--deal-id", "D-1"]).unwrap();
    let err = run_deal(&conn, &["rm", "--deal-id", "D-1"]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DealflowError>(),
        Some(DealflowError::NotFound { entity: "deal", .. })
    ));
    assert_eq!(load_deals(&conn).unwrap().len(), 3);
}
