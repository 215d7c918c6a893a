// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use dealflow::config::{self, CacheMode, Settings};
use dealflow::error::DealflowError;
use dealflow::sample::load_sample;
use dealflow::{cli, commands, db};
use rusqlite::Connection;
use std::time::Duration;

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn run_config(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["dealflow", "config"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("config", config_m)) = matches.subcommand() {
        commands::config::handle(conn, config_m)
    } else {
        panic!("no config subcommand");
    }
}

#[test]
fn defaults_apply_to_an_empty_store() {
    let conn = base_conn();
    assert_eq!(Settings::load(&conn).unwrap(), Settings::default());
    assert_eq!(config::get(&conn, "cache_mode").unwrap(), None);
}

#[test]
fn set_values_are_read_back() {
    let conn = base_conn();
    run_config(&conn, &["set", "--key", "cache_mode", "--value", " Aggressive "]).unwrap();
    run_config(&conn, &["set", "--key", "alert_recency_days", "--value", "7"]).unwrap();
    run_config(&conn, &["set", "--key", "user_id", "--value", "analyst"]).unwrap();

    let s = Settings::load(&conn).unwrap();
    assert_eq!(s.cache_mode, CacheMode::Aggressive);
    assert_eq!(s.cache_mode.ttl(), Duration::from_secs(600));
    assert_eq!(s.alert_recency_days, 7);
    assert_eq!(s.user_id, "analyst");
    assert_eq!(s.watch_interval_secs, 300);
}

#[test]
fn invalid_values_are_refused() {
    let conn = base_conn();
    for (key, value) in [
        ("cache_mode", "sometimes"),
        ("alert_recency_days", "0"),
        ("alert_recency_days", "100000000"),
        ("watch_interval_secs", "soon"),
        ("user_id", "  "),
        ("theme", "dark"),
    ] {
        let err = run_config(&conn, &["set", "--key", key, "--value", value]).unwrap_err();
        assert!(
            matches!(
                err.downcast_ref::<DealflowError>(),
                Some(DealflowError::InvalidSetting(_))
            ),
            "{} accepted {}",
            key,
            value
        );
    }
    assert_eq!(Settings::load(&conn).unwrap(), Settings::default());
}

#[test]
fn malformed_stored_values_fall_back() {
    let conn = base_conn();
    conn.execute(
        "INSERT INTO settings(key, value) VALUES ('alert_recency_days', 'lots')",
        [],
    )
    .unwrap();
    assert_eq!(Settings::load(&conn).unwrap().alert_recency_days, 30);
}

#[test]
fn sample_loading_is_idempotent() {
    let mut conn = base_conn();
    let today = chrono::NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
    let now = today.and_hms_opt(8, 0, 0).unwrap();
    let first = load_sample(&mut conn, 20, 10, today, now).unwrap();
    assert_eq!((first.deals, first.companies), (20, 10));
    let again = load_sample(&mut conn, 20, 10, today, now).unwrap();
    assert_eq!((again.deals, again.companies), (0, 0));
    let stored: i64 = conn
        .query_row("SELECT COUNT(*) FROM deals", [], |r| r.get(0))
        .unwrap();
    assert_eq!(stored, 20);
}
