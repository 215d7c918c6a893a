// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use dealflow::{cli, commands::exporter, db};
use rusqlite::Connection;
use tempfile::tempdir;

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn run_export(conn: &Connection, args: &[&str]) {
    let mut argv = vec!["dealflow", "export"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(conn, export_m).unwrap();
    } else {
        panic!("no export subcommand");
    }
}

#[test]
fn template_lists_required_then_optional_columns() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("preqin.csv");
    let out_str = out_path.to_string_lossy().to_string();

    run_export(&conn, &["template", "--source", "Preqin", "--out", &out_str]);

    let written = std::fs::read_to_string(out_path).unwrap();
    assert_eq!(
        written.trim_end(),
        "fund_name,target_company,investment_amount,investment_date,\
         fund_type,industry,geography,stage,exit_date,exit_value"
    );
}

#[test]
fn deals_export_as_json() {
    let conn = base_conn();
    conn.execute(
        "INSERT INTO deals(deal_id,target_name,acquirer_name,deal_value,announcement_date,source,import_date) \
         VALUES ('D-1','Acme','Buyer',120.5,'2025-01-02','Manual Entry','2025-01-02 10:00:00')",
        [],
    )
    .unwrap();

    let dir = tempdir().unwrap();
    let out_path = dir.path().join("deals.json");
    let out_str = out_path.to_string_lossy().to_string();
    run_export(&conn, &["deals", "--format", "json", "--out", &out_str]);

    let written = std::fs::read_to_string(out_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    let deal = &value.as_array().unwrap()[0];
    assert_eq!(deal["deal_id"], "D-1");
    assert_eq!(deal["deal_value"], 120.5);
    assert_eq!(deal["announcement_date"], "2025-01-02");
}

#[test]
fn deals_export_as_csv_keeps_blanks() {
    let conn = base_conn();
    conn.execute(
        "INSERT INTO deals(deal_id,target_name,acquirer_name,source) VALUES ('D-2','Acme','Buyer','Manual Entry')",
        [],
    )
    .unwrap();

    let dir = tempdir().unwrap();
    let out_path = dir.path().join("deals.csv");
    let out_str = out_path.to_string_lossy().to_string();
    run_export(&conn, &["deals", "--out", &out_str]);

    let written = std::fs::read_to_string(out_path).unwrap();
    let mut lines = written.lines();
    assert!(lines.next().unwrap().starts_with("deal_id,target_name"));
    assert_eq!(
        lines.next().unwrap(),
        "D-2,Acme,Buyer,,,,,,,,,Manual Entry,,"
    );
}
