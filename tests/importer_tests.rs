// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use dealflow::error::DealflowError;
use dealflow::{cli, commands::importer, db};
use rusqlite::Connection;
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

fn base_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
    write!(file, "{}", contents).unwrap();
    file.flush().unwrap();
    file
}

fn run_import(conn: &mut Connection, args: &[&str]) -> anyhow::Result<importer::ImportOutcome> {
    let mut argv = vec!["dealflow", "import", "file"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("import", import_m)) = matches.subcommand() {
        if let Some(("file", file_m)) = import_m.subcommand() {
            return importer::import_file(conn, file_m);
        }
    }
    panic!("no import file subcommand");
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .unwrap()
}

const MERGERMARKET: &str = "Deal ID,Target Name,Acquirer Name,Deal Value,Announcement Date,Industry\n\
    MM-1,Alpha Labs,Beta Holdings,\"$1,200.5\",2024-02-01,Technology\n\
    MM-2,Gamma Bio,Delta Pharma,n/a,sometime,Healthcare\n\
    MM-3,Eps Energy,Zeta Power,-5,2024-02-03,Energy\n";

#[test]
fn mergermarket_rows_are_cleaned_and_stored() {
    let mut conn = base_conn();
    let file = csv_file(MERGERMARKET);
    let path = file.path().to_str().unwrap().to_string();
    let padded = format!("  {}  ", path);

    let outcome = run_import(&mut conn, &["--path", &padded, "--source", "Mergermarket"]).unwrap();
    let stored = outcome.stored.unwrap();
    assert_eq!(stored.table, "deals");
    assert_eq!(stored.inserted, 3);

    let (value, date, source): (Option<f64>, Option<String>, String) = conn
        .query_row(
            "SELECT deal_value, announcement_date, source FROM deals WHERE deal_id='MM-1'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(value, Some(1200.5));
    assert_eq!(date.as_deref(), Some("2024-02-01"));
    assert_eq!(source, "Mergermarket");

    let (bad_value, bad_date): (Option<f64>, Option<String>) = conn
        .query_row(
            "SELECT deal_value, announcement_date FROM deals WHERE deal_id='MM-2'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(bad_value, None);
    assert_eq!(bad_date, None);

    let negative: Option<f64> = conn
        .query_row("SELECT deal_value FROM deals WHERE deal_id='MM-3'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(negative, None);
}

#[test]
fn reimport_skips_known_deal_ids() {
    let mut conn = base_conn();
    let file = csv_file(MERGERMARKET);
    let path = file.path().to_str().unwrap().to_string();
    run_import(&mut conn, &["--path", &path, "--source", "mergermarket"]).unwrap();
    let again = run_import(&mut conn, &["--path", &path, "--source", "mergermarket"]).unwrap();
    let stored = again.stored.unwrap();
    assert_eq!(stored.inserted, 0);
    assert_eq!(stored.duplicates, 3);
    assert_eq!(count(&conn, "deals"), 3);
}

#[test]
fn dry_run_reports_issues_without_storing() {
    let mut conn = base_conn();
    let file = csv_file("Target Name,Deal Value\nAcme,\nBeta,\nGamma,10\n");
    let path = file.path().to_str().unwrap().to_string();
    let outcome =
        run_import(&mut conn, &["--path", &path, "--source", "mergermarket", "--dry-run"]).unwrap();
    assert!(!outcome.valid);
    assert_eq!(
        outcome.issues,
        vec![
            "Missing required columns: deal_id, acquirer_name, announcement_date".to_string(),
            "High percentage of missing deal_value values: 2/3".to_string(),
        ]
    );
    assert!(outcome.stored.is_none());
    assert_eq!(count(&conn, "deals"), 0);
}

#[test]
fn generated_ids_fill_missing_deal_ids() {
    let mut conn = base_conn();
    let file = csv_file("target_name,acquirer_name,deal_value\nAcme,Buyer,5\nBeta,Buyer,6\n");
    let path = file.path().to_str().unwrap().to_string();
    run_import(&mut conn, &["--path", &path, "--source", "mergermarket"]).unwrap();
    let ids: Vec<String> = {
        let mut stmt = conn.prepare("SELECT deal_id FROM deals ORDER BY id").unwrap();
        stmt.query_map([], |r| r.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    };
    assert_eq!(ids.len(), 2);
    assert!(ids.iter().all(|id| id.starts_with("MERGERMARKET-")));
    assert_ne!(ids[0], ids[1]);
}

#[test]
fn preqin_columns_map_onto_deals() {
    let mut conn = base_conn();
    let file = csv_file(
        "fund_name,target_company,investment_amount,investment_date,industry\n\
         Growth Fund IV,Acme Robotics,\"$45.5\",03/15/2024,Technology\n",
    );
    let path = file.path().to_str().unwrap().to_string();
    run_import(&mut conn, &["--path", &path, "--source", "preqin"]).unwrap();
    let (target, acquirer, value, date, source): (String, String, f64, String, String) = conn
        .query_row(
            "SELECT target_name, acquirer_name, deal_value, announcement_date, source FROM deals",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .unwrap();
    assert_eq!(target, "Acme Robotics");
    assert_eq!(acquirer, "Growth Fund IV");
    assert_eq!(value, 45.5);
    assert_eq!(date, "2024-03-15");
    assert_eq!(source, "Preqin");
}

#[test]
fn index_constituents_become_companies() {
    let mut conn = base_conn();
    let file = csv_file(
        "Company Name,Ticker,Index Name,Market Cap,Country\n\
         Acme Corp,ACME,S&P 500,2.5B,USA\n\
         Beta Inc,BETA,S&P 500,750M,USA\n",
    );
    let path = file.path().to_str().unwrap().to_string();
    let outcome =
        run_import(&mut conn, &["--path", &path, "--source", "index constituents"]).unwrap();
    assert_eq!(outcome.stored.unwrap().table, "companies");
    let (cap, index, geo, source_rows): (f64, String, String, i64) = conn
        .query_row(
            "SELECT market_cap, index_membership, geography, (SELECT COUNT(*) FROM companies) \
             FROM companies WHERE ticker='ACME'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .unwrap();
    assert_eq!(cap, 2_500_000_000.0);
    assert_eq!(index, "S&P 500");
    assert_eq!(geo, "USA");
    assert_eq!(source_rows, 2);
}

#[test]
fn sec_filings_carry_red_flags() {
    let mut conn = base_conn();
    let file = csv_file(
        "company_name,form_type,filing_date,content\n\
         Acme Corp,8-K,2024-04-02,Pending lawsuit disclosed alongside the merger agreement\n",
    );
    let path = file.path().to_str().unwrap().to_string();
    run_import(&mut conn, &["--path", &path, "--source", "sec_filings"]).unwrap();
    let (kind, flags, mentions, source): (String, String, String, String) = conn
        .query_row(
            "SELECT filing_type, red_flags, deal_mentions, source FROM filings",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .unwrap();
    assert_eq!(kind, "8-K");
    assert_eq!(flags, "lawsuit");
    assert!(mentions.contains("merger"));
    assert_eq!(source, "SEC EDGAR");
}

#[test]
fn json_press_releases_land_in_filings() {
    let mut conn = base_conn();
    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"[{{"company_name":"Acme","title":"News","date":"2024-05-01","content":"Strong growth after the acquisition"}}]"#
    )
    .unwrap();
    file.flush().unwrap();
    let path = file.path().to_str().unwrap().to_string();
    run_import(&mut conn, &["--path", &path, "--source", "press_releases"]).unwrap();
    let (kind, date): (String, String) = conn
        .query_row("SELECT filing_type, filing_date FROM filings", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .unwrap();
    assert_eq!(kind, "Press Release");
    assert_eq!(date, "2024-05-01");
}

#[test]
fn unknown_source_has_no_destination() {
    let mut conn = base_conn();
    let file = csv_file("a,b\n1,2\n");
    let path = file.path().to_str().unwrap().to_string();
    let err = run_import(&mut conn, &["--path", &path, "--source", "custom_feed"]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DealflowError>(),
        Some(DealflowError::NoDestination(_))
    ));
    // generic processing still works when nothing is stored
    let outcome =
        run_import(&mut conn, &["--path", &path, "--source", "custom_feed", "--dry-run"]).unwrap();
    assert!(outcome.valid);
}

#[test]
fn processed_rows_can_be_written_out() {
    let mut conn = base_conn();
    let file = csv_file(MERGERMARKET);
    let path = file.path().to_str().unwrap().to_string();
    let out = tempfile::tempdir().unwrap();
    let out_path = out.path().join("processed.csv");
    let out_str = out_path.to_string_lossy().to_string();
    run_import(
        &mut conn,
        &["--path", &path, "--source", "mergermarket", "--dry-run", "--out", &out_str],
    )
    .unwrap();
    let written = std::fs::read_to_string(out_path).unwrap();
    let header = written.lines().next().unwrap();
    assert!(header.starts_with("deal_id,target_name,acquirer_name,deal_value"));
    assert!(header.ends_with("source,import_date"));
    assert!(written.contains("MM-1,Alpha Labs,Beta Holdings,1200.5,2024-02-01"));
}

#[test]
fn unreadable_file_is_an_error() {
    let mut conn = base_conn();
    let err = run_import(
        &mut conn,
        &["--path", "/nonexistent/deals.csv", "--source", "mergermarket"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("Read /nonexistent/deals.csv"));
}
