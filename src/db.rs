// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Dealflow", "dealflow"));

/// Environment override for the database file.
pub const DB_ENV: &str = "DEALFLOW_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(DB_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("dealflow.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

/// Changes whenever any connection commits a write: `data_version` tracks
/// other connections, `total_changes()` this one.
pub fn change_marker(conn: &Connection) -> rusqlite::Result<(i64, i64)> {
    let others: i64 = conn.pragma_query_value(None, "data_version", |r| r.get(0))?;
    let own: i64 = conn.query_row("SELECT total_changes()", [], |r| r.get(0))?;
    Ok((others, own))
}

/// Column names follow the dashboard's data file so existing databases open
/// unchanged.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS deals(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        deal_id TEXT UNIQUE,
        target_name TEXT,
        acquirer_name TEXT,
        deal_value REAL, -- USD millions
        announcement_date DATE,
        completion_date DATE,
        industry TEXT,
        sector TEXT,
        geography TEXT,
        deal_type TEXT,
        status TEXT,
        source TEXT,
        import_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        tags TEXT,
        notes TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_deals_announcement ON deals(announcement_date);

    CREATE TABLE IF NOT EXISTS companies(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_name TEXT,
        ticker TEXT,
        industry TEXT,
        sector TEXT,
        geography TEXT,
        market_cap REAL,
        revenue REAL,
        ebitda REAL,
        employees INTEGER,
        index_membership TEXT,
        tags TEXT,
        watchlist BOOLEAN DEFAULT 0,
        last_updated TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );
    CREATE INDEX IF NOT EXISTS idx_companies_name ON companies(company_name);

    CREATE TABLE IF NOT EXISTS filings(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_name TEXT,
        cik TEXT,
        ticker TEXT,
        filing_type TEXT,
        filing_date DATE,
        content TEXT,
        red_flags TEXT,
        deal_mentions TEXT,
        source TEXT,
        url TEXT,
        import_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );

    -- keywords and filters hold JSON text
    CREATE TABLE IF NOT EXISTS alerts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT,
        alert_name TEXT,
        keywords TEXT,
        filters TEXT,
        email_notifications BOOLEAN DEFAULT 0,
        created_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        last_triggered TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS watchlist(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT,
        entity_type TEXT,
        entity_id TEXT,
        entity_name TEXT,
        notes TEXT,
        added_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );
    "#,
    )
}
