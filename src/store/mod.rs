// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! SQLite persistence for deals, companies, filings, alerts and the watchlist.
//!
//! Every statement is parameterized. Read-modify-write operations run inside
//! `BEGIN IMMEDIATE` transactions so concurrent writers cannot lose updates.

pub mod alerts;
pub mod companies;
pub mod deals;
pub mod filings;
pub mod import;
pub mod watchlist;

use crate::error::DealflowError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

pub(crate) fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|d| d.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn text_ref(r: &Row, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match r.get_ref(idx)? {
        ValueRef::Text(b) => Some(String::from_utf8_lossy(b).into_owned()),
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    })
}

/// Dates written by other tools may carry a time part; only the day is kept.
pub(crate) fn opt_date(r: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    Ok(text_ref(r, idx)?.and_then(|s| crate::normalize::parse_date(&s)))
}

pub(crate) fn opt_timestamp(r: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    Ok(text_ref(r, idx)?.and_then(|s| parse_timestamp(&s)))
}

pub(crate) fn timestamp_or_epoch(r: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    Ok(opt_timestamp(r, idx)?.unwrap_or(DateTime::<Utc>::UNIX_EPOCH.naive_utc()))
}

pub(crate) fn opt_text(r: &Row, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(text_ref(r, idx)?.filter(|s| !s.is_empty()))
}

pub(crate) fn opt_real(r: &Row, idx: usize) -> rusqlite::Result<Option<f64>> {
    Ok(match r.get_ref(idx)? {
        ValueRef::Real(f) => Some(f),
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Text(b) => std::str::from_utf8(b).ok().and_then(|s| s.trim().parse().ok()),
        _ => None,
    })
}

/// `LIKE` pattern matching `needle` anywhere; wildcards in it are literal.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataStatus {
    pub deals: i64,
    pub companies: i64,
    pub filings: i64,
    pub alerts: i64,
    pub watchlist: i64,
    pub latest_deal_import: Option<String>,
    pub latest_company_update: Option<String>,
}

pub fn data_status(conn: &Connection) -> Result<DataStatus, DealflowError> {
    let count = |table: &str| -> Result<i64, DealflowError> {
        // table names come from the fixed list below, never from input
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
            r.get(0)
        })?)
    };
    let latest = |sql: &str| -> Result<Option<String>, DealflowError> {
        Ok(conn
            .query_row(sql, [], |r| r.get::<_, Option<String>>(0))
            .optional()?
            .flatten())
    };
    Ok(DataStatus {
        deals: count("deals")?,
        companies: count("companies")?,
        filings: count("filings")?,
        alerts: count("alerts")?,
        watchlist: count("watchlist")?,
        latest_deal_import: latest("SELECT MAX(import_date) FROM deals")?,
        latest_company_update: latest("SELECT MAX(last_updated) FROM companies")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn timestamps_accept_sqlite_and_iso_layouts() {
        let want = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-06-01 12:30:00"), Some(want));
        assert_eq!(parse_timestamp("2024-06-01T12:30:00"), Some(want));
        assert_eq!(parse_timestamp("garbage"), None);
    }

    #[test]
    fn status_counts_empty_database() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let status = data_status(&conn).unwrap();
        assert_eq!(status.deals, 0);
        assert_eq!(status.latest_deal_import, None);
    }
}
