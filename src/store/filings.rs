// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{contains_pattern, opt_date, opt_text, timestamp_or_epoch};
use crate::error::DealflowError;
use crate::models::{Filing, split_tags};
use rusqlite::{Connection, Row, params};

const FILING_COLUMNS: &str = "id, company_name, cik, ticker, filing_type, filing_date, content, \
     red_flags, deal_mentions, source, url, import_date";

fn filing_from_row(r: &Row) -> rusqlite::Result<Filing> {
    Ok(Filing {
        id: r.get(0)?,
        company_name: opt_text(r, 1)?.unwrap_or_default(),
        cik: opt_text(r, 2)?,
        ticker: opt_text(r, 3)?,
        filing_type: opt_text(r, 4)?,
        filing_date: opt_date(r, 5)?,
        content: opt_text(r, 6)?,
        red_flags: opt_text(r, 7)?,
        deal_mentions: opt_text(r, 8)?,
        source: opt_text(r, 9)?.unwrap_or_default(),
        url: opt_text(r, 10)?,
        import_date: timestamp_or_epoch(r, 11)?,
    })
}

pub fn insert_filing(conn: &Connection, f: &Filing) -> Result<i64, DealflowError> {
    conn.execute(
        "INSERT INTO filings(company_name, cik, ticker, filing_type, filing_date, content, \
         red_flags, deal_mentions, source, url, import_date) \
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
        params![
            f.company_name,
            f.cik,
            f.ticker,
            f.filing_type,
            f.filing_date,
            f.content,
            f.red_flags,
            f.deal_mentions,
            f.source,
            f.url,
            f.import_date,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Latest filings whose company name contains `company`.
pub fn filings_for(
    conn: &Connection,
    company: &str,
    limit: usize,
) -> Result<Vec<Filing>, DealflowError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM filings WHERE company_name LIKE ?1 ESCAPE '\\' \
         ORDER BY filing_date IS NULL, filing_date DESC, id DESC LIMIT ?2",
        FILING_COLUMNS
    ))?;
    let rows = stmt.query_map(
        params![contains_pattern(company.trim()), limit as i64],
        filing_from_row,
    )?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Distinct red-flag terms across `filings`, first-seen order.
pub fn red_flags_for(filings: &[Filing]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for f in filings {
        for flag in split_tags(f.red_flags.as_deref().unwrap_or("")) {
            if !out.contains(&flag) {
                out.push(flag);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn filing(name: &str, date: (i32, u32, u32), flags: Option<&str>) -> Filing {
        Filing {
            id: 0,
            company_name: name.into(),
            cik: None,
            ticker: None,
            filing_type: Some("10-K".into()),
            filing_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
            content: None,
            red_flags: flags.map(str::to_string),
            deal_mentions: None,
            source: "SEC EDGAR".into(),
            url: None,
            import_date: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn newest_filing_first_and_flags_deduplicated() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        insert_filing(&conn, &filing("Acme Corp", (2024, 1, 5), Some("lawsuit, fraud"))).unwrap();
        insert_filing(&conn, &filing("Acme Corp", (2024, 3, 9), Some("fraud"))).unwrap();
        insert_filing(&conn, &filing("Other Inc", (2024, 4, 1), Some("default"))).unwrap();

        let got = filings_for(&conn, "acme", 10).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].filing_date, NaiveDate::from_ymd_opt(2024, 3, 9));
        assert_eq!(red_flags_for(&got), vec!["fraud", "lawsuit"]);
    }
}
