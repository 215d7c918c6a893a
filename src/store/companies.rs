// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{contains_pattern, opt_real, opt_text, timestamp_or_epoch};
use crate::error::DealflowError;
use crate::models::{Company, split_tags};
use rusqlite::types::Value;
use rusqlite::{
    Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params,
    params_from_iter,
};

const COMPANY_COLUMNS: &str = "id, company_name, ticker, industry, sector, geography, \
     market_cap, revenue, ebitda, employees, index_membership, tags, watchlist, last_updated";

/// Screening results are capped like the dashboard's result grid.
pub const SCREEN_LIMIT: usize = 50;

fn company_from_row(r: &Row) -> rusqlite::Result<Company> {
    Ok(Company {
        id: r.get(0)?,
        company_name: opt_text(r, 1)?.unwrap_or_default(),
        ticker: opt_text(r, 2)?,
        industry: opt_text(r, 3)?,
        sector: opt_text(r, 4)?,
        geography: opt_text(r, 5)?,
        market_cap: opt_real(r, 6)?,
        revenue: opt_real(r, 7)?,
        ebitda: opt_real(r, 8)?,
        employees: opt_real(r, 9)?.map(|e| e as i64),
        index_membership: opt_text(r, 10)?,
        tags: opt_text(r, 11)?,
        watchlist: r.get::<_, Option<bool>>(12)?.unwrap_or(false),
        last_updated: timestamp_or_epoch(r, 13)?,
    })
}

pub fn insert_company(conn: &Connection, c: &Company) -> Result<i64, DealflowError> {
    conn.execute(
        "INSERT INTO companies(company_name, ticker, industry, sector, geography, market_cap, \
         revenue, ebitda, employees, index_membership, tags, watchlist, last_updated) \
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)",
        params![
            c.company_name,
            c.ticker,
            c.industry,
            c.sector,
            c.geography,
            c.market_cap,
            c.revenue,
            c.ebitda,
            c.employees,
            c.index_membership,
            c.tags,
            c.watchlist,
            c.last_updated,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_company(conn: &Connection, id: i64) -> Result<Company, DealflowError> {
    conn.query_row(
        &format!("SELECT {} FROM companies WHERE id=?1", COMPANY_COLUMNS),
        params![id],
        company_from_row,
    )
    .optional()?
    .ok_or_else(|| DealflowError::not_found("company", id.to_string()))
}

pub fn find_companies(conn: &Connection, name: &str) -> Result<Vec<Company>, DealflowError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM companies WHERE company_name=?1 ORDER BY id",
        COMPANY_COLUMNS
    ))?;
    let rows = stmt.query_map(params![name], company_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Largest market cap first.
pub fn list_companies(conn: &Connection, limit: usize) -> Result<Vec<Company>, DealflowError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM companies ORDER BY market_cap IS NULL, market_cap DESC, id LIMIT ?1",
        COMPANY_COLUMNS
    ))?;
    let rows = stmt.query_map(params![limit as i64], company_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[derive(Debug, Clone, Default)]
pub struct CompanyScreen {
    pub industries: Vec<String>,
    /// Ignored unless positive.
    pub min_revenue: f64,
    /// Ignored unless positive.
    pub max_revenue: f64,
    pub index_membership: Option<String>,
    pub watchlist_only: bool,
}

/// Largest market cap first, at most [`SCREEN_LIMIT`] rows.
pub fn screen_companies(
    conn: &Connection,
    q: &CompanyScreen,
) -> Result<Vec<Company>, DealflowError> {
    let mut sql = format!("SELECT {} FROM companies WHERE 1=1", COMPANY_COLUMNS);
    let mut values: Vec<Value> = Vec::new();

    if !q.industries.is_empty() {
        let marks = vec!["?"; q.industries.len()].join(",");
        sql.push_str(&format!(" AND lower(industry) IN ({})", marks));
        values.extend(q.industries.iter().map(|i| Value::Text(i.trim().to_lowercase())));
    }
    if q.min_revenue > 0.0 {
        sql.push_str(" AND revenue >= ?");
        values.push(Value::Real(q.min_revenue));
    }
    if q.max_revenue > 0.0 {
        sql.push_str(" AND revenue <= ?");
        values.push(Value::Real(q.max_revenue));
    }
    if let Some(idx) = q.index_membership.as_deref().filter(|s| !s.trim().is_empty()) {
        sql.push_str(" AND index_membership LIKE ? ESCAPE '\\'");
        values.push(Value::Text(contains_pattern(idx.trim())));
    }
    if q.watchlist_only {
        sql.push_str(" AND watchlist=1");
    }
    sql.push_str(" ORDER BY market_cap IS NULL, market_cap DESC, id LIMIT ?");
    values.push(Value::Integer(SCREEN_LIMIT as i64));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), company_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Adds `tag` to every company named `company_name`. Idempotent.
///
/// The read and the write share one immediate transaction, so two taggers
/// racing on the same row cannot drop each other's tag.
pub fn apply_tag(conn: &Connection, company_name: &str, tag: &str) -> Result<(), DealflowError> {
    let tag = tag.trim();
    if tag.is_empty() || tag.contains(',') {
        return Err(DealflowError::InvalidInput(format!(
            "tag '{}' must be non-empty and contain no commas",
            tag
        )));
    }

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let current: Vec<(i64, Option<String>)> = {
        let mut stmt = tx.prepare("SELECT id, tags FROM companies WHERE company_name=?1")?;
        let rows = stmt.query_map(params![company_name], |r| Ok((r.get(0)?, r.get(1)?)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        out
    };
    if current.is_empty() {
        return Err(DealflowError::not_found("company", company_name));
    }

    for (id, tags) in current {
        let mut list = split_tags(tags.as_deref().unwrap_or(""));
        if list.iter().any(|t| t == tag) {
            continue;
        }
        list.push(tag.to_string());
        tx.execute(
            "UPDATE companies SET tags=?1 WHERE id=?2",
            params![list.join(","), id],
        )?;
    }
    tx.commit()?;
    tracing::debug!(company = company_name, tag, "tag applied");
    Ok(())
}
