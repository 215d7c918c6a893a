// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{contains_pattern, opt_date, opt_real, opt_text, timestamp_or_epoch};
use crate::error::DealflowError;
use crate::models::Deal;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

const DEAL_COLUMNS: &str = "id, deal_id, target_name, acquirer_name, deal_value, \
     announcement_date, completion_date, industry, sector, geography, deal_type, status, \
     tags, notes, source, import_date";

const NEWEST_FIRST: &str = " ORDER BY announcement_date IS NULL, announcement_date DESC, id DESC";

fn deal_from_row(r: &Row) -> rusqlite::Result<Deal> {
    Ok(Deal {
        id: r.get(0)?,
        deal_id: opt_text(r, 1)?.unwrap_or_default(),
        target_name: opt_text(r, 2)?.unwrap_or_default(),
        acquirer_name: opt_text(r, 3)?.unwrap_or_default(),
        deal_value: opt_real(r, 4)?,
        announcement_date: opt_date(r, 5)?,
        completion_date: opt_date(r, 6)?,
        industry: opt_text(r, 7)?,
        sector: opt_text(r, 8)?,
        geography: opt_text(r, 9)?,
        deal_type: opt_text(r, 10)?,
        status: opt_text(r, 11)?,
        tags: opt_text(r, 12)?,
        notes: opt_text(r, 13)?,
        source: opt_text(r, 14)?.unwrap_or_default(),
        import_date: timestamp_or_epoch(r, 15)?,
    })
}

/// Deal ids for rows whose source did not assign one.
pub fn generate_deal_id(source_label: &str, at: NaiveDateTime, seq: usize) -> String {
    let prefix: String = source_label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_uppercase();
    format!("{}-{}-{:04}", prefix, at.format("%Y%m%d%H%M%S%3f"), seq)
}

fn insert_sql(or_ignore: bool) -> String {
    format!(
        "INSERT {}INTO deals(deal_id, target_name, acquirer_name, deal_value, announcement_date, \
         completion_date, industry, sector, geography, deal_type, status, tags, notes, source, import_date) \
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)",
        if or_ignore { "OR IGNORE " } else { "" }
    )
}

fn execute_insert(conn: &Connection, d: &Deal, or_ignore: bool) -> rusqlite::Result<usize> {
    conn.execute(
        &insert_sql(or_ignore),
        params![
            d.deal_id,
            d.target_name,
            d.acquirer_name,
            d.deal_value,
            d.announcement_date,
            d.completion_date,
            d.industry,
            d.sector,
            d.geography,
            d.deal_type,
            d.status,
            d.tags,
            d.notes,
            d.source,
            d.import_date,
        ],
    )
}

/// Returns the new row id; `d.id` is ignored.
pub fn insert_deal(conn: &Connection, d: &Deal) -> Result<i64, DealflowError> {
    execute_insert(conn, d, false)?;
    Ok(conn.last_insert_rowid())
}

/// Like [`insert_deal`] but skips a duplicate `deal_id`, returning `None`.
pub fn insert_deal_if_new(conn: &Connection, d: &Deal) -> Result<Option<i64>, DealflowError> {
    match execute_insert(conn, d, true)? {
        0 => Ok(None),
        _ => Ok(Some(conn.last_insert_rowid())),
    }
}

pub fn get_deal(conn: &Connection, id: i64) -> Result<Deal, DealflowError> {
    conn.query_row(
        &format!("SELECT {} FROM deals WHERE id=?1", DEAL_COLUMNS),
        params![id],
        deal_from_row,
    )
    .optional()?
    .ok_or_else(|| DealflowError::not_found("deal", id.to_string()))
}

pub fn delete_deal(conn: &Connection, deal_id: &str) -> Result<(), DealflowError> {
    let n = conn.execute("DELETE FROM deals WHERE deal_id=?1", params![deal_id])?;
    if n == 0 {
        return Err(DealflowError::not_found("deal", deal_id));
    }
    Ok(())
}

/// All deals, newest announcement first; undated deals last.
pub fn load_deals(conn: &Connection) -> Result<Vec<Deal>, DealflowError> {
    search_deals(conn, &DealSearch::default())
}

#[derive(Debug, Clone, Default)]
pub struct DealSearch {
    /// Any keyword in the target or acquirer name (case-insensitive).
    pub keywords: Vec<String>,
    pub industries: Vec<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub limit: Option<usize>,
}

pub fn search_deals(conn: &Connection, q: &DealSearch) -> Result<Vec<Deal>, DealflowError> {
    let mut sql = format!("SELECT {} FROM deals WHERE 1=1", DEAL_COLUMNS);
    let mut values: Vec<Value> = Vec::new();

    let keywords: Vec<&str> = q
        .keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    if !keywords.is_empty() {
        let clauses: Vec<&str> = keywords
            .iter()
            .map(|_| "target_name LIKE ? ESCAPE '\\' OR acquirer_name LIKE ? ESCAPE '\\'")
            .collect();
        sql.push_str(&format!(" AND ({})", clauses.join(" OR ")));
        for k in keywords {
            let pattern = contains_pattern(k);
            values.push(Value::Text(pattern.clone()));
            values.push(Value::Text(pattern));
        }
    }
    if !q.industries.is_empty() {
        let marks = vec!["?"; q.industries.len()].join(",");
        sql.push_str(&format!(" AND lower(industry) IN ({})", marks));
        values.extend(q.industries.iter().map(|i| Value::Text(i.trim().to_lowercase())));
    }
    if let Some(min) = q.min_value {
        sql.push_str(" AND deal_value >= ?");
        values.push(Value::Real(min));
    }
    if let Some(max) = q.max_value {
        sql.push_str(" AND deal_value <= ?");
        values.push(Value::Real(max));
    }
    if let Some(from) = q.date_from {
        sql.push_str(" AND date(announcement_date) >= ?");
        values.push(Value::Text(from.to_string()));
    }
    if let Some(to) = q.date_to {
        sql.push_str(" AND date(announcement_date) <= ?");
        values.push(Value::Text(to.to_string()));
    }
    sql.push_str(NEWEST_FIRST);
    if let Some(limit) = q.limit {
        sql.push_str(" LIMIT ?");
        values.push(Value::Integer(limit as i64));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), deal_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Deals announced on or after `since`; `None` keeps every deal.
pub fn recent_deals(
    conn: &Connection,
    since: Option<NaiveDate>,
) -> Result<Vec<Deal>, DealflowError> {
    search_deals(
        conn,
        &DealSearch {
            date_from: since,
            ..DealSearch::default()
        },
    )
}

/// Deals where the company appears as target or acquirer.
pub fn company_history(conn: &Connection, company: &str) -> Result<Vec<Deal>, DealflowError> {
    search_deals(
        conn,
        &DealSearch {
            keywords: vec![company.to_string()],
            ..DealSearch::default()
        },
    )
}
