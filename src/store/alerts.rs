// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{opt_text, opt_timestamp, timestamp_or_epoch};
use crate::error::DealflowError;
use crate::models::{Alert, AlertFilters, NewAlert};
use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, Row, params};

const ALERT_COLUMNS: &str = "id, user_id, alert_name, keywords, filters, email_notifications, \
     created_date, last_triggered";

/// An alert as stored, before its JSON columns are decoded. Rows written by
/// other tools may not decode; callers decide whether that is fatal.
#[derive(Debug, Clone)]
pub struct AlertRow {
    pub id: i64,
    pub user_id: String,
    pub alert_name: String,
    pub keywords: String,
    pub filters: String,
    pub email_notifications: bool,
    pub created_date: NaiveDateTime,
    pub last_triggered: Option<NaiveDateTime>,
}

impl AlertRow {
    fn from_row(r: &Row) -> rusqlite::Result<AlertRow> {
        Ok(AlertRow {
            id: r.get(0)?,
            user_id: opt_text(r, 1)?.unwrap_or_default(),
            alert_name: opt_text(r, 2)?.unwrap_or_default(),
            keywords: opt_text(r, 3)?.unwrap_or_default(),
            filters: opt_text(r, 4)?.unwrap_or_default(),
            email_notifications: r.get::<_, Option<bool>>(5)?.unwrap_or(false),
            created_date: timestamp_or_epoch(r, 6)?,
            last_triggered: opt_timestamp(r, 7)?,
        })
    }

    pub fn decode(&self) -> Result<Alert, DealflowError> {
        let keywords: Vec<String> =
            serde_json::from_str(&self.keywords).map_err(|source| DealflowError::Decode {
                context: format!("keywords of alert {}", self.id),
                source,
            })?;
        // an absent filters column means "no filters"
        let filters: AlertFilters = if self.filters.trim().is_empty() {
            AlertFilters::default()
        } else {
            serde_json::from_str(&self.filters).map_err(|source| DealflowError::Decode {
                context: format!("filters of alert {}", self.id),
                source,
            })?
        };
        Ok(Alert {
            id: self.id,
            user_id: self.user_id.clone(),
            alert_name: self.alert_name.clone(),
            keywords,
            filters,
            email_notifications: self.email_notifications,
            created_date: self.created_date,
            last_triggered: self.last_triggered,
        })
    }
}

/// Validates and stores a new alert, returning its id.
pub fn create_alert(
    conn: &Connection,
    new: &NewAlert,
    now: NaiveDateTime,
) -> Result<i64, DealflowError> {
    crate::alerts::check_new_alert(new)?;
    conn.execute(
        "INSERT INTO alerts(user_id, alert_name, keywords, filters, email_notifications, created_date) \
         VALUES (?1,?2,?3,?4,?5,?6)",
        params![
            new.user_id,
            new.alert_name.trim(),
            serde_json::to_string(&new.keywords)?,
            serde_json::to_string(&new.filters)?,
            new.email_notifications,
            now,
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, name = %new.alert_name, "alert created");
    Ok(id)
}

/// Raw rows, newest first; all users when `user_id` is `None`.
pub fn load_alert_rows(
    conn: &Connection,
    user_id: Option<&str>,
) -> Result<Vec<AlertRow>, DealflowError> {
    let sql = format!(
        "SELECT {} FROM alerts WHERE ?1 IS NULL OR user_id=?1 ORDER BY created_date DESC, id DESC",
        ALERT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], AlertRow::from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Decoded alerts for a user. Rows that fail to decode are logged and left
/// out; `doctor` reports them.
pub fn list_alerts(conn: &Connection, user_id: &str) -> Result<Vec<Alert>, DealflowError> {
    let mut out = Vec::new();
    for row in load_alert_rows(conn, Some(user_id))? {
        match row.decode() {
            Ok(a) => out.push(a),
            Err(e) => tracing::warn!(id = row.id, error = %e, "skipping undecodable alert"),
        }
    }
    Ok(out)
}

pub fn get_alert(conn: &Connection, id: i64) -> Result<Alert, DealflowError> {
    conn.query_row(
        &format!("SELECT {} FROM alerts WHERE id=?1", ALERT_COLUMNS),
        params![id],
        AlertRow::from_row,
    )
    .optional()?
    .ok_or_else(|| DealflowError::not_found("alert", id.to_string()))?
    .decode()
}

pub fn delete_alert(conn: &Connection, id: i64) -> Result<(), DealflowError> {
    let n = conn.execute("DELETE FROM alerts WHERE id=?1", params![id])?;
    if n == 0 {
        return Err(DealflowError::not_found("alert", id.to_string()));
    }
    Ok(())
}

pub fn mark_triggered(conn: &Connection, id: i64, at: NaiveDateTime) -> Result<(), DealflowError> {
    let n = conn.execute(
        "UPDATE alerts SET last_triggered=?1 WHERE id=?2",
        params![at, id],
    )?;
    if n == 0 {
        return Err(DealflowError::not_found("alert", id.to_string()));
    }
    Ok(())
}
