// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{opt_text, timestamp_or_epoch};
use crate::error::DealflowError;
use crate::models::{EntityType, WatchlistEntry};
use chrono::NaiveDateTime;
use rusqlite::{Connection, params};

pub fn add_entry(
    conn: &Connection,
    user_id: &str,
    entity_type: EntityType,
    entity_name: &str,
    notes: Option<&str>,
    at: NaiveDateTime,
) -> Result<i64, DealflowError> {
    let name = entity_name.trim();
    if name.is_empty() {
        return Err(DealflowError::InvalidInput(
            "watchlist entity name is empty".into(),
        ));
    }
    conn.execute(
        "INSERT INTO watchlist(user_id, entity_type, entity_name, notes, added_date) \
         VALUES (?1,?2,?3,?4,?5)",
        params![user_id, entity_type.to_string(), name, notes, at],
    )?;
    if entity_type == EntityType::Company {
        // keep the company flag in step; a company not yet imported is fine
        conn.execute(
            "UPDATE companies SET watchlist=1 WHERE company_name=?1",
            params![name],
        )?;
    }
    Ok(conn.last_insert_rowid())
}

/// Entries for `user_id`, most recently added first.
pub fn list_entries(conn: &Connection, user_id: &str) -> Result<Vec<WatchlistEntry>, DealflowError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, entity_type, entity_name, notes, added_date \
         FROM watchlist WHERE user_id=?1 ORDER BY added_date DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![user_id], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            opt_text(r, 1)?.unwrap_or_default(),
            opt_text(r, 2)?.unwrap_or_default(),
            opt_text(r, 3)?.unwrap_or_default(),
            opt_text(r, 4)?,
            timestamp_or_epoch(r, 5)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, user_id, kind, entity_name, notes, added_date) = row?;
        let entity_type = match kind.parse::<EntityType>() {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(id, error = %e, "skipping watchlist row");
                continue;
            }
        };
        out.push(WatchlistEntry {
            id,
            user_id,
            entity_type,
            entity_name,
            notes,
            added_date,
        });
    }
    Ok(out)
}
