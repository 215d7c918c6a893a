// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Persistent settings kept in the `settings` table.

use crate::error::DealflowError;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const KEY_USER_ID: &str = "user_id";
pub const KEY_CACHE_MODE: &str = "cache_mode";
pub const KEY_ALERT_RECENCY_DAYS: &str = "alert_recency_days";
/// Longest recency window accepted anywhere, about a century.
pub const MAX_RECENCY_DAYS: i64 = 36_500;
pub const KEY_WATCH_INTERVAL_SECS: &str = "watch_interval_secs";

pub const KNOWN_KEYS: &[&str] = &[
    KEY_USER_ID,
    KEY_CACHE_MODE,
    KEY_ALERT_RECENCY_DAYS,
    KEY_WATCH_INTERVAL_SECS,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CacheMode {
    Off,
    Standard,
    Aggressive,
}

impl CacheMode {
    pub fn ttl(self) -> Duration {
        match self {
            CacheMode::Off => Duration::ZERO,
            CacheMode::Standard => Duration::from_secs(300),
            CacheMode::Aggressive => Duration::from_secs(600),
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CacheMode::Off => "off",
            CacheMode::Standard => "standard",
            CacheMode::Aggressive => "aggressive",
        })
    }
}

impl FromStr for CacheMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(CacheMode::Off),
            "standard" => Ok(CacheMode::Standard),
            "aggressive" => Ok(CacheMode::Aggressive),
            other => Err(format!(
                "Invalid cache mode '{}' (use off|standard|aggressive)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub user_id: String,
    pub cache_mode: CacheMode,
    pub alert_recency_days: i64,
    pub watch_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            user_id: "default_user".to_string(),
            cache_mode: CacheMode::Standard,
            alert_recency_days: 30,
            watch_interval_secs: 300,
        }
    }
}

impl Settings {
    /// Missing or malformed entries fall back to defaults.
    pub fn load(conn: &Connection) -> Result<Settings, DealflowError> {
        let defaults = Settings::default();
        Ok(Settings {
            user_id: get(conn, KEY_USER_ID)?
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.user_id),
            cache_mode: parsed(conn, KEY_CACHE_MODE)?.unwrap_or(defaults.cache_mode),
            alert_recency_days: parsed(conn, KEY_ALERT_RECENCY_DAYS)?
                .filter(|d: &i64| (1..=MAX_RECENCY_DAYS).contains(d))
                .unwrap_or(defaults.alert_recency_days),
            watch_interval_secs: parsed(conn, KEY_WATCH_INTERVAL_SECS)?
                .filter(|s: &u64| *s > 0)
                .unwrap_or(defaults.watch_interval_secs),
        })
    }

    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (KEY_USER_ID, self.user_id.clone()),
            (KEY_CACHE_MODE, self.cache_mode.to_string()),
            (KEY_ALERT_RECENCY_DAYS, self.alert_recency_days.to_string()),
            (KEY_WATCH_INTERVAL_SECS, self.watch_interval_secs.to_string()),
        ]
    }
}

fn parsed<T: FromStr>(conn: &Connection, key: &str) -> Result<Option<T>, DealflowError> {
    Ok(get(conn, key)?.and_then(|v| match v.trim().parse::<T>() {
        Ok(t) => Some(t),
        Err(_) => {
            tracing::warn!(key, value = %v, "ignoring malformed setting");
            None
        }
    }))
}

pub fn get(conn: &Connection, key: &str) -> Result<Option<String>, DealflowError> {
    let v = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

/// Validates the value for known keys before writing it.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<(), DealflowError> {
    let value = value.trim();
    let invalid = |msg: String| Err(DealflowError::InvalidSetting(msg));
    match key {
        KEY_USER_ID if value.is_empty() => return invalid("user_id cannot be empty".into()),
        KEY_USER_ID => {}
        KEY_CACHE_MODE => {
            if let Err(msg) = value.parse::<CacheMode>() {
                return invalid(msg);
            }
        }
        KEY_ALERT_RECENCY_DAYS => match value.parse::<i64>() {
            Ok(n) if (1..=MAX_RECENCY_DAYS).contains(&n) => {}
            _ => {
                return invalid(format!(
                    "{} must be between 1 and {}",
                    key, MAX_RECENCY_DAYS
                ));
            }
        },
        KEY_WATCH_INTERVAL_SECS => match value.parse::<u64>() {
            Ok(n) if n > 0 => {}
            _ => return invalid(format!("{} must be a positive integer", key)),
        },
        other => {
            return invalid(format!(
                "Unknown setting '{}' (known: {})",
                other,
                KNOWN_KEYS.join(", ")
            ));
        }
    }
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn defaults_when_empty() {
        assert_eq!(Settings::load(&conn()).unwrap(), Settings::default());
    }

    #[test]
    fn set_then_load() {
        let conn = conn();
        set(&conn, KEY_CACHE_MODE, " Aggressive ").unwrap();
        set(&conn, KEY_ALERT_RECENCY_DAYS, "7").unwrap();
        let s = Settings::load(&conn).unwrap();
        assert_eq!(s.cache_mode, CacheMode::Aggressive);
        assert_eq!(s.alert_recency_days, 7);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        let conn = conn();
        assert!(set(&conn, "colour", "blue").is_err());
        assert!(set(&conn, KEY_WATCH_INTERVAL_SECS, "0").is_err());
        assert!(set(&conn, KEY_CACHE_MODE, "max").is_err());
    }

    #[test]
    fn recency_window_is_bounded() {
        let conn = conn();
        set(&conn, KEY_ALERT_RECENCY_DAYS, "36500").unwrap();
        let err = set(&conn, KEY_ALERT_RECENCY_DAYS, "100000000").unwrap_err();
        assert!(matches!(err, DealflowError::InvalidSetting(_)));
        assert_eq!(Settings::load(&conn).unwrap().alert_recency_days, MAX_RECENCY_DAYS);

        conn.execute(
            "UPDATE settings SET value = '100000000' WHERE key = ?1",
            [KEY_ALERT_RECENCY_DAYS],
        )
        .unwrap();
        assert_eq!(Settings::load(&conn).unwrap().alert_recency_days, 30);
    }
}
