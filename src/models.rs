// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Statuses offered for manual entry. Stored statuses are free text.
pub const KNOWN_STATUSES: &[&str] = &["Rumored", "Announced", "Pending", "Complete", "Terminated"];

/// Statuses counted as "active" on the dashboard.
pub const ACTIVE_STATUSES: &[&str] = &["Announced", "Pending"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: i64,
    pub deal_id: String,
    pub target_name: String,
    pub acquirer_name: String,
    pub deal_value: Option<f64>, // USD millions
    pub announcement_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub industry: Option<String>,
    pub sector: Option<String>,
    pub geography: Option<String>,
    pub deal_type: Option<String>,
    pub status: Option<String>,
    pub tags: Option<String>,
    pub notes: Option<String>,
    pub source: String,
    pub import_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub company_name: String,
    pub ticker: Option<String>,
    pub industry: Option<String>,
    pub sector: Option<String>,
    pub geography: Option<String>,
    pub market_cap: Option<f64>,
    pub revenue: Option<f64>,
    pub ebitda: Option<f64>,
    pub employees: Option<i64>,
    pub index_membership: Option<String>,
    pub tags: Option<String>, // comma-joined
    pub watchlist: bool,
    pub last_updated: NaiveDateTime,
}

impl Company {
    pub fn tag_list(&self) -> Vec<String> {
        split_tags(self.tags.as_deref().unwrap_or(""))
    }
}

pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filing {
    pub id: i64,
    pub company_name: String,
    pub cik: Option<String>,
    pub ticker: Option<String>,
    pub filing_type: Option<String>,
    pub filing_date: Option<NaiveDate>,
    pub content: Option<String>,
    pub red_flags: Option<String>,
    pub deal_mentions: Option<String>,
    pub source: String,
    pub url: Option<String>,
    pub import_date: NaiveDateTime,
}

/// Filter half of an alert. Serialized as the `filters` JSON column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertFilters {
    pub industries: Vec<String>,
    pub geographies: Vec<String>,
    pub min_deal_size: f64,
    pub max_deal_size: Option<f64>,
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub user_id: String,
    pub alert_name: String,
    pub keywords: Vec<String>,
    pub filters: AlertFilters,
    pub email_notifications: bool,
    pub created_date: NaiveDateTime,
    pub last_triggered: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub user_id: String,
    pub alert_name: String,
    pub keywords: Vec<String>,
    pub filters: AlertFilters,
    pub email_notifications: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    Company,
    Deal,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Company => f.write_str("Company"),
            EntityType::Deal => f.write_str("Deal"),
        }
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "company" => Ok(EntityType::Company),
            "deal" => Ok(EntityType::Deal),
            other => Err(format!("unknown entity type '{}' (use company|deal)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub id: i64,
    pub user_id: String,
    pub entity_type: EntityType,
    pub entity_name: String,
    pub notes: Option<String>,
    pub added_date: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        };
        f.write_str(s)
    }
}

/// Mail-shaped notification produced by the alert matcher. Sending it is the
/// job of a [`crate::alerts::Notifier`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}
