// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Errors raised by the ingestion pipeline, the store and the alert matcher.
///
/// `Parse` is cell-level and never escapes a batch: the normalizer logs it
/// and stores a null. `UnknownSource` disables source-specific handling but
/// still lets generic ingestion proceed.
#[derive(Debug, Error)]
pub enum DealflowError {
    #[error("could not parse {field} value '{value}'")]
    Parse { field: String, value: String },

    #[error("unknown data source '{0}'")]
    UnknownSource(String),

    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("invalid alert: {0}")]
    InvalidAlert(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("notification failed: {0}")]
    Notify(String),

    #[error("source '{0}' has no destination table")]
    NoDestination(String),

    #[error("unsupported file format '{0}' (use csv|xlsx|json)")]
    UnsupportedFormat(String),

    #[error("malformed stored value in {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DealflowError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        DealflowError::NotFound {
            entity,
            key: key.into(),
        }
    }
}
