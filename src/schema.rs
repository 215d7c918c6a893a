// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Registry of the external data sources an upload can declare.

use crate::batch::Batch;
use crate::error::DealflowError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Mergermarket,
    Preqin,
    SecFilings,
    IndexConstituents,
    PressReleases,
}

pub const ALL_SOURCES: &[SourceKind] = &[
    SourceKind::Mergermarket,
    SourceKind::Preqin,
    SourceKind::SecFilings,
    SourceKind::IndexConstituents,
    SourceKind::PressReleases,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSchema {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

impl SourceSchema {
    pub fn all_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.required.iter().chain(self.optional.iter()).copied()
    }
}

static MERGERMARKET: SourceSchema = SourceSchema {
    required: &[
        "deal_id",
        "target_name",
        "acquirer_name",
        "deal_value",
        "announcement_date",
    ],
    optional: &[
        "industry",
        "sector",
        "geography",
        "deal_type",
        "status",
        "completion_date",
    ],
};

static PREQIN: SourceSchema = SourceSchema {
    required: &[
        "fund_name",
        "target_company",
        "investment_amount",
        "investment_date",
    ],
    optional: &[
        "fund_type",
        "industry",
        "geography",
        "stage",
        "exit_date",
        "exit_value",
    ],
};

static SEC_FILINGS: SourceSchema = SourceSchema {
    required: &["company_name", "filing_type", "filing_date", "content"],
    optional: &["cik", "ticker", "form_type", "url"],
};

static INDEX_CONSTITUENTS: SourceSchema = SourceSchema {
    required: &["company_name", "ticker", "index_name"],
    optional: &["sector", "industry", "market_cap", "weight", "country"],
};

static PRESS_RELEASES: SourceSchema = SourceSchema {
    required: &["company_name", "title", "date", "content"],
    optional: &["source", "url", "sentiment", "keywords"],
};

impl SourceKind {
    /// Accepts display names as well: `"SEC Filings"` resolves to `sec_filings`.
    pub fn from_name(name: &str) -> Option<SourceKind> {
        let key = name.trim().to_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "mergermarket" => Some(SourceKind::Mergermarket),
            "preqin" => Some(SourceKind::Preqin),
            "sec_filings" => Some(SourceKind::SecFilings),
            "index_constituents" => Some(SourceKind::IndexConstituents),
            "press_releases" => Some(SourceKind::PressReleases),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Mergermarket => "mergermarket",
            SourceKind::Preqin => "preqin",
            SourceKind::SecFilings => "sec_filings",
            SourceKind::IndexConstituents => "index_constituents",
            SourceKind::PressReleases => "press_releases",
        }
    }

    /// Provenance label written to the `source` column.
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Mergermarket => "Mergermarket",
            SourceKind::Preqin => "Preqin",
            SourceKind::SecFilings => "SEC EDGAR",
            SourceKind::IndexConstituents => "Index Data",
            SourceKind::PressReleases => "Press Release",
        }
    }

    pub fn schema(self) -> &'static SourceSchema {
        match self {
            SourceKind::Mergermarket => &MERGERMARKET,
            SourceKind::Preqin => &PREQIN,
            SourceKind::SecFilings => &SEC_FILINGS,
            SourceKind::IndexConstituents => &INDEX_CONSTITUENTS,
            SourceKind::PressReleases => &PRESS_RELEASES,
        }
    }

    /// Column the validator checks for sparse monetary values.
    pub fn value_column(self) -> &'static str {
        match self {
            SourceKind::Preqin => "investment_amount",
            _ => "deal_value",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn resolve(source_name: &str) -> Result<SourceKind, DealflowError> {
    SourceKind::from_name(source_name)
        .ok_or_else(|| DealflowError::UnknownSource(source_name.trim().to_string()))
}

pub fn get_schema(source_name: &str) -> Result<&'static SourceSchema, DealflowError> {
    resolve(source_name).map(SourceKind::schema)
}

/// Header-only batch carrying the source's required then optional columns.
pub fn get_template(source_name: &str) -> Result<Batch, DealflowError> {
    let schema = get_schema(source_name)?;
    Ok(Batch::new(schema.all_columns().map(str::to_string).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_resolve() {
        assert_eq!(
            SourceKind::from_name("SEC Filings"),
            Some(SourceKind::SecFilings)
        );
        assert_eq!(
            SourceKind::from_name(" Index-Constituents "),
            Some(SourceKind::IndexConstituents)
        );
    }

    #[test]
    fn unknown_source_is_an_error() {
        let err = get_schema("custom").unwrap_err();
        assert!(matches!(err, DealflowError::UnknownSource(ref s) if s == "custom"));
    }

    #[test]
    fn template_lists_required_then_optional() {
        let t = get_template("mergermarket").unwrap();
        assert_eq!(t.columns.first().map(String::as_str), Some("deal_id"));
        assert_eq!(t.columns.last().map(String::as_str), Some("completion_date"));
        assert_eq!(t.columns.len(), 11);
        assert!(t.is_empty());
    }
}
