//! Raw scraped tables and the canonical cache schema.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::instance::{OptimizationStatus, ProblemType};

/// A table exactly as scraped: header texts and row cell texts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Index of the column whose header is `name`.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| Error::MissingColumn {
                column: name.to_owned(),
            })
    }

    /// Cell text at `(row, column)`; short rows read as empty cells.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map_or("", |c| c.trim())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Canonical column names of the cached metadata table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    Status,
    NVars,
    NBins,
    NInts,
    NConts,
    NCons,
    NNz,
    Group,
    Primal,
    Tags,
    Type,
    OptimizationStatus,
}

impl Column {
    pub const ALL: [Column; 13] = [
        Column::Name,
        Column::Status,
        Column::NVars,
        Column::NBins,
        Column::NInts,
        Column::NConts,
        Column::NCons,
        Column::NNz,
        Column::Group,
        Column::Primal,
        Column::Tags,
        Column::Type,
        Column::OptimizationStatus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Status => "status",
            Self::NVars => "n_vars",
            Self::NBins => "n_bins",
            Self::NInts => "n_ints",
            Self::NConts => "n_conts",
            Self::NCons => "n_cons",
            Self::NNz => "n_nz",
            Self::Group => "group",
            Self::Primal => "primal",
            Self::Tags => "tags",
            Self::Type => "type",
            Self::OptimizationStatus => "optimization_status",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| s.to_owned())
    }
}

/// One row of the canonical metadata table, as persisted in the cache file.
///
/// `status` and `tags` keep the scraped text; they are interpreted when the
/// row becomes an [`Instance`](crate::Instance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRow {
    pub name: String,
    pub status: String,
    pub n_vars: u64,
    pub n_bins: u64,
    pub n_ints: u64,
    pub n_conts: u64,
    pub n_cons: u64,
    pub n_nz: u64,
    pub group: Option<String>,
    pub primal: Option<f64>,
    pub tags: String,
    #[serde(rename = "type")]
    pub problem_type: ProblemType,
    pub optimization_status: OptimizationStatus,
}
