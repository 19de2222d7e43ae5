//! Benchmark instance records.
//!
//! An [`Instance`] is built fresh from the cached metadata table on every
//! load. Its `path` is the only piece of mutable, machine-local state: it is
//! set once the artifact is on disk and cleared again by [`Instance::remove`].

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::library::Library;

/// Problem class derived from variable-type counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProblemType {
    /// All variables continuous.
    Lp,
    /// All variables binary.
    Blp,
    /// All variables general integer.
    Ilp,
    /// Binary and continuous variables, no general integers.
    Mblp,
    /// Anything else.
    Milp,
}

impl ProblemType {
    /// Classify a problem from its variable counts.
    ///
    /// Precedence: all-continuous, all-binary, all-integer, no-integers,
    /// mixed. An empty model (`n_vars == 0`) is therefore an LP.
    pub fn classify(n_vars: u64, n_bins: u64, n_ints: u64, n_conts: u64) -> Self {
        if n_conts == n_vars {
            Self::Lp
        } else if n_bins == n_vars {
            Self::Blp
        } else if n_ints == n_vars {
            Self::Ilp
        } else if n_ints == 0 {
            Self::Mblp
        } else {
            Self::Milp
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lp => "LP",
            Self::Blp => "BLP",
            Self::Ilp => "ILP",
            Self::Mblp => "MBLP",
            Self::Milp => "MILP",
        }
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Difficulty status as published by the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Easy,
    Hard,
    Open,
    Closed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Hard => "hard",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    /// Parse a status cell, ignoring case and surrounding whitespace.
    pub fn parse_cell(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "hard" => Some(Self::Hard),
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the best known objective value of an instance is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationStatus {
    Infeasible,
    Unbounded,
    /// A feasible solution is known but not proven optimal.
    Feasible,
    Optimal,
    #[default]
    Unknown,
}

impl OptimizationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Infeasible => "infeasible",
            Self::Unbounded => "unbounded",
            Self::Feasible => "feasible",
            Self::Optimal => "optimal",
            Self::Unknown => "unknown",
        }
    }

    /// Whether a primal bound can accompany this status.
    pub fn has_bound(self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }
}

impl fmt::Display for OptimizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Problem file format an artifact can be downloaded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Mps,
    Lp,
}

impl Format {
    /// File extension, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mps => "mps",
            Self::Lp => "lp",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "mps" => Ok(Self::Mps),
            "lp" => Ok(Self::Lp),
            _ => Err(Error::UnknownFormat(s.to_owned())),
        }
    }
}

/// One benchmark instance and its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub library: Library,
    pub name: String,
    /// Local artifact path, set only while the artifact is on disk.
    pub path: Option<PathBuf>,
    pub problem_type: ProblemType,
    pub status: Option<Status>,
    pub optimization_status: OptimizationStatus,
    pub primal: Option<f64>,
    pub dual: Option<f64>,
    pub n_vars: u64,
    pub n_bins: u64,
    pub n_ints: u64,
    pub n_conts: u64,
    pub n_cons: u64,
    pub n_nz: u64,
    pub n_sos: Option<u64>,
    pub n_semi: Option<u64>,
    pub n_quads: Option<u64>,
    pub q0_density: Option<f64>,
    pub q0_ev_prob: Option<f64>,
    pub obj_type: Option<String>,
    pub var_type: Option<String>,
    pub cons_type: Option<String>,
    pub group: Option<String>,
    pub tags: Vec<String>,
    pub formats: Vec<Format>,
}

impl Instance {
    /// Local artifact path, if downloaded.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_downloaded(&self) -> bool {
        self.path.as_deref().is_some_and(Path::exists)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Delete the local artifact, if any, and forget its path.
    pub fn remove(&mut self) -> io::Result<()> {
        if let Some(path) = self.path.take() {
            match fs::remove_file(&path) {
                Ok(()) => tracing::debug!("Removed {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    self.path = Some(path);
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

fn or_dash<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn breakdown(total: u64, parts: &[(Option<u64>, &str)]) -> String {
    let mut text = total.to_string();
    for (count, label) in parts {
        if let Some(count) = count.filter(|c| *c > 0) {
            text.push_str(&format!(" ({count} {label})"));
        }
    }
    text
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rows: Vec<(&str, String)> = vec![
            ("Instance", self.name.clone()),
            ("Problem Type", self.problem_type.to_string()),
            ("Local path", or_dash(self.path.as_deref().map(Path::display))),
            ("Status", or_dash(self.status)),
            ("Optimization Status", self.optimization_status.to_string()),
            ("Primal Bound", or_dash(self.primal)),
            ("Dual Bound", or_dash(self.dual)),
            (
                "Variables",
                breakdown(
                    self.n_vars,
                    &[(Some(self.n_bins), "binary"), (Some(self.n_ints), "integer")],
                ),
            ),
            (
                "Constraints",
                breakdown(
                    self.n_cons,
                    &[(self.n_quads, "quadratic"), (self.n_sos, "SOS"), (self.n_semi, "semi")],
                ),
            ),
            ("Non-zeroes", self.n_nz.to_string()),
        ];

        if let Some(density) = self.q0_density {
            rows.push(("Q0 Density", format!("{density}%")));
            rows.push(("Q0 EV Density", format!("{}%", or_dash(self.q0_ev_prob))));
            rows.push(("Objective Type", or_dash(self.obj_type.as_deref())));
            rows.push(("Variables Type", or_dash(self.var_type.as_deref())));
            rows.push(("Constraints Type", or_dash(self.cons_type.as_deref())));
        }
        if !self.tags.is_empty() {
            rows.push(("Tags", self.tags.join(", ")));
        }
        if !self.formats.is_empty() {
            let formats: Vec<&str> = self.formats.iter().map(|f| f.extension()).collect();
            rows.push(("Formats", formats.join(", ")));
        }

        let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
        for (i, (key, value)) in rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{key:<width$}: {value}")?;
        }
        Ok(())
    }
}
