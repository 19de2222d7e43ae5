//! Error types for the mipdata-core crate.
//!
//! All fallible operations return [`Error`]. Variants group into the four
//! failure classes the catalog distinguishes: usage mistakes raised before
//! any I/O, remote fetch failures, data shape problems in scraped or cached
//! tables, and local filesystem failures.

use std::path::PathBuf;

use thiserror::Error;

use crate::filter::FilterError;
use crate::instance::Format;
use crate::library::Library;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // ==================== Usage ====================
    #[error("instance {instance} does not support format {format}")]
    UnsupportedFormat { instance: String, format: Format },

    #[error("no file format specified and instance {instance} declares no formats")]
    NoFormats { instance: String },

    #[error("library {0} is not supported yet")]
    NotImplemented(Library),

    #[error("library {0} is not split into tagged collections")]
    NotACollection(Library),

    #[error("unknown library: {0}")]
    UnknownLibrary(String),

    #[error("unknown file format: {0}")]
    UnknownFormat(String),

    #[error("invalid filter: {0}")]
    Filter(#[from] FilterError),

    // ==================== Remote ====================
    #[error("GET {url} failed with HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("GET {url} timed out")]
    Timeout { url: String },

    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("no table found at {url}")]
    NoTable { url: String },

    // ==================== Data shape ====================
    #[error("missing column {column:?} in table")]
    MissingColumn { column: String },

    #[error("invalid value {value:?} in column {column} for row {row}")]
    InvalidValue {
        column: &'static str,
        row: String,
        value: String,
    },

    #[error("cache file {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    // ==================== Local ====================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to move {} into place: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decompress artifact for {}: {source}", path.display())]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache is locked by another process and no cached table exists at {}", path.display())]
    CacheUnavailable { path: PathBuf },
}

impl Error {
    /// Whether the error came from talking to the remote library website.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::HttpStatus { .. } | Self::Timeout { .. } | Self::Transport { .. } | Self::NoTable { .. }
        )
    }

    /// Whether the error is a caller mistake that no retry would fix.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. }
                | Self::NoFormats { .. }
                | Self::NotImplemented(_)
                | Self::NotACollection(_)
                | Self::UnknownLibrary(_)
                | Self::UnknownFormat(_)
                | Self::Filter(_)
        )
    }

    /// Whether the error describes a malformed scraped or cached table.
    pub fn is_data(&self) -> bool {
        matches!(
            self,
            Self::MissingColumn { .. } | Self::InvalidValue { .. } | Self::Csv { .. }
        )
    }
}
