//! Local access to optimization benchmark libraries.
//!
//! `mipdata-core` scrapes the instance table a benchmark library publishes on
//! its website, normalizes it into typed [`Instance`] records, caches it as
//! CSV below a cache root and downloads instance files on demand.
//!
//! # Example
//!
//! ```no_run
//! use mipdata_core::{Catalog, DownloadRequest, Library};
//!
//! # fn main() -> mipdata_core::Result<()> {
//! let catalog = Catalog::open(".mipdata")?;
//! let mut instances = catalog.load(
//!     Library::MiplibBenchmark,
//!     &["n_vars < 1000", "'binary' in tags"],
//!     false,
//! )?;
//! for instance in &mut instances {
//!     let outcome = catalog.download(instance, &DownloadRequest::new())?;
//!     println!("{} -> {}", instance.name, outcome.path().display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Concurrent processes sharing a cache root coordinate through a lock file
//! per metadata table; see [`Catalog::load_with_source`] for what happens
//! under contention.

pub mod artifact;
pub mod cache;
pub mod catalog;
pub mod error;
pub mod filter;
pub mod html;
pub mod http;
pub mod instance;
pub mod library;
pub mod lock;
pub mod normalize;
pub mod progress;
pub mod table;

pub use artifact::{DownloadOutcome, DownloadRequest, Encoding};
pub use catalog::{Catalog, DEFAULT_CACHE_DIR, TableSource};
pub use error::{Error, Result};
pub use filter::{Filter, FilterError};
pub use http::{DEFAULT_HTTP_TIMEOUT, HttpClient, UreqClient};
pub use instance::{Format, Instance, OptimizationStatus, ProblemType, Status};
pub use library::{Family, Library};
pub use lock::DEFAULT_LOCK_TIMEOUT;
pub use progress::{ProgressCallback, ProgressEvent};
pub use table::{CacheRow, Column, RawTable};
