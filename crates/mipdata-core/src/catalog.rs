//! Lock-protected access to the cached metadata tables.
//!
//! [`Catalog`] owns a cache root and decides, under a cross-process lock,
//! whether a library's metadata table is read from disk or fetched again.
//! When another process holds the lock for longer than the configured
//! timeout, the catalog serves whatever table is already on disk instead of
//! failing.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::cache::{self, CacheLayout};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::html;
use crate::http::{HttpClient, UreqClient};
use crate::instance::Instance;
use crate::library::Library;
use crate::lock::{CacheLock, DEFAULT_LOCK_TIMEOUT};
use crate::normalize;
use crate::progress::{ProgressCallback, ProgressEvent};
use crate::table::CacheRow;

/// Cache root used when none is configured, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = ".mipdata";

/// Where the rows returned by [`Catalog::load_with_source`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSource {
    /// Fetched from the library website and written to the cache.
    Fetched,
    /// Read from the cache under the lock.
    Cached,
    /// Read from the cache without the lock, after the lock wait timed out.
    StaleFallback,
}

/// Entry point to instance metadata and artifacts below one cache root.
#[derive(Clone)]
pub struct Catalog {
    layout: CacheLayout,
    client: Arc<dyn HttpClient>,
    lock_timeout: Duration,
    progress: Option<ProgressCallback>,
}

impl Catalog {
    /// Open (creating if needed) the cache rooted at `root`.
    ///
    /// Relative roots are resolved against the current directory once, so
    /// later directory changes do not move the cache.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = std::path::absolute(root.as_ref())?;
        fs::create_dir_all(&root)?;
        debug!("Using cache root {}", root.display());
        Ok(Self {
            layout: CacheLayout::new(root),
            client: Arc::new(UreqClient::default()),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            progress: None,
        })
    }

    /// Open the cache at [`DEFAULT_CACHE_DIR`].
    pub fn open_default() -> Result<Self> {
        Self::open(DEFAULT_CACHE_DIR)
    }

    /// Replace the HTTP transport.
    #[must_use]
    pub fn with_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = client;
        self
    }

    /// Set how long to wait for another process holding the cache lock.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Set a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn cache_root(&self) -> &Path {
        self.layout.root()
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    /// Location of the cached metadata table of `library`.
    pub fn table_path(&self, library: Library) -> PathBuf {
        self.layout.table_path(library)
    }

    pub(crate) fn client(&self) -> &dyn HttpClient {
        self.client.as_ref()
    }

    pub(crate) fn notify(&self, event: ProgressEvent) {
        if let Some(callback) = &self.progress {
            callback(event);
        }
    }

    /// Load the instances of `library` that satisfy every filter.
    ///
    /// See [`load_with_source`](Self::load_with_source).
    pub fn load<S: AsRef<str>>(&self, library: Library, filters: &[S], refresh: bool) -> Result<Vec<Instance>> {
        self.load_with_source(library, filters, refresh)
            .map(|(instances, _)| instances)
    }

    /// Load the instances of `library` that satisfy every filter, and report
    /// where the metadata table came from.
    ///
    /// The table is fetched when `refresh` is set or nothing is cached yet,
    /// and read from the cache otherwise. If the cache lock cannot be taken
    /// within the lock timeout, the cached table is read as-is and a notice
    /// is emitted; this fails with [`Error::CacheUnavailable`] only when no
    /// cached table exists at all.
    #[instrument(level = "debug", skip_all, fields(library = %library, refresh = refresh))]
    pub fn load_with_source<S: AsRef<str>>(
        &self,
        library: Library,
        filters: &[S],
        refresh: bool,
    ) -> Result<(Vec<Instance>, TableSource)> {
        let filters = Filter::parse_all(filters)?;
        if !normalize::supports(library) {
            return Err(Error::NotImplemented(library));
        }

        let (rows, source) = self.resolve_table(library, refresh)?;

        let mut instances = Vec::new();
        for row in &rows {
            if Filter::matches_all(&filters, row)? {
                instances.push(normalize::build_instance(library, row)?);
            }
        }
        debug!(
            "{} of {} {library} instances selected ({source:?})",
            instances.len(),
            rows.len()
        );
        Ok((instances, source))
    }

    fn resolve_table(&self, library: Library, refresh: bool) -> Result<(Vec<CacheRow>, TableSource)> {
        let table_path = self.layout.table_path(library);
        let lock_path = self.layout.lock_path(library);

        let Some(_lock) = CacheLock::acquire(&lock_path, self.lock_timeout)? else {
            let message = format!(
                "Cache for {library} is locked by another process; using the table on disk"
            );
            warn!("{message}");
            self.notify(ProgressEvent::Notice { message });
            if !table_path.exists() {
                return Err(Error::CacheUnavailable { path: table_path });
            }
            return Ok((cache::read_table(&table_path)?, TableSource::StaleFallback));
        };

        if refresh || !table_path.exists() {
            let rows = self.fetch_table(library)?;
            cache::write_table(&table_path, &rows)?;
            Ok((rows, TableSource::Fetched))
        } else {
            debug!("Reading cached table {}", table_path.display());
            Ok((cache::read_table(&table_path)?, TableSource::Cached))
        }
    }

    fn fetch_table(&self, library: Library) -> Result<Vec<CacheRow>> {
        let url = library.table_url();
        let label = format!("{library} metadata");
        self.notify(ProgressEvent::Started {
            label: label.clone(),
            url: url.clone(),
        });

        let page = self.client.fetch_text(&url)?;
        let table = html::first_table(&page).ok_or_else(|| Error::NoTable { url: url.clone() })?;
        let rows = normalize::normalize(library, &table)?;

        info!("Fetched {} {library} instances from {url}", rows.len());
        self.notify(ProgressEvent::Finished {
            label,
            bytes: page.len() as u64,
        });
        Ok(rows)
    }
}
