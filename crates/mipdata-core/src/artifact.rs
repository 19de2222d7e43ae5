//! Idempotent, crash-safe artifact downloads.
//!
//! Bytes only ever land in temporary files next to the final path. The
//! final path is replaced by a single rename once the transfer (and any
//! decompression) succeeded, so a failed or interrupted download leaves
//! whatever was there before untouched.

use std::ffi::OsStr;
use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::instance::{Format, Instance};
use crate::library::{Family, Library};
use crate::progress::ProgressEvent;

/// Transfer encoding a library applies to the artifacts it serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Identity,
    Gzip,
}

impl Encoding {
    /// Encoding used by `library`, if its artifacts can be downloaded.
    pub fn for_library(library: Library) -> Result<Self> {
        match library.family() {
            Family::Miplib => Ok(Self::Gzip),
            Family::Minlplib | Family::Qplib => Err(Error::NotImplemented(library)),
        }
    }

    /// Suffix appended to the plain artifact URL.
    pub fn url_suffix(self) -> &'static str {
        match self {
            Self::Identity => "",
            Self::Gzip => ".gz",
        }
    }
}

/// Options for [`Catalog::download`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Format to fetch; defaults to the first format the instance declares.
    pub format: Option<Format>,
    /// Download again even if the artifact is already on disk.
    pub refresh: bool,
    /// Extra directory level between the family and format directories.
    pub subdir: Option<String>,
}

impl DownloadRequest {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    #[must_use]
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    #[must_use]
    pub fn subdir(mut self, subdir: impl Into<String>) -> Self {
        self.subdir = Some(subdir.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The artifact was fetched and moved into place.
    Downloaded(PathBuf),
    /// The artifact already existed and nothing was fetched.
    AlreadyPresent(PathBuf),
}

impl DownloadOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Downloaded(path) | Self::AlreadyPresent(path) => path,
        }
    }

    pub fn was_downloaded(&self) -> bool {
        matches!(self, Self::Downloaded(_))
    }
}

/// Pick the format to download: the requested one if the instance offers
/// it, else the instance's first format.
pub(crate) fn target_format(instance: &Instance, requested: Option<Format>) -> Result<Format> {
    match requested {
        Some(format) if instance.formats.contains(&format) => Ok(format),
        Some(format) => Err(Error::UnsupportedFormat {
            instance: instance.name.clone(),
            format,
        }),
        None => instance.formats.first().copied().ok_or_else(|| Error::NoFormats {
            instance: instance.name.clone(),
        }),
    }
}

fn has_extension(path: &Path, format: Format) -> bool {
    path.extension().and_then(OsStr::to_str) == Some(format.extension())
}

impl Catalog {
    /// Make sure the artifact of `instance` is on disk and record its path.
    ///
    /// A path of another format is deleted first. When the target file
    /// already exists and `refresh` is off, nothing is fetched.
    #[instrument(level = "debug", skip_all, fields(library = %instance.library, instance = %instance.name))]
    pub fn download(&self, instance: &mut Instance, request: &DownloadRequest) -> Result<DownloadOutcome> {
        let format = target_format(instance, request.format)?;
        let encoding = Encoding::for_library(instance.library)?;

        if let Some(existing) = instance.path.as_deref()
            && !has_extension(existing, format)
        {
            debug!("Discarding {} for format {format}", existing.display());
            instance.remove()?;
        }

        let path = match &instance.path {
            Some(path) => path.clone(),
            None => self.layout().artifact_path(
                instance.library,
                request.subdir.as_deref(),
                &instance.name,
                format,
            )?,
        };

        if path.exists() && !request.refresh {
            let message = format!("{} already exists, skipping download", path.display());
            warn!("{message}");
            self.notify(ProgressEvent::Notice { message });
            instance.path = Some(path.clone());
            return Ok(DownloadOutcome::AlreadyPresent(path));
        }

        let url = format!(
            "{}{}",
            instance.library.download_url(&instance.name, format),
            encoding.url_suffix()
        );
        let label = format!("{}.{format}", instance.name);
        self.notify(ProgressEvent::Started {
            label: label.clone(),
            url: url.clone(),
        });

        let bytes = self.fetch_artifact(&url, &path, encoding)?;
        instance.path = Some(path.clone());

        info!("Downloaded {} ({bytes} bytes)", path.display());
        self.notify(ProgressEvent::Finished { label, bytes });
        Ok(DownloadOutcome::Downloaded(path))
    }

    /// Attach the artifact path to `instance` if the artifact is already on
    /// disk at its computed location. Returns that path.
    pub fn locate(
        &self,
        instance: &mut Instance,
        format: Option<Format>,
        subdir: Option<&str>,
    ) -> Result<Option<PathBuf>> {
        let format = target_format(instance, format)?;
        let path = self
            .layout()
            .artifact_path(instance.library, subdir, &instance.name, format)?;
        if path.is_file() {
            instance.path = Some(path.clone());
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }

    /// Fetch `url` into `path` through temporary siblings, decoding as needed.
    /// Returns the size of the file moved into place.
    fn fetch_artifact(&self, url: &str, path: &Path, encoding: Encoding) -> Result<u64> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let mut received = NamedTempFile::new_in(parent)?;
        self.client().fetch(url, received.as_file_mut())?;

        let finished = match encoding {
            Encoding::Identity => received,
            Encoding::Gzip => {
                let mut decoded = NamedTempFile::new_in(parent)?;
                let mut decoder = MultiGzDecoder::new(BufReader::new(received.reopen()?));
                io::copy(&mut decoder, decoded.as_file_mut()).map_err(|source| Error::Decompress {
                    path: path.to_path_buf(),
                    source,
                })?;
                decoded
            }
        };

        finished.as_file().sync_all()?;
        let bytes = finished.as_file().metadata()?.len();
        finished.persist(path).map_err(|e| Error::Persist {
            path: path.to_path_buf(),
            source: e.error,
        })?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpClient;
    use crate::instance::tests::sample_instance;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Body(&'static [u8]);

    impl HttpClient for Body {
        fn fetch(&self, _url: &str, sink: &mut dyn Write) -> Result<u64> {
            sink.write_all(self.0)?;
            Ok(self.0.len() as u64)
        }
    }

    #[test]
    fn test_target_format() {
        let mut instance = sample_instance();
        assert_eq!(target_format(&instance, None).unwrap(), Format::Mps);
        assert_eq!(target_format(&instance, Some(Format::Mps)).unwrap(), Format::Mps);
        assert!(matches!(
            target_format(&instance, Some(Format::Lp)),
            Err(Error::UnsupportedFormat { format: Format::Lp, .. })
        ));

        instance.formats.clear();
        assert!(matches!(target_format(&instance, None), Err(Error::NoFormats { .. })));
    }

    #[test]
    fn test_encoding_per_family() {
        assert_eq!(Encoding::for_library(Library::MiplibCollection).unwrap(), Encoding::Gzip);
        assert!(matches!(
            Encoding::for_library(Library::Minlplib),
            Err(Error::NotImplemented(Library::Minlplib))
        ));
        assert_eq!(Encoding::Gzip.url_suffix(), ".gz");
    }

    #[test]
    fn test_identity_artifact_is_renamed_into_place() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::open(dir.path())
            .unwrap()
            .with_client(Arc::new(Body(b"NAME plain\nENDATA\n")));
        let path = dir.path().join("lp/plain.lp");

        let bytes = catalog
            .fetch_artifact("http://example.invalid/plain.lp", &path, Encoding::Identity)
            .unwrap();
        assert_eq!(bytes, 18);
        assert_eq!(fs::read(&path).unwrap(), b"NAME plain\nENDATA\n");
        assert_eq!(fs::read_dir(dir.path().join("lp")).unwrap().count(), 1);
    }

    #[test]
    fn test_corrupt_gzip_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::open(dir.path())
            .unwrap()
            .with_client(Arc::new(Body(b"definitely not gzip")));
        let mut instance = sample_instance();

        let err = catalog.download(&mut instance, &DownloadRequest::new()).unwrap_err();
        assert!(matches!(err, Error::Decompress { .. }));
        assert!(instance.path.is_none());

        let mps_dir = dir.path().join("miplib/mps");
        assert_eq!(fs::read_dir(&mps_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_locate_attaches_existing_artifact() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::open(dir.path()).unwrap();
        let mut instance = sample_instance();

        assert_eq!(catalog.locate(&mut instance, None, None).unwrap(), None);
        assert!(instance.path.is_none());

        let path = dir.path().join("miplib/mps/air05.mps");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"NAME air05").unwrap();

        assert_eq!(catalog.locate(&mut instance, None, None).unwrap(), Some(path.clone()));
        assert_eq!(instance.path(), Some(path.as_path()));
    }
}
