//! On-disk layout of the cache directory and metadata table I/O.
//!
//! ```text
//! <root>/
//!   miplib/
//!     benchmark/instances.csv     metadata table of one collection
//!     benchmark/instances.lock    its lock file
//!     [subdir/]mps/air05.mps      artifacts, shared by all collections
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::instance::Format;
use crate::library::Library;
use crate::table::{CacheRow, Column};

const TABLE_FILE: &str = "instances.csv";
const LOCK_EXTENSION: &str = "lock";

/// Paths inside a cache root. Computing a path performs no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a library family, without any collection tag.
    pub fn family_dir(&self, library: Library) -> PathBuf {
        self.root.join(library.family().as_str())
    }

    /// Directory holding the metadata table of `library`.
    pub fn library_dir(&self, library: Library) -> PathBuf {
        let dir = self.family_dir(library);
        match library.tag() {
            Ok(tag) => dir.join(tag),
            Err(_) => dir,
        }
    }

    pub fn table_path(&self, library: Library) -> PathBuf {
        self.library_dir(library).join(TABLE_FILE)
    }

    /// Lock file guarding [`table_path`](Self::table_path).
    pub fn lock_path(&self, library: Library) -> PathBuf {
        self.table_path(library).with_extension(LOCK_EXTENSION)
    }

    /// Final location of an artifact: `<family>[/<subdir>]/<fmt>/<name>.<fmt>`.
    ///
    /// Fails with [`Error::InvalidValue`] when `name` is not a single plain
    /// path component.
    pub fn artifact_path(
        &self,
        library: Library,
        subdir: Option<&str>,
        name: &str,
        format: Format,
    ) -> Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(Error::InvalidValue {
                column: Column::Name.as_str(),
                row: name.to_owned(),
                value: name.to_owned(),
            });
        }
        let mut dir = self.family_dir(library);
        if let Some(subdir) = subdir.filter(|s| !s.is_empty()) {
            dir.push(subdir);
        }
        Ok(dir
            .join(format.extension())
            .join(format!("{name}.{}", format.extension())))
    }
}

/// Atomically replace the metadata table at `path` with `rows`.
///
/// The table is written to a temporary file in the same directory, flushed
/// and renamed over `path`, so readers see either the old or the new table.
pub fn write_table(path: &Path, rows: &[CacheRow]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file_mut());
        let csv_error = |source| Error::Csv {
            path: path.to_path_buf(),
            source,
        };
        writer
            .write_record(Column::ALL.iter().map(|c| c.as_str()))
            .map_err(csv_error)?;
        for row in rows {
            writer.serialize(row).map_err(csv_error)?;
        }
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    tmp.persist(path).map_err(|e| Error::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    tracing::debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Read the metadata table at `path`.
pub fn read_table(path: &Path) -> Result<Vec<CacheRow>> {
    let csv_error = |source| Error::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;

    let headers = reader.headers().map_err(csv_error)?.clone();
    for column in Column::ALL {
        if !headers.iter().any(|h| h == column.as_str()) {
            return Err(Error::MissingColumn {
                column: column.as_str().to_owned(),
            });
        }
    }

    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<CacheRow>, _>>()
        .map_err(csv_error)?;
    tracing::debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{OptimizationStatus, ProblemType};
    use tempfile::TempDir;

    fn rows() -> Vec<CacheRow> {
        vec![
            CacheRow {
                name: "air05".into(),
                status: "easy".into(),
                n_vars: 7195,
                n_bins: 7195,
                n_ints: 0,
                n_conts: 0,
                n_cons: 426,
                n_nz: 52121,
                group: None,
                primal: Some(26374.0),
                tags: "benchmark binary \"set covering\"".into(),
                problem_type: ProblemType::Blp,
                optimization_status: OptimizationStatus::Optimal,
            },
            CacheRow {
                name: "neos-3754480-nidda".into(),
                status: "open".into(),
                n_vars: 253,
                n_bins: 50,
                n_ints: 0,
                n_conts: 203,
                n_cons: 402,
                n_nz: 1488,
                group: Some("neos-pseudoapplication-19".into()),
                primal: Some(12941.7),
                tags: String::new(),
                problem_type: ProblemType::Mblp,
                optimization_status: OptimizationStatus::Feasible,
            },
        ]
    }

    #[test]
    fn test_layout_partitions_by_family_and_tag() {
        let layout = CacheLayout::new("/cache");
        assert_eq!(
            layout.table_path(Library::MiplibBenchmark),
            Path::new("/cache/miplib/benchmark/instances.csv")
        );
        assert_eq!(
            layout.lock_path(Library::MiplibCollection),
            Path::new("/cache/miplib/collection/instances.lock")
        );
        assert_eq!(
            layout.table_path(Library::Qplib),
            Path::new("/cache/qplib/instances.csv")
        );
    }

    #[test]
    fn test_artifact_path() {
        let layout = CacheLayout::new("/cache");
        assert_eq!(
            layout.artifact_path(Library::MiplibBenchmark, None, "air05", Format::Mps).unwrap(),
            Path::new("/cache/miplib/mps/air05.mps")
        );
        assert_eq!(
            layout.artifact_path(Library::MiplibCollection, Some("run1"), "air05", Format::Lp).unwrap(),
            Path::new("/cache/miplib/run1/lp/air05.lp")
        );
        assert_eq!(
            layout.artifact_path(Library::MiplibCollection, Some(""), "air05", Format::Lp).unwrap(),
            Path::new("/cache/miplib/lp/air05.lp")
        );
    }

    #[test]
    fn test_artifact_path_rejects_names_leaving_the_tree() {
        let layout = CacheLayout::new("/cache");
        for name in ["../../escaped", "a/b", "a\\b", "..", ""] {
            let err = layout
                .artifact_path(Library::MiplibBenchmark, None, name, Format::Mps)
                .unwrap_err();
            assert!(matches!(err, Error::InvalidValue { column: "name", .. }), "{name}");
        }
        assert!(
            layout
                .artifact_path(Library::MiplibBenchmark, None, "neos-3754480-nidda", Format::Mps)
                .is_ok()
        );
    }

    #[test]
    fn test_table_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("miplib/benchmark/instances.csv");
        write_table(&path, &rows()).unwrap();

        let header = fs::read_to_string(&path).unwrap();
        assert!(header.starts_with(
            "name,status,n_vars,n_bins,n_ints,n_conts,n_cons,n_nz,group,primal,tags,type,optimization_status\n"
        ));
        assert_eq!(read_table(&path).unwrap(), rows());
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("instances.csv");
        write_table(&path, &[]).unwrap();
        assert!(fs::read_to_string(&path).unwrap().starts_with("name,status,"));
        assert!(read_table(&path).unwrap().is_empty());
    }

    #[test]
    fn test_rewrite_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("instances.csv");
        write_table(&path, &rows()).unwrap();
        write_table(&path, &rows()[..1]).unwrap();

        assert_eq!(read_table(&path).unwrap().len(), 1);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_foreign_file_is_a_data_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("instances.csv");
        fs::write(&path, "Instance,Status\nair05,easy\n").unwrap();
        let err = read_table(&path).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { .. }));
        assert!(err.is_data());
    }
}
