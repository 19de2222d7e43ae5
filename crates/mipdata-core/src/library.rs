//! Static facts about the supported benchmark libraries.
//!
//! Nothing here performs I/O: a [`Library`] only knows where its metadata
//! table and artifacts live and how its cache directory is partitioned.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::instance::Format;

/// Group of libraries published by the same site with the same conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Miplib,
    Minlplib,
    Qplib,
}

impl Family {
    /// Directory name used to partition the cache.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Miplib => "miplib",
            Self::Minlplib => "minlplib",
            Self::Qplib => "qplib",
        }
    }

    pub fn website(self) -> &'static str {
        match self {
            Self::Miplib => "https://miplib.zib.de/",
            Self::Minlplib => "http://www.minlplib.org/",
            Self::Qplib => "http://www.qplib.de/",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A benchmark library, or one tagged collection of a library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Library {
    /// The MIPLIB 2017 benchmark set.
    MiplibBenchmark,
    /// The full MIPLIB 2017 collection.
    MiplibCollection,
    Minlplib,
    Qplib,
}

impl Library {
    pub const ALL: [Library; 4] = [
        Library::MiplibBenchmark,
        Library::MiplibCollection,
        Library::Minlplib,
        Library::Qplib,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MiplibBenchmark => "miplib_benchmark",
            Self::MiplibCollection => "miplib_collection",
            Self::Minlplib => "minlplib",
            Self::Qplib => "qplib",
        }
    }

    pub fn family(self) -> Family {
        match self {
            Self::MiplibBenchmark | Self::MiplibCollection => Family::Miplib,
            Self::Minlplib => Family::Minlplib,
            Self::Qplib => Family::Qplib,
        }
    }

    /// Whether the library is one of several tagged collections sharing a family.
    pub fn is_collection(self) -> bool {
        self.family() == Family::Miplib
    }

    /// Collection tag, used both in the metadata URL and the cache layout.
    pub fn tag(self) -> Result<&'static str, Error> {
        match self {
            Self::MiplibBenchmark => Ok("benchmark"),
            Self::MiplibCollection => Ok("collection"),
            Self::Minlplib | Self::Qplib => Err(Error::NotACollection(self)),
        }
    }

    pub fn website(self) -> &'static str {
        self.family().website()
    }

    /// Page whose first `<table>` lists the library's instances.
    pub fn table_url(self) -> String {
        match self.tag() {
            Ok(tag) => format!("{}tag_{tag}.html", self.website()),
            Err(_) => format!("{}instances.html", self.website()),
        }
    }

    /// Remote location of an instance's problem file, before any
    /// transfer encoding the library applies.
    pub fn download_url(self, name: &str, format: Format) -> String {
        let website = self.website();
        let ext = format.extension();
        match self.family() {
            Family::Miplib => format!("{website}WebData/instances/{name}.{ext}"),
            Family::Minlplib => format!("{website}{ext}/{name}.{ext}"),
            Family::Qplib => format!("{website}{ext}/QPLIB_{name}.{ext}"),
        }
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Library {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|library| library.as_str() == normalized)
            .ok_or_else(|| Error::UnknownLibrary(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_display() {
        for library in Library::ALL {
            assert_eq!(library.to_string().parse::<Library>().unwrap(), library);
        }
        assert_eq!(
            "MIPLIB-Benchmark".parse::<Library>().unwrap(),
            Library::MiplibBenchmark
        );
        assert!(matches!("cblib".parse::<Library>(), Err(Error::UnknownLibrary(_))));
    }

    #[test]
    fn test_miplib_variants_share_a_family() {
        assert_eq!(Library::MiplibBenchmark.family(), Family::Miplib);
        assert_eq!(Library::MiplibCollection.family(), Family::Miplib);
        assert_eq!(Library::MiplibCollection.family().as_str(), "miplib");
        assert_eq!(Library::Qplib.family().as_str(), "qplib");
    }

    #[test]
    fn test_tag_requires_a_collection() {
        assert_eq!(Library::MiplibBenchmark.tag().unwrap(), "benchmark");
        assert_eq!(Library::MiplibCollection.tag().unwrap(), "collection");
        assert!(Library::MiplibBenchmark.is_collection());
        assert!(!Library::Minlplib.is_collection());
        assert!(matches!(
            Library::Minlplib.tag(),
            Err(Error::NotACollection(Library::Minlplib))
        ));
    }

    #[test]
    fn test_table_urls() {
        assert_eq!(
            Library::MiplibBenchmark.table_url(),
            "https://miplib.zib.de/tag_benchmark.html"
        );
        assert_eq!(
            Library::MiplibCollection.table_url(),
            "https://miplib.zib.de/tag_collection.html"
        );
        assert_eq!(Library::Minlplib.table_url(), "http://www.minlplib.org/instances.html");
        assert_eq!(Library::Qplib.table_url(), "http://www.qplib.de/instances.html");
    }

    #[test]
    fn test_download_urls() {
        assert_eq!(
            Library::MiplibBenchmark.download_url("air05", Format::Mps),
            "https://miplib.zib.de/WebData/instances/air05.mps"
        );
        assert_eq!(
            Library::Minlplib.download_url("ex1221", Format::Lp),
            "http://www.minlplib.org/lp/ex1221.lp"
        );
        assert_eq!(
            Library::Qplib.download_url("0018", Format::Lp),
            "http://www.qplib.de/lp/QPLIB_0018.lp"
        );
    }
}
