//! Reader for Larian `LSPK` packages (`.pak`).
//!
//! A package starts with a fixed header declaring the format version and the
//! location of an LZ4-compressed file table. Each table row describes one
//! entry: its path, where its bytes live and how they are compressed. Entries
//! are either compressed individually (zlib, LZ4 block or zstd) or, in *solid*
//! packages, concatenated and compressed as a single stream.
//!
//! # Example
//!
//! ```no_run
//! use lspk::Package;
//! use std::fs::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut package = Package::mount_from_reader(File::open("Alpha.pak")?)?;
//! if let Some(meta) = package.find_by_suffix("meta.lsx").map(|e| e.name.clone()) {
//!     let bytes = package.extract(&meta)?;
//!     println!("{} bytes of metadata", bytes.len());
//! }
//! # Ok(())
//! # }
//! ```

use camino::Utf8Path;
use std::fs::File;
use std::io::{Read, Seek};

pub mod compression;
mod decoder;
mod entry;
pub mod error;
mod extractor;
mod header;
mod read;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;

pub use compression::{CompressionMethod, Framing};
pub use entry::PackageEntry;
pub use error::{DecompressError, HeaderFault, PackageError, Result};
pub use extractor::{ExtractProgress, ExtractReport, PackageExtractor};
pub use header::{PackageHeader, MAGIC, SUPPORTED_VERSIONS};

use decoder::SolidLayout;

/// A mounted package: the parsed header and file table plus the byte source
/// the entries are read from.
///
/// The index is immutable once mounted. Solid packages keep their decompressed
/// stream cached after the first extraction so that further entries are sliced
/// from memory instead of decompressing the whole stream again.
pub struct Package<TSource: Read + Seek> {
    header: PackageHeader,
    entries: Vec<PackageEntry>,

    solid: Option<SolidLayout>,
    solid_stream: Option<Box<[u8]>>,

    /// The original byte source.
    source: TSource,
}

impl<TSource: Read + Seek> std::fmt::Debug for Package<TSource> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("header", &self.header)
            .field("entries", &self.entries.len())
            .field("solid", &self.is_solid())
            .field("cached", &self.solid_stream.is_some())
            .finish_non_exhaustive()
    }
}

impl<TSource: Read + Seek> Package<TSource> {
    pub fn header(&self) -> &PackageHeader {
        &self.header
    }

    /// Entries in file table order.
    pub fn entries(&self) -> &[PackageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_solid(&self) -> bool {
        self.solid.is_some()
    }

    /// Look up an entry by its exact package-relative path.
    pub fn entry(&self, name: &str) -> Option<&PackageEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Find the first entry (in table order) whose path ends with `suffix`.
    ///
    /// Matching is case-sensitive. This is how metadata documents are located
    /// regardless of the folder they live in.
    pub fn find_by_suffix(&self, suffix: &str) -> Option<&PackageEntry> {
        self.entries.iter().find(|e| e.name.ends_with(suffix))
    }

    /// Drop the cached solid stream, if any.
    pub fn clear_cache(&mut self) {
        self.solid_stream = None;
    }

    pub fn into_inner(self) -> TSource {
        self.source
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| PackageError::EntryNotFound(name.to_string()))
    }
}

/// Open and mount the package at `path`.
pub fn open(path: impl AsRef<Utf8Path>) -> Result<Package<File>> {
    let file = File::open(path.as_ref().as_std_path())?;
    Package::mount_from_reader(file)
}

/// List every entry of the package at `path`.
///
/// The package is opened, indexed and closed again; nothing is cached between
/// calls.
pub fn list_entries(path: impl AsRef<Utf8Path>) -> Result<Vec<PackageEntry>> {
    Ok(open(path)?.entries)
}

/// Extract a single entry's decompressed bytes.
pub fn extract_entry(path: impl AsRef<Utf8Path>, name: &str) -> Result<Vec<u8>> {
    open(path)?.extract(name)
}

/// Extract every entry into `destination`, mirroring the package-relative paths.
///
/// Entries that fail are listed in the report; the rest are still written.
pub fn extract_all(
    path: impl AsRef<Utf8Path>,
    destination: impl AsRef<Utf8Path>,
) -> Result<ExtractReport> {
    let mut package = open(path)?;
    PackageExtractor::new(&mut package).extract_all(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::PackageWriter;
    use camino::Utf8PathBuf;

    #[test]
    fn test_path_based_operations() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let pak = root.join("Alpha.pak");

        PackageWriter::new(18)
            .with_entry("Mods/Alpha/meta.lsx", b"<save/>", CompressionMethod::Zlib)
            .with_entry("Public/Alpha/data.txt", b"payload", CompressionMethod::Lz4)
            .write_to(&pak)
            .unwrap();

        let entries = list_entries(&pak).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Mods/Alpha/meta.lsx");

        let bytes = extract_entry(&pak, "Public/Alpha/data.txt").unwrap();
        assert_eq!(bytes, b"payload");

        assert!(matches!(
            extract_entry(&pak, "missing.txt"),
            Err(PackageError::EntryNotFound(_))
        ));

        let out = root.join("out");
        let report = extract_all(&pak, &out).unwrap();
        assert_eq!(report.files_written.len(), 2);
        assert_eq!(
            std::fs::read(out.join("Mods/Alpha/meta.lsx")).unwrap(),
            b"<save/>"
        );
    }

    #[test]
    fn test_find_by_suffix_is_case_sensitive_and_first_wins() {
        let bytes = PackageWriter::new(18)
            .with_entry("Mods/First/meta.lsx", b"1", CompressionMethod::None)
            .with_entry("Mods/Second/meta.lsx", b"2", CompressionMethod::None)
            .with_entry("Mods/Third/META.LSX", b"3", CompressionMethod::None)
            .build()
            .unwrap();
        let package = Package::mount_from_reader(std::io::Cursor::new(bytes)).unwrap();

        assert_eq!(
            package.find_by_suffix("meta.lsx").unwrap().name,
            "Mods/First/meta.lsx"
        );
        assert_eq!(
            package.find_by_suffix("META.LSX").unwrap().name,
            "Mods/Third/META.LSX"
        );
        assert!(package.find_by_suffix("Meta.lsx").is_none());
    }
}
