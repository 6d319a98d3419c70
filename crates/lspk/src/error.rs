//! Error types for package reading.
//!
//! Format errors are never partially trusted: a package whose header or file
//! table cannot be parsed fails to mount as a whole, and an entry whose
//! decompressed length differs from the declared size fails to extract.

use crate::CompressionMethod;
use std::io;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PackageError>;

#[derive(Error, Debug)]
pub enum PackageError {
    /// Reading the package or writing an extracted file failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("binrw error: {0}")]
    BinRw(#[from] binrw::Error),

    /// The header or file table is not something this reader understands.
    #[error("corrupt package header: {0}")]
    CorruptHeader(HeaderFault),

    #[error("entry not found: {0}")]
    EntryNotFound(String),

    #[error("failed to decompress '{name}': {source}")]
    Decompression {
        name: String,
        #[source]
        source: DecompressError,
    },

    /// The entry is stored in a secondary archive part (`<name>_1.pak`, ...).
    #[error("entry '{name}' lives in archive part {part}, which is not available")]
    ArchivePartUnavailable { name: String, part: u32 },

    #[error("entry path escapes the output directory: {0}")]
    UnsafePath(String),

    #[error("extraction cancelled")]
    Cancelled,
}

impl PackageError {
    /// Whether this error means the package itself is malformed, as opposed to
    /// an environmental failure.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            PackageError::CorruptHeader(_)
                | PackageError::Decompression { .. }
                | PackageError::BinRw(_)
        )
    }
}

/// Why a package header or file table was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderFault {
    #[error("bad magic {0:#010x}")]
    BadMagic(u32),

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),

    #[error("header is truncated")]
    Truncated,

    #[error("file table: {0}")]
    FileTable(String),
}

impl From<HeaderFault> for PackageError {
    fn from(fault: HeaderFault) -> Self {
        PackageError::CorruptHeader(fault)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecompressError {
    #[error("{method} data is corrupt: {reason}")]
    Corrupt {
        method: CompressionMethod,
        reason: String,
    },

    #[error("expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    /// The declared size cannot be produced from the stored bytes.
    #[error("declared size of {declared} bytes is implausible for {stored} stored bytes")]
    ImplausibleSize { declared: u64, stored: u64 },
}
