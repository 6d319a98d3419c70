//! Error types for metadata parsing and discovery.
//!
//! A [`MetadataError`] is fatal to one mod only. Discovery records it against
//! the archive and moves on to the next one.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MetadataError>;

#[derive(Error, Debug)]
pub enum MetadataError {
    /// The package itself could not be read.
    #[error("Package error: {0}")]
    Package(#[from] lspk::PackageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The structured document is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A sidecar document could not be deserialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The structured document has no module node, or the module node has no UUID.
    #[error("Metadata document has no module identity")]
    MissingIdentity,

    /// Elements are not balanced, or a node is closed that was never opened.
    #[error("Malformed metadata document: {0}")]
    Malformed(String),

    #[error("Metadata document is not valid UTF-8")]
    Encoding,

    #[error("Invalid version: {0}")]
    InvalidVersion(String),
}

impl From<quick_xml::events::attributes::AttrError> for MetadataError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        MetadataError::Xml(err.into())
    }
}
