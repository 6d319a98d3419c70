//! Mod metadata for Larian packages.
//!
//! A mod's identity and description come from up to three places, in order of
//! trust: the `meta.lsx` document inside its package, an `info.json` sidecar
//! next to it, and finally its file name. This crate parses the first two,
//! merges them into a [`ModRecord`], and synthesizes a record from the file
//! name when neither yields an identity.
//!
//! # Example
//!
//! ```no_run
//! use lsmod_meta::{ModDiscovery, PackageFiles};
//! use camino::Utf8Path;
//!
//! # fn main() -> Result<(), lsmod_meta::MetadataError> {
//! let report = ModDiscovery::new(PackageFiles).discover_dir(Utf8Path::new("Mods"))?;
//! for record in &report.mods {
//!     println!("{} {} ({:?})", record.id, record.name, record.metadata_source);
//! }
//! # Ok(())
//! # }
//! ```

mod category;
pub mod discovery;
pub mod error;
pub mod identity;
pub mod lsx;
mod parse;
mod record;
pub mod sidecar;
mod version;

pub use category::{Category, Tier};
pub use discovery::{
    load_sidecar_for, read_mod_from_package, ArchiveAccess, DiscoveryFailure, DiscoveryProgress,
    DiscoveryReport, ModDiscovery, PackageFiles,
};
pub use error::{MetadataError, Result};
pub use lsx::ModuleInfo;
pub use parse::{merge, record_from_sidecar, synthesize_from_filename};
pub use record::{DependencyRef, MetadataSource, ModRecord};
pub use sidecar::SidecarMod;
pub use version::Version64;
