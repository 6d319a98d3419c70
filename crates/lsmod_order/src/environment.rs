//! Inspecting the game installation for things validation needs to know.
//!
//! These functions do the filesystem access so that
//! [`validate`](crate::validate) itself stays pure.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

/// Loader file the runtime extension installs next to the game executable.
pub const EXTENSION_LOADER: &str = "DWrite.dll";

/// Loose directories under the game's `Data` directory that override packaged
/// content and break mods.
const HAZARDOUS_DATA_DIRS: &[(&str, &str)] = &[
    (
        "Mods",
        "Loose Mods folder in the game data directory overrides packaged mods",
    ),
    (
        "Public",
        "Loose Public folder in the game data directory overrides packaged content",
    ),
];

/// The runtime extension as found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionStatus {
    pub loader_path: Utf8PathBuf,
}

/// Look for the runtime extension loader in the game's `bin` directory.
pub fn detect_runtime_extension(bin_dir: &Utf8Path) -> Option<ExtensionStatus> {
    let loader_path = bin_dir.join(EXTENSION_LOADER);
    if loader_path.as_std_path().is_file() {
        tracing::debug!("Runtime extension loader found at {}", loader_path);
        Some(ExtensionStatus { loader_path })
    } else {
        None
    }
}

/// A problematic directory found in the game installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentHazard {
    pub path: Utf8PathBuf,
    pub description: String,
}

/// Known-problematic loose directories under `data_dir`.
pub fn detect_environment_hazards(data_dir: &Utf8Path) -> Vec<EnvironmentHazard> {
    HAZARDOUS_DATA_DIRS
        .iter()
        .map(|(name, description)| (data_dir.join(name), description))
        .filter(|(path, _)| path.as_std_path().is_dir())
        .map(|(path, description)| EnvironmentHazard {
            path,
            description: description.to_string(),
        })
        .collect()
}
