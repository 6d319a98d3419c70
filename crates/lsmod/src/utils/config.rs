//! Application configuration management utilities.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;

/// Application-wide configuration stored in config.toml.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Directory scanned for `.pak` archives.
    pub mods_dir: Option<Utf8PathBuf>,
    /// JSON file holding user category overrides.
    pub overrides_path: Option<Utf8PathBuf>,
    /// The game's `Data` directory. Its sibling `bin` directory is searched for
    /// the runtime extension.
    pub game_data_dir: Option<Utf8PathBuf>,
    /// Whether the runtime extension was installed the last time we looked.
    pub extension_previously_deployed: bool,
}

impl AppConfig {
    /// The game's `bin` directory, next to `game_data_dir`.
    pub fn game_bin_dir(&self) -> Option<Utf8PathBuf> {
        let data_dir = self.game_data_dir.as_ref()?;
        data_dir.parent().map(|root| root.join("bin"))
    }
}

/// Returns the directory where the current executable resides.
pub fn install_dir() -> Option<Utf8PathBuf> {
    let exe = env::current_exe().ok()?;
    let parent = exe.parent()?;
    Utf8PathBuf::from_path_buf(parent.to_path_buf()).ok()
}

/// Returns a config file path located next to the executable.
pub fn config_path(file_name: &str) -> Option<Utf8PathBuf> {
    install_dir().map(|dir| dir.join(file_name))
}

/// Returns the default configuration file path (config.toml).
pub fn default_config_path() -> Option<Utf8PathBuf> {
    config_path("config.toml")
}

/// Loads the application configuration from config.toml.
/// Returns default configuration if file doesn't exist or cannot be parsed.
pub fn load_config() -> AppConfig {
    default_config_path()
        .map(|path| load_config_from(&path))
        .unwrap_or_default()
}

/// Loads configuration from an explicit path, falling back to defaults.
pub fn load_config_from(path: &Utf8Path) -> AppConfig {
    let Ok(content) = fs::read_to_string(path.as_std_path()) else {
        return AppConfig::default();
    };
    match toml::from_str(&content) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!("Ignoring unreadable config {}: {}", path, err);
            AppConfig::default()
        }
    }
}

/// Saves the application configuration to config.toml.
pub fn save_config(cfg: &AppConfig) -> io::Result<()> {
    let path = default_config_path().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Could not determine config path")
    })?;
    save_config_to(&path, cfg)
}

pub fn save_config_to(path: &Utf8Path, cfg: &AppConfig) -> io::Result<()> {
    let content = toml::to_string_pretty(cfg).map_err(io::Error::other)?;
    fs::write(path.as_std_path(), content)
}
