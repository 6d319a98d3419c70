use crate::errors::CliError;
use crate::utils::config::{self, AppConfig};
use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;
use colored::Colorize;
use lsmod_meta::Tier;
use lsmod_order::CategoryOverrides;
use miette::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigKey {
    ModsDir,
    OverridesPath,
    GameDataDir,
}

/// Print a config path entry with status indicator
fn print_path_config(
    name: &str,
    path: Option<&Utf8PathBuf>,
    validator: impl Fn(&Utf8Path) -> bool,
) {
    match path {
        Some(p) => {
            let status = if validator(p.as_path()) {
                "✓".bright_green()
            } else {
                "✗".bright_red()
            };
            println!("  {} {} {}", format!("{}:", name).bright_white(), p, status);
        }
        None => {
            println!(
                "  {} {}",
                format!("{}:", name).bright_white(),
                "(not set)".bright_yellow()
            );
        }
    }
}

pub fn show_config() -> Result<()> {
    let cfg = config::load_config();
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    println!();
    println!("  {} {}", "config_file:".bright_white(), config_path);

    print_path_config("mods_dir", cfg.mods_dir.as_ref(), |p| p.is_dir());
    print_path_config("overrides_path", cfg.overrides_path.as_ref(), |p| p.is_file());
    print_path_config("game_data_dir", cfg.game_data_dir.as_ref(), |p| p.is_dir());
    println!(
        "  {} {}",
        "extension_previously_deployed:".bright_white(),
        cfg.extension_previously_deployed
    );

    println!();
    Ok(())
}

pub fn set_config_value(key: ConfigKey, value: String) -> Result<()> {
    let mut cfg = config::load_config();
    apply_config_value(&mut cfg, key, Utf8PathBuf::from(value));
    config::save_config(&cfg).map_err(CliError::from)?;

    println!("  {}", "Configuration updated".bright_green());
    Ok(())
}

fn apply_config_value(cfg: &mut AppConfig, key: ConfigKey, value: Utf8PathBuf) {
    let slot = match key {
        ConfigKey::ModsDir => &mut cfg.mods_dir,
        ConfigKey::OverridesPath => &mut cfg.overrides_path,
        ConfigKey::GameDataDir => &mut cfg.game_data_dir,
    };
    *slot = Some(value);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TierArg {
    Framework,
    Gameplay,
    Content,
    Visual,
    LateLoader,
}

impl From<TierArg> for Tier {
    fn from(tier: TierArg) -> Self {
        match tier {
            TierArg::Framework => Tier::Framework,
            TierArg::Gameplay => Tier::Gameplay,
            TierArg::Content => Tier::Content,
            TierArg::Visual => Tier::Visual,
            TierArg::LateLoader => Tier::LateLoader,
        }
    }
}

/// Set or clear a category override. `tier == None` clears it.
pub fn set_category_override(id: String, tier: Option<TierArg>) -> Result<()> {
    let cfg = config::load_config();
    let path = cfg.overrides_path.ok_or(CliError::OverridesPathNotSet)?;

    let mut overrides = CategoryOverrides::load(&path).map_err(CliError::from)?;
    match tier {
        Some(tier) => {
            let tier = Tier::from(tier);
            overrides.set(id.clone(), tier);
            println!("  {} {} {}", id.bright_cyan(), "→".dimmed(), tier);
        }
        None => match overrides.clear(&id) {
            Some(previous) => println!(
                "  {} {}",
                id.bright_cyan(),
                format!("no longer forced to {}", previous).dimmed()
            ),
            None => println!("  {} {}", id.bright_cyan(), "had no override".dimmed()),
        },
    }
    overrides.save(&path).map_err(CliError::from)?;
    Ok(())
}
