//! Shared steps of the `order` and `check` commands: finding the mods,
//! building the load order and inspecting the game installation.

use crate::errors::CliError;
use crate::utils::config::AppConfig;
use camino::{Utf8Path, Utf8PathBuf};
use lsmod_meta::{ModDiscovery, ModRecord, PackageFiles};
use lsmod_order::{
    detect_environment_hazards, detect_runtime_extension, CategoryOverrides, Environment,
    Fingerprint, LoadOrder,
};

/// The mods directory from the command line, or from config.toml.
pub fn resolve_mods_dir(
    arg: Option<String>,
    config: &AppConfig,
) -> Result<Utf8PathBuf, CliError> {
    let dir = arg
        .map(Utf8PathBuf::from)
        .or_else(|| config.mods_dir.clone())
        .ok_or(CliError::ModsDirNotSet)?;
    if !dir.as_std_path().is_dir() {
        return Err(CliError::file_not_found(dir));
    }
    Ok(dir)
}

pub fn load_overrides(config: &AppConfig) -> Result<CategoryOverrides, CliError> {
    match &config.overrides_path {
        Some(path) => Ok(CategoryOverrides::load(path)?),
        None => Ok(CategoryOverrides::default()),
    }
}

/// Read every archive in `dir`. Archives that fail are reported and skipped.
pub fn discover_mods(dir: &Utf8Path) -> Result<Vec<ModRecord>, CliError> {
    let report = ModDiscovery::new(PackageFiles)
        .with_progress(|progress| {
            tracing::debug!(
                "[{}/{}] {}",
                progress.current,
                progress.total,
                progress.current_archive
            );
        })
        .discover_dir(dir)?;

    for failure in &report.failures {
        tracing::warn!("Skipped {}: {}", failure.archive, failure.error);
    }
    tracing::info!(
        "Discovered {} mod(s) in {}, {} failed",
        report.mods.len(),
        dir,
        report.failures.len()
    );
    Ok(report.mods)
}

/// A recorded load order: one mod id per line. Blank lines and lines
/// starting with `#` are ignored.
pub struct OrderFile {
    pub ids: Vec<String>,
    pub fingerprint: Fingerprint,
}

pub fn read_order_file(path: &Utf8Path) -> Result<OrderFile, CliError> {
    if !path.as_std_path().is_file() {
        return Err(CliError::file_not_found(path));
    }
    let bytes = std::fs::read(path.as_std_path())?;
    let ids = parse_order_ids(&String::from_utf8_lossy(&bytes));
    Ok(OrderFile {
        ids,
        fingerprint: Fingerprint::of(&bytes),
    })
}

fn parse_order_ids(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Render ids in the format [`read_order_file`] reads.
pub fn render_order_ids(ids: &[String]) -> String {
    let mut content = ids.join("\n");
    content.push('\n');
    content
}

/// Inspect the game installation named in the config.
pub fn detect_environment(config: &AppConfig) -> Environment {
    let runtime_extension = config
        .game_bin_dir()
        .and_then(|bin| detect_runtime_extension(&bin));
    let hazards = config
        .game_data_dir
        .as_deref()
        .map(detect_environment_hazards)
        .unwrap_or_default();

    Environment {
        runtime_extension,
        extension_previously_deployed: config.extension_previously_deployed,
        hazards,
        ..Default::default()
    }
}

/// Build the load order: the recorded ids that are installed become active
/// in recorded order, or every discovered mod when nothing was recorded.
pub fn build_load_order(
    records: Vec<ModRecord>,
    overrides: CategoryOverrides,
    environment: Environment,
) -> Result<LoadOrder, CliError> {
    let activate: Vec<String> = if environment.recorded_order.is_empty() {
        records.iter().map(|record| record.id.clone()).collect()
    } else {
        environment.recorded_order.clone()
    };

    let mut order = LoadOrder::from_records(records, overrides, environment);
    for id in &activate {
        if order.mods().contains(id) {
            order.activate(id, None)?;
        }
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsmod_meta::{DependencyRef, MetadataSource};

    #[test]
    fn test_parse_order_ids() {
        let ids = parse_order_ids("# saved order\nb\n\n  a  \r\n");
        assert_eq!(ids, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(
            parse_order_ids(&render_order_ids(&ids)),
            vec!["b".to_string(), "a".to_string()]
        );
    }

    #[test]
    fn test_build_load_order_follows_recorded_order() {
        let a = ModRecord::new("a", "Alpha", MetadataSource::Embedded)
            .with_dependency(DependencyRef::new("b"));
        let b = ModRecord::new("b", "Beta", MetadataSource::Embedded);
        let c = ModRecord::new("c", "Gamma", MetadataSource::Embedded);

        let environment = Environment {
            recorded_order: vec!["b".into(), "a".into(), "gone".into()],
            ..Default::default()
        };
        let order =
            build_load_order(vec![a, b, c], CategoryOverrides::default(), environment).unwrap();

        let active: Vec<&str> = order.active().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(active, vec!["b", "a"]);
        assert_eq!(order.inactive().len(), 1);
        assert!(order
            .warnings()
            .iter()
            .any(|w| w.affected_ids.contains("gone")));
    }

    #[test]
    fn test_build_load_order_activates_everything_without_record() {
        let a = ModRecord::new("a", "Alpha", MetadataSource::Embedded);
        let b = ModRecord::new("b", "Beta", MetadataSource::Embedded);
        let order = build_load_order(
            vec![a, b],
            CategoryOverrides::default(),
            Environment::default(),
        )
        .unwrap();

        assert_eq!(order.active().len(), 2);
        assert!(order.inactive().is_empty());
    }
}
