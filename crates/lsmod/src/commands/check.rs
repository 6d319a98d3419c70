use super::mods::{
    build_load_order, detect_environment, discover_mods, load_overrides, read_order_file,
    resolve_mods_dir,
};
use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::{load_config, save_config};
use crate::utils::severity_label;
use camino::Utf8PathBuf;
use colored::Colorize;
use itertools::Itertools;
use lsmod_order::{Fingerprint, FingerprintCheck, Severity, SuggestedAction, Warning};
use miette::{IntoDiagnostic, Result};

pub struct CheckModsArgs {
    pub mods_dir: Option<String>,
    pub order_file: Option<String>,
    pub fingerprint: Option<String>,
    pub json: bool,
}

pub fn check_mods(args: CheckModsArgs) -> Result<()> {
    let mut config = load_config();
    let mods_dir = resolve_mods_dir(args.mods_dir, &config)?;
    let overrides = load_overrides(&config)?;

    let mut environment = detect_environment(&config);
    if let Some(path) = &args.order_file {
        let order_file = read_order_file(Utf8PathBuf::from(path).as_path())?;
        if let Some(stored) = &args.fingerprint {
            let stored = Fingerprint::from_hex(stored).map_err(CliError::from)?;
            environment.fingerprint = Some(FingerprintCheck {
                stored,
                current: order_file.fingerprint,
            });
        }
        environment.recorded_order = order_file.ids;
    } else if args.fingerprint.is_some() {
        tracing::warn!("--fingerprint has no effect without --order-file");
    }

    let extension_deployed = environment.runtime_extension.is_some();
    let records = discover_mods(&mods_dir)?;
    let order = build_load_order(records, overrides, environment)?;

    if args.json {
        let json = serde_json::to_string_pretty(order.warnings()).into_diagnostic()?;
        println!("{}", json);
    } else {
        print_warnings(order.warnings(), order.active().len());
    }

    if config.game_data_dir.is_some() && config.extension_previously_deployed != extension_deployed
    {
        config.extension_previously_deployed = extension_deployed;
        if let Err(err) = save_config(&config) {
            tracing::warn!("Failed to remember runtime extension state: {}", err);
        }
    }

    let critical = order
        .warnings()
        .iter()
        .filter(|w| w.severity == Severity::Critical)
        .count();
    if critical > 0 {
        return Err(CliError::CriticalProblems { count: critical }.into());
    }
    Ok(())
}

fn print_warnings(warnings: &[Warning], active_count: usize) {
    println_pad!(
        "{} {}",
        "🩺 Checked".bright_blue().bold(),
        format!("{} active mod(s)", active_count).bright_cyan().bold()
    );

    if warnings.is_empty() {
        println_pad!("{}", "✅ No problems found".bright_green().bold());
        return;
    }

    println_pad!("");
    for warning in warnings {
        println_pad!(
            "{} {} {}",
            severity_label(warning.severity),
            format!("[{}]", warning.category).dimmed(),
            warning.message.bright_white()
        );
        if !warning.affected_ids.is_empty() {
            println_pad!(
                "   {} {}",
                "mods:".dimmed(),
                warning.affected_ids.iter().join(", ").dimmed()
            );
        }
        if let Some(action) = &warning.suggested_action {
            println_pad!("   {} {}", "→".bright_cyan(), describe_action(action));
        }
    }
}

fn describe_action(action: &SuggestedAction) -> String {
    match action {
        SuggestedAction::Reorder => "Sort the load order (lsmod order)".to_string(),
        SuggestedAction::Activate(id) => format!("Activate {}", id),
        SuggestedAction::Deactivate(id) => format!("Deactivate {}", id),
        SuggestedAction::Install(name) => format!("Install {}", name),
        SuggestedAction::Delete(path) => format!("Delete {}", path),
        SuggestedAction::Remove(id) => format!("Remove {} from the load order", id),
        SuggestedAction::Review => "Review manually".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_action() {
        assert_eq!(
            describe_action(&SuggestedAction::Activate("a".into())),
            "Activate a"
        );
        assert_eq!(
            describe_action(&SuggestedAction::Delete(Utf8PathBuf::from("Data/Mods"))),
            "Delete Data/Mods"
        );
    }
}
