use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::load_config;
use camino::Utf8Path;
use colored::Colorize;
use itertools::Itertools;
use lsmod_meta::{load_sidecar_for, read_mod_from_package, MetadataError, PackageFiles};
use lsmod_order::infer_category;
use miette::{IntoDiagnostic, Result};
use serde_json::to_string_pretty;

use super::mods::load_overrides;

pub struct InfoPackageArgs {
    pub file_path: String,
}

pub fn info_package(args: InfoPackageArgs) -> Result<()> {
    let file_path = Utf8Path::new(&args.file_path);
    if !file_path.exists() {
        return Err(CliError::file_not_found(file_path).into());
    }

    let sidecar = load_sidecar_for(file_path);
    let mut record =
        read_mod_from_package(&PackageFiles, file_path, sidecar.as_ref()).map_err(|e| match e {
            MetadataError::Package(source) => CliError::package(file_path, source),
            other => CliError::from(other),
        })?;
    let overrides = load_overrides(&load_config())?;
    record.category = infer_category(&record, &overrides);
    let pretty_record = to_string_pretty(&record).into_diagnostic()?;

    println_pad!(
        "{} {}",
        "📦 Mod:".bright_blue().bold(),
        record.name.bright_cyan().bold()
    );
    println_pad!("{} {}", "🆔 UUID:".bright_green(), record.id.bright_white());
    println_pad!(
        "{} {}",
        "🏷️ Version:".bright_green(),
        record.version.to_string().bright_white().bold()
    );
    if !record.author.is_empty() {
        println_pad!("{} {}", "👤 Author:".bright_green(), record.author.bright_white());
    }
    println_pad!(
        "{} {}",
        "📝 Description:".bright_yellow(),
        if record.description.is_empty() {
            "No description"
        } else {
            record.description.as_str()
        }
        .bright_white()
    );
    println_pad!(
        "{} {} {}",
        "🗂️  Category:".bright_yellow(),
        record.category.to_string().bright_white(),
        format!("(metadata from {:?})", record.metadata_source).dimmed()
    );
    if !record.tags.is_empty() {
        println_pad!(
            "{} {}",
            "🔖 Tags:".bright_yellow(),
            record.tags.iter().join(", ").bright_white()
        );
    }
    if record.requires_runtime_extension {
        println_pad!("{}", "🧩 Requires the script extender".bright_magenta());
    }

    if !record.dependencies.is_empty() {
        println_pad!("\n{}", "🔗 Dependencies:".bright_magenta().bold());
        for dependency in &record.dependencies {
            println_pad!(
                "   {} {} {}",
                "•".bright_cyan(),
                dependency.display_name().bright_cyan().bold(),
                dependency.id.dimmed()
            );
        }
    }
    if !record.conflicts.is_empty() {
        println_pad!("\n{}", "⛔ Conflicts:".bright_magenta().bold());
        for conflict in &record.conflicts {
            println_pad!(
                "   {} {} {}",
                "•".bright_red(),
                conflict.display_name().bright_red().bold(),
                conflict.id.dimmed()
            );
        }
    }

    println_pad!("\n{}", "🧾 Full record (JSON):".bright_magenta().bold());
    println_pad!("{}", pretty_record);

    Ok(())
}
