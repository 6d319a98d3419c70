use super::mods::{
    build_load_order, detect_environment, discover_mods, load_overrides, read_order_file,
    render_order_ids, resolve_mods_dir,
};
use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::load_config;
use camino::Utf8PathBuf;
use clap::ValueEnum;
use colored::Colorize;
use lsmod_meta::Category;
use lsmod_order::{is_base_module, Fingerprint, Severity, SortMode};
use miette::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OrderMode {
    /// Dependencies before dependents, nothing else
    #[default]
    Dependency,
    /// Group by category tier, then dependency order inside each tier
    Smart,
}

impl OrderMode {
    fn label(self) -> &'static str {
        match self {
            OrderMode::Dependency => "dependency",
            OrderMode::Smart => "smart",
        }
    }
}

impl From<OrderMode> for SortMode {
    fn from(mode: OrderMode) -> Self {
        match mode {
            OrderMode::Dependency => SortMode::Dependency,
            OrderMode::Smart => SortMode::Smart,
        }
    }
}

pub struct OrderModsArgs {
    pub mods_dir: Option<String>,
    pub mode: OrderMode,
    pub order_file: Option<String>,
    pub write: Option<String>,
}

pub fn order_mods(args: OrderModsArgs) -> Result<()> {
    let config = load_config();
    let mods_dir = resolve_mods_dir(args.mods_dir, &config)?;
    let overrides = load_overrides(&config)?;

    let mut environment = detect_environment(&config);
    if let Some(path) = &args.order_file {
        environment.recorded_order = read_order_file(Utf8PathBuf::from(path).as_path())?.ids;
    }

    let records = discover_mods(&mods_dir)?;
    let mut order = build_load_order(records, overrides, environment)?;

    println_pad!(
        "{} {} {}",
        "🔀 Sorting".bright_blue().bold(),
        order.active().len().to_string().bright_cyan().bold(),
        format!("mod(s) in {} mode", args.mode.label())
    );

    let cyclic_tiers = order.sort(args.mode.into()).map_err(CliError::from)?;
    for tier in &cyclic_tiers {
        println_pad!(
            "{} {}",
            "⚠️ Circular dependencies in tier".bright_yellow(),
            format!("{} kept their previous order", tier).bright_white()
        );
    }

    println_pad!("\n{}", "📜 Load order:".bright_magenta().bold());
    for (index, record) in order.active().iter().enumerate() {
        let category = match record.category {
            Category::Unset => String::new(),
            category => format!(" [{}]", category),
        };
        println_pad!(
            "   {} {} {}{}",
            format!("{:>3}.", index + 1).dimmed(),
            record.name.bright_cyan().bold(),
            record.id.dimmed(),
            category.bright_green()
        );
    }

    let problems = order
        .warnings()
        .iter()
        .filter(|w| w.severity > Severity::Info)
        .count();
    if problems > 0 {
        println_pad!(
            "\n{} {}",
            problems.to_string().bright_yellow().bold(),
            "problem(s) remain, run `lsmod check` for details".bright_yellow()
        );
    }

    if let Some(path) = args.write {
        let ids = order.load_order_ids();
        let content = render_order_ids(&ids);
        std::fs::write(&path, &content).map_err(CliError::from)?;

        let base_count = ids.iter().filter(|id| is_base_module(id)).count();
        tracing::info!("Wrote {} ids ({} base) to {}", ids.len(), base_count, path);
        println_pad!(
            "\n{} {}",
            "💾 Written to:".bright_green(),
            path.bright_white().bold()
        );
        println_pad!(
            "{} {}",
            "🔑 Fingerprint:".bright_green(),
            Fingerprint::of(content.as_bytes()).to_string().dimmed()
        );
    }

    Ok(())
}
