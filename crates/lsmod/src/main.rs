use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    check_mods, extract_package, info_package, list_package_entries, order_mods,
    set_category_override, set_config_value, show_config, CheckModsArgs, ConfigKey,
    ExtractPackageArgs, InfoPackageArgs, ListEntriesArgs, OrderMode, OrderModsArgs, TierArg,
};
use miette::Result;
use tracing_subscriber::EnvFilter;

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the entries of a package
    Entries {
        /// The path to the package file
        #[arg(short, long)]
        file_path: String,
    },
    /// Extract a package to a directory
    Extract {
        /// The path to the package file
        #[arg(short, long)]
        file_path: String,

        /// The directory to extract to (defaults to a folder named after the package)
        #[arg(short, long)]
        output_dir: Option<String>,
    },
    /// Show the mod metadata of a package
    Info {
        /// The path to the package file
        #[arg(short, long)]
        file_path: String,
    },
    /// Sort the installed mods and print the load order
    Order {
        /// Directory holding the mod packages (defaults to mods_dir from config)
        #[arg(short, long)]
        mods_dir: Option<String>,

        #[arg(long, value_enum, default_value = "dependency")]
        mode: OrderMode,

        /// A recorded load order (one id per line) to start from
        #[arg(long)]
        order_file: Option<String>,

        /// Write the sorted load order to this file
        #[arg(short, long)]
        write: Option<String>,
    },
    /// Report problems with the installed mods
    Check {
        /// Directory holding the mod packages (defaults to mods_dir from config)
        #[arg(short, long)]
        mods_dir: Option<String>,

        /// A recorded load order (one id per line) to check
        #[arg(long)]
        order_file: Option<String>,

        /// Fingerprint printed when the order file was written
        #[arg(long, requires = "order_file")]
        fingerprint: Option<String>,

        /// Print the warnings as JSON
        #[arg(long)]
        json: bool,
    },
    /// Force a mod into a category tier
    Category {
        /// The mod's UUID
        id: String,

        #[arg(value_enum, required_unless_present = "clear")]
        tier: Option<TierArg>,

        /// Remove the override instead
        #[arg(long, conflicts_with = "tier")]
        clear: bool,
    },
    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the current configuration
    Show,
    /// Set a path in the configuration
    Set {
        #[arg(value_enum)]
        key: ConfigKey,
        value: String,
    },
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            "lsmod=debug,lsmod_order=debug,lsmod_meta=debug,lspk=debug".into()
        } else {
            "warn".into()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = parse_args();
    init_logging(args.verbose);

    match args.command {
        Commands::Entries { file_path } => list_package_entries(ListEntriesArgs { file_path }),
        Commands::Extract {
            file_path,
            output_dir,
        } => extract_package(ExtractPackageArgs {
            file_path,
            output_dir,
        }),
        Commands::Info { file_path } => info_package(InfoPackageArgs { file_path }),
        Commands::Order {
            mods_dir,
            mode,
            order_file,
            write,
        } => order_mods(OrderModsArgs {
            mods_dir,
            mode,
            order_file,
            write,
        }),
        Commands::Check {
            mods_dir,
            order_file,
            fingerprint,
            json,
        } => check_mods(CheckModsArgs {
            mods_dir,
            order_file,
            fingerprint,
            json,
        }),
        Commands::Category { id, tier, clear } => {
            set_category_override(id, if clear { None } else { tier })
        }
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => show_config(),
            ConfigAction::Set { key, value } => set_config_value(key, value),
        },
    }
}
