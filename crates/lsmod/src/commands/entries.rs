use crate::errors::CliError;
use crate::println_pad;
use crate::utils::format_size;
use camino::Utf8Path;
use colored::Colorize;
use miette::Result;

pub struct ListEntriesArgs {
    pub file_path: String,
}

pub fn list_package_entries(args: ListEntriesArgs) -> Result<()> {
    let file_path = Utf8Path::new(&args.file_path);
    if !file_path.exists() {
        return Err(CliError::file_not_found(file_path).into());
    }

    let package = lspk::open(file_path).map_err(|e| CliError::package(file_path, e))?;
    let header = package.header();

    println_pad!(
        "{} {}",
        "📦 Package:".bright_blue().bold(),
        file_path.as_str().bright_cyan().bold()
    );
    println_pad!(
        "{} v{}{}  {} {}",
        "🏷️ Format:".bright_green(),
        header.version.to_string().bright_white().bold(),
        if package.is_solid() { " (solid)" } else { "" },
        "priority".dimmed(),
        header.priority
    );
    println_pad!(
        "\n{} {}",
        "🗂️  Entries:".bright_magenta().bold(),
        format!("({})", package.len()).dimmed()
    );

    for entry in package.entries() {
        let part = if entry.archive_part != 0 {
            format!(" [part {}]", entry.archive_part)
        } else {
            String::new()
        };
        println_pad!(
            "   {} {} {}{}",
            "•".bright_cyan(),
            entry.name.bright_white(),
            format!(
                "({}, {} -> {})",
                entry.compression,
                format_size(entry.compressed_size),
                format_size(entry.uncompressed_size)
            )
            .dimmed(),
            part.bright_yellow()
        );
    }

    Ok(())
}
