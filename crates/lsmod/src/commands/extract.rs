use crate::errors::CliError;
use crate::println_pad;
use crate::utils::format_size;
use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;
use lspk::PackageExtractor;
use miette::Result;

pub struct ExtractPackageArgs {
    pub file_path: String,
    pub output_dir: Option<String>,
}

/// Compute the default output directory: parent folder + file stem
fn default_output_dir(file_path: &Utf8Path) -> Utf8PathBuf {
    let file_stem = file_path.file_stem().unwrap_or("extracted");
    match file_path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.join(file_stem),
        _ => Utf8PathBuf::from(file_stem),
    }
}

pub fn extract_package(args: ExtractPackageArgs) -> Result<()> {
    let file_path = Utf8Path::new(&args.file_path);
    if !file_path.exists() {
        return Err(CliError::file_not_found(file_path).into());
    }

    let mut package = lspk::open(file_path).map_err(|e| CliError::package(file_path, e))?;

    println_pad!(
        "{} {}",
        "📦 Extracting package:".bright_blue().bold(),
        args.file_path.bright_cyan().bold()
    );

    let output_dir = args
        .output_dir
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| default_output_dir(file_path));

    println_pad!(
        "{} {}",
        "📁 Extracting to:".bright_yellow(),
        output_dir.as_str().bright_white().bold()
    );

    let report = PackageExtractor::new(&mut package)
        .with_progress(|progress| {
            tracing::debug!("Extracting {}", progress.current_file);
            println_pad!(
                "   {} {}",
                format!("[{}/{}]", progress.current, progress.total).dimmed(),
                progress.current_file
            );
        })
        .extract_all(&output_dir)
        .map_err(|e| CliError::package(file_path, e))?;

    if !report.is_complete() {
        println_pad!("");
        for (name, err) in &report.failures {
            println_pad!(
                "{} {} {}",
                "⚠️  Failed:".bright_yellow().bold(),
                name.bright_white(),
                format!("({})", err).dimmed()
            );
        }
        println_pad!(
            "{} {}",
            "📝 Extracted".bright_blue().bold(),
            format!(
                "{} of {} files, {}",
                report.files_written.len(),
                report.files_written.len() + report.failures.len(),
                format_size(report.bytes_written)
            )
            .dimmed()
        );
        return Err(CliError::IncompleteExtraction {
            path: file_path.to_path_buf(),
            failed: report.failures.len(),
        }
        .into());
    }

    println_pad!(
        "{} {}",
        "✅ Extraction complete!".bright_green().bold(),
        format!(
            "({} files, {})",
            report.files_written.len(),
            format_size(report.bytes_written)
        )
        .dimmed()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lspk::fixture::PackageWriter;
    use lspk::CompressionMethod;

    #[test]
    fn test_default_output_dir() {
        assert_eq!(
            default_output_dir(Utf8Path::new("mods/Alpha.pak")),
            Utf8PathBuf::from("mods/Alpha")
        );
        assert_eq!(
            default_output_dir(Utf8Path::new("Alpha.pak")),
            Utf8PathBuf::from("Alpha")
        );
    }

    #[test]
    fn test_extract_package() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let pak = root.join("Alpha.pak");
        PackageWriter::new(18)
            .with_entry("Mods/Alpha/meta.lsx", b"<save/>", CompressionMethod::Zlib)
            .with_entry("Public/Alpha/a.txt", b"payload", CompressionMethod::Zstd)
            .write_to(&pak)
            .unwrap();

        extract_package(ExtractPackageArgs {
            file_path: pak.to_string(),
            output_dir: None,
        })
        .unwrap();

        let out = root.join("Alpha");
        assert_eq!(
            std::fs::read(out.join("Public/Alpha/a.txt")).unwrap(),
            b"payload"
        );
    }

    #[test]
    fn test_extract_package_keeps_going_after_a_bad_entry() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let pak = root.join("Broken.pak");
        let bytes = PackageWriter::new(18)
            .with_entry("bad.txt", b"broken", CompressionMethod::Zlib)
            .with_entry("good.txt", b"intact", CompressionMethod::Zlib)
            .build_with_declared_sizes(|index, declared| {
                if index == 0 {
                    declared + 5
                } else {
                    declared
                }
            })
            .unwrap();
        std::fs::write(&pak, bytes).unwrap();

        let err = extract_package(ExtractPackageArgs {
            file_path: pak.to_string(),
            output_dir: None,
        })
        .unwrap_err();

        assert!(err.to_string().contains("1 entry"));
        assert_eq!(
            std::fs::read(root.join("Broken/good.txt")).unwrap(),
            b"intact"
        );
    }

    #[test]
    fn test_extract_missing_file() {
        let err = extract_package(ExtractPackageArgs {
            file_path: "does/not/exist.pak".into(),
            output_dir: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
