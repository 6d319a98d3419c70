use camino::Utf8PathBuf;
use lsmod_meta::MetadataError;
use lsmod_order::OrderError;
use lspk::PackageError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("File not found: {path}")]
    #[diagnostic(
        code(file::not_found),
        help("Make sure the file exists and the path is correct")
    )]
    FileNotFound { path: Utf8PathBuf },

    #[error("No mods directory configured")]
    #[diagnostic(
        code(config::mods_dir_missing),
        help("Pass --mods-dir or run `lsmod config set mods-dir <DIR>`")
    )]
    ModsDirNotSet,

    #[error("No category overrides file configured")]
    #[diagnostic(
        code(config::overrides_path_missing),
        help("Run `lsmod config set overrides-path <FILE>` first")
    )]
    OverridesPathNotSet,

    #[error("Failed to read package: {path}")]
    #[diagnostic(
        code(package::read_failed),
        help("The file may be truncated, corrupt or not a Larian package")
    )]
    Package {
        path: Utf8PathBuf,
        #[source]
        source: PackageError,
    },

    #[error("{failed} entry(s) of {path} could not be extracted")]
    #[diagnostic(
        code(package::extract_incomplete),
        help("The other entries were written; the package is probably damaged")
    )]
    IncompleteExtraction { path: Utf8PathBuf, failed: usize },

    #[error("Failed to read mod metadata")]
    #[diagnostic(code(metadata::read_failed))]
    Metadata {
        #[from]
        source: MetadataError,
    },

    #[error("Dependency cycle between: {}", ids.join(", "))]
    #[diagnostic(
        code(order::cycle),
        help("Remove one of the dependencies or use --mode smart to keep each tier's order")
    )]
    DependencyCycle { ids: Vec<String> },

    #[error("Load order operation failed")]
    #[diagnostic(code(order::failed))]
    Order {
        #[source]
        source: OrderError,
    },

    #[error("{count} critical problem(s) found")]
    #[diagnostic(
        code(check::critical),
        help("Fix the critical problems above before launching the game")
    )]
    CriticalProblems { count: usize },

    #[error("Invalid fingerprint: {value}")]
    #[diagnostic(
        code(check::invalid_fingerprint),
        help("Pass the 64 character hex SHA-256 digest printed by a previous check")
    )]
    InvalidFingerprint { value: String },

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn file_not_found(path: impl Into<Utf8PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn package(path: impl Into<Utf8PathBuf>, source: PackageError) -> Self {
        Self::Package {
            path: path.into(),
            source,
        }
    }
}

impl From<OrderError> for CliError {
    fn from(source: OrderError) -> Self {
        match source {
            OrderError::CycleDetected { ids } => Self::DependencyCycle { ids },
            OrderError::InvalidFingerprint(value) => Self::InvalidFingerprint { value },
            source => Self::Order { source },
        }
    }
}
