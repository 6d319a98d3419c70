//! Turning archives on disk into [`ModRecord`]s.
//!
//! [`read_mod_from_package`] handles one archive. [`ModDiscovery`] runs it over
//! a whole mods directory, reporting progress per archive and collecting
//! per-archive failures instead of aborting.

use crate::{
    error::Result,
    lsx,
    parse::{merge, synthesize_from_filename},
    sidecar::{parse_sidecar, SidecarMod},
    MetadataError, ModRecord,
};
use camino::{Utf8Path, Utf8PathBuf};
use lspk::PackageEntry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use walkdir::WalkDir;

/// Path suffix of the structured metadata document inside an archive.
pub const META_DOCUMENT_SUFFIX: &str = "meta.lsx";
/// Path suffix of the entry that marks a mod as needing the runtime extension.
pub const EXTENSION_MARKER_SUFFIX: &str = "ScriptExtender/Config.json";
pub const ARCHIVE_EXTENSION: &str = "pak";

/// Read access to archives, so discovery can run against something other
/// than real files.
pub trait ArchiveAccess: Send + Sync {
    fn list_entries(&self, archive: &Utf8Path) -> lspk::Result<Vec<PackageEntry>>;
    fn extract_entry(&self, archive: &Utf8Path, name: &str) -> lspk::Result<Vec<u8>>;
}

/// [`ArchiveAccess`] backed by package files on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageFiles;

impl ArchiveAccess for PackageFiles {
    fn list_entries(&self, archive: &Utf8Path) -> lspk::Result<Vec<PackageEntry>> {
        lspk::list_entries(archive)
    }

    fn extract_entry(&self, archive: &Utf8Path, name: &str) -> lspk::Result<Vec<u8>> {
        lspk::extract_entry(archive, name)
    }
}

/// Where the sidecar of `archive` is expected: same directory, same stem,
/// `.json` extension.
pub fn sidecar_path_for(archive: &Utf8Path) -> Utf8PathBuf {
    archive.with_extension("json")
}

/// Load the sidecar next to `archive`, if there is a usable one.
///
/// An unreadable or invalid sidecar is logged and ignored; it never fails
/// the mod.
pub fn load_sidecar_for(archive: &Utf8Path) -> Option<SidecarMod> {
    let path = sidecar_path_for(archive);
    if !path.as_std_path().is_file() {
        return None;
    }
    let parsed = std::fs::read(path.as_std_path())
        .map_err(MetadataError::from)
        .and_then(|bytes| parse_sidecar(&bytes));
    match parsed {
        Ok(sidecar) => sidecar,
        Err(err) => {
            tracing::warn!("Ignoring sidecar {}: {}", path, err);
            None
        }
    }
}

/// Build the record for one archive.
///
/// Package format errors fail the call. A metadata document without
/// identity, or one that does not parse, falls back to the sidecar and then
/// to a record synthesized from the file name.
pub fn read_mod_from_package<A: ArchiveAccess + ?Sized>(
    access: &A,
    archive: &Utf8Path,
    sidecar: Option<&SidecarMod>,
) -> Result<ModRecord> {
    let entries = access.list_entries(archive)?;
    let requires_extension = entries
        .iter()
        .any(|e| e.name.ends_with(EXTENSION_MARKER_SUFFIX));

    let structured = match entries
        .iter()
        .find(|e| e.name.ends_with(META_DOCUMENT_SUFFIX))
    {
        Some(meta) => {
            let bytes = access.extract_entry(archive, &meta.name)?;
            match lsx::parse_module_info(&bytes) {
                Ok(info) => Some(info),
                Err(err) => {
                    tracing::warn!("Unusable {} in {}: {}", meta.name, archive, err);
                    None
                }
            }
        }
        None => {
            tracing::debug!("No {} in {}", META_DOCUMENT_SUFFIX, archive);
            None
        }
    };

    let mut record =
        merge(structured, sidecar).unwrap_or_else(|| synthesize_from_filename(archive));
    record.requires_runtime_extension |= requires_extension;
    record.source_archive = Some(archive.to_path_buf());

    tracing::debug!(
        "Read {} ({}) from {} via {:?}",
        record.name,
        record.id,
        archive,
        record.metadata_source
    );
    Ok(record)
}

/// Progress emitted once per archive during discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryProgress {
    pub current_archive: Utf8PathBuf,
    /// 1-based index of the archive.
    pub current: u32,
    pub total: u32,
}

/// An archive that could not be turned into a record.
#[derive(Debug)]
pub struct DiscoveryFailure {
    pub archive: Utf8PathBuf,
    pub error: MetadataError,
}

#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Records in archive order.
    pub mods: Vec<ModRecord>,
    pub failures: Vec<DiscoveryFailure>,
    /// Set when discovery stopped early; `mods` and `failures` cover only the
    /// archives visited before that.
    pub cancelled: bool,
}

type ProgressCallback = Arc<dyn Fn(DiscoveryProgress) + Send + Sync>;

/// Batch discovery over many archives.
pub struct ModDiscovery<A: ArchiveAccess> {
    access: A,
    progress_callback: Option<ProgressCallback>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<A: ArchiveAccess> ModDiscovery<A> {
    pub fn new(access: A) -> Self {
        Self {
            access,
            progress_callback: None,
            cancel: None,
        }
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(DiscoveryProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Stop before the next archive once `cancel` is set.
    pub fn with_cancellation(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn access(&self) -> &A {
        &self.access
    }

    /// Every `.pak` file below `dir`, sorted by path.
    pub fn find_archives(&self, dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
        let mut archives = Vec::new();
        for entry in WalkDir::new(dir.as_std_path()).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_archive = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION));
            if !is_archive {
                continue;
            }
            match Utf8PathBuf::from_path_buf(entry.into_path()) {
                Ok(path) => archives.push(path),
                Err(path) => tracing::warn!("Skipping non UTF-8 path {}", path.display()),
            }
        }
        Ok(archives)
    }

    /// Discover every archive below `dir`.
    pub fn discover_dir(&self, dir: &Utf8Path) -> Result<DiscoveryReport> {
        let archives = self.find_archives(dir)?;
        tracing::info!("Found {} archives in {}", archives.len(), dir);
        Ok(self.discover(&archives))
    }

    /// Read each archive in turn. Failures are collected, not propagated.
    pub fn discover(&self, archives: &[Utf8PathBuf]) -> DiscoveryReport {
        let total = archives.len() as u32;
        let mut report = DiscoveryReport::default();

        for (index, archive) in archives.iter().enumerate() {
            if self.is_cancelled() {
                tracing::info!("Discovery cancelled after {} archives", index);
                report.cancelled = true;
                break;
            }

            self.emit_progress(DiscoveryProgress {
                current_archive: archive.clone(),
                current: index as u32 + 1,
                total,
            });

            let sidecar = load_sidecar_for(archive);
            match read_mod_from_package(&self.access, archive, sidecar.as_ref()) {
                Ok(record) => report.mods.push(record),
                Err(error) => {
                    tracing::warn!("Failed to read {}: {}", archive, error);
                    report.failures.push(DiscoveryFailure {
                        archive: archive.clone(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            "Discovered {} mods ({} failed)",
            report.mods.len(),
            report.failures.len()
        );
        report
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn emit_progress(&self, progress: DiscoveryProgress) {
        if let Some(callback) = &self.progress_callback {
            callback(progress);
        }
    }
}
