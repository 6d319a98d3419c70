use crate::{Package, PackageError, Result};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::io::{Read, Seek};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Progress emitted once per entry during [`PackageExtractor::extract_all`].
#[derive(Debug, Clone)]
pub struct ExtractProgress {
    /// Package-relative path of the entry being written.
    pub current_file: String,
    /// 1-based index of the entry.
    pub current: u32,
    pub total: u32,
}

/// Summary of a completed extraction.
#[derive(Debug, Default)]
pub struct ExtractReport {
    pub output_dir: Utf8PathBuf,
    pub files_written: Vec<Utf8PathBuf>,
    pub bytes_written: u64,
    /// Entries that could not be written, with the reason.
    pub failures: Vec<(String, PackageError)>,
}

impl ExtractReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

type ProgressCallback = Arc<dyn Fn(ExtractProgress) + Send + Sync>;

/// Writes the entries of a mounted package to disk.
///
/// Cancellation is cooperative: the flag is checked before each entry, so an
/// entry that has started writing is always finished.
pub struct PackageExtractor<'a, TSource: Read + Seek> {
    package: &'a mut Package<TSource>,
    progress_callback: Option<ProgressCallback>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a, TSource: Read + Seek> PackageExtractor<'a, TSource> {
    pub fn new(package: &'a mut Package<TSource>) -> Self {
        Self {
            package,
            progress_callback: None,
            cancel: None,
        }
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ExtractProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    pub fn with_cancellation(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Extract every entry below `output_dir`.
    ///
    /// An entry that fails is recorded in [`ExtractReport::failures`] and the
    /// remaining entries are still written. Only cancellation stops early;
    /// files already written stay on disk and calling again overwrites them.
    pub fn extract_all(&mut self, output_dir: impl AsRef<Utf8Path>) -> Result<ExtractReport> {
        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir.as_std_path())?;

        let total = self.package.len() as u32;
        let mut report = ExtractReport {
            output_dir: output_dir.to_path_buf(),
            ..Default::default()
        };

        tracing::info!("Extracting {} entries to {}", total, output_dir);

        for index in 0..self.package.len() {
            if self.is_cancelled() {
                tracing::info!("Extraction cancelled after {} entries", index);
                return Err(PackageError::Cancelled);
            }

            let name = self.package.entries()[index].name.clone();
            self.emit_progress(ExtractProgress {
                current_file: name.clone(),
                current: index as u32 + 1,
                total,
            });

            match self.write_entry(output_dir, index, &name) {
                Ok((target, len)) => {
                    tracing::debug!("Wrote {} ({} bytes)", target, len);
                    report.bytes_written += len as u64;
                    report.files_written.push(target);
                }
                Err(err) => {
                    tracing::warn!("Failed to extract {}: {}", name, err);
                    report.failures.push((name, err));
                }
            }
        }

        if !report.is_complete() {
            tracing::info!(
                "Extracted {} of {} entries",
                report.files_written.len(),
                total
            );
        }
        Ok(report)
    }

    fn write_entry(
        &mut self,
        output_dir: &Utf8Path,
        index: usize,
        name: &str,
    ) -> Result<(Utf8PathBuf, usize)> {
        let target = output_dir.join(safe_relative_path(name)?);
        let data = self.package.extract_at(index)?;

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent.as_std_path())?;
        }
        std::fs::write(target.as_std_path(), &data)?;
        Ok((target, data.len()))
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn emit_progress(&self, progress: ExtractProgress) {
        if let Some(callback) = &self.progress_callback {
            callback(progress);
        }
    }
}

/// Reject entry names that would land outside the output directory.
fn safe_relative_path(name: &str) -> Result<Utf8PathBuf> {
    let path = Utf8Path::new(name);
    let mut safe = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::Normal(part) => safe.push(part),
            Utf8Component::CurDir => {}
            _ => return Err(PackageError::UnsafePath(name.to_string())),
        }
    }
    if safe.as_str().is_empty() {
        return Err(PackageError::UnsafePath(name.to_string()));
    }
    Ok(safe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::PackageWriter;
    use crate::CompressionMethod;
    use std::io::Cursor;
    use std::sync::Mutex;

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    #[test]
    fn test_extract_all_reports_progress() {
        let bytes = PackageWriter::new(18)
            .with_entry("Mods/A/meta.lsx", b"meta", CompressionMethod::Zlib)
            .with_entry("Public/A/Stats/a.txt", b"stats", CompressionMethod::Lz4)
            .build()
            .unwrap();
        let mut package = Package::mount_from_reader(Cursor::new(bytes)).unwrap();
        let (_dir, root) = temp_root();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let report = PackageExtractor::new(&mut package)
            .with_progress(move |p| sink.lock().unwrap().push((p.current, p.total)))
            .extract_all(&root)
            .unwrap();

        assert_eq!(report.bytes_written, 9);
        assert_eq!(*seen.lock().unwrap(), vec![(1, 2), (2, 2)]);
        assert_eq!(
            std::fs::read(root.join("Public/A/Stats/a.txt")).unwrap(),
            b"stats"
        );
    }

    #[test]
    fn test_failed_entry_does_not_stop_the_rest() {
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
        let mut package = Package::mount_from_reader(Cursor::new(bytes)).unwrap();
        let (_dir, root) = temp_root();

        let report = PackageExtractor::new(&mut package)
            .extract_all(&root)
            .unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "bad.txt");
        assert!(matches!(
            report.failures[0].1,
            PackageError::Decompression { .. }
        ));
        assert_eq!(report.files_written, vec![root.join("good.txt")]);
        assert_eq!(std::fs::read(root.join("good.txt")).unwrap(), b"intact");
        assert!(!root.join("bad.txt").as_std_path().exists());
    }

    #[test]
    fn test_cancelled_before_first_entry() {
        let bytes = PackageWriter::new(18)
            .with_entry("a.txt", b"a", CompressionMethod::None)
            .build()
            .unwrap();
        let mut package = Package::mount_from_reader(Cursor::new(bytes)).unwrap();
        let (_dir, root) = temp_root();

        let cancel = Arc::new(AtomicBool::new(true));
        let result = PackageExtractor::new(&mut package)
            .with_cancellation(cancel)
            .extract_all(&root);

        assert!(matches!(result, Err(PackageError::Cancelled)));
        assert!(!root.join("a.txt").as_std_path().exists());
    }

    #[test]
    fn test_unsafe_entry_names_rejected() {
        assert!(safe_relative_path("../evil.txt").is_err());
        assert!(safe_relative_path("/etc/passwd").is_err());
        assert!(safe_relative_path("Mods/../../evil.txt").is_err());
        assert_eq!(
            safe_relative_path("./Mods/A/meta.lsx").unwrap(),
            Utf8PathBuf::from("Mods/A/meta.lsx")
        );
    }
}
