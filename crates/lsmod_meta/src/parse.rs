use crate::{
    identity, lsx::ModuleInfo, sidecar::SidecarMod, DependencyRef, MetadataSource, ModRecord,
};
use camino::Utf8Path;

impl From<ModuleInfo> for ModRecord {
    fn from(info: ModuleInfo) -> Self {
        let mut record = ModRecord::new(info.uuid, info.name, MetadataSource::Embedded);
        record.folder = info.folder;
        record.author = info.author;
        record.description = info.description;
        record.version = info.version;
        record.content_hash = info.md5;
        record.dependencies = info.dependencies;
        record.conflicts = info.conflicts;
        record.with_tags(info.tags)
    }
}

/// Build a record from a sidecar alone. `None` when the sidecar has no UUID.
pub fn record_from_sidecar(sidecar: &SidecarMod) -> Option<ModRecord> {
    let id = sidecar.uuid()?;
    let name = sidecar.name.clone().unwrap_or_default();
    let mut record = ModRecord::new(id, name, MetadataSource::Sidecar);

    record.folder = sidecar.folder.clone().unwrap_or_default();
    record.author = sidecar.author.clone().unwrap_or_default();
    record.description = sidecar.description.clone().unwrap_or_default();
    record.content_hash = sidecar.md5.clone().filter(|h| !h.trim().is_empty());
    record.requires_runtime_extension = sidecar.requires_script_extender.unwrap_or(false);
    record.dependencies = sidecar
        .dependencies
        .iter()
        .map(|d| d.to_reference())
        .filter(|d: &DependencyRef| !d.id.is_empty())
        .collect();

    if let Some(version) = &sidecar.version {
        match version.resolve() {
            Ok(version) => record.version = version,
            Err(err) => tracing::warn!("Ignoring sidecar version for {}: {}", id, err),
        }
    }
    if let Some(tags) = &sidecar.tags {
        for tag in tags.to_vec() {
            record.push_tag(tag);
        }
    }

    Some(record)
}

/// Combine the structured document and the sidecar into one record.
///
/// Structured fields win. The sidecar only fills fields the structured
/// document leaves empty. Returns `None` when neither source yields an
/// identity; callers then fall back to [`synthesize_from_filename`].
pub fn merge(structured: Option<ModuleInfo>, sidecar: Option<&SidecarMod>) -> Option<ModRecord> {
    let sidecar_record = sidecar.and_then(record_from_sidecar);

    match (structured, sidecar_record) {
        (Some(info), Some(side)) => {
            let mut record = ModRecord::from(info);
            if record.id != side.id {
                tracing::debug!(
                    "Sidecar id {} differs from embedded id {}, keeping embedded",
                    side.id,
                    record.id
                );
            }
            record.fill_missing_from(&side);
            Some(record)
        }
        (Some(info), None) => Some(ModRecord::from(info)),
        (None, Some(side)) => Some(side),
        (None, None) => None,
    }
}

/// Record for an archive without usable metadata.
///
/// The id is derived from the lowercased file name. Name and folder are the
/// file stem.
pub fn synthesize_from_filename(archive: &Utf8Path) -> ModRecord {
    let stem = archive
        .file_stem()
        .or_else(|| archive.file_name())
        .unwrap_or(archive.as_str());
    let mut record = ModRecord::new(
        identity::derive_id_for_path(archive),
        stem,
        MetadataSource::FilenameDerived,
    );
    record.source_archive = Some(archive.to_path_buf());
    record
}
