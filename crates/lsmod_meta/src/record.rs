use crate::{Category, Version64};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Where a record's fields came from, ordered by trust.
///
/// `Builtin > Embedded > Sidecar > Imported > FilenameDerived`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataSource {
    /// Synthesized from the archive file name.
    FilenameDerived,
    /// Taken from an external load-order document.
    Imported,
    /// `info.json` next to (or shipped with) the archive.
    Sidecar,
    /// `meta.lsx` inside the archive.
    Embedded,
    /// One of the game's own modules.
    Builtin,
}

/// A pointer to another mod, used for both dependencies and conflicts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRef {
    pub id: String,
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Version64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl DependencyRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Name to show to a user: the display name, else the folder, else the id.
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.folder.is_empty() {
            &self.folder
        } else {
            &self.id
        }
    }
}

/// The canonical parsed form of a mod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModRecord {
    /// Stable identity. Never regenerated for the same archive.
    pub id: String,
    pub folder: String,
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: Version64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
    #[serde(default)]
    pub conflicts: Vec<DependencyRef>,
    #[serde(default)]
    pub requires_runtime_extension: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_archive: Option<Utf8PathBuf>,
    pub metadata_source: MetadataSource,
    #[serde(default)]
    pub category: Category,
}

impl ModRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, source: MetadataSource) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            folder: name.clone(),
            name,
            author: String::new(),
            description: String::new(),
            version: Version64::default(),
            content_hash: None,
            tags: Vec::new(),
            dependencies: Vec::new(),
            conflicts: Vec::new(),
            requires_runtime_extension: false,
            source_archive: None,
            metadata_source: source,
            category: Category::Unset,
        }
    }

    /// A record standing in for a mod known only from a reference, such as an
    /// entry in an external load-order document.
    pub fn from_reference(reference: &DependencyRef) -> Self {
        let mut record = Self::new(
            reference.id.clone(),
            reference.display_name(),
            MetadataSource::Imported,
        );
        if !reference.folder.is_empty() {
            record.folder = reference.folder.clone();
        }
        record.version = reference.version;
        record.content_hash = reference.content_hash.clone();
        record
    }

    pub fn with_dependency(mut self, dependency: DependencyRef) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_conflict(mut self, conflict: DependencyRef) -> Self {
        self.conflicts.push(conflict);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            self.push_tag(tag);
        }
        self
    }

    /// Add a tag, keeping the first occurrence of duplicates.
    pub fn push_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        let tag = tag.trim();
        if !tag.is_empty() && !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    /// A reference to this record, as another mod would declare it.
    pub fn to_reference(&self) -> DependencyRef {
        DependencyRef {
            id: self.id.clone(),
            folder: self.folder.clone(),
            name: self.name.clone(),
            version: self.version,
            content_hash: self.content_hash.clone(),
        }
    }

    /// Whether this mod declares `id` as a dependency.
    pub fn depends_on(&self, id: &str) -> bool {
        self.dependencies.iter().any(|d| d.id == id)
    }

    /// Whether this mod declares `id` as a conflict.
    pub fn conflicts_with(&self, id: &str) -> bool {
        self.conflicts.iter().any(|c| c.id == id)
    }

    /// Fill fields that are empty here from `other`. Identity, trust and
    /// category are never taken from `other`.
    pub fn fill_missing_from(&mut self, other: &ModRecord) {
        if self.folder.is_empty() {
            self.folder = other.folder.clone();
        }
        if self.name.is_empty() {
            self.name = other.name.clone();
        }
        if self.author.is_empty() {
            self.author = other.author.clone();
        }
        if self.description.is_empty() {
            self.description = other.description.clone();
        }
        if self.version.is_zero() {
            self.version = other.version;
        }
        if self.content_hash.is_none() {
            self.content_hash = other.content_hash.clone();
        }
        if self.tags.is_empty() {
            self.tags = other.tags.clone();
        }
        if self.dependencies.is_empty() {
            self.dependencies = other.dependencies.clone();
        }
        if self.conflicts.is_empty() {
            self.conflicts = other.conflicts.clone();
        }
        if self.source_archive.is_none() {
            self.source_archive = other.source_archive.clone();
        }
        self.requires_runtime_extension |= other.requires_runtime_extension;
    }

    /// Fold a re-discovered copy of the same mod into this record.
    ///
    /// When `other` is at least as trusted, its fields replace these and the
    /// old values only fill gaps. Otherwise `other` only fills gaps. The id
    /// and category always stay.
    pub fn absorb(&mut self, other: ModRecord) {
        if other.metadata_source >= self.metadata_source {
            let id = std::mem::take(&mut self.id);
            let category = self.category;
            let previous = std::mem::replace(self, other);
            self.id = id;
            self.category = category;
            self.fill_missing_from(&previous);
        } else {
            self.fill_missing_from(&other);
        }
    }
}
