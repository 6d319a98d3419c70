//! The `info.json` sidecar shipped next to an archive.
//!
//! Two shapes are accepted: a flat object describing one mod, or the
//! mod-manager export `{ "Mods": [ { ... } ], "MD5": "..." }`, of which the
//! first mod is used. Keys are accepted in `PascalCase` or lower case.

use crate::{error::Result, DependencyRef, MetadataError, Version64};
use serde::Deserialize;

/// A version written either as a dotted string or as the packed integer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SidecarVersion {
    Packed(u64),
    Text(String),
}

impl SidecarVersion {
    pub fn resolve(&self) -> Result<Version64> {
        match self {
            SidecarVersion::Packed(packed) => Ok(Version64::from_packed(*packed)),
            SidecarVersion::Text(text) => match text.trim().parse::<u64>() {
                Ok(packed) => Ok(Version64::from_packed(packed)),
                Err(_) => text.parse(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SidecarTags {
    List(Vec<String>),
    Text(String),
}

impl SidecarTags {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            SidecarTags::List(tags) => tags.clone(),
            SidecarTags::Text(text) => text.split(';').map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SidecarDependency {
    Id(String),
    Full {
        #[serde(rename = "UUID", alias = "uuid", alias = "Uuid")]
        uuid: String,
        #[serde(rename = "Folder", alias = "folder", default)]
        folder: Option<String>,
        #[serde(rename = "Name", alias = "name", default)]
        name: Option<String>,
        #[serde(rename = "Version", alias = "version", default)]
        version: Option<SidecarVersion>,
    },
}

impl SidecarDependency {
    pub fn to_reference(&self) -> DependencyRef {
        match self {
            SidecarDependency::Id(id) => DependencyRef::new(id.trim()),
            SidecarDependency::Full {
                uuid,
                folder,
                name,
                version,
            } => DependencyRef {
                id: uuid.trim().to_string(),
                folder: folder.clone().unwrap_or_default(),
                name: name.clone().unwrap_or_default(),
                version: version
                    .as_ref()
                    .and_then(|v| v.resolve().ok())
                    .unwrap_or_default(),
                content_hash: None,
            },
        }
    }
}

/// One mod as described by a sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct SidecarMod {
    #[serde(rename = "Name", alias = "name", default)]
    pub name: Option<String>,
    #[serde(rename = "Author", alias = "author", default)]
    pub author: Option<String>,
    #[serde(rename = "Version", alias = "version", default)]
    pub version: Option<SidecarVersion>,
    #[serde(rename = "Description", alias = "description", default)]
    pub description: Option<String>,
    #[serde(rename = "UUID", alias = "uuid", alias = "Uuid", default)]
    pub uuid: Option<String>,
    #[serde(rename = "Folder", alias = "folder", default)]
    pub folder: Option<String>,
    #[serde(rename = "MD5", alias = "md5", default)]
    pub md5: Option<String>,
    #[serde(rename = "Tags", alias = "tags", default)]
    pub tags: Option<SidecarTags>,
    #[serde(
        rename = "RequiresScriptExtender",
        alias = "requiresScriptExtender",
        alias = "requires_script_extender",
        default
    )]
    pub requires_script_extender: Option<bool>,
    #[serde(rename = "Dependencies", alias = "dependencies", default)]
    pub dependencies: Vec<SidecarDependency>,
}

impl SidecarMod {
    /// The declared UUID, `None` when absent or blank.
    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SidecarDocument {
    Manager {
        #[serde(rename = "Mods", alias = "mods")]
        mods: Vec<SidecarMod>,
        #[serde(rename = "MD5", alias = "md5", default)]
        md5: Option<String>,
    },
    Flat(SidecarMod),
}

/// Parse sidecar bytes. A leading byte order mark is ignored.
///
/// Returns `None` for a mod-manager export with an empty `Mods` list.
pub fn parse_sidecar(bytes: &[u8]) -> Result<Option<SidecarMod>> {
    let text = std::str::from_utf8(bytes).map_err(|_| MetadataError::Encoding)?;
    let document: SidecarDocument = serde_json::from_str(text.trim_start_matches('\u{feff}'))?;

    Ok(match document {
        SidecarDocument::Manager { mods, md5 } => mods.into_iter().next().map(|mut first| {
            if first.md5.is_none() {
                first.md5 = md5;
            }
            first
        }),
        SidecarDocument::Flat(flat) => Some(flat),
    })
}
