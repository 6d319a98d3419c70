//! Category inference and persisted user overrides.
//!
//! Inference order, first match wins:
//!
//! 1. a user override for the mod's id
//! 2. a keyword match against the mod's tags, tier 1 keywords first
//! 3. a keyword or phrase match against the display name, tier 1 first
//! 4. otherwise [`Category::Unset`]
//!
//! Keywords match whole words only. Names are split on punctuation and on
//! lower-to-upper case changes, so `BetterHairStyles` contains the word `hair`.

use crate::error::Result;
use camino::Utf8Path;
use lsmod_meta::{Category, ModRecord, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const FRAMEWORK_KEYWORDS: &[&str] = &[
    "framework",
    "library",
    "lib",
    "api",
    "core",
    "toolkit",
    "utility",
    "utilities",
    "script extender",
    "mod config menu",
    "mcm",
    "dependency",
    "resource",
];

const GAMEPLAY_KEYWORDS: &[&str] = &[
    "gameplay",
    "class",
    "classes",
    "subclass",
    "subclasses",
    "spell",
    "spells",
    "feat",
    "feats",
    "race",
    "races",
    "combat",
    "balance",
    "rebalance",
    "mechanics",
    "difficulty",
    "item",
    "items",
    "equipment",
    "weapon",
    "weapons",
    "armor",
    "armour",
    "party",
];

const CONTENT_KEYWORDS: &[&str] = &[
    "content",
    "quest",
    "quests",
    "story",
    "companion",
    "companions",
    "npc",
    "npcs",
    "dialogue",
    "dialog",
    "location",
    "vendor",
    "merchant",
];

const VISUAL_KEYWORDS: &[&str] = &[
    "visual",
    "visuals",
    "cosmetic",
    "cosmetics",
    "hair",
    "hairstyle",
    "hairstyles",
    "face",
    "faces",
    "tattoo",
    "tattoos",
    "makeup",
    "texture",
    "textures",
    "dye",
    "dyes",
    "appearance",
    "camera",
    "lighting",
    "ui",
    "icon",
    "icons",
    "portrait",
    "portraits",
];

const LATE_LOADER_KEYWORDS: &[&str] = &[
    "compatibility",
    "compat",
    "patch",
    "override",
    "overrides",
    "fix",
    "fixes",
    "late loader",
    "load last",
    "translation",
    "localization",
];

/// Keywords for `tier`.
pub fn keywords(tier: Tier) -> &'static [&'static str] {
    match tier {
        Tier::Framework => FRAMEWORK_KEYWORDS,
        Tier::Gameplay => GAMEPLAY_KEYWORDS,
        Tier::Content => CONTENT_KEYWORDS,
        Tier::Visual => VISUAL_KEYWORDS,
        Tier::LateLoader => LATE_LOADER_KEYWORDS,
    }
}

/// User-assigned tiers keyed by mod id, persisted as JSON.
///
/// Overrides live apart from the records, so they survive re-discovery.
///
/// # JSON format
///
/// ```json
/// {
///   "version": 1,
///   "overrides": { "11111111-1111-1111-1111-111111111111": "framework" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryOverrides {
    pub version: u32,
    #[serde(default)]
    overrides: BTreeMap<String, Tier>,
}

impl Default for CategoryOverrides {
    fn default() -> Self {
        Self {
            version: 1,
            overrides: BTreeMap::new(),
        }
    }
}

impl CategoryOverrides {
    /// Load overrides from `path`. A missing file yields no overrides.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        if !path.as_std_path().exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path.as_std_path())?;
        let overrides: Self = serde_json::from_str(&contents)?;
        tracing::debug!("Loaded {} category overrides from {}", overrides.len(), path);
        Ok(overrides)
    }

    /// Save overrides to `path`, creating parent directories if needed.
    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent.as_std_path())?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_std_path(), contents)?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Tier> {
        self.overrides.get(id).copied()
    }

    pub fn set(&mut self, id: impl Into<String>, tier: Tier) {
        self.overrides.insert(id.into(), tier);
    }

    /// Remove the override for `id`, returning it.
    pub fn clear(&mut self, id: &str) -> Option<Tier> {
        self.overrides.remove(id)
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Tier)> {
        self.overrides.iter().map(|(id, tier)| (id.as_str(), *tier))
    }
}

/// Lowercase words of `text`, split at non-alphanumerics and at lower-to-upper
/// case changes.
fn words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;

    for c in text.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = false;
            continue;
        }
        if c.is_uppercase() && previous_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        previous_lower = c.is_lowercase() || c.is_numeric();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Whether `phrase` occurs in `haystack` as a run of whole words.
fn contains_phrase(haystack: &[String], phrase: &str) -> bool {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack
        .windows(needle.len())
        .any(|window| window.iter().zip(&needle).all(|(word, n)| word == n))
}

fn match_tier(texts: &[Vec<String>]) -> Option<Tier> {
    Tier::ALL.into_iter().find(|&tier| {
        keywords(tier)
            .iter()
            .any(|keyword| texts.iter().any(|words| contains_phrase(words, keyword)))
    })
}

/// Tier suggested by the mod's tags.
pub fn infer_from_tags(tags: &[String]) -> Option<Tier> {
    let tag_words: Vec<Vec<String>> = tags.iter().map(|tag| words(tag)).collect();
    match_tier(&tag_words)
}

/// Tier suggested by the mod's display name.
pub fn infer_from_name(name: &str) -> Option<Tier> {
    match_tier(&[words(name)])
}

/// The category `record` should have.
pub fn infer_category(record: &ModRecord, overrides: &CategoryOverrides) -> Category {
    overrides
        .get(&record.id)
        .or_else(|| infer_from_tags(&record.tags))
        .or_else(|| infer_from_name(&record.name))
        .map(Category::Tier)
        .unwrap_or(Category::Unset)
}

/// Write the inferred or overridden category onto every record.
pub fn apply_categories(records: &mut [ModRecord], overrides: &CategoryOverrides) {
    for record in records.iter_mut() {
        record.category = infer_category(record, overrides);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsmod_meta::MetadataSource;

    fn named(name: &str) -> ModRecord {
        ModRecord::new(format!("id-{name}"), name, MetadataSource::Embedded)
    }

    #[test]
    fn test_word_splitting() {
        assert_eq!(words("BetterHairStyles"), vec!["better", "hair", "styles"]);
        assert_eq!(words("5e Spells-Plus"), vec!["5e", "spells", "plus"]);
        assert_eq!(words("UI_Overhaul"), vec!["ui", "overhaul"]);
    }

    #[test]
    fn test_keyword_matches_whole_words_only() {
        assert_eq!(infer_from_name("Librarian Companion"), Some(Tier::Content));
        assert_eq!(infer_from_name("Unrelated"), None);
        assert_eq!(infer_from_name("Mod Config Menu"), Some(Tier::Framework));
        assert_eq!(infer_from_name("Mod Menu Config"), None);
    }

    #[test]
    fn test_earlier_tier_wins() {
        // "spells" is gameplay, "hair" is visual
        assert_eq!(infer_from_name("Hair and Spells"), Some(Tier::Gameplay));
        assert_eq!(
            infer_from_tags(&["Visual".to_string(), "Library".to_string()]),
            Some(Tier::Framework)
        );
    }

    #[test]
    fn test_inference_order() {
        let mut overrides = CategoryOverrides::default();

        let record = named("Camera Tweaks").with_tags(["Classes"]);
        assert_eq!(
            infer_category(&record, &overrides),
            Category::Tier(Tier::Gameplay)
        );

        let untagged = named("Camera Tweaks");
        assert_eq!(
            infer_category(&untagged, &overrides),
            Category::Tier(Tier::Visual)
        );

        overrides.set(record.id.clone(), Tier::LateLoader);
        assert_eq!(
            infer_category(&record, &overrides),
            Category::Tier(Tier::LateLoader)
        );

        assert_eq!(infer_category(&named("Zzz"), &overrides), Category::Unset);
    }

    #[test]
    fn test_apply_categories_keeps_unset() {
        let mut records = vec![named("Spell Pack"), named("Something")];
        apply_categories(&mut records, &CategoryOverrides::default());
        assert_eq!(records[0].category, Category::Tier(Tier::Gameplay));
        assert_eq!(records[1].category, Category::Unset);
        assert_eq!(records[1].category.sort_tier(), Tier::Content);
    }

    #[test]
    fn test_overrides_set_clear_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("nested/overrides.json"))
            .unwrap();

        let missing = CategoryOverrides::load(&path).unwrap();
        assert!(missing.is_empty());

        let mut overrides = CategoryOverrides::default();
        overrides.set("a", Tier::Visual);
        overrides.set("b", Tier::Framework);
        assert_eq!(overrides.clear("b"), Some(Tier::Framework));
        assert_eq!(overrides.clear("b"), None);
        overrides.save(&path).unwrap();

        let loaded = CategoryOverrides::load(&path).unwrap();
        assert_eq!(loaded, overrides);
        assert_eq!(loaded.get("a"), Some(Tier::Visual));

        let raw = std::fs::read_to_string(path.as_std_path()).unwrap();
        assert!(raw.contains("\"visual\""));
    }

    #[test]
    fn test_corrupt_overrides_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("overrides.json")).unwrap();
        std::fs::write(path.as_std_path(), "not json").unwrap();
        assert!(CategoryOverrides::load(&path).is_err());
    }
}
