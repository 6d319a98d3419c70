use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Coarse load-order class. Lower tiers load first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Framework = 1,
    Gameplay = 2,
    Content = 3,
    Visual = 4,
    LateLoader = 5,
}

impl Tier {
    /// All tiers in load order.
    pub const ALL: [Tier; 5] = [
        Tier::Framework,
        Tier::Gameplay,
        Tier::Content,
        Tier::Visual,
        Tier::LateLoader,
    ];

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn from_rank(rank: u8) -> Option<Tier> {
        Self::ALL.into_iter().find(|tier| tier.rank() == rank)
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::Framework => "Framework",
            Tier::Gameplay => "Gameplay",
            Tier::Content => "Content",
            Tier::Visual => "Visual",
            Tier::LateLoader => "Late Loader",
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A mod's stored category.
///
/// `Unset` means nothing was ever assigned. Sorting treats it as
/// [`Tier::Content`] through [`Category::sort_tier`], but the stored value is
/// never rewritten to that tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Unset,
    Tier(Tier),
}

impl Category {
    pub fn tier(self) -> Option<Tier> {
        match self {
            Category::Unset => None,
            Category::Tier(tier) => Some(tier),
        }
    }

    /// The tier used for grouping when sorting.
    pub fn sort_tier(self) -> Tier {
        self.tier().unwrap_or(Tier::Content)
    }

    pub fn is_set(self) -> bool {
        matches!(self, Category::Tier(_))
    }
}

impl From<Tier> for Category {
    fn from(tier: Tier) -> Self {
        Category::Tier(tier)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Unset => f.write_str("Uncategorized"),
            Category::Tier(tier) => tier.fmt(f),
        }
    }
}
