use crate::error::MetadataError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// A four component module version packed into 64 bits.
///
/// Bit widths, high to low: major 9, minor 8, revision 16, build 31. Ordering
/// is the ordering of the packed integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub struct Version64 {
    packed: u64,
}

const MAJOR_SHIFT: u32 = 55;
const MINOR_SHIFT: u32 = 47;
const REVISION_SHIFT: u32 = 31;

const MAJOR_MASK: u64 = (1 << 9) - 1;
const MINOR_MASK: u64 = (1 << 8) - 1;
const REVISION_MASK: u64 = (1 << 16) - 1;
const BUILD_MASK: u64 = (1 << 31) - 1;

impl Version64 {
    /// Build a version from its components. Each component is masked to its
    /// bit width.
    pub fn new(major: u32, minor: u32, revision: u32, build: u32) -> Self {
        let packed = ((u64::from(major) & MAJOR_MASK) << MAJOR_SHIFT)
            | ((u64::from(minor) & MINOR_MASK) << MINOR_SHIFT)
            | ((u64::from(revision) & REVISION_MASK) << REVISION_SHIFT)
            | (u64::from(build) & BUILD_MASK);
        Self { packed }
    }

    pub const fn from_packed(packed: u64) -> Self {
        Self { packed }
    }

    /// Decode the legacy 32-bit `Version` attribute (4/4/8/16 bits).
    pub fn from_packed32(packed: u32) -> Self {
        Self::new(
            packed >> 28,
            (packed >> 24) & 0x0F,
            (packed >> 16) & 0xFF,
            packed & 0xFFFF,
        )
    }

    pub const fn to_packed(self) -> u64 {
        self.packed
    }

    pub fn major(self) -> u32 {
        ((self.packed >> MAJOR_SHIFT) & MAJOR_MASK) as u32
    }

    pub fn minor(self) -> u32 {
        ((self.packed >> MINOR_SHIFT) & MINOR_MASK) as u32
    }

    pub fn revision(self) -> u32 {
        ((self.packed >> REVISION_SHIFT) & REVISION_MASK) as u32
    }

    pub fn build(self) -> u32 {
        (self.packed & BUILD_MASK) as u32
    }

    pub fn is_zero(self) -> bool {
        self.packed == 0
    }
}

impl From<u64> for Version64 {
    fn from(packed: u64) -> Self {
        Self::from_packed(packed)
    }
}

impl From<Version64> for u64 {
    fn from(version: Version64) -> Self {
        version.to_packed()
    }
}

impl Display for Version64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major(),
            self.minor(),
            self.revision(),
            self.build()
        )
    }
}

impl FromStr for Version64 {
    type Err = MetadataError;

    /// Parse `major[.minor[.revision[.build]]]`; missing components are zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches(['v', 'V']);
        let invalid = || MetadataError::InvalidVersion(s.to_string());

        let parts: Vec<&str> = trimmed.split('.').collect();
        if trimmed.is_empty() || parts.len() > 4 {
            return Err(invalid());
        }

        let mut components = [0u32; 4];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| invalid())?;
        }

        let [major, minor, revision, build] = components;
        if u64::from(major) > MAJOR_MASK
            || u64::from(minor) > MINOR_MASK
            || u64::from(revision) > REVISION_MASK
            || u64::from(build) > BUILD_MASK
        {
            return Err(invalid());
        }

        Ok(Self::new(major, minor, revision, build))
    }
}
