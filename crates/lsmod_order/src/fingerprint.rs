use crate::{error::Result, OrderError};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a load-order document.
///
/// Stored after writing the document and compared on the next start to notice
/// edits made by something else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    pub fn of_file(path: &Utf8Path) -> Result<Self> {
        let bytes = std::fs::read(path.as_std_path())?;
        Ok(Self::of(&bytes))
    }

    /// Accept a previously stored digest. Case is normalised.
    pub fn from_hex(digest: &str) -> Result<Self> {
        let digest = digest.trim();
        let decoded = hex::decode(digest)
            .map_err(|_| OrderError::InvalidFingerprint(digest.to_string()))?;
        if decoded.len() != 32 {
            return Err(OrderError::InvalidFingerprint(digest.to_string()));
        }
        Ok(Self(hex::encode(decoded)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, bytes: &[u8]) -> bool {
        *self == Self::of(bytes)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored fingerprint next to the one computed now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintCheck {
    pub stored: Fingerprint,
    pub current: Fingerprint,
}

impl FingerprintCheck {
    pub fn is_mismatch(&self) -> bool {
        self.stored != self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_hex_sha256() {
        let fp = Fingerprint::of(b"");
        assert_eq!(
            fp.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert!(fp.matches(b""));
        assert!(!fp.matches(b"changed"));
    }

    #[test]
    fn test_from_hex() {
        let fp = Fingerprint::of(b"order");
        let upper = fp.as_str().to_uppercase();
        assert_eq!(Fingerprint::from_hex(&upper).unwrap(), fp);
        assert!(Fingerprint::from_hex("abcd").is_err());
        assert!(Fingerprint::from_hex("not hex").is_err());
    }

    #[test]
    fn test_of_file_and_check() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"<save/>").unwrap();
        let path = Utf8Path::from_path(file.path()).unwrap();

        let stored = Fingerprint::of_file(path).unwrap();
        std::fs::write(file.path(), b"<save>edited</save>").unwrap();
        let check = FingerprintCheck {
            stored,
            current: Fingerprint::of_file(path).unwrap(),
        };
        assert!(check.is_mismatch());
    }
}
