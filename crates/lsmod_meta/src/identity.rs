use camino::Utf8Path;
use uuid::Uuid;

/// Namespace for ids derived from archive file names.
const FILENAME_NAMESPACE: Uuid = Uuid::from_u128(0x6c73_6d6f_645f_4000_8000_6669_6c65_6e61);

/// Deterministic id for a mod known only by its archive file name.
///
/// The same file name (compared case-insensitively) always maps to the same id.
pub fn derive_id(file_name: &str) -> String {
    Uuid::new_v5(&FILENAME_NAMESPACE, file_name.to_lowercase().as_bytes())
        .hyphenated()
        .to_string()
}

/// [`derive_id`] over the final component of `path`.
pub fn derive_id_for_path(path: &Utf8Path) -> String {
    derive_id(path.file_name().unwrap_or(path.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_id_is_stable_and_case_insensitive() {
        let a = derive_id("MyMod.pak");
        assert_eq!(a, derive_id("mymod.pak"));
        assert_eq!(a, derive_id("MYMOD.PAK"));
        assert_ne!(a, derive_id("OtherMod.pak"));

        let parsed = Uuid::parse_str(&a).unwrap();
        assert_eq!(parsed.get_version_num(), 5);
    }

    #[test]
    fn test_path_uses_file_name_only() {
        assert_eq!(
            derive_id_for_path(Utf8Path::new("/games/Mods/MyMod.pak")),
            derive_id("MyMod.pak")
        );
    }
}
