use lsmod_meta::{MetadataSource, ModRecord};

/// One of the game's own modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseModule {
    pub id: &'static str,
    pub folder: &'static str,
    pub name: &'static str,
}

impl BaseModule {
    pub fn to_record(self) -> ModRecord {
        let mut record = ModRecord::new(self.id, self.name, MetadataSource::Builtin);
        record.folder = self.folder.to_string();
        record
    }
}

/// Modules shipped with the game. They anchor the front of every load order,
/// never contribute ordering edges and are never reported as missing.
pub const BASE_MODULES: &[BaseModule] = &[
    BaseModule {
        id: "28ac9ce2-2aba-8cda-b3b5-6e922f71b6b8",
        folder: "GustavDev",
        name: "GustavDev",
    },
    BaseModule {
        id: "991c9c7a-fb80-40cb-8f0d-b92d4e80e9b1",
        folder: "Gustav",
        name: "Gustav",
    },
    BaseModule {
        id: "cb555efe-2d9e-131f-8195-a89329d218ea",
        folder: "GustavX",
        name: "GustavX",
    },
    BaseModule {
        id: "ed539163-bb70-431b-96a7-f5b2eda5376b",
        folder: "Shared",
        name: "Shared",
    },
    BaseModule {
        id: "3d0c5ff8-c95d-c907-ff3e-34b204f1c630",
        folder: "SharedDev",
        name: "SharedDev",
    },
    BaseModule {
        id: "9dff4c3b-fda7-43de-a763-ce1383039999",
        folder: "Engine",
        name: "Engine",
    },
    BaseModule {
        id: "630daa32-70f8-3da5-41b9-154fe8410236",
        folder: "MainUI",
        name: "MainUI",
    },
    BaseModule {
        id: "ee5a55ff-eb38-0b27-c5b0-f358dc306d34",
        folder: "ModBrowser",
        name: "ModBrowser",
    },
    BaseModule {
        id: "e5c9077e-1fca-4f24-b55d-464f512c98a8",
        folder: "FW3",
        name: "FW3",
    },
    BaseModule {
        id: "b77b6210-ac50-4cb1-a3d5-5702fb9c744c",
        folder: "Honour",
        name: "Honour",
    },
];

/// The module every load order starts with.
pub const PRIMARY_BASE_MODULE: BaseModule = BASE_MODULES[0];

pub fn is_base_module(id: &str) -> bool {
    BASE_MODULES.iter().any(|base| base.id.eq_ignore_ascii_case(id))
}

pub fn base_module(id: &str) -> Option<BaseModule> {
    BASE_MODULES
        .iter()
        .copied()
        .find(|base| base.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_module_lookup() {
        assert!(is_base_module("991c9c7a-fb80-40cb-8f0d-b92d4e80e9b1"));
        assert!(is_base_module("991C9C7A-FB80-40CB-8F0D-B92D4E80E9B1"));
        assert!(!is_base_module("11111111-1111-1111-1111-111111111111"));

        let record = PRIMARY_BASE_MODULE.to_record();
        assert_eq!(record.metadata_source, MetadataSource::Builtin);
        assert_eq!(record.folder, "GustavDev");
        assert_eq!(base_module(&record.id), Some(PRIMARY_BASE_MODULE));
    }
}
