//! The validation battery run after every change to the mod set.
//!
//! [`validate`] is a pure function of its [`ValidationInput`]. Every check
//! runs on every call and the result replaces the previous warning list; no
//! check depends on another's output.

use crate::{
    base::is_base_module,
    environment::{EnvironmentHazard, ExtensionStatus},
    fingerprint::FingerprintCheck,
    graph::DependencyGraph,
    OrderError,
};
use camino::Utf8PathBuf;
use itertools::Itertools;
use lsmod_meta::{MetadataSource, ModRecord};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Display;

/// Ordered `Info < Warning < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningCategory {
    DuplicateId,
    MissingDependency,
    WrongOrder,
    CircularDependency,
    Conflict,
    OrphanedEntry,
    ExtensionRequired,
    NoMetadata,
    EnvironmentHazard,
    ExternalMutation,
}

impl Display for WarningCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            WarningCategory::DuplicateId => "duplicate-id",
            WarningCategory::MissingDependency => "missing-dependency",
            WarningCategory::WrongOrder => "wrong-order",
            WarningCategory::CircularDependency => "circular-dependency",
            WarningCategory::Conflict => "conflict",
            WarningCategory::OrphanedEntry => "orphaned-entry",
            WarningCategory::ExtensionRequired => "extension-required",
            WarningCategory::NoMetadata => "no-metadata",
            WarningCategory::EnvironmentHazard => "environment-hazard",
            WarningCategory::ExternalMutation => "external-mutation",
        })
    }
}

/// What a user could do about a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "target", rename_all = "kebab-case")]
pub enum SuggestedAction {
    /// Sort the active list.
    Reorder,
    /// Activate the installed but inactive mod with this id.
    Activate(String),
    Deactivate(String),
    /// Install the mod with this name.
    Install(String),
    /// Delete this file or directory.
    Delete(Utf8PathBuf),
    /// Drop this id from the recorded load order.
    Remove(String),
    /// Needs a person to look at it.
    Review,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub severity: Severity,
    pub category: WarningCategory,
    pub message: String,
    pub affected_ids: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<SuggestedAction>,
}

impl Warning {
    fn new(severity: Severity, category: WarningCategory, message: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            affected_ids: BTreeSet::new(),
            suggested_action: None,
        }
    }

    fn affecting<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    fn suggest(mut self, action: SuggestedAction) -> Self {
        self.suggested_action = Some(action);
        self
    }
}

/// Everything [`validate`] looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationInput<'a> {
    pub active: &'a [ModRecord],
    pub inactive: &'a [ModRecord],
    /// `None` when the runtime extension is not installed.
    pub runtime_extension: Option<&'a ExtensionStatus>,
    /// Whether the runtime extension was seen installed before.
    pub extension_previously_deployed: bool,
    pub hazards: &'a [EnvironmentHazard],
    /// Ids listed in the external load-order document.
    pub recorded_order: &'a [String],
    pub fingerprint: Option<&'a FingerprintCheck>,
}

impl<'a> ValidationInput<'a> {
    pub fn new(active: &'a [ModRecord], inactive: &'a [ModRecord]) -> Self {
        Self {
            active,
            inactive,
            ..Default::default()
        }
    }
}

/// Run every check and return the findings.
pub fn validate(input: &ValidationInput<'_>) -> Vec<Warning> {
    let mut warnings = Vec::new();
    check_duplicate_ids(input, &mut warnings);
    check_dependencies(input, &mut warnings);
    check_cycles(input, &mut warnings);
    check_conflicts(input, &mut warnings);
    check_orphaned_entries(input, &mut warnings);
    check_runtime_extension(input, &mut warnings);
    check_metadata(input, &mut warnings);
    check_environment(input, &mut warnings);
    check_fingerprint(input, &mut warnings);

    tracing::debug!("Validation produced {} warnings", warnings.len());
    warnings
}

fn check_duplicate_ids(input: &ValidationInput<'_>, warnings: &mut Vec<Warning>) {
    // copies per id, in first-seen order; the flag marks active copies
    let mut groups: Vec<(&str, Vec<(&ModRecord, bool)>)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let copies = input
        .active
        .iter()
        .map(|record| (record, true))
        .chain(input.inactive.iter().map(|record| (record, false)));
    for (record, active) in copies {
        let slot = *slots.entry(record.id.as_str()).or_insert_with(|| {
            groups.push((record.id.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push((record, active));
    }

    for (id, group) in groups.iter().filter(|(_, group)| group.len() > 1) {
        let active_copies = group.iter().filter(|(_, active)| *active).count();
        let severity = if active_copies > 1 {
            Severity::Critical
        } else {
            Severity::Warning
        };
        let archives = group
            .iter()
            .filter_map(|(record, _)| record.source_archive.as_ref())
            .map(|path| path.as_str())
            .join(", ");

        let mut warning = Warning::new(
            severity,
            WarningCategory::DuplicateId,
            format!(
                "{} copies of '{}' share the id {} ({} active){}",
                group.len(),
                group[0].0.name,
                id,
                active_copies,
                if archives.is_empty() {
                    String::new()
                } else {
                    format!(": {archives}")
                }
            ),
        )
        .affecting([*id]);

        // suggest removing the copy that is not the first one seen
        warning = match group.iter().skip(1).find_map(|(r, _)| r.source_archive.clone()) {
            Some(path) => warning.suggest(SuggestedAction::Delete(path)),
            None => warning.suggest(SuggestedAction::Review),
        };
        warnings.push(warning);
    }
}

fn check_dependencies(input: &ValidationInput<'_>, warnings: &mut Vec<Warning>) {
    let mut position: HashMap<&str, usize> = HashMap::new();
    for (index, record) in input.active.iter().enumerate() {
        position.entry(record.id.as_str()).or_insert(index);
    }
    let inactive: HashMap<&str, &ModRecord> = input
        .inactive
        .iter()
        .map(|record| (record.id.as_str(), record))
        .collect();

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    for (index, record) in input.active.iter().enumerate() {
        if is_base_module(&record.id) {
            continue;
        }
        for dependency in &record.dependencies {
            if dependency.id == record.id
                || is_base_module(&dependency.id)
                || !seen.insert((record.id.as_str(), dependency.id.as_str()))
            {
                continue;
            }

            match position.get(dependency.id.as_str()) {
                Some(&dep_index) if dep_index > index => warnings.push(
                    Warning::new(
                        Severity::Warning,
                        WarningCategory::WrongOrder,
                        format!(
                            "'{}' loads before its dependency '{}'",
                            record.name,
                            dependency.display_name()
                        ),
                    )
                    .affecting([record.id.as_str(), dependency.id.as_str()])
                    .suggest(SuggestedAction::Reorder),
                ),
                Some(_) => {}
                None => warnings.push(missing_dependency(record, dependency, &inactive)),
            }
        }
    }
}

fn missing_dependency(
    record: &ModRecord,
    dependency: &lsmod_meta::DependencyRef,
    inactive: &HashMap<&str, &ModRecord>,
) -> Warning {
    match inactive.get(dependency.id.as_str()) {
        Some(installed) => Warning::new(
            Severity::Warning,
            WarningCategory::MissingDependency,
            format!(
                "'{}' requires '{}', which is installed but not active",
                record.name, installed.name
            ),
        )
        .affecting([record.id.as_str(), dependency.id.as_str()])
        .suggest(SuggestedAction::Activate(dependency.id.clone())),
        None => Warning::new(
            Severity::Warning,
            WarningCategory::MissingDependency,
            format!(
                "'{}' requires '{}', which is not installed",
                record.name,
                dependency.display_name()
            ),
        )
        .affecting([record.id.as_str()])
        .suggest(SuggestedAction::Install(dependency.display_name().to_string())),
    }
}

fn check_cycles(input: &ValidationInput<'_>, warnings: &mut Vec<Warning>) {
    let mods: Vec<ModRecord> = input
        .active
        .iter()
        .filter(|record| !is_base_module(&record.id))
        .cloned()
        .collect();

    if let Err(OrderError::CycleDetected { ids }) = DependencyGraph::build(&mods).sort() {
        let names = mods
            .iter()
            .filter(|record| ids.contains(&record.id))
            .map(|record| record.name.as_str())
            .unique()
            .join(", ");
        warnings.push(
            Warning::new(
                Severity::Critical,
                WarningCategory::CircularDependency,
                format!("Circular dependency between {names}"),
            )
            .affecting(ids)
            .suggest(SuggestedAction::Review),
        );
    }
}

fn check_conflicts(input: &ValidationInput<'_>, warnings: &mut Vec<Warning>) {
    let mut reported: HashSet<(&str, &str)> = HashSet::new();

    for (first, second) in input.active.iter().tuple_combinations() {
        if first.id == second.id || is_base_module(&first.id) || is_base_module(&second.id) {
            continue;
        }
        if !first.conflicts_with(&second.id) && !second.conflicts_with(&first.id) {
            continue;
        }
        let pair = if first.id < second.id {
            (first.id.as_str(), second.id.as_str())
        } else {
            (second.id.as_str(), first.id.as_str())
        };
        if !reported.insert(pair) {
            continue;
        }

        warnings.push(
            Warning::new(
                Severity::Warning,
                WarningCategory::Conflict,
                format!("'{}' conflicts with '{}'", first.name, second.name),
            )
            .affecting([pair.0, pair.1])
            .suggest(SuggestedAction::Deactivate(second.id.clone())),
        );
    }
}

fn check_orphaned_entries(input: &ValidationInput<'_>, warnings: &mut Vec<Warning>) {
    let known: HashSet<&str> = input
        .active
        .iter()
        .chain(input.inactive)
        .map(|record| record.id.as_str())
        .collect();

    for id in input.recorded_order.iter().unique() {
        if known.contains(id.as_str()) || is_base_module(id) {
            continue;
        }
        warnings.push(
            Warning::new(
                Severity::Info,
                WarningCategory::OrphanedEntry,
                format!("The load order lists {id}, which is not installed"),
            )
            .affecting([id.as_str()])
            .suggest(SuggestedAction::Remove(id.clone())),
        );
    }
}

fn check_runtime_extension(input: &ValidationInput<'_>, warnings: &mut Vec<Warning>) {
    if input.runtime_extension.is_some() {
        return;
    }

    let requiring: Vec<&ModRecord> = input
        .active
        .iter()
        .filter(|record| record.requires_runtime_extension)
        .collect();

    if !requiring.is_empty() {
        warnings.push(
            Warning::new(
                Severity::Warning,
                WarningCategory::ExtensionRequired,
                format!(
                    "The script extender is not installed but is required by {}",
                    requiring.iter().map(|r| r.name.as_str()).join(", ")
                ),
            )
            .affecting(requiring.iter().map(|r| r.id.as_str()))
            .suggest(SuggestedAction::Install("Script Extender".to_string())),
        );
    }

    if input.extension_previously_deployed {
        warnings.push(
            Warning::new(
                Severity::Warning,
                WarningCategory::ExternalMutation,
                "The script extender was installed before but is now missing",
            )
            .affecting(requiring.iter().map(|r| r.id.as_str()))
            .suggest(SuggestedAction::Install("Script Extender".to_string())),
        );
    }
}

fn check_metadata(input: &ValidationInput<'_>, warnings: &mut Vec<Warning>) {
    for record in input.active.iter().chain(input.inactive) {
        if record.metadata_source != MetadataSource::FilenameDerived {
            continue;
        }
        warnings.push(
            Warning::new(
                Severity::Info,
                WarningCategory::NoMetadata,
                format!(
                    "'{}' has no metadata; its identity was derived from the file name",
                    record.name
                ),
            )
            .affecting([record.id.as_str()]),
        );
    }
}

fn check_environment(input: &ValidationInput<'_>, warnings: &mut Vec<Warning>) {
    for hazard in input.hazards {
        warnings.push(
            Warning::new(
                Severity::Info,
                WarningCategory::EnvironmentHazard,
                format!("{}: {}", hazard.description, hazard.path),
            )
            .suggest(SuggestedAction::Delete(hazard.path.clone())),
        );
    }
}

fn check_fingerprint(input: &ValidationInput<'_>, warnings: &mut Vec<Warning>) {
    let Some(check) = input.fingerprint else {
        return;
    };
    if check.is_mismatch() {
        warnings.push(
            Warning::new(
                Severity::Warning,
                WarningCategory::ExternalMutation,
                "The load-order file was changed outside this tool since it was last written",
            )
            .suggest(SuggestedAction::Review),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::PRIMARY_BASE_MODULE;
    use crate::fingerprint::Fingerprint;
    use crate::graph::tests::record;

    fn only(warnings: &[Warning], category: WarningCategory) -> Vec<&Warning> {
        warnings.iter().filter(|w| w.category == category).collect()
    }

    fn run(active: &[ModRecord], inactive: &[ModRecord]) -> Vec<Warning> {
        validate(&ValidationInput::new(active, inactive))
    }

    #[test]
    fn test_clean_set_has_no_warnings() {
        let active = vec![
            PRIMARY_BASE_MODULE.to_record(),
            record("B", &[PRIMARY_BASE_MODULE.id]),
            record("A", &["B"]),
        ];
        assert!(run(&active, &[]).is_empty());
    }

    #[test]
    fn test_missing_dependency_not_installed() {
        let alpha = record(
            "11111111-1111-1111-1111-111111111111",
            &["22222222-2222-2222-2222-222222222222"],
        );
        let warnings = run(&[alpha.clone()], &[]);

        assert_eq!(warnings.len(), 1);
        let warning = &warnings[0];
        assert_eq!(warning.category, WarningCategory::MissingDependency);
        assert_eq!(warning.severity, Severity::Warning);
        assert!(warning.affected_ids.contains(&alpha.id));
        assert!(matches!(
            warning.suggested_action,
            Some(SuggestedAction::Install(_))
        ));
    }

    #[test]
    fn test_missing_dependency_installed_but_inactive() {
        let warnings = run(&[record("A", &["B"])], &[record("B", &[])]);
        let missing = only(&warnings, WarningCategory::MissingDependency);

        assert_eq!(missing.len(), 1);
        assert_eq!(
            missing[0].suggested_action,
            Some(SuggestedAction::Activate("B".to_string()))
        );
        assert!(missing[0].affected_ids.contains("B"));
    }

    #[test]
    fn test_alpha_package_end_to_end() {
        let meta = r#"<save><region id="Config"><node id="root"><children>
            <node id="Dependencies"><children>
              <node id="ModuleShortDesc">
                <attribute id="UUID" type="FixedString" value="22222222-2222-2222-2222-222222222222"/>
                <attribute id="Name" type="LSString" value="Beta"/>
              </node>
            </children></node>
            <node id="ModuleInfo">
              <attribute id="UUID" type="FixedString" value="11111111-1111-1111-1111-111111111111"/>
              <attribute id="Name" type="LSString" value="Alpha"/>
            </node>
        </children></node></region></save>"#;

        let dir = tempfile::tempdir().unwrap();
        let archive = Utf8PathBuf::from_path_buf(dir.path().join("Alpha.pak")).unwrap();
        lspk::fixture::PackageWriter::new(18)
            .with_entry("Mods/Alpha/meta.lsx", meta.as_bytes(), lspk::CompressionMethod::Zlib)
            .write_to(&archive)
            .unwrap();

        assert_eq!(lspk::list_entries(&archive).unwrap().len(), 1);
        let alpha =
            lsmod_meta::read_mod_from_package(&lsmod_meta::PackageFiles, &archive, None).unwrap();
        assert_eq!(alpha.name, "Alpha");
        assert_eq!(alpha.dependencies.len(), 1);

        let warnings = run(&[alpha.clone()], &[]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, WarningCategory::MissingDependency);
        assert_eq!(warnings[0].severity, Severity::Warning);
        assert!(warnings[0].affected_ids.contains(&alpha.id));
    }

    #[test]
    fn test_wrong_order() {
        let warnings = run(&[record("A", &["B"]), record("B", &[])], &[]);

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, WarningCategory::WrongOrder);
        assert_eq!(
            warnings[0].affected_ids,
            BTreeSet::from(["A".to_string(), "B".to_string()])
        );
        assert_eq!(warnings[0].suggested_action, Some(SuggestedAction::Reorder));
    }

    #[test]
    fn test_cycle_is_critical() {
        let warnings = run(&[record("A", &["B"]), record("B", &["A"])], &[]);
        let cycles = only(&warnings, WarningCategory::CircularDependency);

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].severity, Severity::Critical);
        assert_eq!(cycles[0].affected_ids.len(), 2);
    }

    #[test]
    fn test_conflicts_are_symmetric_and_deduplicated() {
        let plain = || (record("A", &[]), record("B", &[]));

        let (a, b) = plain();
        let one_way = run(&[a.with_conflict(b.to_reference()), b], &[]);

        let (a, b) = plain();
        let other_way = run(&[a.clone(), b.with_conflict(a.to_reference())], &[]);

        let (a, b) = plain();
        let both = run(
            &[
                a.clone().with_conflict(b.to_reference()),
                b.with_conflict(a.to_reference()),
            ],
            &[],
        );

        for warnings in [&one_way, &other_way, &both] {
            assert_eq!(warnings.len(), 1);
            assert_eq!(warnings[0].category, WarningCategory::Conflict);
            assert_eq!(
                warnings[0].affected_ids,
                BTreeSet::from(["A".to_string(), "B".to_string()])
            );
        }
        assert_eq!(one_way, both);
        assert_eq!(other_way, both);
    }

    #[test]
    fn test_inactive_conflict_is_ignored() {
        let a = record("A", &[]).with_conflict(lsmod_meta::DependencyRef::new("B"));
        assert!(run(&[a], &[record("B", &[])]).is_empty());
    }

    #[test]
    fn test_duplicate_ids() {
        let mut first = record("A", &[]);
        first.source_archive = Some(Utf8PathBuf::from("Mods/A.pak"));
        let mut second = record("A", &[]);
        second.source_archive = Some(Utf8PathBuf::from("Mods/A_copy.pak"));

        let warnings = run(&[first.clone()], &[second.clone()]);
        let dupes = only(&warnings, WarningCategory::DuplicateId);
        assert_eq!(dupes.len(), 1);
        assert_eq!(dupes[0].severity, Severity::Warning);
        assert_eq!(
            dupes[0].suggested_action,
            Some(SuggestedAction::Delete(Utf8PathBuf::from("Mods/A_copy.pak")))
        );

        let warnings = run(&[first, second], &[]);
        let dupes = only(&warnings, WarningCategory::DuplicateId);
        assert_eq!(dupes.len(), 1);
        assert_eq!(dupes[0].severity, Severity::Critical);
    }

    #[test]
    fn test_runtime_extension_missing() {
        let mut scripted = record("S", &[]);
        scripted.requires_runtime_extension = true;
        let active = [scripted];

        let mut input = ValidationInput::new(&active, &[]);
        let warnings = validate(&input);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, WarningCategory::ExtensionRequired);

        input.extension_previously_deployed = true;
        let categories: Vec<_> = validate(&input).iter().map(|w| w.category).collect();
        assert_eq!(
            categories,
            vec![
                WarningCategory::ExtensionRequired,
                WarningCategory::ExternalMutation
            ]
        );

        let status = ExtensionStatus {
            loader_path: Utf8PathBuf::from("bin/DWrite.dll"),
        };
        input.runtime_extension = Some(&status);
        assert!(validate(&input).is_empty());
    }

    #[test]
    fn test_extension_disappeared_only_with_prior_deployment() {
        let active = [record("A", &[])];

        let never_had_it = ValidationInput::new(&active, &[]);
        assert!(validate(&never_had_it).is_empty());

        let had_it = ValidationInput {
            extension_previously_deployed: true,
            ..ValidationInput::new(&active, &[])
        };
        let warnings = validate(&had_it);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, WarningCategory::ExternalMutation);
        assert!(warnings[0].message.contains("now missing"));
        assert!(only(&warnings, WarningCategory::ExtensionRequired).is_empty());
    }

    #[test]
    fn test_info_level_checks() {
        let mut derived = record("D", &[]);
        derived.metadata_source = MetadataSource::FilenameDerived;
        let active = [derived];
        let hazards = [EnvironmentHazard {
            path: Utf8PathBuf::from("Data/Mods"),
            description: "Loose Mods folder".to_string(),
        }];
        let recorded = vec![
            "D".to_string(),
            "gone".to_string(),
            "gone".to_string(),
            PRIMARY_BASE_MODULE.id.to_string(),
        ];

        let input = ValidationInput {
            hazards: &hazards,
            recorded_order: &recorded,
            ..ValidationInput::new(&active, &[])
        };
        let warnings = validate(&input);

        assert!(warnings.iter().all(|w| w.severity == Severity::Info));
        assert_eq!(only(&warnings, WarningCategory::NoMetadata).len(), 1);
        let orphans = only(&warnings, WarningCategory::OrphanedEntry);
        assert_eq!(orphans.len(), 1);
        assert_eq!(
            orphans[0].suggested_action,
            Some(SuggestedAction::Remove("gone".to_string()))
        );
        let hazard = only(&warnings, WarningCategory::EnvironmentHazard);
        assert_eq!(
            hazard[0].suggested_action,
            Some(SuggestedAction::Delete(Utf8PathBuf::from("Data/Mods")))
        );
    }

    #[test]
    fn test_external_mutation() {
        let check = FingerprintCheck {
            stored: Fingerprint::of(b"old"),
            current: Fingerprint::of(b"new"),
        };
        let input = ValidationInput {
            fingerprint: Some(&check),
            ..Default::default()
        };
        let warnings = validate(&input);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, WarningCategory::ExternalMutation);

        let same = FingerprintCheck {
            stored: Fingerprint::of(b"same"),
            current: Fingerprint::of(b"same"),
        };
        let input = ValidationInput {
            fingerprint: Some(&same),
            ..Default::default()
        };
        assert!(validate(&input).is_empty());
    }

    #[test]
    fn test_warnings_serialize() {
        let warnings = run(&[record("A", &["B"]), record("B", &[])], &[]);
        let json = serde_json::to_value(&warnings).unwrap();
        assert_eq!(json[0]["category"], "wrong-order");
        assert_eq!(json[0]["severity"], "warning");
        assert_eq!(json[0]["suggestedAction"]["action"], "reorder");
    }
}
