//! The mutable mod set and its current warnings.
//!
//! [`LoadOrder`] owns the active and inactive sequences, the category
//! overrides and what is known about the game environment. Every mutator
//! finishes by recomputing the full warning list, so after any call returns
//! [`LoadOrder::warnings`] describes the state as it is now.

use crate::{
    base::{is_base_module, PRIMARY_BASE_MODULE},
    category::{apply_categories, infer_category, CategoryOverrides},
    environment::{EnvironmentHazard, ExtensionStatus},
    error::Result,
    fingerprint::FingerprintCheck,
    graph::dependency_sort,
    smart::smart_sort,
    validate::{validate, Severity, ValidationInput, Warning},
    OrderError,
};
use lsmod_meta::{ModRecord, Tier};

/// Active and inactive mods. No id appears twice across both sequences.
#[derive(Debug, Clone, Default)]
pub struct OrderedModSet {
    active: Vec<ModRecord>,
    inactive: Vec<ModRecord>,
}

impl OrderedModSet {
    pub fn active(&self) -> &[ModRecord] {
        &self.active
    }

    pub fn inactive(&self) -> &[ModRecord] {
        &self.inactive
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&ModRecord> {
        self.active
            .iter()
            .chain(&self.inactive)
            .find(|record| record.id == id)
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active_index(id).is_some()
    }

    fn active_index(&self, id: &str) -> Option<usize> {
        self.active.iter().position(|record| record.id == id)
    }

    fn inactive_index(&self, id: &str) -> Option<usize> {
        self.inactive.iter().position(|record| record.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut ModRecord> {
        self.active
            .iter_mut()
            .chain(self.inactive.iter_mut())
            .find(|record| record.id == id)
    }

    fn records_mut(&mut self) -> impl Iterator<Item = &mut ModRecord> {
        self.active.iter_mut().chain(self.inactive.iter_mut())
    }
}

/// How [`LoadOrder::sort`] orders the active mods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Dependency order only. Fails on any cycle.
    Dependency,
    /// Tier grouping, then dependency order inside each tier. A cyclic tier
    /// keeps its order.
    Smart,
}

/// What the validator needs to know about the game installation.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub runtime_extension: Option<ExtensionStatus>,
    pub extension_previously_deployed: bool,
    pub hazards: Vec<EnvironmentHazard>,
    /// Ids listed in the load-order document on disk.
    pub recorded_order: Vec<String>,
    pub fingerprint: Option<FingerprintCheck>,
}

/// The single owner of the mod set.
#[derive(Debug, Clone, Default)]
pub struct LoadOrder {
    mods: OrderedModSet,
    /// Records whose id is already taken by a mod from another archive.
    duplicates: Vec<ModRecord>,
    overrides: CategoryOverrides,
    environment: Environment,
    warnings: Vec<Warning>,
}

impl LoadOrder {
    pub fn new(overrides: CategoryOverrides, environment: Environment) -> Self {
        let mut order = Self {
            overrides,
            environment,
            ..Default::default()
        };
        order.revalidate();
        order
    }

    /// Start from discovered records, all inactive, in discovery order.
    pub fn from_records(
        records: impl IntoIterator<Item = ModRecord>,
        overrides: CategoryOverrides,
        environment: Environment,
    ) -> Self {
        let mut order = Self::new(overrides, environment);
        for record in records {
            order.insert_record(record);
        }
        order.revalidate();
        order
    }

    pub fn mods(&self) -> &OrderedModSet {
        &self.mods
    }

    pub fn active(&self) -> &[ModRecord] {
        self.mods.active()
    }

    pub fn inactive(&self) -> &[ModRecord] {
        self.mods.inactive()
    }

    pub fn duplicates(&self) -> &[ModRecord] {
        &self.duplicates
    }

    pub fn get(&self, id: &str) -> Option<&ModRecord> {
        self.mods.get(id)
    }

    pub fn overrides(&self) -> &CategoryOverrides {
        &self.overrides
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Warnings for the current state.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.warnings.iter().map(|w| w.severity).max()
    }

    /// Whether a destructive action such as saving should ask first.
    pub fn has_critical(&self) -> bool {
        self.max_severity() == Some(Severity::Critical)
    }

    /// Move an inactive mod into the active list at `at`, or at the end.
    ///
    /// Activating a mod that is already active changes nothing.
    pub fn activate(&mut self, id: &str, at: Option<usize>) -> Result<()> {
        if self.mods.is_active(id) {
            return Ok(());
        }
        let index = self
            .mods
            .inactive_index(id)
            .ok_or_else(|| OrderError::UnknownMod(id.to_string()))?;

        let record = self.mods.inactive.remove(index);
        let at = at.unwrap_or(self.mods.active.len()).min(self.mods.active.len());
        tracing::debug!("Activating {} at {}", record.id, at);
        self.mods.active.insert(at, record);

        self.revalidate();
        Ok(())
    }

    /// Move an active mod to the end of the inactive list.
    pub fn deactivate(&mut self, id: &str) -> Result<()> {
        if is_base_module(id) {
            return Err(OrderError::BaseModule(id.to_string()));
        }
        let Some(index) = self.mods.active_index(id) else {
            return if self.mods.contains(id) {
                Ok(())
            } else {
                Err(OrderError::UnknownMod(id.to_string()))
            };
        };

        let record = self.mods.active.remove(index);
        tracing::debug!("Deactivating {}", record.id);
        self.mods.inactive.push(record);

        self.revalidate();
        Ok(())
    }

    /// Move an active mod to position `to` (clamped to the list).
    pub fn move_active(&mut self, id: &str, to: usize) -> Result<()> {
        let from = self
            .mods
            .active_index(id)
            .ok_or_else(|| OrderError::UnknownMod(id.to_string()))?;

        let record = self.mods.active.remove(from);
        let to = to.min(self.mods.active.len());
        self.mods.active.insert(to, record);

        self.revalidate();
        Ok(())
    }

    /// Reorder the active list.
    ///
    /// Returns the tiers that fell back to their original order (always empty
    /// for [`SortMode::Dependency`]). A dependency sort that hits a cycle
    /// leaves the order untouched and returns the error.
    pub fn sort(&mut self, mode: SortMode) -> Result<Vec<Tier>> {
        let result = match mode {
            SortMode::Dependency => {
                dependency_sort(&self.mods.active).map(|order| (order, Vec::new()))
            }
            SortMode::Smart => {
                apply_categories(&mut self.mods.active, &self.overrides);
                let outcome = smart_sort(&self.mods.active);
                Ok((outcome.order, outcome.cyclic_tiers))
            }
        };

        let outcome = match result {
            Ok((order, cyclic_tiers)) => {
                self.mods.active = order;
                Ok(cyclic_tiers)
            }
            Err(err) => Err(err),
        };
        self.revalidate();
        outcome
    }

    /// Add a discovered record, or fold it into the existing one with the
    /// same id.
    ///
    /// A record for the same id from a different archive is kept aside as a
    /// duplicate and reported by validation.
    pub fn upsert(&mut self, record: ModRecord) {
        self.insert_record(record);
        self.revalidate();
    }

    /// Forget a mod whose archive is gone. Returns the removed record.
    pub fn remove(&mut self, id: &str) -> Result<ModRecord> {
        if is_base_module(id) {
            return Err(OrderError::BaseModule(id.to_string()));
        }
        let removed = if let Some(index) = self.mods.active_index(id) {
            self.mods.active.remove(index)
        } else if let Some(index) = self.mods.inactive_index(id) {
            self.mods.inactive.remove(index)
        } else {
            return Err(OrderError::UnknownMod(id.to_string()));
        };

        // a shadowed copy takes the freed place in the inactive list
        if let Some(index) = self.duplicates.iter().position(|d| d.id == id) {
            let promoted = self.duplicates.remove(index);
            self.mods.inactive.push(promoted);
        }

        self.revalidate();
        Ok(removed)
    }

    pub fn set_category_override(&mut self, id: &str, tier: Tier) {
        self.overrides.set(id, tier);
        self.refresh_category(id);
        self.revalidate();
    }

    pub fn clear_category_override(&mut self, id: &str) -> Option<Tier> {
        let cleared = self.overrides.clear(id);
        self.refresh_category(id);
        self.revalidate();
        cleared
    }

    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = environment;
        self.revalidate();
    }

    /// The ids to write to the load-order document: base modules first (the
    /// primary one when none is active), then the other active mods.
    pub fn load_order_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .mods
            .active
            .iter()
            .filter(|record| is_base_module(&record.id))
            .map(|record| record.id.clone())
            .collect();
        if ids.is_empty() {
            ids.push(PRIMARY_BASE_MODULE.id.to_string());
        }
        ids.extend(
            self.mods
                .active
                .iter()
                .filter(|record| !is_base_module(&record.id))
                .map(|record| record.id.clone()),
        );
        ids
    }

    fn insert_record(&mut self, mut record: ModRecord) {
        record.category = infer_category(&record, &self.overrides);

        let Some(existing) = self.mods.get_mut(&record.id) else {
            self.mods.inactive.push(record);
            return;
        };

        let same_archive = match (&existing.source_archive, &record.source_archive) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        if same_archive {
            existing.absorb(record);
            let refreshed = infer_category(existing, &self.overrides);
            existing.category = refreshed;
        } else {
            tracing::warn!(
                "{} from {:?} has the same id as an installed mod",
                record.name,
                record.source_archive
            );
            self.duplicates.push(record);
        }
    }

    fn refresh_category(&mut self, id: &str) {
        let overrides = &self.overrides;
        for record in self.mods.records_mut().filter(|r| r.id == id) {
            record.category = infer_category(record, overrides);
        }
    }

    fn revalidate(&mut self) {
        let mut inactive = self.mods.inactive.clone();
        inactive.extend(self.duplicates.iter().cloned());

        let input = ValidationInput {
            active: &self.mods.active,
            inactive: &inactive,
            runtime_extension: self.environment.runtime_extension.as_ref(),
            extension_previously_deployed: self.environment.extension_previously_deployed,
            hazards: &self.environment.hazards,
            recorded_order: &self.environment.recorded_order,
            fingerprint: self.environment.fingerprint.as_ref(),
        };
        self.warnings = validate(&input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::{ids, record};
    use crate::validate::WarningCategory;
    use camino::Utf8PathBuf;
    use lsmod_meta::{Category, MetadataSource};

    fn order_with(records: Vec<ModRecord>) -> LoadOrder {
        LoadOrder::from_records(records, CategoryOverrides::default(), Environment::default())
    }

    fn categories(order: &LoadOrder) -> Vec<WarningCategory> {
        order.warnings().iter().map(|w| w.category).collect()
    }

    #[test]
    fn test_mutations_keep_partition_and_revalidate() {
        let mut order = order_with(vec![record("A", &["B"]), record("B", &[])]);
        assert_eq!(order.inactive().len(), 2);
        assert!(order.warnings().is_empty());

        order.activate("A", None).unwrap();
        assert_eq!(categories(&order), vec![WarningCategory::MissingDependency]);

        order.activate("B", None).unwrap();
        assert_eq!(ids(order.active()), vec!["A", "B"]);
        assert_eq!(categories(&order), vec![WarningCategory::WrongOrder]);

        order.move_active("B", 0).unwrap();
        assert!(order.warnings().is_empty());

        order.deactivate("A").unwrap();
        assert_eq!(ids(order.active()), vec!["B"]);
        assert_eq!(ids(order.inactive()), vec!["A"]);
        assert!(order.warnings().is_empty());

        let all: Vec<&str> = order
            .active()
            .iter()
            .chain(order.inactive())
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(all.len(), 2);
        assert_ne!(all[0], all[1]);
    }

    #[test]
    fn test_unknown_and_base_mods() {
        let mut order = order_with(vec![record("A", &[])]);
        assert!(matches!(order.activate("nope", None), Err(OrderError::UnknownMod(_))));
        assert!(matches!(order.move_active("A", 0), Err(OrderError::UnknownMod(_))));
        assert!(matches!(
            order.deactivate(PRIMARY_BASE_MODULE.id),
            Err(OrderError::BaseModule(_))
        ));
        // activating twice is a no-op
        order.activate("A", None).unwrap();
        order.activate("A", Some(0)).unwrap();
        assert_eq!(order.active().len(), 1);
    }

    #[test]
    fn test_dependency_sort_and_cycle_leaves_order() {
        let mut order = order_with(vec![record("A", &["B"]), record("B", &[])]);
        order.activate("A", None).unwrap();
        order.activate("B", None).unwrap();

        assert!(order.sort(SortMode::Dependency).unwrap().is_empty());
        assert_eq!(ids(order.active()), vec!["B", "A"]);
        assert_eq!(
            order.load_order_ids(),
            vec![PRIMARY_BASE_MODULE.id.to_string(), "B".to_string(), "A".to_string()]
        );

        let mut cyclic = order_with(vec![record("X", &["Y"]), record("Y", &["X"])]);
        cyclic.activate("X", None).unwrap();
        cyclic.activate("Y", None).unwrap();
        assert!(cyclic.has_critical());
        assert!(matches!(
            cyclic.sort(SortMode::Dependency),
            Err(OrderError::CycleDetected { .. })
        ));
        assert_eq!(ids(cyclic.active()), vec!["X", "Y"]);
    }

    #[test]
    fn test_smart_sort_reports_cyclic_tiers() {
        let mut order = order_with(vec![
            ModRecord::new("hair", "Hair Pack", MetadataSource::Embedded),
            record("X", &["Y"]).with_tags(["Spells"]),
            record("Y", &["X"]).with_tags(["Spells"]),
            ModRecord::new("lib", "Some Library", MetadataSource::Embedded),
        ]);
        for id in ["hair", "X", "Y", "lib"] {
            order.activate(id, None).unwrap();
        }

        let cyclic = order.sort(SortMode::Smart).unwrap();
        assert_eq!(cyclic, vec![Tier::Gameplay]);
        assert_eq!(ids(order.active()), vec!["lib", "X", "Y", "hair"]);
    }

    #[test]
    fn test_category_override_survives_rediscovery() {
        let mut order = order_with(vec![ModRecord::new(
            "m",
            "Hair Pack",
            MetadataSource::FilenameDerived,
        )]);
        assert_eq!(order.get("m").unwrap().category, Category::Tier(Tier::Visual));

        order.set_category_override("m", Tier::LateLoader);
        assert_eq!(order.get("m").unwrap().category, Category::Tier(Tier::LateLoader));

        order.upsert(ModRecord::new("m", "Hair Pack", MetadataSource::Embedded));
        let record = order.get("m").unwrap();
        assert_eq!(record.metadata_source, MetadataSource::Embedded);
        assert_eq!(record.category, Category::Tier(Tier::LateLoader));

        assert_eq!(order.clear_category_override("m"), Some(Tier::LateLoader));
        assert_eq!(order.get("m").unwrap().category, Category::Tier(Tier::Visual));
    }

    #[test]
    fn test_duplicate_archive_is_kept_aside_and_reported() {
        let mut first = record("A", &[]);
        first.source_archive = Some(Utf8PathBuf::from("Mods/A.pak"));
        let mut second = record("A", &[]);
        second.source_archive = Some(Utf8PathBuf::from("Mods/A (1).pak"));

        let mut order = order_with(vec![first]);
        order.upsert(second);
        assert_eq!(order.inactive().len(), 1);
        assert_eq!(order.duplicates().len(), 1);
        assert_eq!(categories(&order), vec![WarningCategory::DuplicateId]);

        let removed = order.remove("A").unwrap();
        assert_eq!(removed.source_archive, Some(Utf8PathBuf::from("Mods/A.pak")));
        assert_eq!(order.inactive().len(), 1);
        assert!(order.duplicates().is_empty());
        assert!(order.warnings().is_empty());
    }

    #[test]
    fn test_environment_changes_revalidate() {
        let mut order = order_with(vec![record("A", &[])]);
        assert!(order.warnings().is_empty());

        order.set_environment(Environment {
            extension_previously_deployed: true,
            ..Default::default()
        });
        assert_eq!(categories(&order), vec![WarningCategory::ExternalMutation]);
    }
}
