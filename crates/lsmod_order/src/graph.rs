//! Dependency graph and stable topological sort.
//!
//! An edge runs from a dependency to its dependent: when B depends on A, A
//! must come first. Among the mods that are ready at any step, the one that
//! came earliest in the input is emitted, so mods without a constraint between
//! them keep their input order.

use crate::{base::is_base_module, error::Result, OrderError};
use lsmod_meta::ModRecord;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Dependency edges over a list of mods, by input index.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    ids: Vec<String>,
    /// `dependents[a]` lists every `b` that depends on `a`.
    dependents: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

impl DependencyGraph {
    /// Build the graph for `mods`.
    ///
    /// Dependencies on base modules, on mods outside `mods` and on the mod
    /// itself add no edge. A repeated id resolves to its first occurrence.
    pub fn build(mods: &[ModRecord]) -> Self {
        let mut first_index: HashMap<&str, usize> = HashMap::with_capacity(mods.len());
        for (index, record) in mods.iter().enumerate() {
            first_index.entry(record.id.as_str()).or_insert(index);
        }

        let mut dependents = vec![Vec::new(); mods.len()];
        let mut in_degree = vec![0usize; mods.len()];
        for (index, record) in mods.iter().enumerate() {
            for dependency in &record.dependencies {
                if dependency.id == record.id || is_base_module(&dependency.id) {
                    continue;
                }
                let Some(&target) = first_index.get(dependency.id.as_str()) else {
                    continue;
                };
                if target == index || dependents[target].contains(&index) {
                    continue;
                }
                dependents[target].push(index);
                in_degree[index] += 1;
            }
        }

        Self {
            ids: mods.iter().map(|m| m.id.clone()).collect(),
            dependents,
            in_degree,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.in_degree.iter().sum()
    }

    /// Input indices in a dependency-respecting order.
    ///
    /// Fails with [`OrderError::CycleDetected`] naming, in input order, every
    /// mod that could not be placed.
    pub fn sort(&self) -> Result<Vec<usize>> {
        let mut in_degree = self.in_degree.clone();
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &degree)| degree == 0)
            .map(|(index, _)| Reverse(index))
            .collect();

        let mut order = Vec::with_capacity(self.len());
        while let Some(Reverse(index)) = ready.pop() {
            order.push(index);
            for &dependent in &self.dependents[index] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        if order.len() < self.len() {
            let mut ids: Vec<String> = Vec::new();
            for (index, degree) in in_degree.iter().enumerate() {
                if *degree > 0 && !ids.contains(&self.ids[index]) {
                    ids.push(self.ids[index].clone());
                }
            }
            return Err(OrderError::CycleDetected { ids });
        }

        Ok(order)
    }
}

/// Reorder `mods` so that every dependency precedes its dependents.
pub fn topo_sort(mods: &[ModRecord]) -> Result<Vec<ModRecord>> {
    let order = DependencyGraph::build(mods).sort()?;
    Ok(order.into_iter().map(|index| mods[index].clone()).collect())
}

/// Plain dependency sort of an active list: base modules first in their
/// existing order, then everything else topologically sorted.
///
/// A cycle fails the whole sort. There is no fallback order.
pub fn dependency_sort(active: &[ModRecord]) -> Result<Vec<ModRecord>> {
    let (base, rest): (Vec<ModRecord>, Vec<ModRecord>) = active
        .iter()
        .cloned()
        .partition(|record| is_base_module(&record.id));

    let sorted = topo_sort(&rest)?;
    tracing::debug!(
        "Dependency sort placed {} base and {} other mods",
        base.len(),
        sorted.len()
    );

    let mut order = base;
    order.extend(sorted);
    Ok(order)
}
