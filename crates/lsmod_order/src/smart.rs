use crate::{base::is_base_module, graph::topo_sort, OrderError};
use lsmod_meta::{ModRecord, Tier};

/// Result of [`smart_sort`].
#[derive(Debug, Clone)]
pub struct SmartSortOutcome {
    pub order: Vec<ModRecord>,
    /// Tiers whose members form a dependency cycle. These kept their
    /// original relative order.
    pub cyclic_tiers: Vec<Tier>,
}

/// Tier-grouped dependency sort.
///
/// Base modules come first in their existing order. The rest are grouped by
/// [`Category::sort_tier`](lsmod_meta::Category::sort_tier) and each tier is
/// sorted on its own, tiers in ascending order. A cycle inside a tier keeps
/// that tier's input order and never affects the other tiers.
///
/// Categories are read as they are stored on the records; run
/// [`apply_categories`](crate::apply_categories) first to refresh them.
pub fn smart_sort(active: &[ModRecord]) -> SmartSortOutcome {
    let mut order: Vec<ModRecord> = active
        .iter()
        .filter(|record| is_base_module(&record.id))
        .cloned()
        .collect();
    let mut cyclic_tiers = Vec::new();

    for tier in Tier::ALL {
        let members: Vec<ModRecord> = active
            .iter()
            .filter(|record| !is_base_module(&record.id) && record.category.sort_tier() == tier)
            .cloned()
            .collect();
        if members.is_empty() {
            continue;
        }

        match topo_sort(&members) {
            Ok(sorted) => order.extend(sorted),
            Err(OrderError::CycleDetected { ids }) => {
                tracing::warn!(
                    "Cycle in tier {} between {}, keeping original order",
                    tier,
                    ids.join(", ")
                );
                cyclic_tiers.push(tier);
                order.extend(members);
            }
            Err(err) => {
                tracing::warn!("Sorting tier {} failed: {}, keeping original order", tier, err);
                cyclic_tiers.push(tier);
                order.extend(members);
            }
        }
    }

    SmartSortOutcome {
        order,
        cyclic_tiers,
    }
}
