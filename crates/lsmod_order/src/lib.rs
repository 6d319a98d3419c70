//! Load ordering and validation for Larian mods.
//!
//! Given [`ModRecord`](lsmod_meta::ModRecord)s, this crate
//!
//! - sorts them so every dependency loads before its dependents
//!   ([`dependency_sort`]),
//! - assigns each a [`Tier`](lsmod_meta::Tier) from overrides, tags and name
//!   ([`infer_category`]),
//! - groups by tier and sorts inside each group ([`smart_sort`]),
//! - checks a mod set for problems ([`validate`]).
//!
//! [`LoadOrder`] ties these together as the owner of the active and inactive
//! lists, revalidating after every change.
//!
//! # Example
//!
//! ```
//! use lsmod_meta::{DependencyRef, MetadataSource, ModRecord};
//! use lsmod_order::{CategoryOverrides, Environment, LoadOrder, SortMode};
//!
//! let a = ModRecord::new("a", "Alpha", MetadataSource::Embedded)
//!     .with_dependency(DependencyRef::new("b"));
//! let b = ModRecord::new("b", "Beta", MetadataSource::Embedded);
//!
//! let mut order = LoadOrder::from_records([a, b], CategoryOverrides::default(), Environment::default());
//! order.activate("a", None).unwrap();
//! order.activate("b", None).unwrap();
//! assert_eq!(order.warnings().len(), 1);
//!
//! order.sort(SortMode::Dependency).unwrap();
//! assert!(order.warnings().is_empty());
//! ```

pub mod base;
pub mod category;
pub mod environment;
pub mod error;
pub mod fingerprint;
pub mod graph;
pub mod smart;
pub mod state;
pub mod validate;

pub use base::{is_base_module, BaseModule, BASE_MODULES, PRIMARY_BASE_MODULE};
pub use category::{apply_categories, infer_category, CategoryOverrides};
pub use environment::{
    detect_environment_hazards, detect_runtime_extension, EnvironmentHazard, ExtensionStatus,
};
pub use error::{OrderError, Result};
pub use fingerprint::{Fingerprint, FingerprintCheck};
pub use graph::{dependency_sort, topo_sort, DependencyGraph};
pub use smart::{smart_sort, SmartSortOutcome};
pub use state::{Environment, LoadOrder, OrderedModSet, SortMode};
pub use validate::{validate, Severity, SuggestedAction, ValidationInput, Warning, WarningCategory};
