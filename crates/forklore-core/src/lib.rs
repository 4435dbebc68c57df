//! forklore-core - Core library for consensus-spec browsing
//!
//! This crate provides the building blocks for:
//! - Consolidating raw per-fork, per-network spec data into deduplicated items ([`consolidate`])
//! - Building the cross-reference graph over item source text ([`refs`])
//! - Navigation trees and filter state for the specs and tests views ([`tree`], [`tests_tree`], [`filter`])
//! - Deep-link fragments that address any item or test file ([`deeplink`])
//! - The version catalog and the test-fixture manifest ([`versions`], [`manifest`])
//!
//! Everything here is pure: no I/O, no clocks except where injected. The
//! `forklore` binary crate layers fetching, caching, and the HTTP API on top.
//!
//! # Consolidation in one picture
//!
//! Raw data repeats every item under every fork. Consolidation keeps an item
//! once and records only the forks where its value actually changed:
//!
//! ```
//! use forklore_core::{RawSpecData, consolidate, Fork, KNOWN_FORKS, Category};
//! use serde_json::json;
//!
//! let raw: RawSpecData = serde_json::from_value(json!({
//!     "mainnet": {
//!         "phase0": { "constant_vars": { "X": ["uint64", "5"] } },
//!         "altair": { "constant_vars": { "X": ["uint64", "5"] } },
//!         "bellatrix": { "constant_vars": { "X": ["uint64", "7"] } },
//!     }
//! })).unwrap();
//!
//! let items = consolidate(&raw, &KNOWN_FORKS);
//! let x = items.get(Category::ConstantVars, "X").unwrap();
//! assert_eq!(x.forks, [Fork::Phase0, Fork::Bellatrix]);
//! ```

pub mod consolidate;
pub mod deeplink;
pub mod filter;
pub mod fork;
pub mod history;
pub mod manifest;
pub mod refs;
pub mod tests_tree;
pub mod tree;
pub mod versions;

pub use consolidate::{
    CATEGORIES, Category, ItemSet, NetworkValue, RawSpecData, Rendered, SpecItem, VarValue,
    consolidate,
};
pub use deeplink::{DeepLink, FileRef, ViewMode};
pub use filter::{SEARCH_DEBOUNCE, SearchDebouncer, SingleSelect, Toggle};
pub use fork::{Fork, KNOWN_FORKS, sort_fork_names, split_fork_suffix};
pub use history::{HistoryEntry, NavigationHistory};
pub use manifest::{DisplayFile, TestManifest, display_files, is_binary, looks_like_test_file};
pub use refs::{LinkSpan, NameResolver, ReferenceGraph, link_spans};
pub use tests_tree::{ButtonStates, TestsFilter, TestsTree, TestsView};
pub use tree::{ExpandHint, SpecsFilter, SpecsTree, SpecsTreeView};
pub use versions::{VersionCatalog, VersionList};
