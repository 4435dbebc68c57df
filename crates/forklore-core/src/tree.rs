//! Navigation tree over consolidated spec items.
//!
//! Top level is one node per non-empty category in display order; children
//! are items sorted by name. Filtering is pure: the tree is built once per
//! version load and `filter` derives a view from the current filter state.

use crate::consolidate::{Category, ItemSet};
use crate::filter::SingleSelect;
use crate::fork::Fork;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ItemNode {
    pub name: String,
    pub forks: Vec<Fork>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    pub category: Category,
    pub items: Vec<ItemNode>,
}

/// The unfiltered specs tree.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SpecsTree {
    pub categories: Vec<CategoryNode>,
}

impl SpecsTree {
    pub fn build(items: &ItemSet) -> Self {
        let categories = items
            .categories
            .iter()
            .map(|(category, items)| CategoryNode {
                category: *category,
                items: items
                    .values()
                    .map(|item| ItemNode {
                        name: item.name.clone(),
                        forks: item.forks.clone(),
                    })
                    .collect(),
            })
            .collect();
        // ItemSet maps are ordered, so categories arrive in display order
        // and items in name order already.
        Self { categories }
    }

    /// Derive the visible tree under the given filter state.
    pub fn filter(&self, filter: &SpecsFilter) -> SpecsTreeView {
        let search = filter.search.to_lowercase();
        let mut categories = Vec::new();

        for node in &self.categories {
            if let Some(wanted) = filter.category.selected()
                && *wanted != node.category
            {
                continue;
            }

            let items: Vec<ItemNode> = node
                .items
                .iter()
                .filter(|item| {
                    let fork_ok = match filter.fork.selected() {
                        Some(fork) => item.forks.contains(fork),
                        None => true,
                    };
                    let search_ok =
                        search.is_empty() || item.name.to_lowercase().contains(&search);
                    fork_ok && search_ok
                })
                .cloned()
                .collect();

            if items.is_empty() {
                continue;
            }

            let expand = if !search.is_empty() || filter.category.is_selected(&node.category) {
                ExpandHint::Expand
            } else if filter.is_clear() {
                ExpandHint::Collapse
            } else {
                // Partial filter states leave the user's expand state alone.
                ExpandHint::Keep
            };

            categories.push(CategoryView {
                category: node.category,
                expand,
                items,
            });
        }

        SpecsTreeView { categories }
    }
}

/// Specs-mode filter state: fork facet, category facet, free-text search.
#[derive(Debug, Clone, Default)]
pub struct SpecsFilter {
    pub fork: SingleSelect<Fork>,
    pub category: SingleSelect<Category>,
    pub search: String,
}

impl SpecsFilter {
    pub fn is_clear(&self) -> bool {
        self.fork.is_empty() && self.category.is_empty() && self.search.is_empty()
    }
}

/// What a category subtree should do to its expansion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpandHint {
    Expand,
    Collapse,
    Keep,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub category: Category,
    pub expand: ExpandHint,
    pub items: Vec<ItemNode>,
}

/// The filtered, displayable tree.
#[derive(Debug, Clone, Serialize)]
pub struct SpecsTreeView {
    pub categories: Vec<CategoryView>,
}

impl SpecsTreeView {
    pub fn visible_names(&self) -> Vec<&str> {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter().map(|i| i.name.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidate::{RawSpecData, consolidate};
    use crate::fork::KNOWN_FORKS;
    use serde_json::json;

    fn tree() -> SpecsTree {
        let raw: RawSpecData = serde_json::from_value(json!({
            "mainnet": {
                "phase0": {
                    "constant_vars": { "MIN_DEPOSIT": "1", "MAX_DEPOSIT": "32" },
                    "functions": { "process_deposit": "def process_deposit(): ..." },
                },
                "altair": {
                    "constant_vars": { "MIN_DEPOSIT": "2" },
                    "functions": { "process_sync": "def process_sync(): ..." },
                },
            }
        }))
        .expect("valid raw data");
        SpecsTree::build(&consolidate(&raw, &KNOWN_FORKS))
    }

    #[test]
    fn categories_appear_in_display_order_with_sorted_items() {
        let tree = tree();
        assert_eq!(
            tree.categories.iter().map(|c| c.category).collect::<Vec<_>>(),
            [Category::ConstantVars, Category::Functions]
        );
        let names: Vec<_> = tree.categories[0].items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["MAX_DEPOSIT", "MIN_DEPOSIT"]);
    }

    #[test]
    fn fork_filter_keeps_items_touching_that_fork() {
        let tree = tree();
        let mut filter = SpecsFilter::default();
        filter.fork.toggle(Fork::Altair);
        let view = tree.filter(&filter);
        // MIN_DEPOSIT changed at altair, process_sync appeared at altair;
        // MAX_DEPOSIT and process_deposit are phase0-only.
        assert_eq!(view.visible_names(), ["MIN_DEPOSIT", "process_sync"]);
    }

    #[test]
    fn category_filter_drops_other_subtrees_and_expands_its_own() {
        let tree = tree();
        let mut filter = SpecsFilter::default();
        filter.category.toggle(Category::Functions);
        let view = tree.filter(&filter);
        assert_eq!(view.categories.len(), 1);
        assert_eq!(view.categories[0].category, Category::Functions);
        assert_eq!(view.categories[0].expand, ExpandHint::Expand);
    }

    #[test]
    fn search_is_case_insensitive_substring_and_expands() {
        let tree = tree();
        let filter = SpecsFilter {
            search: "deposit".to_string(),
            ..Default::default()
        };
        let view = tree.filter(&filter);
        assert_eq!(
            view.visible_names(),
            ["MAX_DEPOSIT", "MIN_DEPOSIT", "process_deposit"]
        );
        assert!(view.categories.iter().all(|c| c.expand == ExpandHint::Expand));
    }

    #[test]
    fn empty_categories_hide_and_clear_filters_collapse() {
        let tree = tree();
        let filter = SpecsFilter {
            search: "zzz_nothing".to_string(),
            ..Default::default()
        };
        assert!(tree.filter(&filter).categories.is_empty());

        let view = tree.filter(&SpecsFilter::default());
        assert!(view.categories.iter().all(|c| c.expand == ExpandHint::Collapse));
    }

    #[test]
    fn partial_filter_leaves_expansion_untouched() {
        let tree = tree();
        let mut filter = SpecsFilter::default();
        filter.fork.toggle(Fork::Phase0);
        let view = tree.filter(&filter);
        assert!(view.categories.iter().all(|c| c.expand == ExpandHint::Keep));
    }

    #[test]
    fn filter_application_order_does_not_matter() {
        let tree = tree();

        let mut forward = SpecsFilter::default();
        forward.fork.toggle(Fork::Altair);
        forward.search = "min".to_string();

        let mut reverse = SpecsFilter::default();
        reverse.search = "min".to_string();
        reverse.fork.toggle(Fork::Altair);

        let both = SpecsFilter {
            search: "min".to_string(),
            ..{
                let mut f = SpecsFilter::default();
                f.fork.toggle(Fork::Altair);
                f
            }
        };

        let both_view = tree.filter(&both);
        let expected = both_view.visible_names();
        assert_eq!(tree.filter(&forward).visible_names(), expected);
        assert_eq!(tree.filter(&reverse).visible_names(), expected);
        assert_eq!(expected, vec!["MIN_DEPOSIT"]);
    }
}
