//! Terminal output for the CLI subcommands.

use forklore_core::{Category, ItemSet, ReferenceGraph, SpecItem, VersionCatalog};
use owo_colors::OwoColorize;

/// Render the version catalog, one line per version.
pub fn render_versions(catalog: &VersionCatalog, selected: Option<&str>) -> String {
    let mut out = String::new();
    for version in catalog.versions() {
        if Some(version.as_str()) == selected {
            out.push_str(&format!("{} {}\n", "*".green().bold(), version.bold()));
        } else {
            out.push_str(&format!("  {version}\n"));
        }
    }
    out
}

/// Render consolidated items grouped by category.
pub fn render_items(items: &ItemSet, verbose: bool) -> String {
    let mut out = String::new();
    for (category, by_name) in &items.categories {
        out.push_str(&format!(
            "{} {} ({})\n",
            "##".bold(),
            category.as_str().cyan().bold(),
            by_name.len()
        ));
        if verbose {
            for item in by_name.values() {
                out.push_str(&format!("  {}  {}\n", item.name, fork_list(item).dimmed()));
            }
        }
    }
    out
}

/// Render one item's detail: forks and usedBy.
pub fn render_item(item: &SpecItem, category: Category, refs: &ReferenceGraph) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {} ({})\n",
        "->".blue().bold(),
        item.name.bold(),
        category.as_str()
    ));
    out.push_str(&format!("   forks: {}\n", fork_list(item)));
    match refs.used_by(&item.name) {
        Some(users) if !users.is_empty() => {
            out.push_str(&format!("   used by: {}\n", users.len()));
            for user in users {
                out.push_str(&format!("     {user}\n"));
            }
        }
        _ => out.push_str(&format!("   used by: {}\n", "nothing".dimmed())),
    }
    out
}

fn fork_list(item: &SpecItem) -> String {
    item.forks
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use forklore_core::{KNOWN_FORKS, RawSpecData, consolidate};
    use serde_json::json;

    #[test]
    fn item_detail_lists_forks_and_users() {
        let raw: RawSpecData = serde_json::from_value(json!({
            "mainnet": {
                "phase0": {
                    "constant_vars": { "MAX_DEPOSITS": ["uint64", "16"] },
                    "functions": { "process_deposit": "return MAX_DEPOSITS" },
                }
            }
        }))
        .expect("valid raw data");
        let items = consolidate(&raw, &KNOWN_FORKS);
        let refs = ReferenceGraph::build(&items);
        let item = items.get(Category::ConstantVars, "MAX_DEPOSITS").expect("item");

        let text = render_item(item, Category::ConstantVars, &refs);
        assert!(text.contains("MAX_DEPOSITS"));
        assert!(text.contains("phase0"));
        assert!(text.contains("process_deposit"));
    }
}
