//! Navigation tree over the test-fixture manifest.
//!
//! Five nested levels (preset → fork → testType → testSuite → config) with a
//! leaf per test case. Every node carries a slash-joined path key, which is
//! what deep links and selection use to address it.

use crate::filter::SingleSelect;
use crate::fork::Fork;
use crate::manifest::TestManifest;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Hierarchy level of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Level {
    Preset,
    Fork,
    Runner,
    Suite,
    Config,
    Case,
}

/// Facet attributes a filter can apply to. Deeper levels inherit the
/// attributes of their ancestors.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeAttrs {
    pub preset: Option<String>,
    pub fork: Option<String>,
    pub runner: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestsNode {
    pub label: String,
    pub level: Level,
    /// Slash-joined hierarchy key; for case leaves this is the manifest's
    /// `path` verbatim.
    pub path: String,
    pub attrs: NodeAttrs,
    pub children: Vec<TestsNode>,
    /// Case leaves only: the case's file list.
    pub files: Vec<String>,
}

impl TestsNode {
    fn branch(label: &str, level: Level, path: String, attrs: NodeAttrs) -> Self {
        Self {
            label: label.to_string(),
            level,
            path,
            attrs,
            children: Vec::new(),
            files: Vec::new(),
        }
    }
}

/// The unfiltered tests tree plus the flat facet combinations used for
/// button availability.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TestsTree {
    pub presets: Vec<TestsNode>,
    /// Distinct (preset, fork, runner) combinations present in the data.
    #[serde(skip)]
    combos: BTreeSet<(String, String, String)>,
}

impl TestsTree {
    pub fn build(manifest: &TestManifest) -> Self {
        let mut presets = Vec::new();
        let mut combos = BTreeSet::new();

        for (preset, pe) in &manifest.presets {
            let mut preset_node = TestsNode::branch(
                preset,
                Level::Preset,
                preset.clone(),
                NodeAttrs {
                    preset: Some(preset.clone()),
                    ..Default::default()
                },
            );

            // Canonical fork order with eip* forks pushed to the end.
            let mut fork_names: Vec<&String> = pe.forks.keys().collect();
            fork_names.sort_by(|a, b| Fork::parse_lenient(a).cmp(&Fork::parse_lenient(b)));

            for fork in fork_names {
                let fe = &pe.forks[fork];
                let fork_path = format!("{preset}/{fork}");
                let mut fork_node = TestsNode::branch(
                    fork,
                    Level::Fork,
                    fork_path.clone(),
                    NodeAttrs {
                        preset: Some(preset.clone()),
                        fork: Some(fork.clone()),
                        runner: None,
                    },
                );

                for (runner, te) in &fe.test_types {
                    combos.insert((preset.clone(), fork.clone(), runner.clone()));
                    let runner_path = format!("{fork_path}/{runner}");
                    let attrs = NodeAttrs {
                        preset: Some(preset.clone()),
                        fork: Some(fork.clone()),
                        runner: Some(runner.clone()),
                    };
                    let mut runner_node =
                        TestsNode::branch(runner, Level::Runner, runner_path.clone(), attrs.clone());

                    for (suite, se) in &te.test_suites {
                        let suite_path = format!("{runner_path}/{suite}");
                        let mut suite_node =
                            TestsNode::branch(suite, Level::Suite, suite_path.clone(), attrs.clone());

                        for (config, ce) in &se.configs {
                            let config_path = format!("{suite_path}/{config}");
                            let mut config_node = TestsNode::branch(
                                config,
                                Level::Config,
                                config_path.clone(),
                                attrs.clone(),
                            );

                            for case in &ce.tests {
                                config_node.children.push(TestsNode {
                                    label: case.name.clone(),
                                    level: Level::Case,
                                    path: case.path.clone(),
                                    attrs: attrs.clone(),
                                    children: Vec::new(),
                                    files: case.files.clone(),
                                });
                            }

                            suite_node.children.push(config_node);
                        }
                        runner_node.children.push(suite_node);
                    }
                    fork_node.children.push(runner_node);
                }
                preset_node.children.push(fork_node);
            }
            presets.push(preset_node);
        }

        Self { presets, combos }
    }

    pub fn node_by_path(&self, path: &str) -> Option<&TestsNode> {
        fn walk<'a>(nodes: &'a [TestsNode], path: &str) -> Option<&'a TestsNode> {
            for node in nodes {
                if node.path == path {
                    return Some(node);
                }
                // Path keys nest by prefix, so only descend where it can match.
                if path.starts_with(&node.path)
                    && path.as_bytes().get(node.path.len()) == Some(&b'/')
                    && let Some(found) = walk(&node.children, path)
                {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.presets, path)
    }

    /// Path keys of every ancestor of `path`, outermost first. The node
    /// itself is not included.
    pub fn ancestors_of(&self, path: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut prefix = String::new();
        for segment in path.split('/') {
            if !prefix.is_empty() {
                out.push(prefix.clone());
                prefix.push('/');
            }
            prefix.push_str(segment);
        }
        out
    }

    /// Derive the visible/expanded node sets under the given filter.
    pub fn filter(&self, filter: &TestsFilter) -> TestsView {
        // Fast path: a preset filter alone can only toggle whole preset
        // subtrees. Must agree with the general walk below.
        if filter.search.is_empty()
            && filter.fork.is_empty()
            && filter.runner.is_empty()
            && let Some(preset) = filter.preset.selected()
        {
            let mut view = TestsView::default();
            for node in &self.presets {
                if node.label == *preset {
                    mark_subtree(node, &mut view);
                }
            }
            return view;
        }

        let mut view = TestsView::default();
        let search = filter.search.to_lowercase();
        for node in &self.presets {
            visit(node, filter, &search, &mut view);
        }
        view
    }

    /// Recompute which facet buttons remain selectable: a value is enabled
    /// iff at least one test combination is consistent with the *other*
    /// facets' current selections. Run after every filter change so a
    /// disabled button never hides a non-empty result set.
    pub fn button_states(&self, filter: &TestsFilter) -> ButtonStates {
        let mut states = ButtonStates::default();

        for (preset, fork, runner) in &self.combos {
            let preset_ok = filter.preset.selected().is_none_or(|p| p == preset);
            let fork_ok = filter.fork.selected().is_none_or(|f| f == fork);
            let runner_ok = filter.runner.selected().is_none_or(|r| r == runner);

            if fork_ok && runner_ok {
                *states.presets.entry(preset.clone()).or_insert(false) = true;
            } else {
                states.presets.entry(preset.clone()).or_insert(false);
            }
            if preset_ok && runner_ok {
                *states.forks.entry(fork.clone()).or_insert(false) = true;
            } else {
                states.forks.entry(fork.clone()).or_insert(false);
            }
            if preset_ok && fork_ok {
                *states.runners.entry(runner.clone()).or_insert(false) = true;
            } else {
                states.runners.entry(runner.clone()).or_insert(false);
            }
        }

        states
    }

    /// Fork button labels in display order (canonical, eip* last).
    pub fn fork_buttons(&self) -> Vec<String> {
        let mut forks: Vec<String> = self
            .combos
            .iter()
            .map(|(_, fork, _)| fork.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        forks.sort_by(|a, b| Fork::parse_lenient(a).cmp(&Fork::parse_lenient(b)));
        forks
    }

    /// Runner button labels, alphabetical.
    pub fn runner_buttons(&self) -> Vec<String> {
        self.combos
            .iter()
            .map(|(_, _, runner)| runner.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn preset_buttons(&self) -> Vec<String> {
        self.combos
            .iter()
            .map(|(preset, _, _)| preset.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn facets_satisfied(attrs: &NodeAttrs, filter: &TestsFilter) -> bool {
    let preset_ok = match (filter.preset.selected(), &attrs.preset) {
        (Some(wanted), Some(actual)) => wanted == actual,
        (Some(_), None) => true, // facet does not apply to this node
        (None, _) => true,
    };
    let fork_ok = match (filter.fork.selected(), &attrs.fork) {
        (Some(wanted), Some(actual)) => wanted == actual,
        (Some(_), None) => true,
        (None, _) => true,
    };
    let runner_ok = match (filter.runner.selected(), &attrs.runner) {
        (Some(wanted), Some(actual)) => wanted == actual,
        (Some(_), None) => true,
        (None, _) => true,
    };
    preset_ok && fork_ok && runner_ok
}

/// General walk: returns whether anything in the subtree matched. Matching
/// nodes surface their whole ancestor chain, expanded.
fn visit(node: &TestsNode, filter: &TestsFilter, search: &str, view: &mut TestsView) -> bool {
    let self_matches = (search.is_empty() || node.label.to_lowercase().contains(search))
        && facets_satisfied(&node.attrs, filter);

    let mut descendant_matched = false;
    for child in &node.children {
        if visit(child, filter, search, view) {
            descendant_matched = true;
        }
    }

    if self_matches || descendant_matched {
        view.visible.insert(node.path.clone());
    }
    if descendant_matched {
        view.expanded.insert(node.path.clone());
    }
    self_matches || descendant_matched
}

fn mark_subtree(node: &TestsNode, view: &mut TestsView) {
    view.visible.insert(node.path.clone());
    if !node.children.is_empty() {
        view.expanded.insert(node.path.clone());
    }
    for child in &node.children {
        mark_subtree(child, view);
    }
}

/// Tests-mode filter state.
#[derive(Debug, Clone, Default)]
pub struct TestsFilter {
    pub preset: SingleSelect<String>,
    pub fork: SingleSelect<String>,
    pub runner: SingleSelect<String>,
    pub search: String,
}

/// Visible and expanded node paths under a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestsView {
    pub visible: BTreeSet<String>,
    pub expanded: BTreeSet<String>,
}

/// Enabled/disabled state per facet button.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ButtonStates {
    pub presets: BTreeMap<String, bool>,
    pub forks: BTreeMap<String, bool>,
    pub runners: BTreeMap<String, bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest() -> TestManifest {
        serde_json::from_value(json!({
            "presets": {
                "mainnet": { "forks": {
                    "deneb": { "testTypes": {
                        "operations": { "testSuites": { "attestation": {
                            "testCount": 1,
                            "configs": { "mainnet": { "tests": [
                                { "name": "test_one",
                                  "files": ["roots.ssz_snappy", "roots.ssz_snappy.yaml"],
                                  "path": "mainnet/deneb/operations/attestation/mainnet/test_one" }
                            ] } }
                        } } }
                    } },
                    "eip6110": { "testTypes": {
                        "ssz_generic": { "testSuites": { "containers": {
                            "testCount": 1,
                            "configs": { "mainnet": { "tests": [
                                { "name": "test_container",
                                  "files": ["value.yaml"],
                                  "path": "mainnet/eip6110/ssz_generic/containers/mainnet/test_container" }
                            ] } }
                        } } }
                    } },
                    "altair": { "testTypes": {
                        "operations": { "testSuites": { "sync": {
                            "testCount": 1,
                            "configs": { "mainnet": { "tests": [
                                { "name": "test_minimal_sync",
                                  "files": ["meta.yaml"],
                                  "path": "mainnet/altair/operations/sync/mainnet/test_minimal_sync" }
                            ] } }
                        } } }
                    } }
                } },
                "minimal": { "forks": {
                    "deneb": { "testTypes": {
                        "finality": { "testSuites": { "finality": {
                            "testCount": 1,
                            "configs": { "minimal": { "tests": [
                                { "name": "test_fin",
                                  "files": ["state.ssz_snappy"],
                                  "path": "minimal/deneb/finality/finality/minimal/test_fin" }
                            ] } }
                        } } }
                    } }
                } }
            },
            "version": "v1.6.0"
        }))
        .expect("valid manifest")
    }

    #[test]
    fn forks_order_canonically_with_eip_last() {
        let tree = TestsTree::build(&manifest());
        let mainnet = &tree.presets[0];
        let forks: Vec<_> = mainnet.children.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(forks, ["altair", "deneb", "eip6110"]);
        assert_eq!(tree.fork_buttons(), ["altair", "deneb", "eip6110"]);
    }

    #[test]
    fn runner_buttons_are_alphabetical() {
        let tree = TestsTree::build(&manifest());
        assert_eq!(tree.runner_buttons(), ["finality", "operations", "ssz_generic"]);
    }

    #[test]
    fn node_lookup_by_exact_path_key() {
        let tree = TestsTree::build(&manifest());
        let node = tree
            .node_by_path("mainnet/deneb/operations/attestation/mainnet/test_one")
            .expect("case node");
        assert_eq!(node.level, Level::Case);
        assert_eq!(node.label, "test_one");
        assert!(tree.node_by_path("mainnet/deneb/operations/nope").is_none());
    }

    #[test]
    fn ancestors_are_outermost_first() {
        let tree = TestsTree::build(&manifest());
        assert_eq!(
            tree.ancestors_of("mainnet/deneb/operations/attestation/mainnet/test_one"),
            [
                "mainnet",
                "mainnet/deneb",
                "mainnet/deneb/operations",
                "mainnet/deneb/operations/attestation",
                "mainnet/deneb/operations/attestation/mainnet",
            ]
        );
    }

    #[test]
    fn search_surfaces_ancestors_of_matches() {
        let tree = TestsTree::build(&manifest());
        let filter = TestsFilter {
            search: "minimal_sync".to_string(),
            ..Default::default()
        };
        let view = tree.filter(&filter);
        let case = "mainnet/altair/operations/sync/mainnet/test_minimal_sync";
        assert!(view.visible.contains(case));
        for ancestor in tree.ancestors_of(case) {
            assert!(view.visible.contains(&ancestor), "missing {ancestor}");
            assert!(view.expanded.contains(&ancestor), "not expanded: {ancestor}");
        }
        // Unrelated subtrees stay hidden.
        assert!(!view.visible.contains("minimal/deneb"));
    }

    #[test]
    fn facet_filters_combine() {
        let tree = TestsTree::build(&manifest());
        let mut filter = TestsFilter::default();
        filter.preset.toggle("mainnet".to_string());
        filter.runner.toggle("operations".to_string());
        let view = tree.filter(&filter);
        assert!(view.visible.contains("mainnet/deneb/operations/attestation/mainnet/test_one"));
        assert!(view.visible.contains("mainnet/altair/operations/sync/mainnet/test_minimal_sync"));
        assert!(!view.visible.contains("mainnet/eip6110/ssz_generic"));
        assert!(!view.visible.contains("minimal"));
    }

    #[test]
    fn preset_fast_path_matches_general_walk() {
        let tree = TestsTree::build(&manifest());
        let mut filter = TestsFilter::default();
        filter.preset.toggle("minimal".to_string());

        let fast = tree.filter(&filter);

        // Run the general walk directly on the same filter state.
        let mut general = TestsView::default();
        for node in &tree.presets {
            super::visit(node, &filter, "", &mut general);
        }

        assert_eq!(fast, general);
    }

    #[test]
    fn button_states_track_reachable_combinations() {
        let tree = TestsTree::build(&manifest());
        let mut filter = TestsFilter::default();
        filter.runner.toggle("finality".to_string());
        let states = tree.button_states(&filter);

        // finality tests only exist under minimal/deneb.
        assert_eq!(states.presets.get("minimal"), Some(&true));
        assert_eq!(states.presets.get("mainnet"), Some(&false));
        assert_eq!(states.forks.get("deneb"), Some(&true));
        assert_eq!(states.forks.get("altair"), Some(&false));
        // Runner buttons ignore the runner facet itself: all stay enabled
        // relative to the (empty) preset/fork selections.
        assert!(states.runners.values().all(|enabled| *enabled));
    }

    #[test]
    fn disabled_buttons_never_hide_results() {
        let tree = TestsTree::build(&manifest());
        let mut filter = TestsFilter::default();
        filter.preset.toggle("mainnet".to_string());
        filter.fork.toggle("eip6110".to_string());
        let states = tree.button_states(&filter);
        assert_eq!(states.runners.get("ssz_generic"), Some(&true));
        assert_eq!(states.runners.get("operations"), Some(&false));
        assert_eq!(states.runners.get("finality"), Some(&false));
    }
}
