//! A browsing session over one data root.
//!
//! Owns the version catalog, the fully-derived state of the selected version
//! (items, reference graph, both trees), the navigation history, and the
//! filter state. Version switches rebuild everything wholesale; nothing is
//! merged incrementally.

use crate::loader::{CaseLoader, FILE_WAIT_CAP, FileSlot};
use crate::store::DataStore;
use eyre::Result;
use forklore_core::tree::SpecsFilter;
use forklore_core::{
    DeepLink, Fork, ItemSet, KNOWN_FORKS, NavigationHistory, RawSpecData, ReferenceGraph,
    SpecsTree, TestManifest, TestsFilter, TestsTree, VersionCatalog, ViewMode, consolidate,
};
use std::sync::Arc;

/// Everything derived from one version's data files.
#[derive(Debug)]
pub struct VersionData {
    pub version: String,
    pub items: ItemSet,
    pub refs: ReferenceGraph,
    pub specs_tree: SpecsTree,
    pub manifest: TestManifest,
    pub tests_tree: TestsTree,
}

impl VersionData {
    pub fn build(version: &str, raw: &RawSpecData, manifest: TestManifest) -> Self {
        let items = consolidate(raw, &KNOWN_FORKS);
        let refs = ReferenceGraph::build(&items);
        let specs_tree = SpecsTree::build(&items);
        let tests_tree = TestsTree::build(&manifest);
        Self {
            version: version.to_string(),
            items,
            refs,
            specs_tree,
            manifest,
            tests_tree,
        }
    }
}

/// Why a deep link could not be followed.
#[derive(Debug)]
pub enum NavigateError {
    /// The link decodes but its target does not exist in the selected
    /// version. Rendered distinctly from fetch errors so the user is told
    /// to try another version.
    NotFound { version: String, target: String },
    /// Loading version-scoped data failed.
    Load(eyre::Report),
}

impl std::fmt::Display for NavigateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigateError::NotFound { version, target } => {
                write!(f, "{target} not found in {version}")
            }
            NavigateError::Load(err) => write!(f, "{err:#}"),
        }
    }
}

impl std::error::Error for NavigateError {}

/// What following a deep link produced.
#[derive(Debug)]
pub enum Navigation {
    /// The link named a version the catalog does not know; the router
    /// leaves the current view untouched.
    Ignored,
    Spec(SpecFocus),
    Test(TestFocus),
}

#[derive(Debug)]
pub struct SpecFocus {
    pub name: String,
    pub fork: Option<Fork>,
    pub used_by: Vec<String>,
}

#[derive(Debug)]
pub struct TestFocus {
    pub path: String,
    /// Ancestor node keys to expand, outermost first.
    pub ancestors: Vec<String>,
    pub file: Option<FileFocus>,
}

#[derive(Debug)]
pub struct FileFocus {
    pub name: String,
    pub view: Option<ViewMode>,
    pub slot: FileSlot,
    /// Whether the hex/yaml toggle is available (both siblings arrived).
    pub toggle_ready: bool,
}

pub struct Session {
    store: DataStore,
    loader: Arc<CaseLoader>,
    catalog: VersionCatalog,
    data: Option<VersionData>,
    pub history: NavigationHistory,
    pub specs_filter: SpecsFilter,
    pub tests_filter: TestsFilter,
}

impl Session {
    /// Open a session: load the catalog and the default version.
    pub async fn open(store: DataStore, preferred: Option<&str>) -> Result<Self> {
        let catalog = VersionCatalog::from_list(store.versions().await?);
        let mut session = Self {
            loader: Arc::new(CaseLoader::new(store.clone())),
            store,
            catalog,
            data: None,
            history: NavigationHistory::new(),
            specs_filter: SpecsFilter::default(),
            tests_filter: TestsFilter::default(),
        };
        if let Some(version) = session.catalog.select(preferred).map(str::to_string) {
            session.switch_version(&version).await?;
        }
        Ok(session)
    }

    pub fn catalog(&self) -> &VersionCatalog {
        &self.catalog
    }

    pub fn data(&self) -> Option<&VersionData> {
        self.data.as_ref()
    }

    pub fn loader(&self) -> &Arc<CaseLoader> {
        &self.loader
    }

    pub fn current_version(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.version.as_str())
    }

    /// Load a version and rebuild all derived state. History and filters
    /// reset; the file cache survives (it is keyed by version).
    pub async fn switch_version(&mut self, version: &str) -> Result<()> {
        let raw = self.store.spec_data(version).await?;
        let manifest = self.store.manifest(version).await?;
        self.data = Some(VersionData::build(version, &raw, manifest));
        self.history.clear();
        self.specs_filter = SpecsFilter::default();
        self.tests_filter = TestsFilter::default();
        Ok(())
    }

    /// Follow a decoded deep link: switch version if needed, locate the
    /// target, expand its ancestors, and for file links wait (bounded)
    /// until the file's content has settled.
    pub async fn navigate(&mut self, link: &DeepLink) -> Result<Navigation, NavigateError> {
        let version = match link {
            DeepLink::Spec { version, .. } | DeepLink::Test { version, .. } => version.as_str(),
        };
        if !self.catalog.contains(version) {
            return Ok(Navigation::Ignored);
        }
        if self.current_version() != Some(version) {
            let version = version.to_string();
            self.switch_version(&version)
                .await
                .map_err(NavigateError::Load)?;
        }
        let data = self.data.as_ref().ok_or_else(|| NavigateError::NotFound {
            version: version.to_string(),
            target: "version data".to_string(),
        })?;

        match link {
            DeepLink::Spec {
                category,
                name,
                fork,
                ..
            } => {
                let item =
                    data.items
                        .get(*category, name)
                        .ok_or_else(|| NavigateError::NotFound {
                            version: version.to_string(),
                            target: format!("{}/{name}", category.as_str()),
                        })?;
                self.history.push(item.name.clone(), fork.clone());
                Ok(Navigation::Spec(SpecFocus {
                    name: item.name.clone(),
                    fork: fork.clone(),
                    used_by: data
                        .refs
                        .used_by(name)
                        .map(|set| set.iter().cloned().collect())
                        .unwrap_or_default(),
                }))
            }
            DeepLink::Test { path, file, .. } => {
                let node =
                    data.tests_tree
                        .node_by_path(path)
                        .ok_or_else(|| NavigateError::NotFound {
                            version: version.to_string(),
                            target: path.clone(),
                        })?;
                let ancestors = data.tests_tree.ancestors_of(path);

                let file = match file {
                    None => None,
                    Some(target) => {
                        if !node.files.iter().any(|f| f == &target.name) {
                            return Err(NavigateError::NotFound {
                                version: version.to_string(),
                                target: format!("{path}/{}", target.name),
                            });
                        }
                        let case = self
                            .loader
                            .load(version, path, &node.files)
                            .map_err(NavigateError::Load)?;
                        let slot = case
                            .wait_for(&target.name, FILE_WAIT_CAP)
                            .await
                            .unwrap_or(FileSlot::Pending);
                        Some(FileFocus {
                            name: target.name.clone(),
                            view: target.view,
                            slot,
                            toggle_ready: case.toggle_ready(&target.name),
                        })
                    }
                };

                Ok(Navigation::Test(TestFocus {
                    path: path.clone(),
                    ancestors,
                    file,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forklore_core::Category;
    use serde_json::json;

    fn fixture_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let write = |rel: &str, contents: String| {
            let path = dir.path().join(rel);
            std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            std::fs::write(path, contents).expect("write");
        };

        write(
            "data/versions.json",
            json!({ "versions": ["v1.6.0", "v1.5.0"] }).to_string(),
        );
        for version in ["v1.6.0", "v1.5.0"] {
            write(
                &format!("pyspec/{version}/pyspec.json"),
                json!({
                    "mainnet": {
                        "phase0": {
                            "constant_vars": { "MAX_DEPOSITS": ["uint64", "16"] },
                            "functions": { "process_deposit": "def process_deposit():\n    return MAX_DEPOSITS" },
                        },
                        "deneb": {
                            "constant_vars": { "MAX_DEPOSITS_DENEB": ["uint64", "32"] },
                        },
                    }
                })
                .to_string(),
            );
            write(
                &format!("data/{version}/manifest.json"),
                json!({
                    "presets": { "mainnet": { "forks": { "deneb": { "testTypes": { "operations": {
                        "testSuites": { "attestation": {
                            "testCount": 1,
                            "configs": { "mainnet": { "tests": [
                                { "name": "test_one",
                                  "files": ["roots.ssz_snappy", "roots.ssz_snappy.yaml"],
                                  "path": "mainnet/deneb/operations/attestation/mainnet/test_one" }
                            ] } }
                        } }
                    } } } } } },
                    "version": version
                })
                .to_string(),
            );
            write(
                &format!(
                    "data/{version}/tests/mainnet/deneb/operations/attestation/mainnet/test_one/roots.ssz_snappy"
                ),
                "\u{1}\u{2}".to_string(),
            );
            write(
                &format!(
                    "data/{version}/tests/mainnet/deneb/operations/attestation/mainnet/test_one/roots.ssz_snappy.yaml"
                ),
                "root: 0x0102\n".to_string(),
            );
        }
        dir
    }

    #[tokio::test]
    async fn open_selects_the_first_version_and_builds_state() {
        let dir = fixture_root();
        let session = Session::open(DataStore::local(dir.path()), None)
            .await
            .expect("open");
        assert_eq!(session.current_version(), Some("v1.6.0"));
        let data = session.data().expect("data");
        // MAX_DEPOSITS_DENEB folds into MAX_DEPOSITS at deneb.
        let item = data.items.get(Category::ConstantVars, "MAX_DEPOSITS").expect("item");
        assert_eq!(item.forks, [Fork::Phase0, Fork::Deneb]);
        assert!(
            data.refs
                .used_by("MAX_DEPOSITS")
                .expect("entry")
                .contains("process_deposit")
        );
    }

    #[tokio::test]
    async fn navigate_to_spec_item_pushes_history() {
        let dir = fixture_root();
        let mut session = Session::open(DataStore::local(dir.path()), None)
            .await
            .expect("open");
        let link = DeepLink::parse("specs/v1.6.0/constant_vars-MAX_DEPOSITS-DENEB").expect("link");
        let nav = session.navigate(&link).await.expect("navigate");
        match nav {
            Navigation::Spec(focus) => {
                assert_eq!(focus.name, "MAX_DEPOSITS");
                assert_eq!(focus.fork, Some(Fork::Deneb));
                assert_eq!(focus.used_by, ["process_deposit"]);
            }
            other => panic!("unexpected navigation: {other:?}"),
        }
        assert_eq!(session.history.len(), 1);
    }

    #[tokio::test]
    async fn navigate_switches_version_and_resets_history() {
        let dir = fixture_root();
        let mut session = Session::open(DataStore::local(dir.path()), None)
            .await
            .expect("open");
        session.history.push("SOMETHING", None);

        let link = DeepLink::parse("specs/v1.5.0/functions-process_deposit").expect("link");
        session.navigate(&link).await.expect("navigate");
        assert_eq!(session.current_version(), Some("v1.5.0"));
        // The version switch cleared history before the new push.
        assert_eq!(session.history.len(), 1);
    }

    #[tokio::test]
    async fn navigate_end_to_end_to_a_test_file() {
        let dir = fixture_root();
        let mut session = Session::open(DataStore::local(dir.path()), None)
            .await
            .expect("open");
        let link = DeepLink::parse(
            "tests/v1.6.0/mainnet/deneb/operations/attestation/mainnet/test_one/roots.ssz_snappy:yaml",
        )
        .expect("link");
        let nav = session.navigate(&link).await.expect("navigate");
        match nav {
            Navigation::Test(focus) => {
                assert_eq!(
                    focus.ancestors,
                    [
                        "mainnet",
                        "mainnet/deneb",
                        "mainnet/deneb/operations",
                        "mainnet/deneb/operations/attestation",
                        "mainnet/deneb/operations/attestation/mainnet",
                    ]
                );
                let file = focus.file.expect("file focus");
                assert_eq!(file.view, Some(ViewMode::Yaml));
                assert!(matches!(file.slot, FileSlot::Loaded(_)));
                assert!(file.toggle_ready);
            }
            other => panic!("unexpected navigation: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_targets_and_unknown_versions_are_distinct() {
        let dir = fixture_root();
        let mut session = Session::open(DataStore::local(dir.path()), None)
            .await
            .expect("open");

        let link = DeepLink::parse("specs/v1.6.0/constant_vars-NOPE").expect("link");
        match session.navigate(&link).await {
            Err(NavigateError::NotFound { version, .. }) => assert_eq!(version, "v1.6.0"),
            other => panic!("unexpected: {other:?}"),
        }

        // An unknown version is a malformed link: silently ignored.
        let link = DeepLink::parse("specs/v9.9.9/constant_vars-MAX_DEPOSITS").expect("link");
        assert!(matches!(
            session.navigate(&link).await,
            Ok(Navigation::Ignored)
        ));
    }
}
