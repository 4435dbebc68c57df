//! Test manifest model (`manifest.json`).
//!
//! A five-level hierarchy: preset → fork → testType → testSuite → config,
//! with a list of test cases at the bottom. Each case carries the files that
//! make it up; binary fixture files may bring a YAML companion which is
//! displayed as an alternate view of the same file, never as its own entry.

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestManifest {
    #[serde(default)]
    pub presets: BTreeMap<String, PresetEntry>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresetEntry {
    #[serde(default)]
    pub forks: BTreeMap<String, ForkEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForkEntry {
    #[serde(rename = "testTypes", default)]
    pub test_types: BTreeMap<String, TestTypeEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestTypeEntry {
    #[serde(rename = "testSuites", default)]
    pub test_suites: BTreeMap<String, TestSuiteEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestSuiteEntry {
    #[serde(rename = "testCount", default)]
    pub test_count: usize,
    #[serde(default)]
    pub configs: BTreeMap<String, ConfigEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigEntry {
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    pub name: String,
    #[serde(default)]
    pub files: Vec<String>,
    /// Slash-joined hierarchy key, unique within a version.
    pub path: String,
}

/// A flattened view of one test case with its full hierarchy coordinates.
#[derive(Debug, Clone, Copy)]
pub struct CaseRef<'a> {
    pub preset: &'a str,
    pub fork: &'a str,
    pub runner: &'a str,
    pub suite: &'a str,
    pub config: &'a str,
    pub case: &'a TestCase,
}

impl TestManifest {
    /// Iterate every test case with its hierarchy coordinates.
    pub fn cases(&self) -> impl Iterator<Item = CaseRef<'_>> {
        self.presets.iter().flat_map(|(preset, pe)| {
            pe.forks.iter().flat_map(move |(fork, fe)| {
                fe.test_types.iter().flat_map(move |(runner, te)| {
                    te.test_suites.iter().flat_map(move |(suite, se)| {
                        se.configs.iter().flat_map(move |(config, ce)| {
                            ce.tests.iter().map(move |case| CaseRef {
                                preset,
                                fork,
                                runner,
                                suite,
                                config,
                                case,
                            })
                        })
                    })
                })
            })
        })
    }

    pub fn case_by_path(&self, path: &str) -> Option<CaseRef<'_>> {
        self.cases().find(|c| c.case.path == path)
    }
}

// ============================================================================
// File classification
// ============================================================================

/// Extensions a deep-link file segment can be recognized by.
pub const TEST_FILE_EXTENSIONS: [&str; 5] = [".ssz_snappy", ".ssz", ".yaml", ".json", ".txt"];

/// A file is fetched as raw bytes iff it is a serialized fixture.
pub fn is_binary(name: &str) -> bool {
    name.ends_with(".ssz_snappy") || name.ends_with(".ssz")
}

/// A YAML companion pairs with the binary file its name wraps
/// (`roots.ssz_snappy.yaml` → `roots.ssz_snappy`).
pub fn is_companion(name: &str) -> bool {
    name.ends_with(".ssz_snappy.yaml")
}

/// The name of the binary file a companion belongs to.
pub fn companion_primary(name: &str) -> Option<&str> {
    if is_companion(name) {
        name.strip_suffix(".yaml")
    } else {
        None
    }
}

pub fn looks_like_test_file(name: &str) -> bool {
    TEST_FILE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// One displayable file slot of a test case.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFile {
    pub name: String,
    pub binary: bool,
    /// True once a `.ssz_snappy.yaml` sibling exists; enables the hex/yaml
    /// toggle on this slot.
    pub has_companion: bool,
}

/// Collapse a case's file list into display slots: companions fold into
/// their primary and never appear standalone.
pub fn display_files(files: &[String]) -> Vec<DisplayFile> {
    files
        .iter()
        .filter(|name| !is_companion(name))
        .map(|name| DisplayFile {
            name: name.clone(),
            binary: is_binary(name),
            has_companion: files.iter().any(|f| companion_primary(f) == Some(name.as_str())),
        })
        .collect()
}
