//! Consolidation of raw per-fork, per-network spec data into items.
//!
//! Raw spec data carries a full value snapshot for every fork. The
//! consolidator compresses that into one [`SpecItem`] per name, keeping only
//! the forks where the rendered value actually changed. Variable categories
//! additionally fold `BASE_<FORK>` suffix variants into their base name,
//! taking the highest-order suffix present in each fork snapshot ("latest
//! override wins").

use crate::fork::{Fork, split_fork_suffix};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

/// A spec item category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    ConstantVars,
    ConfigVars,
    PresetVars,
    CustomTypes,
    SszObjects,
    Dataclasses,
    Functions,
}

/// All categories, in display order. Variant order above matches, so the
/// derived `Ord` keeps maps in display order too.
pub const CATEGORIES: [Category; 7] = [
    Category::ConstantVars,
    Category::ConfigVars,
    Category::PresetVars,
    Category::CustomTypes,
    Category::SszObjects,
    Category::Dataclasses,
    Category::Functions,
];

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ConfigVars => "config_vars",
            Category::ConstantVars => "constant_vars",
            Category::Dataclasses => "dataclasses",
            Category::Functions => "functions",
            Category::PresetVars => "preset_vars",
            Category::SszObjects => "ssz_objects",
            Category::CustomTypes => "custom_types",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        CATEGORIES.iter().find(|c| c.as_str() == s).copied()
    }

    /// Variable categories get the mainnet/minimal split and fork-suffix
    /// folding; code categories are consolidated as whole source blobs.
    pub fn is_variable(&self) -> bool {
        matches!(
            self,
            Category::ConfigVars | Category::ConstantVars | Category::PresetVars
        )
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Category::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("unknown category: {s}")))
    }
}

// ============================================================================
// Raw input model (pyspec.json)
// ============================================================================

/// Per-category raw entries for one fork of one network.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCategories {
    #[serde(default)]
    pub config_vars: BTreeMap<String, Value>,
    #[serde(default)]
    pub constant_vars: BTreeMap<String, Value>,
    #[serde(default)]
    pub dataclasses: BTreeMap<String, Value>,
    #[serde(default)]
    pub functions: BTreeMap<String, Value>,
    #[serde(default)]
    pub preset_vars: BTreeMap<String, Value>,
    #[serde(default)]
    pub ssz_objects: BTreeMap<String, Value>,
    #[serde(default)]
    pub custom_types: BTreeMap<String, Value>,
}

impl RawCategories {
    pub fn category(&self, category: Category) -> &BTreeMap<String, Value> {
        match category {
            Category::ConfigVars => &self.config_vars,
            Category::ConstantVars => &self.constant_vars,
            Category::Dataclasses => &self.dataclasses,
            Category::Functions => &self.functions,
            Category::PresetVars => &self.preset_vars,
            Category::SszObjects => &self.ssz_objects,
            Category::CustomTypes => &self.custom_types,
        }
    }
}

/// Fork name → raw categories, for one network. Fork keys in the input are
/// matched case-insensitively.
pub type RawForkMap = BTreeMap<String, RawCategories>;

/// The full raw spec payload for one version (`pyspec.json`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSpecData {
    #[serde(default)]
    pub mainnet: Option<RawForkMap>,
    #[serde(default)]
    pub minimal: Option<RawForkMap>,
}

fn fork_block<'a>(map: Option<&'a RawForkMap>, fork: &Fork) -> Option<&'a RawCategories> {
    map?.iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(fork.as_str()))
        .map(|(_, cats)| cats)
}

// ============================================================================
// Consolidated output model
// ============================================================================

/// A single rendered variable value: an optional type annotation plus the
/// value text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarValue {
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub value: String,
}

/// A variable's value on both networks. Either side may be absent when that
/// network's data does not define the variable at this fork.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct NetworkValue {
    pub mainnet: Option<VarValue>,
    pub minimal: Option<VarValue>,
}

/// One fork's rendered value of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Rendered {
    Variable(NetworkValue),
    Code(String),
}

impl Rendered {
    /// All textual content of this value, for reference scanning. Variable
    /// values concatenate both networks' fields with spaces.
    pub fn text(&self) -> String {
        match self {
            Rendered::Code(source) => source.clone(),
            Rendered::Variable(nv) => {
                let mut parts = Vec::new();
                for side in [&nv.mainnet, &nv.minimal].into_iter().flatten() {
                    if let Some(t) = &side.type_name {
                        parts.push(t.clone());
                    }
                    parts.push(side.value.clone());
                }
                parts.join(" ")
            }
        }
    }
}

/// A consolidated spec item: its value history compressed to the forks where
/// the value changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecItem {
    pub name: String,
    pub category: Category,
    /// Strictly increasing in canonical fork order, never empty.
    pub forks: Vec<Fork>,
    /// Exactly one entry per fork in `forks`.
    pub values: BTreeMap<Fork, Rendered>,
}

/// The full consolidated item set for one version.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemSet {
    pub categories: BTreeMap<Category, BTreeMap<String, SpecItem>>,
}

impl ItemSet {
    pub fn get(&self, category: Category, name: &str) -> Option<&SpecItem> {
        self.categories.get(&category)?.get(name)
    }

    /// Look an item up by name across all categories (names are unique within
    /// a category; cross-category collisions resolve in display order).
    pub fn by_name(&self, name: &str) -> Option<&SpecItem> {
        self.categories.values().find_map(|items| items.get(name))
    }

    pub fn iter_items(&self) -> impl Iterator<Item = &SpecItem> {
        self.categories.values().flat_map(|items| items.values())
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(|items| items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Consolidation
// ============================================================================

/// Render a raw variable entry: a `[type, value]` pair, or a bare scalar.
fn render_var(raw: &Value) -> VarValue {
    if let Value::Array(pair) = raw
        && pair.len() == 2
    {
        return VarValue {
            type_name: Some(stringify(&pair[0])),
            value: stringify(&pair[1]),
        };
    }
    VarValue {
        type_name: None,
        value: stringify(raw),
    }
}

/// Render a raw code entry as source text.
fn render_code(raw: &Value) -> String {
    stringify(raw)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Suffix rank within one fork snapshot: a bare name ranks below any
/// suffixed variant, and suffixes rank by canonical fork order.
fn suffix_rank(fork: &Option<Fork>) -> (bool, Option<&Fork>) {
    (fork.is_some(), fork.as_ref())
}

/// For one fork snapshot of one network, compute the effective value per base
/// name: among `BASE` and `BASE_<FORK>` variants, the highest-order suffix
/// wins.
fn best_versions(block: Option<&RawCategories>, category: Category) -> BTreeMap<String, VarValue> {
    let mut best: BTreeMap<String, (Option<Fork>, VarValue)> = BTreeMap::new();
    let Some(block) = block else {
        return BTreeMap::new();
    };
    for (raw_name, raw_value) in block.category(category) {
        let (base, suffix) = split_fork_suffix(raw_name);
        let candidate = render_var(raw_value);
        match best.get(base) {
            Some((current, _)) if suffix_rank(current) >= suffix_rank(&suffix) => {}
            _ => {
                best.insert(base.to_string(), (suffix, candidate));
            }
        }
    }
    best.into_iter().map(|(k, (_, v))| (k, v)).collect()
}

/// Consolidate raw spec data into items.
///
/// `fork_order` is the canonical fork order, oldest first; forks absent from
/// the data contribute nothing. Output is deterministic for identical input.
pub fn consolidate(raw: &RawSpecData, fork_order: &[Fork]) -> ItemSet {
    let mut out = ItemSet::default();

    for category in CATEGORIES {
        let mut last_serialized: BTreeMap<String, String> = BTreeMap::new();
        let mut items: BTreeMap<String, SpecItem> = BTreeMap::new();

        for fork in fork_order {
            if category.is_variable() {
                let mainnet = best_versions(fork_block(raw.mainnet.as_ref(), fork), category);
                let minimal = best_versions(fork_block(raw.minimal.as_ref(), fork), category);

                let bases: BTreeSet<&String> = mainnet.keys().chain(minimal.keys()).collect();
                for base in bases {
                    let rendered = NetworkValue {
                        mainnet: mainnet.get(base.as_str()).cloned(),
                        minimal: minimal.get(base.as_str()).cloned(),
                    };
                    // Change detection compares the mainnet serialization,
                    // falling back to minimal when mainnet has no data.
                    let probe = rendered.mainnet.as_ref().or(rendered.minimal.as_ref());
                    let Some(probe) = probe else { continue };
                    let serialized =
                        serde_json::to_string(probe).unwrap_or_else(|_| probe.value.clone());
                    record(
                        &mut items,
                        &mut last_serialized,
                        category,
                        base,
                        fork,
                        serialized,
                        Rendered::Variable(rendered),
                    );
                }
            } else {
                // Code categories: one network's snapshot, mainnet preferred.
                let block = fork_block(raw.mainnet.as_ref(), fork)
                    .or_else(|| fork_block(raw.minimal.as_ref(), fork));
                let Some(block) = block else { continue };
                for (name, raw_value) in block.category(category) {
                    let source = render_code(raw_value);
                    record(
                        &mut items,
                        &mut last_serialized,
                        category,
                        name,
                        fork,
                        source.clone(),
                        Rendered::Code(source),
                    );
                }
            }
        }

        if !items.is_empty() {
            out.categories.insert(category, items);
        }
    }

    out
}

fn record(
    items: &mut BTreeMap<String, SpecItem>,
    last_serialized: &mut BTreeMap<String, String>,
    category: Category,
    name: &str,
    fork: &Fork,
    serialized: String,
    rendered: Rendered,
) {
    if last_serialized.get(name) == Some(&serialized) {
        return;
    }
    last_serialized.insert(name.to_string(), serialized);
    let item = items.entry(name.to_string()).or_insert_with(|| SpecItem {
        name: name.to_string(),
        category,
        forks: Vec::new(),
        values: BTreeMap::new(),
    });
    item.forks.push(fork.clone());
    item.values.insert(fork.clone(), rendered);
}
