//! Reference scanning: who uses whom.
//!
//! The reference graph is built by tokenizing every item's rendered text and
//! resolving identifier tokens against the set of known item names, with
//! fork-suffixed spellings (`DOMAIN_ALTAIR`) resolving to their base item.
//! The graph is rebuilt wholesale on every version load; there is no
//! incremental path.

use crate::consolidate::ItemSet;
use crate::fork::split_fork_suffix;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Resolves identifier tokens to item names.
pub struct NameResolver<'a> {
    names: BTreeSet<&'a str>,
}

impl<'a> NameResolver<'a> {
    pub fn new(items: &'a ItemSet) -> Self {
        let names = items.iter_items().map(|i| i.name.as_str()).collect();
        Self { names }
    }

    /// Resolve an identifier: exact item name, or a fork-suffixed spelling
    /// of one. Fork suffixes are mutually exclusive by construction, so at
    /// most one strip is ever possible.
    pub fn resolve(&self, identifier: &str) -> Option<&'a str> {
        if let Some(name) = self.names.get(identifier).copied() {
            return Some(name);
        }
        let (base, fork) = split_fork_suffix(identifier);
        if fork.is_some()
            && let Some(name) = self.names.get(base).copied()
        {
            return Some(name);
        }
        None
    }
}

/// Iterator over word-identifier tokens (`[A-Za-z_][A-Za-z0-9_]*`) in a
/// piece of text, case-preserving.
struct Tokens<'a> {
    text: &'a str,
    pos: usize,
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

impl<'a> Iterator for Tokens<'a> {
    /// (byte offset, token)
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() && !is_ident_start(bytes[self.pos]) {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return None;
        }
        let start = self.pos;
        while self.pos < bytes.len() && is_ident_continue(bytes[self.pos]) {
            self.pos += 1;
        }
        Some((start, &self.text[start..self.pos]))
    }
}

/// Tokenize text into identifier tokens with byte offsets.
pub fn tokens(text: &str) -> impl Iterator<Item = (usize, &str)> {
    Tokens { text, pos: 0 }
}

/// The "used by" side of the reference relation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferenceGraph {
    /// Item name → names of items whose rendered text references it.
    /// Every known item has an entry, possibly empty.
    pub used_by: BTreeMap<String, BTreeSet<String>>,
}

impl ReferenceGraph {
    /// Build the graph over a consolidated item set. Cost is linear in the
    /// total token count across all rendered values; run once per version
    /// load, never per item view.
    pub fn build(items: &ItemSet) -> Self {
        let resolver = NameResolver::new(items);
        let mut used_by: BTreeMap<String, BTreeSet<String>> = items
            .iter_items()
            .map(|i| (i.name.clone(), BTreeSet::new()))
            .collect();

        for item in items.iter_items() {
            for rendered in item.values.values() {
                let text = rendered.text();
                for (_, token) in tokens(&text) {
                    if let Some(target) = resolver.resolve(token)
                        && target != item.name
                        && let Some(set) = used_by.get_mut(target)
                    {
                        set.insert(item.name.clone());
                    }
                }
            }
        }

        Self { used_by }
    }

    pub fn used_by(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.used_by.get(name)
    }
}

/// A resolvable token inside rendered source text, for click-to-navigate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSpan {
    pub offset: usize,
    pub length: usize,
    pub target: String,
}

/// Second pass over already-rendered text: find every token that resolves
/// to a known item and report its span and target. Does not touch the graph.
pub fn link_spans(text: &str, resolver: &NameResolver<'_>) -> Vec<LinkSpan> {
    tokens(text)
        .filter_map(|(offset, token)| {
            resolver.resolve(token).map(|target| LinkSpan {
                offset,
                length: token.len(),
                target: target.to_string(),
            })
        })
        .collect()
}
