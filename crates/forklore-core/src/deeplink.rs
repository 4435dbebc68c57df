//! URL-fragment deep links.
//!
//! Two shapes share the fragment:
//!
//! ```text
//! specs/<version>/<category>-<name>[-<FORK>]
//! tests/<version>/<preset>/<fork>/<testType>/<testSuite>/<config>/<case>[/<file>[:<view>]]
//! ```
//!
//! A fragment without a mode prefix is an old-style specs link. Parsing is
//! total: anything malformed decodes to `None` and callers leave the view
//! untouched instead of erroring.

use crate::consolidate::Category;
use crate::fork::Fork;
use crate::manifest::looks_like_test_file;
use serde::Serialize;

/// How a binary fixture file is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Hex,
    Yaml,
}

impl ViewMode {
    fn parse(s: &str) -> Option<ViewMode> {
        match s {
            "hex" => Some(ViewMode::Hex),
            "yaml" => Some(ViewMode::Yaml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Hex => "hex",
            ViewMode::Yaml => "yaml",
        }
    }
}

/// A file selection inside a test-case link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub name: String,
    pub view: Option<ViewMode>,
}

/// A decoded fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum DeepLink {
    #[serde(rename_all = "camelCase")]
    Spec {
        version: String,
        category: Category,
        name: String,
        fork: Option<Fork>,
    },
    #[serde(rename_all = "camelCase")]
    Test {
        version: String,
        /// Slash-joined hierarchy key of the test case.
        path: String,
        file: Option<FileRef>,
    },
}

/// Minimum path segments of a test link after the version: preset, fork,
/// testType, testSuite, config, case.
const TEST_PATH_SEGMENTS: usize = 6;

impl DeepLink {
    /// Decode a fragment (leading `#` optional). Returns `None` for
    /// anything that does not fit the grammar.
    pub fn parse(fragment: &str) -> Option<DeepLink> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        if fragment.is_empty() {
            return None;
        }

        match fragment.split_once('/') {
            Some(("tests", rest)) => parse_test(rest),
            Some(("specs", rest)) => parse_spec(rest),
            // No mode prefix: old links are specs links.
            _ => parse_spec(fragment),
        }
    }

    /// Encode back to a fragment (no leading `#`). `parse` of the result
    /// yields the same link.
    pub fn encode(&self) -> String {
        match self {
            DeepLink::Spec {
                version,
                category,
                name,
                fork,
            } => {
                let mut out = format!("specs/{version}/{}-{name}", category.as_str());
                if let Some(fork) = fork {
                    out.push('-');
                    out.push_str(&fork.suffix());
                }
                out
            }
            DeepLink::Test {
                version,
                path,
                file,
            } => {
                let mut out = format!("tests/{version}/{path}");
                if let Some(file) = file {
                    out.push('/');
                    out.push_str(&urlencoding::encode(&file.name));
                    if let Some(view) = file.view {
                        out.push(':');
                        out.push_str(view.as_str());
                    }
                }
                out
            }
        }
    }
}

fn parse_spec(rest: &str) -> Option<DeepLink> {
    let (version, item) = rest.split_once('/')?;
    if version.is_empty() || item.is_empty() || item.contains('/') {
        return None;
    }

    let tokens: Vec<&str> = item.split('-').collect();
    if tokens.len() < 2 || tokens.iter().any(|t| t.is_empty()) {
        return None;
    }

    let category = Category::parse(tokens[0])?;

    // The trailing token names a fork only when one is actually spellable
    // there: with two tokens it is the item name, fork or not.
    let fork = if tokens.len() >= 3 {
        Fork::parse(tokens[tokens.len() - 1])
    } else {
        None
    };
    let name_tokens = if fork.is_some() {
        &tokens[1..tokens.len() - 1]
    } else {
        &tokens[1..]
    };

    Some(DeepLink::Spec {
        version: version.to_string(),
        category,
        name: name_tokens.join("-"),
        fork,
    })
}

fn parse_test(rest: &str) -> Option<DeepLink> {
    let (version, path) = rest.split_once('/')?;
    if version.is_empty() {
        return None;
    }

    let mut segments: Vec<&str> = path.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }

    // The last segment is a file when it carries a view suffix or a known
    // fixture extension, and enough segments remain for a full case path.
    let file = if segments.len() > TEST_PATH_SEGMENTS {
        let last = segments[segments.len() - 1];
        match split_file_segment(last) {
            Some(file) => {
                segments.pop();
                Some(file)
            }
            // A view suffix that fails to parse is malformed, not a path
            // segment that happens to contain a colon.
            None if last.contains(':') => return None,
            None => None,
        }
    } else {
        None
    };

    if segments.len() < TEST_PATH_SEGMENTS {
        return None;
    }

    Some(DeepLink::Test {
        version: version.to_string(),
        path: segments.join("/"),
        file,
    })
}

fn split_file_segment(segment: &str) -> Option<FileRef> {
    let (name, view) = match segment.rsplit_once(':') {
        Some((name, view)) => (name, Some(ViewMode::parse(view)?)),
        None => (segment, None),
    };
    let name = urlencoding::decode(name).ok()?.into_owned();
    if view.is_none() && !looks_like_test_file(&name) {
        return None;
    }
    Some(FileRef { name, view })
}
