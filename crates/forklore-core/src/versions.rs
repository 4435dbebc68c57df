//! Version catalog (`versions.json`).
//!
//! Display order puts nightly builds first, then releases by descending
//! semantic version. Pre-releases of a base version sit below its final
//! release, with release > rc > beta > alpha and numeric pre-release
//! counters (`beta.10` above `beta.2`).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Wire shape of `versions.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionList {
    #[serde(default)]
    pub versions: Vec<String>,
}

/// The available versions in display order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct VersionCatalog {
    versions: Vec<String>,
}

impl VersionCatalog {
    pub fn new(mut versions: Vec<String>) -> Self {
        versions.sort_by(|a, b| display_order(a, b));
        versions.dedup();
        Self { versions }
    }

    pub fn from_list(list: VersionList) -> Self {
        Self::new(list.versions)
    }

    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    pub fn contains(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }

    /// The version to show: the preferred one when it still exists,
    /// otherwise the first in display order.
    pub fn select<'a>(&'a self, preferred: Option<&'a str>) -> Option<&'a str> {
        if let Some(wanted) = preferred
            && self.contains(wanted)
        {
            return Some(wanted);
        }
        self.versions.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Channel {
    Alpha,
    Beta,
    Rc,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Semver {
    major: u64,
    minor: u64,
    patch: u64,
    channel: Channel,
    number: u64,
}

fn parse_semver(version: &str) -> Option<Semver> {
    let version = version.strip_prefix('v').unwrap_or(version);
    let (base, pre) = match version.split_once('-') {
        Some((base, pre)) => (base, Some(pre)),
        None => (version, None),
    };

    let mut parts = base.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next().unwrap_or("0").parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let (channel, number) = match pre {
        None => (Channel::Release, 0),
        Some(pre) => {
            let (name, number) = match pre.split_once('.') {
                Some((name, n)) => (name, n.parse().ok()?),
                None => (pre, 0),
            };
            let channel = match name {
                "alpha" => Channel::Alpha,
                "beta" => Channel::Beta,
                "rc" => Channel::Rc,
                _ => return None,
            };
            (channel, number)
        }
    };

    Some(Semver {
        major,
        minor,
        patch,
        channel,
        number,
    })
}

fn is_nightly(version: &str) -> bool {
    version.starts_with("nightly")
}

/// Total order for the version dropdown. Unparseable non-nightly strings
/// sink to the bottom, newest-looking first.
fn display_order(a: &str, b: &str) -> Ordering {
    match (is_nightly(a), is_nightly(b)) {
        (true, true) => b.cmp(a),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => match (parse_semver(a), parse_semver(b)) {
            (Some(va), Some(vb)) => vb.cmp(&va),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b.cmp(a),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nightly_first_then_descending_semver() {
        let catalog = VersionCatalog::new(vec![
            "v1.5.0".to_string(),
            "v1.6.0-alpha.1".to_string(),
            "nightly".to_string(),
            "v1.6.0".to_string(),
            "v1.6.0-beta.0".to_string(),
            "v1.6.0-beta.1".to_string(),
        ]);
        assert_eq!(
            catalog.versions(),
            [
                "nightly",
                "v1.6.0",
                "v1.6.0-beta.1",
                "v1.6.0-beta.0",
                "v1.6.0-alpha.1",
                "v1.5.0",
            ]
        );
    }

    #[test]
    fn prerelease_counters_compare_numerically() {
        let catalog = VersionCatalog::new(vec![
            "v1.6.0-beta.2".to_string(),
            "v1.6.0-beta.10".to_string(),
        ]);
        assert_eq!(catalog.versions(), ["v1.6.0-beta.10", "v1.6.0-beta.2"]);
    }

    #[test]
    fn rc_sits_between_release_and_beta() {
        let catalog = VersionCatalog::new(vec![
            "v1.6.0-beta.1".to_string(),
            "v1.6.0".to_string(),
            "v1.6.0-rc.1".to_string(),
        ]);
        assert_eq!(catalog.versions(), ["v1.6.0", "v1.6.0-rc.1", "v1.6.0-beta.1"]);
    }

    #[test]
    fn select_prefers_an_existing_version() {
        let catalog = VersionCatalog::new(vec![
            "nightly".to_string(),
            "v1.6.0".to_string(),
            "v1.5.0".to_string(),
        ]);
        assert_eq!(catalog.select(Some("v1.5.0")), Some("v1.5.0"));
        assert_eq!(catalog.select(Some("v0.0.0")), Some("nightly"));
        assert_eq!(catalog.select(None), Some("nightly"));

        let empty = VersionCatalog::default();
        assert_eq!(empty.select(None), None);
    }

    #[test]
    fn unparseable_versions_sink_to_the_bottom() {
        let catalog = VersionCatalog::new(vec![
            "weird-tag".to_string(),
            "v1.4.0".to_string(),
        ]);
        assert_eq!(catalog.versions(), ["v1.4.0", "weird-tag"]);
    }
}
