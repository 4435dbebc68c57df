//! Fork model: the canonical fork order and fork-suffix parsing.
//!
//! Forks are protocol upgrade stages with a fixed total order. The order
//! drives change detection in consolidation, display order in trees, and
//! the `BASE_<FORK>` suffix convention on raw variable names.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A named protocol upgrade stage.
///
/// Known forks order by their position in the canonical list. Anything else
/// (an `eip*` feature fork, a fork this build predates) is carried as
/// `Other` and sorts after every known fork, lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Fork {
    Phase0,
    Altair,
    Bellatrix,
    Capella,
    Deneb,
    Electra,
    Fulu,
    Gloas,
    Other(String),
}

/// The known forks in canonical order.
pub const KNOWN_FORKS: [Fork; 8] = [
    Fork::Phase0,
    Fork::Altair,
    Fork::Bellatrix,
    Fork::Capella,
    Fork::Deneb,
    Fork::Electra,
    Fork::Fulu,
    Fork::Gloas,
];

impl Fork {
    /// Parse a known fork name, case-insensitively. Unknown names return
    /// `None` — this is the strict form used for suffix stripping, where a
    /// trailing `_BALANCE` must not be mistaken for a fork.
    pub fn parse(s: &str) -> Option<Fork> {
        KNOWN_FORKS
            .iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .cloned()
    }

    /// Parse any fork name, falling back to `Other` for names that are not
    /// in the known list. Used for data-driven fork keys (manifest levels,
    /// raw spec fork blocks), which may name feature forks like `eip6110`.
    pub fn parse_lenient(s: &str) -> Fork {
        Fork::parse(s).unwrap_or_else(|| Fork::Other(s.to_ascii_lowercase()))
    }

    /// Lowercase canonical name.
    pub fn as_str(&self) -> &str {
        match self {
            Fork::Phase0 => "phase0",
            Fork::Altair => "altair",
            Fork::Bellatrix => "bellatrix",
            Fork::Capella => "capella",
            Fork::Deneb => "deneb",
            Fork::Electra => "electra",
            Fork::Fulu => "fulu",
            Fork::Gloas => "gloas",
            Fork::Other(name) => name,
        }
    }

    /// Uppercase form, as used in `BASE_<FORK>` variable suffixes.
    pub fn suffix(&self) -> String {
        self.as_str().to_ascii_uppercase()
    }
}

impl Display for Fork {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Fork {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Fork {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Err(de::Error::custom("empty fork name"));
        }
        Ok(Fork::parse_lenient(&s))
    }
}

/// Split a raw identifier into its base name and an optional fork suffix.
///
/// `MAX_BLOBS_PER_BLOCK_ELECTRA` → (`MAX_BLOBS_PER_BLOCK`, `electra`);
/// `MAX_BLOBS_PER_BLOCK` is returned whole. Only known fork names are
/// recognized as suffixes, so at most one split is possible.
pub fn split_fork_suffix(identifier: &str) -> (&str, Option<Fork>) {
    if let Some((base, suffix)) = identifier.rsplit_once('_')
        && !base.is_empty()
        && let Some(fork) = Fork::parse(suffix)
    {
        return (base, Some(fork));
    }
    (identifier, None)
}

/// Sort fork names for display: known forks in canonical order, then
/// everything else (`eip*` and friends) lexicographically.
pub fn sort_fork_names(names: &mut [String]) {
    names.sort_by(|a, b| Fork::parse_lenient(a).cmp(&Fork::parse_lenient(b)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Fork::parse("PHASE0"), Some(Fork::Phase0));
        assert_eq!(Fork::parse("Altair"), Some(Fork::Altair));
        assert_eq!(Fork::parse("deneb"), Some(Fork::Deneb));
        assert_eq!(Fork::parse("eip6110"), None);
    }

    #[test]
    fn lenient_parse_keeps_unknown_forks() {
        assert_eq!(
            Fork::parse_lenient("EIP7594"),
            Fork::Other("eip7594".to_string())
        );
        assert_eq!(Fork::parse_lenient("electra"), Fork::Electra);
    }

    #[test]
    fn canonical_order_puts_unknown_last() {
        let mut names = vec![
            "eip7594".to_string(),
            "altair".to_string(),
            "eip6110".to_string(),
            "phase0".to_string(),
            "fulu".to_string(),
        ];
        sort_fork_names(&mut names);
        assert_eq!(names, ["phase0", "altair", "fulu", "eip6110", "eip7594"]);
    }

    #[test]
    fn suffix_split_recognizes_known_forks_only() {
        assert_eq!(
            split_fork_suffix("MAX_BLOBS_PER_BLOCK_ELECTRA"),
            ("MAX_BLOBS_PER_BLOCK", Some(Fork::Electra))
        );
        assert_eq!(
            split_fork_suffix("MAX_EFFECTIVE_BALANCE"),
            ("MAX_EFFECTIVE_BALANCE", None)
        );
        assert_eq!(split_fork_suffix("DOMAIN_ALTAIR"), ("DOMAIN", Some(Fork::Altair)));
        assert_eq!(split_fork_suffix("_ALTAIR"), ("_ALTAIR", None));
    }

    #[test]
    fn suffix_is_uppercase() {
        assert_eq!(Fork::Bellatrix.suffix(), "BELLATRIX");
    }
}
