//! Patch/version policy: source routing, version comparison and section ordering

use crate::wiki::PatchSection;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// First game patch for which the wiki publication is authoritative.
/// The table publication stopped being maintained before this patch.
pub const WIKI_START_PATCH: &str = "25.15";

/// Offset added to the internal major version to obtain the game-facing one
/// (internal 15.x is game patch 25.x).
pub const GAME_PATCH_MAJOR_OFFSET: u32 = 10;

/// A numeric (major, minor, patch) triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Parse a version leniently
    ///
    /// A leading `v` is ignored, each component contributes its leading digits
    /// (so a hotfix letter as in `25.19a` is dropped) and missing or
    /// non-numeric components count as 0.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        let s = s
            .strip_prefix('v')
            .or_else(|| s.strip_prefix('V'))
            .unwrap_or(s);

        let mut parts = s.split('.').map(leading_number);
        Self {
            major: parts.next().unwrap_or(0),
            minor: parts.next().unwrap_or(0),
            patch: parts.next().unwrap_or(0),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

fn leading_number(part: &str) -> u32 {
    let digits: String = part
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Compare two version strings numerically, component-wise
pub fn compare_semver(a: &str, b: &str) -> Ordering {
    Version::parse(a).cmp(&Version::parse(b))
}

/// Which publication is authoritative for a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// The Lua data module
    Table,
    /// The patch-history article
    Wiki,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Table => f.write_str("table"),
            SourceKind::Wiki => f.write_str("wiki"),
        }
    }
}

/// Route a game-facing target version using the default threshold
pub fn select_source(target: &str) -> SourceKind {
    select_source_with(target, WIKI_START_PATCH)
}

/// Route a game-facing target version against an explicit threshold
pub fn select_source_with(target: &str, threshold: &str) -> SourceKind {
    if compare_semver(target, threshold) == Ordering::Less {
        SourceKind::Table
    } else {
        SourceKind::Wiki
    }
}

/// Map an internal version to the game-facing patch (`15.14.1` -> `25.14`)
pub fn to_game_patch(version: &str) -> String {
    let v = Version::parse(version);
    format!("{}.{}", v.major.saturating_add(GAME_PATCH_MAJOR_OFFSET), v.minor)
}

/// Select the sections within `[start, end]` and order them oldest-first
///
/// The publication lists newest sections first, so document order is reversed
/// before a stable sort by version; hotfix sections sharing a triple keep
/// their publication order relative to each other.
pub fn sections_for_merge<'a>(
    sections: &'a [PatchSection],
    start: &str,
    end: &str,
) -> Vec<&'a PatchSection> {
    let start = Version::parse(start);
    let end = Version::parse(end);

    let mut selected: Vec<&PatchSection> = sections
        .iter()
        .filter(|s| {
            let v = Version::parse(&s.version);
            v >= start && v <= end
        })
        .collect();

    selected.reverse();
    selected.sort_by_key(|s| Version::parse(&s.version));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(version: &str) -> PatchSection {
        PatchSection {
            version: version.to_string(),
            content: String::new(),
        }
    }

    #[test]
    fn test_compare_semver() {
        assert_eq!(compare_semver("25.2", "25.10"), Ordering::Less);
        assert_eq!(compare_semver("25.15", "25.15.0"), Ordering::Equal);
        assert_eq!(compare_semver("15.20.1", "15.20"), Ordering::Greater);
        assert_eq!(compare_semver("v25.19", "25.19"), Ordering::Equal);
    }

    #[test]
    fn test_select_source() {
        assert_eq!(select_source("25.14"), SourceKind::Table);
        assert_eq!(select_source("25.15"), SourceKind::Wiki);
        assert_eq!(select_source("25.19"), SourceKind::Wiki);
        assert_eq!(select_source("26.1"), SourceKind::Wiki);
    }

    #[test]
    fn test_to_game_patch() {
        assert_eq!(to_game_patch("15.14.1"), "25.14");
        assert_eq!(to_game_patch("15.20"), "25.20");
    }

    #[test]
    fn test_to_game_patch_saturates_huge_major() {
        let huge = format!("{}.3.1", u32::MAX - 2);
        assert_eq!(to_game_patch(&huge), format!("{}.3", u32::MAX));
    }

    #[test]
    fn test_version_parse_hotfix_letter() {
        let v = Version::parse("25.19a");
        assert_eq!(v, Version { major: 25, minor: 19, patch: 0 });
    }

    #[test]
    fn test_sections_for_merge_orders_oldest_first() {
        let sections = vec![
            section("25.20"),
            section("25.19"),
            section("25.18"),
            section("25.14"),
        ];

        let ordered = sections_for_merge(&sections, "25.15", "25.19");
        let versions: Vec<&str> = ordered.iter().map(|s| s.version.as_str()).collect();

        assert_eq!(versions, vec!["25.18", "25.19"]);
    }

    #[test]
    fn test_sections_for_merge_hotfix_after_base() {
        let sections = vec![section("25.19b"), section("25.19"), section("25.18")];

        let ordered = sections_for_merge(&sections, "25.15", "25.20");
        let versions: Vec<&str> = ordered.iter().map(|s| s.version.as_str()).collect();

        assert_eq!(versions, vec!["25.18", "25.19", "25.19b"]);
    }
}
