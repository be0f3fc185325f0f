//! Matching rules for the wiki patch-history article
//!
//! Kept apart from the HTML traversal in [`crate::wiki`] so the heuristics can
//! be exercised on plain strings.

use crate::stats::StatField;
use regex_lite::Regex;
use std::sync::OnceLock;

/// Substring (case-insensitive) separating modifier sentences from ability entries
pub const MODIFIER_MARKER: &str = "modifier";

/// Stat phrases as written on the wiki, in match priority order
pub const STAT_VOCABULARY: &[(&str, StatField)] = &[
    ("outgoing damage", StatField::DmgDealt),
    ("incoming damage", StatField::DmgTaken),
    ("damage dealt", StatField::DmgDealt),
    ("damage taken", StatField::DmgTaken),
    ("healing", StatField::Healing),
    ("shielding", StatField::Shielding),
    ("ability haste", StatField::AbilityHaste),
    ("mana regen", StatField::ManaRegen),
    ("energy regen", StatField::EnergyRegen),
    ("attack speed", StatField::AttackSpeed),
    ("movement speed", StatField::MovementSpeed),
    ("tenacity", StatField::Tenacity),
];

static VERSION_REGEX: OnceLock<Regex> = OnceLock::new();
static UNIT_NAME_REGEX: OnceLock<Regex> = OnceLock::new();
static SENTENCE_REGEX: OnceLock<Regex> = OnceLock::new();

/// Find a patch version token in heading text ("V25.19", "25.19a", "v14.3.1")
pub fn version_token(text: &str) -> Option<&str> {
    let re = VERSION_REGEX.get_or_init(|| {
        Regex::new(r"(?i)v?(\d+\.\d+(?:\.\d+)?[a-z]?)").expect("VERSION_REGEX pattern is invalid")
    });
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Leading one- or two-word capitalized name ("Akali", "Miss Fortune", "Kai'Sa")
pub fn unit_name_candidate(text: &str) -> Option<&str> {
    let re = UNIT_NAME_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Z][A-Za-z']+(?:\s+[A-Z][A-Za-z']+)?")
            .expect("UNIT_NAME_REGEX pattern is invalid")
    });
    re.find(text.trim_start()).map(|m| m.as_str())
}

/// Whether a list entry is a balance-modifier sentence rather than an ability name
pub fn is_modifier_sentence(text: &str) -> bool {
    text.to_ascii_lowercase().contains(MODIFIER_MARKER)
}

fn sentence_regex() -> &'static Regex {
    SENTENCE_REGEX.get_or_init(|| {
        let stats = STAT_VOCABULARY
            .iter()
            .map(|(phrase, _)| phrase.replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|");
        let value = r"([+\-−]?\d+(?:\.\d+)?%?)";
        let pattern = format!(
            r"(?i)({})\s+modifier\s+changed\s+to\s+{}\s+from\s+{}",
            stats, value, value
        );
        Regex::new(&pattern).expect("SENTENCE_REGEX pattern is invalid")
    })
}

/// Parse "<stat> modifier changed to <new> from <old>" into a stat and its new value
///
/// The old value is read past but not used. Sentences that do not match yield
/// `None`; most list entries are ordinary prose.
pub fn parse_modifier_sentence(text: &str) -> Option<(StatField, f64)> {
    let caps = sentence_regex().captures(text)?;
    let phrase = caps.get(1)?.as_str();
    let field = stat_for_phrase(phrase)?;
    let value = parse_modifier_value(caps.get(2)?.as_str(), field)?;
    Some((field, value))
}

/// Map a matched phrase (any case, any run of whitespace) to its stat field
pub fn stat_for_phrase(phrase: &str) -> Option<StatField> {
    let normalized = phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();
    STAT_VOCABULARY
        .iter()
        .find(|(p, _)| *p == normalized)
        .map(|(_, field)| *field)
}

/// Convert a written value into the stored number
///
/// Percentages become ratios around 1.0 ("-5%" is 0.95, "+10%" is 1.1).
/// Ability haste is absolute and keeps its literal number.
pub fn parse_modifier_value(raw: &str, field: StatField) -> Option<f64> {
    let raw = raw.trim().replace('−', "-");
    let (number, is_percent) = match raw.strip_suffix('%') {
        Some(number) => (number, true),
        None => (raw.as_str(), false),
    };
    let value: f64 = number.trim_start_matches('+').parse().ok()?;

    if field.is_absolute() || !is_percent {
        Some(value)
    } else {
        Some((100.0 + value) / 100.0)
    }
}

/// Collapse runs of whitespace into single spaces and trim
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentages_convert_exactly() {
        assert_eq!(parse_modifier_value("-5%", StatField::DmgTaken), Some(0.95));
        assert_eq!(parse_modifier_value("0%", StatField::DmgDealt), Some(1.0));
        assert_eq!(parse_modifier_value("+10%", StatField::Healing), Some(1.1));
        assert_eq!(parse_modifier_value("−2.5%", StatField::Shielding), Some(0.975));
    }

    #[test]
    fn test_ability_haste_is_absolute() {
        assert_eq!(parse_modifier_value("8", StatField::AbilityHaste), Some(8.0));
        assert_eq!(parse_modifier_value("-10", StatField::AbilityHaste), Some(-10.0));
    }

    #[test]
    fn test_parse_outgoing_damage_sentence() {
        let parsed = parse_modifier_sentence("Outgoing damage modifier changed to 0% from -5%");
        assert_eq!(parsed, Some((StatField::DmgDealt, 1.0)));
    }

    #[test]
    fn test_parse_sentence_variants() {
        assert_eq!(
            parse_modifier_sentence("Incoming damage modifier changed to +5% from 0%."),
            Some((StatField::DmgTaken, 1.05))
        );
        assert_eq!(
            parse_modifier_sentence("Healing  modifier changed to +10% from +15%"),
            Some((StatField::Healing, 1.1))
        );
        assert_eq!(
            parse_modifier_sentence("ABILITY HASTE modifier changed to 8 from 0"),
            Some((StatField::AbilityHaste, 8.0))
        );
        assert_eq!(
            parse_modifier_sentence("Damage taken modifier changed to −5% from 0%"),
            Some((StatField::DmgTaken, 0.95))
        );
    }

    #[test]
    fn test_prose_yields_nothing() {
        assert_eq!(parse_modifier_sentence("Base damage increased to 80."), None);
        assert_eq!(parse_modifier_sentence("Modifier removed."), None);
        assert_eq!(parse_modifier_sentence("Crit modifier changed to 10% from 5%"), None);
    }

    #[test]
    fn test_unit_name_candidate() {
        assert_eq!(unit_name_candidate("Akali"), Some("Akali"));
        assert_eq!(unit_name_candidate("Miss Fortune"), Some("Miss Fortune"));
        assert_eq!(unit_name_candidate("Kai'Sa"), Some("Kai'Sa"));
        assert_eq!(unit_name_candidate("Jarvan IV"), Some("Jarvan IV"));
        assert_eq!(unit_name_candidate("increased damage"), None);
        assert_eq!(unit_name_candidate("Q - Five Point Strike"), None);
        assert_eq!(unit_name_candidate("25.19 changes"), None);
    }

    #[test]
    fn test_modifier_discriminator() {
        assert!(is_modifier_sentence("Outgoing damage MODIFIER changed"));
        assert!(!is_modifier_sentence("Q - Five Point Strike"));
    }

    #[test]
    fn test_version_token() {
        assert_eq!(version_token("V25.19"), Some("25.19"));
        assert_eq!(version_token("Patch 25.19a [edit]"), Some("25.19a"));
        assert_eq!(version_token("v14.3.1"), Some("14.3.1"));
        assert_eq!(version_token("References"), None);
    }

    #[test]
    fn test_stat_for_phrase() {
        assert_eq!(stat_for_phrase("Outgoing\n damage"), Some(StatField::DmgDealt));
        assert_eq!(stat_for_phrase("mana regen"), Some(StatField::ManaRegen));
        assert_eq!(stat_for_phrase("crit"), None);
    }
}
