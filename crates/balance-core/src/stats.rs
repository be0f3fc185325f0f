//! Core stat types: game modes, stat fields, stat blocks and units

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A non-standard play mode with its own balance modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Aram,
    Ar,
    Nb,
    Ofa,
    Urf,
    Usb,
}

impl Mode {
    /// Every supported mode, in canonical order
    pub const ALL: [Mode; 6] = [Mode::Aram, Mode::Ar, Mode::Nb, Mode::Ofa, Mode::Urf, Mode::Usb];

    /// Short mode code as used in the data sources
    pub fn code(&self) -> &'static str {
        match self {
            Mode::Aram => "aram",
            Mode::Ar => "ar",
            Mode::Nb => "nb",
            Mode::Ofa => "ofa",
            Mode::Urf => "urf",
            Mode::Usb => "usb",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown mode '{}'", s))
    }
}

/// A named numeric modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    DmgDealt,
    DmgTaken,
    Healing,
    Shielding,
    AbilityHaste,
    ManaRegen,
    EnergyRegen,
    AttackSpeed,
    MovementSpeed,
    Tenacity,
}

impl StatField {
    /// Every stat field, in canonical order
    pub const ALL: [StatField; 10] = [
        StatField::DmgDealt,
        StatField::DmgTaken,
        StatField::Healing,
        StatField::Shielding,
        StatField::AbilityHaste,
        StatField::ManaRegen,
        StatField::EnergyRegen,
        StatField::AttackSpeed,
        StatField::MovementSpeed,
        StatField::Tenacity,
    ];

    /// Key used in the Lua table and the JSON dataset
    pub fn key(&self) -> &'static str {
        match self {
            StatField::DmgDealt => "dmg_dealt",
            StatField::DmgTaken => "dmg_taken",
            StatField::Healing => "healing",
            StatField::Shielding => "shielding",
            StatField::AbilityHaste => "ability_haste",
            StatField::ManaRegen => "mana_regen",
            StatField::EnergyRegen => "energy_regen",
            StatField::AttackSpeed => "attack_speed",
            StatField::MovementSpeed => "movement_speed",
            StatField::Tenacity => "tenacity",
        }
    }

    /// Ability haste is an absolute amount; everything else is a ratio around 1.0
    pub fn is_absolute(&self) -> bool {
        matches!(self, StatField::AbilityHaste)
    }

    /// Whether `value` means "no change" for this field and must not be stored
    pub fn is_elided_default(&self, value: f64) -> bool {
        matches!(
            self,
            StatField::DmgDealt | StatField::DmgTaken | StatField::Tenacity
        ) && value == 1.0
    }
}

impl fmt::Display for StatField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for StatField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatField::ALL
            .into_iter()
            .find(|f| f.key() == s)
            .ok_or_else(|| format!("unknown stat field '{}'", s))
    }
}

/// Modifiers for one unit in one mode
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct StatBlock(BTreeMap<StatField, f64>);

impl StatBlock {
    /// Create an empty block
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a field, if set
    pub fn get(&self, field: StatField) -> Option<f64> {
        self.0.get(&field).copied()
    }

    /// Set a field, replacing any previous value
    pub fn set(&mut self, field: StatField, value: f64) {
        self.0.insert(field, value);
    }

    /// Remove a field, returning its old value
    pub fn remove(&mut self, field: StatField) -> Option<f64> {
        self.0.remove(&field)
    }

    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields set
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Fields and values in canonical field order
    pub fn iter(&self) -> impl Iterator<Item = (StatField, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Overlay every field of `other` onto this block (last writer wins)
    pub fn overlay(&mut self, other: &StatBlock) {
        for (field, value) in other.iter() {
            self.set(field, value);
        }
    }

    /// Drop fields holding their "no change" default
    pub fn elide_defaults(&mut self) {
        self.0.retain(|field, value| !field.is_elided_default(*value));
    }
}

impl FromIterator<(StatField, f64)> for StatBlock {
    fn from_iter<I: IntoIterator<Item = (StatField, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for StatBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, value) in &self.0 {
            map.serialize_entry(field, &Number(*value))?;
        }
        map.end()
    }
}

/// Writes integral values as JSON integers (`8` rather than `8.0`)
struct Number(f64);

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract() == 0.0 && self.0.abs() < 9.0e15 {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

/// A unit (champion) with its per-mode modifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Numeric id from the roster
    pub id: u32,
    /// Technical identifier (e.g. "MonkeyKing")
    pub name: String,
    /// Display title (e.g. "The Monkey King")
    pub title: String,
    /// Modifiers keyed by mode; an absent mode means no modifiers
    #[serde(default)]
    pub stats: BTreeMap<Mode, StatBlock>,
}

impl Unit {
    /// Create a unit with no modifiers
    pub fn new(id: u32, name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            title: title.into(),
            stats: BTreeMap::new(),
        }
    }

    /// Modifiers for a mode, if any
    pub fn mode_stats(&self, mode: Mode) -> Option<&StatBlock> {
        self.stats.get(&mode)
    }

    /// Apply default elision to one mode and drop it when nothing is left
    pub fn normalize_mode(&mut self, mode: Mode) {
        if let Some(block) = self.stats.get_mut(&mode) {
            block.elide_defaults();
            if block.is_empty() {
                self.stats.remove(&mode);
            }
        }
    }

    /// Apply default and emptiness elision to every mode
    pub fn normalize(&mut self) {
        for mode in Mode::ALL {
            self.normalize_mode(mode);
        }
    }
}

/// Upper-case the first character of a title when it is an ASCII lowercase letter
///
/// "the Rogue Assassin" becomes "The Rogue Assassin"; already capitalized titles
/// are returned unchanged.
pub fn capitalize_title(title: &str) -> String {
    let mut chars = title.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            let mut out = String::with_capacity(title.len());
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
            out
        }
        _ => title.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elided_defaults() {
        assert!(StatField::DmgDealt.is_elided_default(1.0));
        assert!(StatField::DmgTaken.is_elided_default(1.0));
        assert!(StatField::Tenacity.is_elided_default(1.0));
        assert!(!StatField::Healing.is_elided_default(1.0));
        assert!(!StatField::DmgDealt.is_elided_default(0.95));
    }

    #[test]
    fn test_normalize_drops_empty_mode() {
        let mut unit = Unit::new(84, "Akali", "The Rogue Assassin");
        let mut block = StatBlock::new();
        block.set(StatField::DmgDealt, 1.0);
        unit.stats.insert(Mode::Aram, block);

        unit.normalize();

        assert!(unit.stats.is_empty());
    }

    #[test]
    fn test_normalize_keeps_other_fields() {
        let mut unit = Unit::new(84, "Akali", "The Rogue Assassin");
        let block: StatBlock = [(StatField::Tenacity, 1.0), (StatField::Healing, 1.2)]
            .into_iter()
            .collect();
        unit.stats.insert(Mode::Urf, block);

        unit.normalize();

        let urf = unit.mode_stats(Mode::Urf).unwrap();
        assert_eq!(urf.len(), 1);
        assert_eq!(urf.get(StatField::Healing), Some(1.2));
    }

    #[test]
    fn test_capitalize_title() {
        assert_eq!(capitalize_title("the rogue assassin"), "The rogue assassin");
        assert_eq!(capitalize_title("The Rogue Assassin"), "The Rogue Assassin");
        assert_eq!(capitalize_title(""), "");
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("ARAM".parse::<Mode>(), Ok(Mode::Aram));
        assert_eq!("usb".parse::<Mode>(), Ok(Mode::Usb));
        assert!("cherry".parse::<Mode>().is_err());
    }

    #[test]
    fn test_stat_block_serializes_integers() {
        let block: StatBlock = [(StatField::AbilityHaste, 8.0), (StatField::DmgTaken, 0.95)]
            .into_iter()
            .collect();

        let json = serde_json::to_string(&block).unwrap();

        assert_eq!(json, r#"{"dmg_taken":0.95,"ability_haste":8}"#);
    }
}
