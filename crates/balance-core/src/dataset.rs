//! The canonical dataset and its JSON file format
//!
//! On disk the dataset is one JSON object keyed by decimal unit id, plus the
//! reserved metadata keys `_patch` and `_gamePatch`.

use crate::error::{Error, Result};
use crate::stats::{Mode, StatField, Unit};
use crate::version::to_game_patch;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Reserved key holding the current source version
pub const PATCH_KEY: &str = "_patch";
/// Reserved key holding the derived game-facing version
pub const GAME_PATCH_KEY: &str = "_gamePatch";

/// Every unit's balance data plus version metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalDataset {
    units: BTreeMap<u32, Unit>,
    /// Source version the data corresponds to (e.g. "15.20.1")
    pub patch: Option<String>,
    /// Game-facing version derived from `patch` (e.g. "25.20")
    pub game_patch: Option<String>,
}

impl CanonicalDataset {
    /// Create an empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dataset from a file, or an empty one if the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    /// Parse a dataset from JSON and normalize every unit
    pub fn from_json(content: &str) -> Result<Self> {
        let mut dataset: Self = serde_json::from_str(content)?;
        for unit in dataset.units.values_mut() {
            unit.normalize();
        }
        Ok(dataset)
    }

    /// Pretty-printed JSON in the on-disk layout
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the dataset, replacing any existing file atomically
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_atomic(path.as_ref(), &self.to_json()?)
    }

    /// Stamp the source version and its game-facing counterpart
    pub fn set_version(&mut self, patch: &str) {
        self.patch = Some(patch.to_string());
        self.game_patch = Some(to_game_patch(patch));
    }

    /// Unit by id
    pub fn unit(&self, id: u32) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Mutable unit by id
    pub fn unit_mut(&mut self, id: u32) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Insert or replace a unit, keyed by its id
    pub fn insert(&mut self, unit: Unit) -> Option<Unit> {
        self.units.insert(unit.id, unit)
    }

    /// Units in ascending id order
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Number of units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the dataset has no units
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Look up one modifier the way the overlay does
    ///
    /// A missing unit, mode or field all mean "no modifier".
    pub fn modifier(&self, id: u32, mode: Mode, field: StatField) -> Option<f64> {
        self.units
            .get(&id)
            .and_then(|u| u.mode_stats(mode))
            .and_then(|block| block.get(field))
    }
}

impl Serialize for CanonicalDataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (id, unit) in &self.units {
            map.serialize_entry(&id.to_string(), unit)?;
        }
        if let Some(patch) = &self.patch {
            map.serialize_entry(PATCH_KEY, patch)?;
        }
        if let Some(game_patch) = &self.game_patch {
            map.serialize_entry(GAME_PATCH_KEY, game_patch)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CanonicalDataset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let mut dataset = CanonicalDataset::new();

        for (key, value) in raw {
            match key.as_str() {
                PATCH_KEY => dataset.patch = value.as_str().map(str::to_string),
                GAME_PATCH_KEY => dataset.game_patch = value.as_str().map(str::to_string),
                k if k.starts_with('_') => {}
                k => {
                    let id: u32 = k
                        .parse()
                        .map_err(|_| D::Error::custom(format!("invalid unit id key '{}'", k)))?;
                    let unit: Unit = serde_json::from_value(value).map_err(D::Error::custom)?;
                    if unit.id != id {
                        return Err(D::Error::custom(format!(
                            "unit under key '{}' has id {}",
                            k, unit.id
                        )));
                    }
                    dataset.units.insert(id, unit);
                }
            }
        }

        Ok(dataset)
    }
}

/// Write `content` to a sibling temp file and rename it over `path`
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    persist_with(path, |file| Ok(file.write_all(content.as_bytes())?))
}

/// Fill a sibling temp file through `write`, then rename it over `path`
///
/// When `write` fails the temp file is dropped and `path` is left as it was.
pub fn persist_with<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut NamedTempFile) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    write(&mut file)?;
    file.flush()?;
    file.persist(path).map_err(|e| Error::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatBlock;

    fn sample() -> CanonicalDataset {
        let mut dataset = CanonicalDataset::new();
        let mut akali = Unit::new(84, "Akali", "The Rogue Assassin");
        let block: StatBlock = [(StatField::DmgTaken, 0.95), (StatField::AbilityHaste, 8.0)]
            .into_iter()
            .collect();
        akali.stats.insert(Mode::Aram, block);
        dataset.insert(akali);
        dataset.insert(Unit::new(14, "Sion", "The Undead Juggernaut"));
        dataset.set_version("15.20.1");
        dataset
    }

    #[test]
    fn test_json_layout() {
        let json: Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();

        assert_eq!(json["84"]["id"], 84);
        assert_eq!(json["84"]["name"], "Akali");
        assert_eq!(json["84"]["stats"]["aram"]["dmg_taken"], 0.95);
        assert_eq!(json["84"]["stats"]["aram"]["ability_haste"], 8);
        assert_eq!(json["_patch"], "15.20.1");
        assert_eq!(json["_gamePatch"], "25.20");
    }

    #[test]
    fn test_units_written_in_numeric_order() {
        let json = sample().to_json().unwrap();
        let sion = json.find("\"14\"").unwrap();
        let akali = json.find("\"84\"").unwrap();
        let patch = json.find(PATCH_KEY).unwrap();

        assert!(sion < akali);
        assert!(akali < patch);
    }

    #[test]
    fn test_reload_is_identical() {
        let original = sample();
        let reloaded = CanonicalDataset::from_json(&original.to_json().unwrap()).unwrap();

        assert_eq!(reloaded, original);
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn test_reserved_keys_are_not_units() {
        let json = r#"{ "_patch": "15.1.1", "_gamePatch": "25.1", "_note": "x", "14": { "id": 14, "name": "Sion", "title": "T", "stats": {} } }"#;
        let dataset = CanonicalDataset::from_json(json).unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.patch.as_deref(), Some("15.1.1"));
    }

    #[test]
    fn test_key_and_id_mismatch_is_rejected() {
        let json = r#"{ "84": { "id": 14, "name": "Sion", "title": "T", "stats": {} } }"#;
        let err = CanonicalDataset::from_json(json).unwrap_err();

        assert!(matches!(err, Error::Json(_)));
        assert!(err.to_string().contains("'84'"));
    }

    #[test]
    fn test_load_normalizes() {
        let json = r#"{ "84": { "id": 84, "name": "Akali", "title": "T", "stats": { "aram": { "dmg_dealt": 1.0 } } } }"#;
        let dataset = CanonicalDataset::from_json(json).unwrap();

        assert!(dataset.unit(84).unwrap().stats.is_empty());
    }

    #[test]
    fn test_missing_lookups_are_none() {
        let dataset = sample();

        assert_eq!(dataset.modifier(84, Mode::Aram, StatField::DmgTaken), Some(0.95));
        assert_eq!(dataset.modifier(84, Mode::Aram, StatField::Healing), None);
        assert_eq!(dataset.modifier(84, Mode::Urf, StatField::DmgTaken), None);
        assert_eq!(dataset.modifier(9999, Mode::Aram, StatField::DmgTaken), None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dist").join("balance.json");

        sample().save(&path).unwrap();
        let loaded = CanonicalDataset::load(&path).unwrap();

        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = CanonicalDataset::load(dir.path().join("absent.json")).unwrap();
        assert!(dataset.is_empty());
    }
}
