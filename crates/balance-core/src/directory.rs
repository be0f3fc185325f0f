//! Champion directory: display names from the wiki to roster ids

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::net::Fetch;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// One roster entry
#[derive(Debug, Clone, PartialEq)]
pub struct ChampionEntry {
    pub id: u32,
    /// Technical identifier (e.g. "MonkeyKing")
    pub technical_name: String,
    pub title: String,
}

/// Static subset used when the roster cannot be fetched
const FALLBACK: &[(&str, u32, &str)] = &[
    ("Mordekaiser", 82, "The Iron Revenant"),
    ("Akali", 84, "The Rogue Assassin"),
    ("Briar", 233, "The Restrained Hunger"),
    ("Gwen", 887, "The Hallowed Seamstress"),
    ("Sion", 14, "The Undead Juggernaut"),
    ("Ziggs", 115, "The Hexplosives Expert"),
];

#[derive(Deserialize)]
struct RosterDocument {
    data: BTreeMap<String, RosterRecord>,
}

#[derive(Deserialize)]
struct RosterRecord {
    id: String,
    key: String,
    name: String,
    #[serde(default)]
    title: String,
}

/// Lookup from lower-cased display or technical name to a roster entry
#[derive(Debug, Clone, Default)]
pub struct Directory {
    entries: HashMap<String, ChampionEntry>,
}

impl Directory {
    /// Build from a roster document (`data.<key>.{id, key, name, title}`)
    pub fn from_roster_json(content: &str) -> Result<Self> {
        let document: RosterDocument = serde_json::from_str(content)?;
        let mut directory = Self::default();

        for record in document.data.into_values() {
            let Ok(id) = record.key.trim().parse::<u32>() else {
                warn!(name = %record.name, key = %record.key, "skipping roster entry with non-numeric key");
                continue;
            };
            let entry = ChampionEntry {
                id,
                technical_name: record.id,
                title: record.title,
            };
            directory.add(&record.name, entry);
        }

        Ok(directory)
    }

    /// The static partial roster
    pub fn fallback() -> Self {
        let mut directory = Self::default();
        for (name, id, title) in FALLBACK {
            directory.add(
                name,
                ChampionEntry {
                    id: *id,
                    technical_name: name.to_string(),
                    title: title.to_string(),
                },
            );
        }
        directory
    }

    /// Fetch the latest roster, falling back to the static table on any failure
    pub fn build<F: Fetch>(fetcher: &F, sources: &SourceConfig) -> Self {
        match Self::fetch(fetcher, sources) {
            Ok(directory) => {
                debug!(entries = directory.len(), "built champion directory");
                directory
            }
            Err(e) => {
                warn!(error = %e, "failed to build champion directory, using fallback roster");
                Self::fallback()
            }
        }
    }

    fn fetch<F: Fetch>(fetcher: &F, sources: &SourceConfig) -> Result<Self> {
        let version = latest_version(fetcher, &sources.versions_url)?;
        let roster = fetcher.get_text(&sources.roster_url_for(&version))?;
        Self::from_roster_json(&roster)
    }

    fn add(&mut self, display_name: &str, entry: ChampionEntry) {
        self.entries
            .insert(entry.technical_name.to_lowercase(), entry.clone());
        self.entries.insert(display_name.to_lowercase(), entry);
    }

    /// Case-insensitive lookup by display or technical name
    pub fn resolve(&self, name: &str) -> Option<&ChampionEntry> {
        self.entries.get(&name.trim().to_lowercase())
    }

    /// Number of indexed names (display and technical names counted separately)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// First entry of the version list (the list is newest first)
pub fn latest_version<F: Fetch>(fetcher: &F, versions_url: &str) -> Result<String> {
    let content = fetcher.get_text(versions_url)?;
    let versions: Vec<String> = serde_json::from_str(&content)?;
    versions.into_iter().next().ok_or_else(|| Error::Fetch {
        url: versions_url.to_string(),
        message: "version list is empty".to_string(),
    })
}
