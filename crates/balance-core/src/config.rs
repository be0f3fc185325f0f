//! Pipeline configuration

use crate::error::{Error, Result};
use crate::stats::Mode;
use crate::version::WIKI_START_PATCH;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

/// Where the external publications live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON list of roster versions, newest first
    pub versions_url: String,
    /// Roster for one version; `{version}` is substituted
    pub roster_url: String,
    /// Page embedding the Lua data module
    pub table_url: String,
    /// Marker preceding the embedded script
    pub table_start_marker: String,
    /// Marker following the embedded script
    pub table_end_marker: String,
    /// Patch-history article
    pub wiki_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            versions_url: "https://ddragon.leagueoflegends.com/api/versions.json".to_string(),
            roster_url: "https://ddragon.leagueoflegends.com/cdn/{version}/data/en_US/champion.json"
                .to_string(),
            table_url: "https://wiki.leagueoflegends.com/en-us/Module:ChampionData/data".to_string(),
            table_start_marker: "-- &lt;pre>".to_string(),
            table_end_marker: "-- &lt;/pre>".to_string(),
            wiki_url: "https://wiki.leagueoflegends.com/en-us/ARAM/Patch_history".to_string(),
        }
    }
}

impl SourceConfig {
    /// Roster URL for a specific version
    pub fn roster_url_for(&self, version: &str) -> String {
        self.roster_url.replace("{version}", version)
    }
}

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Canonical dataset file
    pub output_path: PathBuf,
    /// Manifest file (version, fingerprint, timestamp)
    pub manifest_path: PathBuf,
    /// User agent sent with every request
    pub user_agent: String,
    /// Mode the wiki article describes
    pub wiki_mode: Mode,
    /// First game patch served by the wiki article
    pub wiki_start_patch: String,
    pub sources: SourceConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("dist/balance.json"),
            manifest_path: PathBuf::from("dist/manifest.json"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            wiki_mode: Mode::Aram,
            wiki_start_patch: WIKI_START_PATCH.to_string(),
            sources: SourceConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a config file from JSON; missing keys take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the config to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
