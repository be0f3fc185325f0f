//! Run manifest: which version the dataset is at and what produced it

use crate::dataset::write_atomic;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Version reported by a manifest that has never been written
pub const INITIAL_PATCH: &str = "0.0.0";

/// Stored next to the dataset and rewritten after every successful run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Internal version the dataset corresponds to
    pub patch: String,
    /// Fingerprint of the last table publication, `None` after a wiki run
    pub hash: Option<String>,
    /// When the dataset was last written
    pub date: Option<DateTime<Utc>>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            patch: INITIAL_PATCH.to_string(),
            hash: None,
            date: None,
        }
    }
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the manifest, or the initial one if the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Write the manifest, replacing any existing file atomically
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        write_atomic(path.as_ref(), &content)
    }

    /// Record a completed run at `patch`
    pub fn stamp(&mut self, patch: &str, hash: Option<String>) {
        self.patch = patch.to_string();
        self.hash = hash;
        self.date = Some(Utc::now());
    }
}
