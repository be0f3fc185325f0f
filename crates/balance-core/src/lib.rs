//! balance-core: Core library for the per-mode champion balance dataset
//!
//! This library provides functionality to:
//! - Parse the Lua data module into canonical unit records
//! - Extract patch sections and per-unit deltas from the wiki patch history
//! - Resolve wiki display names to roster ids
//! - Merge deltas onto the dataset, oldest patch first
//! - Route each run to the authoritative source and persist the result

pub mod config;
pub mod dataset;
pub mod directory;
pub mod error;
pub mod export;
pub mod lua;
pub mod manifest;
pub mod merger;
pub mod net;
pub mod pipeline;
pub mod rules;
pub mod stats;
pub mod table_source;
pub mod version;
pub mod wiki;

pub use config::{PipelineConfig, SourceConfig};
pub use dataset::CanonicalDataset;
pub use directory::{ChampionEntry, Directory};
pub use error::{Error, Result};
pub use export::{export_csv, export_to_path, ExportFormat};
pub use manifest::Manifest;
pub use merger::{merge, merge_all, merge_with_report, MergeReport};
pub use net::{Fetch, HttpFetcher};
pub use pipeline::{Pipeline, UpdateOutcome, UpdateSummary};
pub use stats::{Mode, StatBlock, StatField, Unit};
pub use table_source::{extract_script, extract_units, fingerprint};
pub use version::{compare_semver, select_source, to_game_patch, SourceKind, Version};
pub use wiki::{extract_patch_sections, parse_unit_deltas, Delta, PatchSection};
