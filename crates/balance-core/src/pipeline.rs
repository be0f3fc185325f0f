//! Update runs: pick the authoritative source, rebuild or catch up, persist
//!
//! Nothing is written until every fetch, parse and merge step of a run has
//! succeeded. The dataset is written first, then the manifest.

use crate::config::PipelineConfig;
use crate::dataset::CanonicalDataset;
use crate::directory::{latest_version, Directory};
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::merger::{merge_with_report, MergeReport};
use crate::net::Fetch;
use crate::table_source::{extract_script, extract_units, fingerprint};
use crate::version::{compare_semver, select_source_with, sections_for_merge, to_game_patch, SourceKind};
use crate::wiki::{extract_patch_sections, parse_unit_deltas, PatchSection};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{debug, info};

/// What a finished run wrote
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateSummary {
    /// Manifest version before the run
    pub from: String,
    /// Version stamped by the run
    pub to: String,
    pub source: SourceKind,
    /// Wiki sections applied, oldest first
    pub sections: Vec<String>,
    /// Units in the written dataset
    pub units: usize,
    /// Wiki names that could not be resolved
    pub unresolved: Vec<String>,
}

/// Result of a run
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The dataset already covers the latest version
    UpToDate { current: String },
    /// The table publication has not changed since the last run
    Unchanged { fingerprint: String },
    Updated(UpdateSummary),
}

/// Runs against an explicit fetcher and configuration
pub struct Pipeline<'a, F: Fetch> {
    fetcher: &'a F,
    config: &'a PipelineConfig,
}

impl<'a, F: Fetch> Pipeline<'a, F> {
    pub fn new(fetcher: &'a F, config: &'a PipelineConfig) -> Self {
        Self { fetcher, config }
    }

    /// Latest internal version from the version list
    pub fn latest_version(&self) -> Result<String> {
        latest_version(self.fetcher, &self.config.sources.versions_url)
    }

    /// Bring the dataset up to the latest version from whichever source is authoritative
    pub fn update(&self) -> Result<UpdateOutcome> {
        let manifest = Manifest::load(&self.config.manifest_path)?;
        let latest = self.latest_version()?;
        let target = to_game_patch(&latest);
        let source = select_source_with(&target, &self.config.wiki_start_patch);

        info!(current = %manifest.patch, %latest, %target, %source, "starting update");
        match source {
            SourceKind::Table => self.update_from_table(manifest, &latest),
            SourceKind::Wiki => self.update_from_wiki(manifest, &latest),
        }
    }

    /// Rebuild the whole dataset from the table publication
    pub fn update_from_table(&self, mut manifest: Manifest, latest: &str) -> Result<UpdateOutcome> {
        let (script, hash) = self.fetch_table()?;

        if manifest.hash.as_deref() == Some(hash.as_str()) {
            info!(fingerprint = %hash, "table publication unchanged");
            return Ok(UpdateOutcome::Unchanged { fingerprint: hash });
        }
        if compare_semver(latest, &manifest.patch) != Ordering::Greater {
            info!(current = %manifest.patch, "dataset is up to date");
            return Ok(UpdateOutcome::UpToDate {
                current: manifest.patch,
            });
        }

        let mut dataset = extract_units(&script)?;
        dataset.set_version(latest);
        let from = manifest.patch.clone();
        self.persist(&dataset, &mut manifest, latest, Some(hash))?;

        Ok(UpdateOutcome::Updated(UpdateSummary {
            from,
            to: latest.to_string(),
            source: SourceKind::Table,
            sections: Vec::new(),
            units: dataset.len(),
            unresolved: Vec::new(),
        }))
    }

    /// Apply every wiki section between the current and the latest version, oldest first
    pub fn update_from_wiki(&self, mut manifest: Manifest, latest: &str) -> Result<UpdateOutcome> {
        if compare_semver(latest, &manifest.patch) != Ordering::Greater {
            info!(current = %manifest.patch, "dataset is up to date");
            return Ok(UpdateOutcome::UpToDate {
                current: manifest.patch,
            });
        }

        let target = to_game_patch(latest);
        let current = to_game_patch(&manifest.patch);
        let start = if compare_semver(&current, &self.config.wiki_start_patch) == Ordering::Less {
            self.config.wiki_start_patch.clone()
        } else {
            current
        };

        let sections = self.sections()?;
        let selected = sections_for_merge(&sections, &start, &target);
        if selected.is_empty() {
            info!(%start, %target, "no wiki sections in range");
            return Ok(UpdateOutcome::UpToDate {
                current: manifest.patch,
            });
        }

        let directory = Directory::build(self.fetcher, &self.config.sources);
        let existing = CanonicalDataset::load(&self.config.output_path)?;
        let (mut dataset, report) = self.apply_sections(&existing, &selected, &directory)?;

        dataset.set_version(latest);
        let from = manifest.patch.clone();
        self.persist(&dataset, &mut manifest, latest, None)?;

        Ok(UpdateOutcome::Updated(UpdateSummary {
            from,
            to: latest.to_string(),
            source: SourceKind::Wiki,
            sections: selected.iter().map(|s| s.version.clone()).collect(),
            units: dataset.len(),
            unresolved: report.unresolved,
        }))
    }

    /// Rebuild from the table at the manifest's current version, ignoring the fingerprint
    pub fn crawl_table(&self) -> Result<UpdateSummary> {
        let mut manifest = Manifest::load(&self.config.manifest_path)?;
        let (script, hash) = self.fetch_table()?;

        let mut dataset = extract_units(&script)?;
        let patch = manifest.patch.clone();
        dataset.set_version(&patch);
        self.persist(&dataset, &mut manifest, &patch, Some(hash))?;

        Ok(UpdateSummary {
            from: patch.clone(),
            to: patch,
            source: SourceKind::Table,
            sections: Vec::new(),
            units: dataset.len(),
            unresolved: Vec::new(),
        })
    }

    /// Merge only the newest wiki section onto the existing dataset
    pub fn crawl_wiki_latest(&self) -> Result<UpdateSummary> {
        let mut manifest = Manifest::load(&self.config.manifest_path)?;
        let sections = self.sections()?;
        let newest = sections.first().ok_or(Error::NoSections)?;

        let directory = Directory::build(self.fetcher, &self.config.sources);
        let existing = CanonicalDataset::load(&self.config.output_path)?;
        let (mut dataset, report) = self.apply_sections(&existing, &[newest], &directory)?;

        let patch = manifest.patch.clone();
        dataset.set_version(&patch);
        self.persist(&dataset, &mut manifest, &patch, None)?;

        Ok(UpdateSummary {
            from: patch.clone(),
            to: patch,
            source: SourceKind::Wiki,
            sections: vec![newest.version.clone()],
            units: dataset.len(),
            unresolved: report.unresolved,
        })
    }

    /// Fetch the wiki article and list its patch sections in document order
    pub fn sections(&self) -> Result<Vec<PatchSection>> {
        let html = self.fetcher.get_text(&self.config.sources.wiki_url)?;
        let sections = extract_patch_sections(&html)?;
        if sections.is_empty() {
            return Err(Error::NoSections);
        }
        debug!(count = sections.len(), "extracted wiki sections");
        Ok(sections)
    }

    fn fetch_table(&self) -> Result<(String, String)> {
        let sources = &self.config.sources;
        let html = self.fetcher.get_text(&sources.table_url)?;
        let script = extract_script(&html, &sources.table_start_marker, &sources.table_end_marker)?;
        let hash = fingerprint(&script);
        Ok((script, hash))
    }

    fn apply_sections(
        &self,
        existing: &CanonicalDataset,
        sections: &[&PatchSection],
        directory: &Directory,
    ) -> Result<(CanonicalDataset, MergeReport)> {
        let mut dataset = existing.clone();
        let mut report = MergeReport::default();

        for section in sections {
            let delta = parse_unit_deltas(section, self.config.wiki_mode)?;
            let (merged, step) = merge_with_report(&dataset, &delta, directory);
            info!(
                version = %section.version,
                units = step.resolved.len(),
                unresolved = step.unresolved.len(),
                "applied wiki section"
            );
            dataset = merged;
            report.absorb(step);
        }

        Ok((dataset, report))
    }

    fn persist(
        &self,
        dataset: &CanonicalDataset,
        manifest: &mut Manifest,
        patch: &str,
        hash: Option<String>,
    ) -> Result<()> {
        dataset.save(&self.config.output_path)?;
        manifest.stamp(patch, hash);
        manifest.save(&self.config.manifest_path)?;
        info!(
            patch,
            units = dataset.len(),
            path = %self.config.output_path.display(),
            "wrote dataset"
        );
        Ok(())
    }
}
