//! Merge engine: overlays wiki deltas onto the canonical dataset
//!
//! Merging is last-writer-wins per field and never mutates its input. Applying
//! the same delta twice gives the same result as applying it once.

use crate::dataset::CanonicalDataset;
use crate::directory::Directory;
use crate::stats::{capitalize_title, Unit};
use crate::wiki::Delta;
use serde::Serialize;
use tracing::warn;

/// What a merge touched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    /// Ids of units the delta updated, in delta order
    pub resolved: Vec<u32>,
    /// Names the directory could not resolve
    pub unresolved: Vec<String>,
    /// Units that did not exist before the merge
    pub created: usize,
}

impl MergeReport {
    pub(crate) fn absorb(&mut self, other: MergeReport) {
        self.resolved.extend(other.resolved);
        self.unresolved.extend(other.unresolved);
        self.created += other.created;
    }
}

/// Overlay one delta onto a copy of `existing`
pub fn merge(existing: &CanonicalDataset, delta: &Delta, directory: &Directory) -> CanonicalDataset {
    merge_with_report(existing, delta, directory).0
}

/// Like [`merge`], also reporting resolved and unresolved names
pub fn merge_with_report(
    existing: &CanonicalDataset,
    delta: &Delta,
    directory: &Directory,
) -> (CanonicalDataset, MergeReport) {
    let mut merged = existing.clone();
    let mut report = MergeReport::default();

    for (name, stats) in delta.iter() {
        let Some(entry) = directory.resolve(name) else {
            warn!(name, "unresolved unit name, skipping");
            report.unresolved.push(name.to_string());
            continue;
        };

        if merged.unit(entry.id).is_none() {
            merged.insert(Unit::new(
                entry.id,
                entry.technical_name.clone(),
                capitalize_title(&entry.title),
            ));
            report.created += 1;
        }

        if let Some(unit) = merged.unit_mut(entry.id) {
            unit.stats.entry(delta.mode).or_default().overlay(stats);
            unit.normalize_mode(delta.mode);
        }
        report.resolved.push(entry.id);
    }

    (merged, report)
}

/// Fold deltas in the order given; callers pass them oldest first
pub fn merge_all(
    existing: &CanonicalDataset,
    deltas: &[Delta],
    directory: &Directory,
) -> (CanonicalDataset, MergeReport) {
    let mut current = existing.clone();
    let mut report = MergeReport::default();

    for delta in deltas {
        let (next, step) = merge_with_report(&current, delta, directory);
        current = next;
        report.absorb(step);
    }

    (current, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Mode, StatBlock, StatField};

    fn delta(name: &str, stats: &[(StatField, f64)]) -> Delta {
        let mut delta = Delta::new(Mode::Aram);
        delta.insert(name, &stats.iter().copied().collect::<StatBlock>());
        delta
    }

    fn with_akali(stats: &[(StatField, f64)]) -> CanonicalDataset {
        let mut dataset = CanonicalDataset::new();
        let mut akali = Unit::new(84, "Akali", "The Rogue Assassin");
        if !stats.is_empty() {
            akali
                .stats
                .insert(Mode::Aram, stats.iter().copied().collect());
        }
        dataset.insert(akali);
        dataset
    }

    #[test]
    fn test_default_value_elides_field() {
        let existing = with_akali(&[(StatField::DmgDealt, 0.95)]);
        let merged = merge(
            &existing,
            &delta("Akali", &[(StatField::DmgDealt, 1.0)]),
            &Directory::fallback(),
        );

        assert_eq!(merged.modifier(84, Mode::Aram, StatField::DmgDealt), None);
        assert!(merged.unit(84).unwrap().stats.is_empty());
    }

    #[test]
    fn test_default_onto_empty_stays_empty() {
        let existing = with_akali(&[]);
        let merged = merge(
            &existing,
            &delta("Akali", &[(StatField::DmgDealt, 1.0)]),
            &Directory::fallback(),
        );

        assert_eq!(merged, existing);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let existing = with_akali(&[(StatField::Healing, 0.9)]);
        let update = delta("Akali", &[(StatField::DmgTaken, 0.95), (StatField::Healing, 1.1)]);
        let directory = Directory::fallback();

        let once = merge(&existing, &update, &directory);
        let twice = merge(&once, &update, &directory);

        assert_eq!(once, twice);
        assert_eq!(once.modifier(84, Mode::Aram, StatField::Healing), Some(1.1));
    }

    #[test]
    fn test_merge_does_not_mutate_input() {
        let existing = with_akali(&[(StatField::Healing, 0.9)]);
        let before = existing.clone();

        let _ = merge(
            &existing,
            &delta("Akali", &[(StatField::Healing, 1.2)]),
            &Directory::fallback(),
        );

        assert_eq!(existing, before);
    }

    #[test]
    fn test_later_patch_wins() {
        let directory = Directory::fallback();
        let deltas = vec![
            delta("Akali", &[(StatField::DmgDealt, 0.95)]),
            delta("Akali", &[(StatField::DmgDealt, 1.0)]),
        ];

        let (merged, report) = merge_all(&with_akali(&[]), &deltas, &directory);

        assert_eq!(merged.modifier(84, Mode::Aram, StatField::DmgDealt), None);
        assert_eq!(report.resolved, vec![84, 84]);
    }

    #[test]
    fn test_unresolved_name_is_skipped() {
        let existing = with_akali(&[]);
        let mut update = delta("Teemo", &[(StatField::DmgDealt, 0.9)]);
        update.insert(
            "Akali",
            &[(StatField::DmgTaken, 1.05)].into_iter().collect(),
        );

        let (merged, report) = merge_with_report(&existing, &update, &Directory::fallback());

        assert_eq!(merged.len(), 1);
        assert_eq!(merged.modifier(84, Mode::Aram, StatField::DmgTaken), Some(1.05));
        assert_eq!(report.unresolved, vec!["Teemo".to_string()]);
        assert_eq!(report.created, 0);
    }

    #[test]
    fn test_new_unit_created_from_directory() {
        let (merged, report) = merge_with_report(
            &CanonicalDataset::new(),
            &delta("ziggs", &[(StatField::AbilityHaste, 10.0)]),
            &Directory::fallback(),
        );

        let ziggs = merged.unit(115).unwrap();
        assert_eq!(ziggs.name, "Ziggs");
        assert_eq!(ziggs.title, "The Hexplosives Expert");
        assert_eq!(
            merged.modifier(115, Mode::Aram, StatField::AbilityHaste),
            Some(10.0)
        );
        assert_eq!(report.created, 1);
    }

    #[test]
    fn test_other_modes_untouched() {
        let mut existing = with_akali(&[]);
        existing
            .unit_mut(84)
            .unwrap()
            .stats
            .insert(Mode::Urf, [(StatField::Healing, 0.8)].into_iter().collect());

        let merged = merge(
            &existing,
            &delta("Akali", &[(StatField::Healing, 1.1)]),
            &Directory::fallback(),
        );

        assert_eq!(merged.modifier(84, Mode::Urf, StatField::Healing), Some(0.8));
        assert_eq!(merged.modifier(84, Mode::Aram, StatField::Healing), Some(1.1));
    }
}
