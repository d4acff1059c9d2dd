//! Population-level calibration.
//!
//! For each scenario archetype, raw difficulty is computed for every
//! reservable record under that archetype's representative scenario and the
//! scores are collected into an ascending-sorted table. Percentile lookups are
//! only valid against a table built from the exact population snapshot, so
//! every table carries the population version it was built from.

use crate::engine::classifier::{ReservationType, classify};
use crate::engine::demand::raw_difficulty;
use crate::engine::labeling::{Label, LabelOutcome, map_to_label};
use crate::engine::tuning::Tuning;
use crate::record::{Population, RestaurantRecord};
use crate::scenario::Archetype;
use serde::Serialize;

/// Sorted raw-difficulty distribution for one archetype. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    archetype: Archetype,
    population_version: u64,
    scores: Vec<f64>,
}

impl CalibrationTable {
    /// Builds the table over the reservable sub-population only. Walk-in-only
    /// records have no comparable difficulty semantics and would corrupt the
    /// distribution.
    pub fn build(population: &Population, archetype: Archetype, tuning: &Tuning) -> Self {
        let scenario = archetype.representative();
        let mut scores: Vec<f64> = population
            .records()
            .iter()
            .filter(|r| classify(r, &tuning.classifier) != ReservationType::WalkInOnly)
            .map(|r| raw_difficulty(r, &scenario, tuning, None).raw)
            .collect();
        scores.sort_by(f64::total_cmp);
        Self {
            archetype,
            population_version: population.version(),
            scores,
        }
    }

    pub fn archetype(&self) -> Archetype {
        self.archetype
    }

    pub fn population_version(&self) -> u64 {
        self.population_version
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Rank-based percentile of a raw score within the table, in [0, 100).
    ///
    /// Ties take the midpoint of their rank range, so a score present in the
    /// table never lands at either extreme. An empty table reads as neutral.
    pub fn percentile_of(&self, raw: f64) -> f64 {
        if self.scores.is_empty() {
            return 50.0;
        }
        let below = self.scores.partition_point(|&s| s < raw);
        let not_above = self.scores.partition_point(|&s| s <= raw);
        let ties = not_above - below;
        let rank = below as f64 + ties as f64 / 2.0;
        let percentile = 100.0 * rank / self.scores.len() as f64;
        percentile.clamp(0.0, 99.999)
    }
}

/// One table per archetype, all stamped with the same population version.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSet {
    population_version: u64,
    tables: [CalibrationTable; 3],
}

impl CalibrationSet {
    pub fn build(population: &Population, tuning: &Tuning) -> Self {
        let tables = Archetype::ALL.map(|a| CalibrationTable::build(population, a, tuning));
        Self {
            population_version: population.version(),
            tables,
        }
    }

    pub fn population_version(&self) -> u64 {
        self.population_version
    }

    pub fn table_for(&self, archetype: Archetype) -> &CalibrationTable {
        &self.tables[archetype.index()]
    }

    /// Whether this set was built from the given population snapshot.
    pub fn matches(&self, population: &Population) -> bool {
        self.population_version == population.version()
    }
}

/// Per-archetype audit summary: label distribution, the hardest and easiest
/// venues by raw difficulty, and the reservable/walk-in split. Operational
/// output, not user-facing.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationReport {
    pub archetype: Archetype,
    pub reservable: usize,
    pub walk_in_only: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub hardest: Vec<String>,
    pub easiest: Vec<String>,
}

/// Builds the audit report for one archetype by scoring the population against
/// the already-built set.
pub fn build_report(
    population: &Population,
    set: &CalibrationSet,
    tuning: &Tuning,
    archetype: Archetype,
    extremes: usize,
) -> CalibrationReport {
    let scenario = archetype.representative();
    let table = set.table_for(archetype);

    let mut walk_in_only = 0;
    let mut high = 0;
    let mut medium = 0;
    let mut low = 0;
    let mut scored: Vec<(&RestaurantRecord, f64)> = Vec::new();

    for record in population.records() {
        if classify(record, &tuning.classifier) == ReservationType::WalkInOnly {
            walk_in_only += 1;
            continue;
        }
        let raw = raw_difficulty(record, &scenario, tuning, None).raw;
        let outcome: LabelOutcome = map_to_label(raw, table, record, tuning);
        match outcome.label {
            Label::High => high += 1,
            Label::Medium => medium += 1,
            Label::Low => low += 1,
            Label::WalkInFocused => {}
        }
        scored.push((record, raw));
    }

    scored.sort_by(|a, b| a.1.total_cmp(&b.1));
    let easiest = scored
        .iter()
        .take(extremes)
        .map(|(r, _)| r.name.clone())
        .collect();
    let hardest = scored
        .iter()
        .rev()
        .take(extremes)
        .map(|(r, _)| r.name.clone())
        .collect();

    CalibrationReport {
        archetype,
        reservable: scored.len(),
        walk_in_only,
        high,
        medium,
        low,
        hardest,
        easiest,
    }
}
