//! The reservation-likelihood engine.
//!
//! Pure, synchronous pipeline per record: classify, score demand, rank
//! against the archetype's calibration table, dampen, label, render copy.
//! Calibration over the full population must complete before any per-record
//! estimation; `CalibrationSet` carries the population version so staleness
//! is checkable rather than a silent convention.

use crate::record::{Population, RestaurantRecord};
use crate::scenario::Scenario;
use serde::Serialize;

pub mod calibration;
pub mod classifier;
pub mod copy;
pub mod demand;
pub mod labeling;
pub mod tuning;

pub use calibration::{CalibrationReport, CalibrationSet, CalibrationTable, build_report};
pub use classifier::{ReservationType, classify};
pub use demand::{DemandBreakdown, raw_difficulty};
pub use labeling::{Label, map_to_label, walk_in_outcome};
pub use tuning::{Tuning, TuningError};

/// Intermediate values exposed for auditability. Walk-in-only records skip
/// the demand and mapping stages, so their fields stay empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateDebug {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<DemandBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentile: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dampened_percentile: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dampening: Option<f64>,
}

/// One record's likelihood judgment under one scenario. Ephemeral per call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimationResult {
    pub name: String,
    pub label: Label,
    pub score: u32,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    pub reservation_type: ReservationType,
    pub debug: EstimateDebug,
}

/// Estimates one record under one scenario against pre-built calibration.
///
/// `availability_points` is the optional externally supplied live signal; it
/// is added into the raw score, never multiplied.
pub fn estimate(
    record: &RestaurantRecord,
    scenario: &Scenario,
    tuning: &Tuning,
    calibration: &CalibrationSet,
    availability_points: Option<f64>,
) -> EstimationResult {
    let reservation_type = classify(record, &tuning.classifier);

    if reservation_type == ReservationType::WalkInOnly {
        let (label, score) = walk_in_outcome(tuning);
        return EstimationResult {
            name: record.name.clone(),
            label,
            score,
            reason: copy::primary_phrase(label).to_string(),
            suggestion: copy::walk_in_suggestion(),
            reservation_type,
            debug: EstimateDebug {
                breakdown: None,
                percentile: None,
                dampened_percentile: None,
                dampening: None,
            },
        };
    }

    let table = calibration.table_for(scenario.archetype());
    let breakdown = raw_difficulty(record, scenario, tuning, availability_points);
    let outcome = map_to_label(breakdown.raw, table, record, tuning);
    let reason = copy::build_reason(outcome.label, record, scenario, &breakdown, tuning);
    let suggestion = copy::build_suggestion(outcome.label, scenario, &breakdown, tuning);

    EstimationResult {
        name: record.name.clone(),
        label: outcome.label,
        score: outcome.score,
        reason,
        suggestion,
        reservation_type,
        debug: EstimateDebug {
            breakdown: Some(breakdown),
            percentile: Some(outcome.percentile),
            dampened_percentile: Some(outcome.dampened_percentile),
            dampening: Some(outcome.dampening),
        },
    }
}

/// Estimates the whole population and sorts by descending likelihood.
///
/// The calibration set must have been built from this exact population
/// snapshot; scoring against a stale table is a correctness bug.
pub fn estimate_batch(
    population: &Population,
    scenario: &Scenario,
    tuning: &Tuning,
    calibration: &CalibrationSet,
) -> Vec<EstimationResult> {
    debug_assert!(
        calibration.matches(population),
        "calibration set is stale for this population"
    );
    let mut results: Vec<EstimationResult> = population
        .records()
        .iter()
        .map(|record| estimate(record, scenario, tuning, calibration, None))
        .collect();
    sort_by_likelihood(&mut results);
    results
}

/// Total ordering by descending score; ties keep insertion order.
pub fn sort_by_likelihood(results: &mut [EstimationResult]) {
    results.sort_by(|a, b| b.score.cmp(&a.score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{DayOfWeek, TimeOfDay, TimeWindow};

    fn record(name: &str, rating: f64, reviews: u32, price: Option<u8>, link: bool) -> RestaurantRecord {
        RestaurantRecord {
            name: name.to_string(),
            rating,
            review_count: reviews,
            price_level: price,
            has_booking_link: link,
            format_tags: Vec::new(),
            prestige: None,
            press_links: Vec::new(),
            borough: None,
        }
    }

    fn saturday_dinner() -> Scenario {
        Scenario {
            day: DayOfWeek::Saturday,
            time: TimeWindow::Between {
                start: TimeOfDay {
                    hour: 18,
                    minute: 0,
                },
                end: TimeOfDay {
                    hour: 20,
                    minute: 0,
                },
            },
            party: 2,
        }
    }

    fn population() -> Population {
        Population::new(vec![
            record("Mild", 4.0, 60, Some(2), true),
            record("Steady", 4.2, 200, Some(2), true),
            record("Regular", 4.3, 350, Some(2), true),
            record("Liked", 4.4, 500, Some(3), true),
            record("Busy", 4.5, 900, Some(3), true),
            record("Favorite", 4.7, 1500, Some(3), true),
            record("Hot", 4.8, 3000, Some(4), true),
            record("Joe's Pizza", 0.0, 0, None, false),
        ])
    }

    #[test]
    fn estimate_is_deterministic() {
        let tuning = Tuning::default();
        let pop = population();
        let set = CalibrationSet::build(&pop, &tuning);
        let scenario = saturday_dinner();

        let a = estimate(&pop.records()[5], &scenario, &tuning, &set, None);
        let b = estimate(&pop.records()[5], &scenario, &tuning, &set, None);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).expect("serialize"),
            serde_json::to_string(&b).expect("serialize")
        );
    }

    #[test]
    fn every_record_gets_a_result() {
        let tuning = Tuning::default();
        let pop = population();
        let set = CalibrationSet::build(&pop, &tuning);
        let results = estimate_batch(&pop, &saturday_dinner(), &tuning, &set);
        assert_eq!(results.len(), pop.len());
    }

    #[test]
    fn walk_in_record_gets_fixed_outcome_for_any_scenario() {
        let tuning = Tuning::default();
        let pop = population();
        let set = CalibrationSet::build(&pop, &tuning);
        let joes = &pop.records()[7];

        let weekend = estimate(joes, &saturday_dinner(), &tuning, &set, None);
        let off_peak = estimate(
            joes,
            &Scenario {
                day: DayOfWeek::Monday,
                time: TimeWindow::At(TimeOfDay {
                    hour: 14,
                    minute: 0,
                }),
                party: 6,
            },
            &tuning,
            &set,
            None,
        );

        assert_eq!(weekend.label, Label::WalkInFocused);
        assert_eq!(weekend.score, 50);
        assert_eq!(weekend.reservation_type, ReservationType::WalkInOnly);
        assert_eq!(weekend.label, off_peak.label);
        assert_eq!(weekend.score, off_peak.score);
        assert!(weekend.debug.breakdown.is_none());
        assert!(weekend.debug.percentile.is_none());
    }

    #[test]
    fn popular_linked_record_classifies_likely_reservable() {
        let tuning = Tuning::default();
        let pop = population();
        let set = CalibrationSet::build(&pop, &tuning);
        let favorite = &pop.records()[5];

        let result = estimate(favorite, &saturday_dinner(), &tuning, &set, None);
        assert_eq!(result.reservation_type, ReservationType::LikelyReservable);
        // Most popular venues in this population, so its difficulty percentile
        // is near the top and its booking likelihood near the bottom.
        assert!(result.debug.percentile.expect("percentile") > 60.0);
    }

    #[test]
    fn batch_is_sorted_by_descending_score_with_stable_ties() {
        let tuning = Tuning::default();
        let pop = population();
        let set = CalibrationSet::build(&pop, &tuning);
        let results = estimate_batch(&pop, &saturday_dinner(), &tuning, &set);

        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));

        // Ties preserve the population order.
        let mut tied = vec![
            estimate(&pop.records()[0], &saturday_dinner(), &tuning, &set, None),
            estimate(&pop.records()[1], &saturday_dinner(), &tuning, &set, None),
        ];
        tied[1].score = tied[0].score;
        let first_name = tied[0].name.clone();
        sort_by_likelihood(&mut tied);
        assert_eq!(tied[0].name, first_name);
    }

    #[test]
    fn lower_review_twin_is_never_less_dampened() {
        let tuning = Tuning::default();
        let pop = population();
        let set = CalibrationSet::build(&pop, &tuning);
        let scenario = saturday_dinner();

        let sparse = record("Twin", 4.5, 50, Some(3), true);
        let dense = record("Twin", 4.5, 5000, Some(3), true);

        let sparse_result = estimate(&sparse, &scenario, &tuning, &set, None);
        let dense_result = estimate(&dense, &scenario, &tuning, &set, None);

        assert!(
            sparse_result.debug.dampening.expect("dampening")
                >= dense_result.debug.dampening.expect("dampening")
        );
    }
}
