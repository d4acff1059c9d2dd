//! Confidence dampening and label/score mapping.
//!
//! A raw difficulty score becomes a percentile against the calibration table,
//! is pulled toward neutral (50) when the record's supporting data is weak,
//! and is then bucketed into a label with a label-specific score sub-range.
//! Walk-in-only records never reach this stage; they get a fixed pair.

use crate::engine::calibration::CalibrationTable;
use crate::engine::tuning::{LabelThresholds, Tuning};
use crate::record::RestaurantRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    High,
    Medium,
    Low,
    WalkInFocused,
}

/// Mapping outcome plus the intermediate values, kept for the debug payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelOutcome {
    pub label: Label,
    pub score: u32,
    pub percentile: f64,
    pub dampened_percentile: f64,
    pub dampening: f64,
}

/// Accumulates the dampening factor from the three independent data-sparsity
/// penalties, capped. Always in [0, cap].
pub fn dampening_factor(record: &RestaurantRecord, tuning: &Tuning) -> f64 {
    let penalties = &tuning.dampening;
    let mut factor = 0.0;
    if record.review_count < penalties.low_review_threshold {
        factor += penalties.low_review_penalty;
    }
    if record.price_tier().is_none() {
        factor += penalties.missing_price_penalty;
    }
    if !record.has_booking_link {
        factor += penalties.missing_link_penalty;
    }
    factor.min(penalties.cap)
}

/// Pulls a percentile toward 50 proportionally to the dampening factor.
fn dampen(percentile: f64, factor: f64) -> f64 {
    percentile + (50.0 - percentile) * factor
}

fn label_for(percentile: f64, thresholds: &LabelThresholds) -> Label {
    if percentile <= thresholds.high_percentile_max {
        Label::High
    } else if percentile <= thresholds.medium_percentile_max {
        Label::Medium
    } else {
        Label::Low
    }
}

/// Linear interpolation from a percentile sub-range onto a score sub-range.
/// Top of the score range corresponds to the low end of the percentile range,
/// so score decreases monotonically as percentile rises.
fn interpolate(percentile: f64, pct_lo: f64, pct_hi: f64, score_top: u32, score_bottom: u32) -> u32 {
    let span = pct_hi - pct_lo;
    let position = ((percentile - pct_lo) / span).clamp(0.0, 1.0);
    let top = f64::from(score_top);
    let bottom = f64::from(score_bottom);
    (top - position * (top - bottom)).round() as u32
}

fn score_for(percentile: f64, label: Label, thresholds: &LabelThresholds) -> u32 {
    match label {
        Label::High => interpolate(
            percentile,
            0.0,
            thresholds.high_percentile_max,
            thresholds.high_score_top,
            thresholds.high_score_bottom,
        ),
        Label::Medium => interpolate(
            percentile,
            thresholds.high_percentile_max,
            thresholds.medium_percentile_max,
            thresholds.medium_score_top,
            thresholds.medium_score_bottom,
        ),
        Label::Low => interpolate(
            percentile,
            thresholds.medium_percentile_max,
            100.0,
            thresholds.low_score_top,
            thresholds.low_score_bottom,
        ),
        Label::WalkInFocused => thresholds.walk_in_score,
    }
}

/// Maps a raw difficulty score to its label and bounded score against the
/// given calibration table.
pub fn map_to_label(
    raw: f64,
    table: &CalibrationTable,
    record: &RestaurantRecord,
    tuning: &Tuning,
) -> LabelOutcome {
    let percentile = table.percentile_of(raw);
    let dampening = dampening_factor(record, tuning);
    let dampened_percentile = dampen(percentile, dampening);
    let label = label_for(dampened_percentile, &tuning.labels);
    let score = score_for(dampened_percentile, label, &tuning.labels);
    LabelOutcome {
        label,
        score,
        percentile,
        dampened_percentile,
        dampening,
    }
}

/// The fixed outcome for venues that do not take reservations.
pub fn walk_in_outcome(tuning: &Tuning) -> (Label, u32) {
    (Label::WalkInFocused, tuning.labels.walk_in_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Population;
    use crate::scenario::Archetype;

    fn record(reviews: u32, price: Option<u8>, link: bool) -> RestaurantRecord {
        RestaurantRecord {
            name: "Test Venue".to_string(),
            rating: 4.4,
            review_count: reviews,
            price_level: price,
            has_booking_link: link,
            format_tags: Vec::new(),
            prestige: None,
            press_links: Vec::new(),
            borough: None,
        }
    }

    fn empty_table() -> CalibrationTable {
        let tuning = Tuning::default();
        CalibrationTable::build(&Population::new(Vec::new()), Archetype::OffPeak, &tuning)
    }

    #[test]
    fn dampening_is_bounded_for_every_flag_combination() {
        let tuning = Tuning::default();
        for reviews in [0, 10_000] {
            for price in [None, Some(2)] {
                for link in [false, true] {
                    let factor = dampening_factor(&record(reviews, price, link), &tuning);
                    assert!((0.0..=0.45).contains(&factor));
                }
            }
        }
    }

    #[test]
    fn fully_known_record_is_not_dampened() {
        let tuning = Tuning::default();
        assert_eq!(dampening_factor(&record(5000, Some(3), true), &tuning), 0.0);
    }

    #[test]
    fn fully_unknown_record_hits_the_cap() {
        let tuning = Tuning::default();
        assert_eq!(dampening_factor(&record(0, None, false), &tuning), 0.45);
    }

    #[test]
    fn dampened_percentile_lies_between_raw_and_neutral() {
        for pct in [0.0, 12.5, 40.0, 50.0, 77.0, 99.9] {
            for factor in [0.0, 0.2, 0.45] {
                let dampened = dampen(pct, factor);
                let (lo, hi) = if pct <= 50.0 { (pct, 50.0) } else { (50.0, pct) };
                assert!(dampened >= lo && dampened <= hi, "pct {pct} factor {factor}");
            }
        }
    }

    #[test]
    fn labels_partition_the_percentile_range() {
        let thresholds = LabelThresholds::default();
        let mut step = 0.0;
        while step < 100.0 {
            let label = label_for(step, &thresholds);
            let expected = if step <= 40.0 {
                Label::High
            } else if step <= 75.0 {
                Label::Medium
            } else {
                Label::Low
            };
            assert_eq!(label, expected, "at percentile {step}");
            step += 0.5;
        }
    }

    #[test]
    fn score_is_monotonically_decreasing_in_percentile() {
        let thresholds = LabelThresholds::default();
        let mut last = u32::MAX;
        let mut step = 0.0;
        while step < 100.0 {
            let label = label_for(step, &thresholds);
            let score = score_for(step, label, &thresholds);
            assert!(score <= last, "score rose at percentile {step}");
            last = score;
            step += 0.25;
        }
    }

    #[test]
    fn score_ranges_are_label_specific() {
        let thresholds = LabelThresholds::default();
        assert_eq!(score_for(0.0, Label::High, &thresholds), 90);
        assert_eq!(score_for(40.0, Label::High, &thresholds), 65);
        assert_eq!(score_for(40.0, Label::Medium, &thresholds), 64);
        assert_eq!(score_for(75.0, Label::Medium, &thresholds), 35);
        assert_eq!(score_for(75.0, Label::Low, &thresholds), 34);
        assert_eq!(score_for(99.999, Label::Low, &thresholds), 5);
    }

    #[test]
    fn sparse_record_lands_in_medium_via_dampening() {
        // A high percentile plus maximal dampening pulls inside Medium.
        let tuning = Tuning::default();
        let dampened = dampen(90.0, 0.45);
        assert!(dampened <= tuning.labels.medium_percentile_max);
        assert_eq!(label_for(dampened, &tuning.labels), Label::Medium);
    }

    #[test]
    fn low_review_record_is_never_less_dampened() {
        let tuning = Tuning::default();
        let sparse = dampening_factor(&record(50, Some(3), true), &tuning);
        let dense = dampening_factor(&record(5000, Some(3), true), &tuning);
        assert!(sparse >= dense);
    }

    #[test]
    fn map_to_label_on_empty_table_is_neutral_medium() {
        let tuning = Tuning::default();
        let outcome = map_to_label(0.8, &empty_table(), &record(5000, Some(3), true), &tuning);
        assert_eq!(outcome.percentile, 50.0);
        assert_eq!(outcome.label, Label::Medium);
    }

    #[test]
    fn walk_in_outcome_is_fixed() {
        let tuning = Tuning::default();
        assert_eq!(walk_in_outcome(&tuning), (Label::WalkInFocused, 50));
    }
}
