//! Reason and suggestion rendering.
//!
//! The primary phrase per label is locked copy: the presentation layer keys
//! off these strings, so they are a stable public contract versioned
//! separately from the scoring thresholds. Driver clauses are appended by
//! priority and capped at two to keep output terse.

use crate::engine::demand::DemandBreakdown;
use crate::engine::labeling::Label;
use crate::engine::tuning::Tuning;
use crate::record::{Prestige, RestaurantRecord};
use crate::scenario::Scenario;

const MAX_DRIVERS: usize = 2;

/// Locked primary phrase per label. Stable; do not reword casually.
pub fn primary_phrase(label: Label) -> &'static str {
    match label {
        Label::High => "Good chance of booking",
        Label::Medium => "Bookable with some planning",
        Label::Low => "Hard to book",
        Label::WalkInFocused => "Walk-in focused",
    }
}

/// Renders the reason line: primary phrase plus up to two driver clauses.
pub fn build_reason(
    label: Label,
    record: &RestaurantRecord,
    scenario: &Scenario,
    breakdown: &DemandBreakdown,
    tuning: &Tuning,
) -> String {
    let primary = primary_phrase(label);
    if label == Label::WalkInFocused {
        return primary.to_string();
    }

    let drivers = collect_drivers(record, scenario, breakdown, tuning);
    if drivers.is_empty() {
        primary.to_string()
    } else {
        format!("{primary}: {}", drivers.join(", "))
    }
}

/// Driver clauses in priority order: prestige, format, override, popularity,
/// peak day, party size.
fn collect_drivers(
    record: &RestaurantRecord,
    scenario: &Scenario,
    breakdown: &DemandBreakdown,
    tuning: &Tuning,
) -> Vec<String> {
    let mut drivers = Vec::new();

    if let Some(prestige) = &record.prestige {
        drivers.push(match prestige {
            Prestige::Stars { count: 1 } => "1 Michelin star".to_string(),
            Prestige::Stars { count } => format!("{count} Michelin stars"),
            Prestige::Distinction => "Michelin-listed".to_string(),
        });
    }

    if drivers.len() < MAX_DRIVERS {
        if let Some(keyword) = &breakdown.format_keyword {
            if breakdown.format > 1.0 {
                drivers.push(format!("{keyword} seating is limited"));
            } else {
                drivers.push(format!("{keyword} spot"));
            }
        }
    }

    if drivers.len() < MAX_DRIVERS && breakdown.manual_override > 1.0 {
        drivers.push("known tough reservation".to_string());
    }

    if drivers.len() < MAX_DRIVERS
        && breakdown.popularity >= tuning.labels.popularity_driver_threshold
    {
        drivers.push("heavily reviewed and highly rated".to_string());
    }

    if drivers.len() < MAX_DRIVERS && breakdown.day >= tuning.labels.peak_day_threshold {
        drivers.push("peak night".to_string());
    }

    if drivers.len() < MAX_DRIVERS && scenario.party >= tuning.labels.large_party_threshold {
        drivers.push("large party".to_string());
    }

    drivers.truncate(MAX_DRIVERS);
    drivers
}

/// Label-conditional suggestion. High needs none; Low gets a fixed nudge;
/// Medium only when the scenario itself is working against the caller.
pub fn build_suggestion(
    label: Label,
    scenario: &Scenario,
    breakdown: &DemandBreakdown,
    tuning: &Tuning,
) -> Option<String> {
    match label {
        Label::High => None,
        Label::Low => Some(
            "Book the moment reservations open and watch for cancellations.".to_string(),
        ),
        Label::Medium => {
            let large_party = scenario.party >= tuning.labels.large_party_threshold;
            let peak_day = breakdown.day >= tuning.labels.peak_day_threshold;
            if large_party || peak_day {
                Some("Try an off-peak day or a smaller party for better odds.".to_string())
            } else {
                None
            }
        }
        Label::WalkInFocused => walk_in_suggestion(),
    }
}

/// Fixed suggestion for walk-in-only venues, which skip the demand stage.
pub fn walk_in_suggestion() -> Option<String> {
    Some("No reservations here; arrive early and expect a short wait.".to_string())
}
