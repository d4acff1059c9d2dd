//! Multiplicative demand model.
//!
//! Raw difficulty is the product of independent, strictly positive factors.
//! Optional signals (prestige, press, borough, overrides) contribute only when
//! actually present; absence means the factor is skipped, not neutralized.
//! A live-availability signal, when supplied, is added after the product and
//! is the only non-multiplicative input.

use crate::engine::tuning::{DemandTables, Tuning};
use crate::record::{Prestige, RestaurantRecord};
use crate::scenario::Scenario;
use serde::Serialize;

/// Floor applied after the availability addend so the score stays positive.
const MIN_RAW: f64 = 1e-4;

/// Every intermediate multiplier, exposed for auditability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandBreakdown {
    pub popularity: f64,
    pub day: f64,
    pub time: f64,
    pub party: f64,
    pub price: f64,
    pub format: f64,
    /// Matched format keyword, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_keyword: Option<String>,
    /// 1.0 when no structured badge is present (factor skipped).
    pub prestige: f64,
    pub press: f64,
    pub borough: f64,
    pub manual_override: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_points: Option<f64>,
    pub raw: f64,
}

/// Computes raw difficulty and its factor breakdown for one record under one
/// scenario. Pure; identical inputs always produce the identical breakdown.
pub fn raw_difficulty(
    record: &RestaurantRecord,
    scenario: &Scenario,
    tuning: &Tuning,
    availability_points: Option<f64>,
) -> DemandBreakdown {
    let demand = &tuning.demand;

    let popularity = popularity_factor(record, tuning);
    let day = demand.day_multipliers[scenario.day.index()];
    let time = time_factor(scenario, demand);
    let party = party_factor(scenario.party, demand);
    let price = match record.price_tier() {
        Some(tier) => demand.price_multipliers[usize::from(tier) - 1],
        None => demand.price_unknown_multiplier,
    };
    let (format, format_keyword) = format_factor(record, demand);
    let prestige = prestige_factor(record, demand);
    let press = press_factor(record, demand);
    let borough = borough_factor(record, demand);
    let manual_override = override_factor(record, demand);

    let product = popularity
        * day
        * time
        * party
        * price
        * format
        * prestige
        * press
        * borough
        * manual_override;
    let raw = (product + availability_points.unwrap_or(0.0)).max(MIN_RAW);

    DemandBreakdown {
        popularity,
        day,
        time,
        party,
        price,
        format,
        format_keyword,
        prestige,
        press,
        borough,
        manual_override,
        availability_points,
        raw,
    }
}

/// Weighted blend of log-scaled review volume and linear rating position.
/// Clamped into [floor, 1].
fn popularity_factor(record: &RestaurantRecord, tuning: &Tuning) -> f64 {
    let weights = &tuning.popularity;

    let volume = (1.0 + f64::from(record.review_count)).ln()
        / (1.0 + f64::from(weights.review_cap)).ln();
    let volume = volume.clamp(0.0, 1.0);

    let span = weights.rating_ceiling - weights.rating_floor;
    let rating = ((record.rating - weights.rating_floor) / span).clamp(0.0, 1.0);

    (weights.volume_weight * volume + weights.rating_weight * rating).max(weights.floor)
}

/// Per-hour multiplier, averaged across every hour an interval covers.
fn time_factor(scenario: &Scenario, demand: &DemandTables) -> f64 {
    let hours = scenario.time.hours();
    let sum: f64 = hours
        .iter()
        .map(|&h| demand.hour_multipliers[usize::from(h)])
        .sum();
    sum / hours.len() as f64
}

fn party_factor(party: u32, demand: &DemandTables) -> f64 {
    demand
        .party_steps
        .iter()
        .filter(|step| party >= step.min_size)
        .next_back()
        .map(|step| step.multiplier)
        .unwrap_or(1.0)
}

/// Strongest hard keyword wins; easy keywords are consulted only when no hard
/// keyword matches.
fn format_factor(record: &RestaurantRecord, demand: &DemandTables) -> (f64, Option<String>) {
    let text = record.search_text();

    let hard = demand
        .hard_formats
        .iter()
        .filter(|f| text.contains(&f.keyword))
        .max_by(|a, b| a.multiplier.total_cmp(&b.multiplier));
    if let Some(hit) = hard {
        return (hit.multiplier, Some(hit.keyword.clone()));
    }

    let easy = demand
        .easy_formats
        .iter()
        .filter(|f| text.contains(&f.keyword))
        .min_by(|a, b| a.multiplier.total_cmp(&b.multiplier));
    match easy {
        Some(hit) => (hit.multiplier, Some(hit.keyword.clone())),
        None => (1.0, None),
    }
}

/// Applied only when a structured badge is present.
fn prestige_factor(record: &RestaurantRecord, demand: &DemandTables) -> f64 {
    match &record.prestige {
        Some(Prestige::Stars { count }) => {
            let index = usize::from((*count).clamp(1, 3)) - 1;
            demand.star_multipliers[index]
        }
        Some(Prestige::Distinction) => demand.distinction_multiplier,
        None => 1.0,
    }
}

/// Each recognized source counts once; the combined bonus is capped.
fn press_factor(record: &RestaurantRecord, demand: &DemandTables) -> f64 {
    let mut seen: Vec<&str> = Vec::new();
    for link in &record.press_links {
        let tag = link.trim().to_lowercase();
        if let Some(source) = demand.press_sources.iter().find(|s| tag.contains(*s)) {
            if !seen.contains(&source.as_str()) {
                seen.push(source);
            }
        }
    }
    if seen.is_empty() {
        return 1.0;
    }
    demand
        .press_source_multiplier
        .powi(seen.len() as i32)
        .min(demand.press_cap)
}

fn borough_factor(record: &RestaurantRecord, demand: &DemandTables) -> f64 {
    record
        .borough
        .as_ref()
        .and_then(|b| demand.borough_multipliers.get(&b.trim().to_lowercase()))
        .copied()
        .unwrap_or(1.0)
}

/// Exact or prefix match against the override allow-list after normalization.
fn override_factor(record: &RestaurantRecord, demand: &DemandTables) -> f64 {
    let name = record.normalized_name();
    let matched = demand
        .override_names
        .iter()
        .any(|entry| name == *entry || name.starts_with(entry.as_str()));
    if matched {
        demand.override_multiplier
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{DayOfWeek, TimeOfDay, TimeWindow};

    fn record(name: &str) -> RestaurantRecord {
        RestaurantRecord {
            name: name.to_string(),
            rating: 0.0,
            review_count: 0,
            price_level: None,
            has_booking_link: false,
            format_tags: Vec::new(),
            prestige: None,
            press_links: Vec::new(),
            borough: None,
        }
    }

    fn dinner(day: DayOfWeek, party: u32) -> Scenario {
        Scenario {
            day,
            time: TimeWindow::At(TimeOfDay {
                hour: 19,
                minute: 0,
            }),
            party,
        }
    }

    fn tuning() -> Tuning {
        Tuning::default()
    }

    #[test]
    fn raw_difficulty_is_always_positive() {
        let bare = record("Nothing Known");
        let breakdown = raw_difficulty(&bare, &dinner(DayOfWeek::Monday, 1), &tuning(), None);
        assert!(breakdown.raw > 0.0);

        // Even a hostile availability addend cannot push it to zero.
        let dampened = raw_difficulty(
            &bare,
            &dinner(DayOfWeek::Monday, 1),
            &tuning(),
            Some(-100.0),
        );
        assert!(dampened.raw > 0.0);
    }

    #[test]
    fn popularity_blends_volume_and_rating() {
        let mut popular = record("Popular");
        popular.rating = 5.0;
        popular.review_count = 5000;
        let mut obscure = record("Obscure");
        obscure.rating = 3.0;
        obscure.review_count = 2;

        let t = tuning();
        let scenario = dinner(DayOfWeek::Tuesday, 2);
        let high = raw_difficulty(&popular, &scenario, &t, None).popularity;
        let low = raw_difficulty(&obscure, &scenario, &t, None).popularity;

        assert!((high - 1.0).abs() < 1e-9);
        assert!(low >= t.popularity.floor);
        assert!(high > low);
    }

    #[test]
    fn rating_below_floor_contributes_nothing() {
        let mut r = record("Mediocre");
        r.rating = 3.9;
        r.review_count = 100;
        let mut unrated = record("Unrated");
        unrated.review_count = 100;

        let t = tuning();
        let scenario = dinner(DayOfWeek::Tuesday, 2);
        let a = raw_difficulty(&r, &scenario, &t, None).popularity;
        let b = raw_difficulty(&unrated, &scenario, &t, None).popularity;
        assert_eq!(a, b);
    }

    #[test]
    fn weekend_dinner_outscores_weekday_dinner() {
        let mut r = record("Somewhere");
        r.rating = 4.5;
        r.review_count = 800;

        let t = tuning();
        let saturday = raw_difficulty(&r, &dinner(DayOfWeek::Saturday, 2), &t, None);
        let tuesday = raw_difficulty(&r, &dinner(DayOfWeek::Tuesday, 2), &t, None);
        assert!(saturday.raw > tuesday.raw);
    }

    #[test]
    fn interval_time_factor_is_mean_of_hours() {
        let r = record("Somewhere");
        let t = tuning();
        let scenario = Scenario {
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
        };
        let breakdown = raw_difficulty(&r, &scenario, &t, None);
        let expected = (t.demand.hour_multipliers[18] + t.demand.hour_multipliers[19]) / 2.0;
        assert!((breakdown.time - expected).abs() < 1e-12);
    }

    #[test]
    fn larger_parties_are_harder() {
        let r = record("Somewhere");
        let t = tuning();
        let couple = raw_difficulty(&r, &dinner(DayOfWeek::Friday, 2), &t, None);
        let crowd = raw_difficulty(&r, &dinner(DayOfWeek::Friday, 8), &t, None);
        assert!(crowd.party > couple.party);
        assert_eq!(crowd.party, 1.45);
    }

    #[test]
    fn unknown_price_gets_slight_discount_not_neutral() {
        let r = record("No Price");
        let t = tuning();
        let breakdown = raw_difficulty(&r, &dinner(DayOfWeek::Monday, 2), &t, None);
        assert_eq!(breakdown.price, t.demand.price_unknown_multiplier);
        assert!(breakdown.price < 1.0);
    }

    #[test]
    fn hard_format_beats_easy_format() {
        let mut r = record("Counter Spot");
        r.format_tags = vec!["omakase".to_string(), "diner".to_string()];
        let breakdown = raw_difficulty(&r, &dinner(DayOfWeek::Friday, 2), &tuning(), None);
        assert_eq!(breakdown.format, 1.50);
        assert_eq!(breakdown.format_keyword.as_deref(), Some("omakase"));
    }

    #[test]
    fn easy_format_applies_when_no_hard_match() {
        let mut r = record("Corner Diner");
        let breakdown = raw_difficulty(&r, &dinner(DayOfWeek::Friday, 2), &tuning(), None);
        assert_eq!(breakdown.format, 0.80);
        r.format_tags = vec!["buffet".to_string()];
        let breakdown = raw_difficulty(&r, &dinner(DayOfWeek::Friday, 2), &tuning(), None);
        assert_eq!(breakdown.format, 0.75);
    }

    #[test]
    fn absent_prestige_is_skipped_not_bonused() {
        let plain = record("Plain");
        let mut starred = record("Starred");
        starred.prestige = Some(Prestige::Stars { count: 2 });

        let t = tuning();
        let scenario = dinner(DayOfWeek::Tuesday, 2);
        assert_eq!(raw_difficulty(&plain, &scenario, &t, None).prestige, 1.0);
        assert_eq!(raw_difficulty(&starred, &scenario, &t, None).prestige, 1.50);
    }

    #[test]
    fn press_sources_count_once_and_cap() {
        let mut r = record("Press Darling");
        r.press_links = vec![
            "nytimes".to_string(),
            "nytimes".to_string(),
            "eater".to_string(),
            "infatuation".to_string(),
            "timeout".to_string(),
            "grubstreet".to_string(),
            "newyorker".to_string(),
        ];
        let t = tuning();
        let breakdown = raw_difficulty(&r, &dinner(DayOfWeek::Tuesday, 2), &t, None);
        // Six distinct sources would compound past the cap.
        assert_eq!(breakdown.press, t.demand.press_cap);

        let mut single = record("Once Mentioned");
        single.press_links = vec!["eater".to_string()];
        let breakdown = raw_difficulty(&single, &dinner(DayOfWeek::Tuesday, 2), &t, None);
        assert_eq!(breakdown.press, t.demand.press_source_multiplier);
    }

    #[test]
    fn unrecognized_press_tags_are_ignored() {
        let mut r = record("Blogged About");
        r.press_links = vec!["someblog".to_string()];
        let breakdown = raw_difficulty(&r, &dinner(DayOfWeek::Tuesday, 2), &tuning(), None);
        assert_eq!(breakdown.press, 1.0);
    }

    #[test]
    fn borough_defaults_to_neutral() {
        let mut r = record("Somewhere");
        r.borough = Some("Gotham".to_string());
        let breakdown = raw_difficulty(&r, &dinner(DayOfWeek::Tuesday, 2), &tuning(), None);
        assert_eq!(breakdown.borough, 1.0);

        r.borough = Some("Manhattan".to_string());
        let breakdown = raw_difficulty(&r, &dinner(DayOfWeek::Tuesday, 2), &tuning(), None);
        assert_eq!(breakdown.borough, 1.10);
    }

    #[test]
    fn override_matches_exact_and_prefix() {
        let t = tuning();
        let scenario = dinner(DayOfWeek::Tuesday, 2);

        let exact = record("Carbone");
        assert_eq!(
            raw_difficulty(&exact, &scenario, &t, None).manual_override,
            1.50
        );

        let prefixed = record("Lilia Ristorante");
        assert_eq!(
            raw_difficulty(&prefixed, &scenario, &t, None).manual_override,
            1.50
        );

        let unlisted = record("Quiet Corner");
        assert_eq!(
            raw_difficulty(&unlisted, &scenario, &t, None).manual_override,
            1.0
        );
    }

    #[test]
    fn availability_points_add_rather_than_multiply() {
        let mut r = record("Somewhere");
        r.rating = 4.5;
        r.review_count = 500;
        let t = tuning();
        let scenario = dinner(DayOfWeek::Friday, 2);

        let base = raw_difficulty(&r, &scenario, &t, None);
        let boosted = raw_difficulty(&r, &scenario, &t, Some(0.5));
        assert!((boosted.raw - base.raw - 0.5).abs() < 1e-12);
    }

    #[test]
    fn identical_inputs_are_deterministic() {
        let mut r = record("Deterministic");
        r.rating = 4.6;
        r.review_count = 1234;
        r.press_links = vec!["eater".to_string()];
        let t = tuning();
        let scenario = dinner(DayOfWeek::Saturday, 4);

        let a = raw_difficulty(&r, &scenario, &t, None);
        let b = raw_difficulty(&r, &scenario, &t, None);
        assert_eq!(a, b);
    }
}
