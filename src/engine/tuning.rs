//! Tuning tables for the demand model, classifier, dampening, and labels.
//!
//! One immutable `Tuning` value is built at process start and threaded through
//! every engine call, so retuning never touches algorithm code. Defaults carry
//! the reference literals; a JSON file can override any section, in the same
//! way the service loads its other data artefacts.
//!
//! Several literals are empirically tuned rather than derived (notably the
//! unknown-price discount and the classifier review thresholds). Treat them as
//! tunable constants; do not re-derive.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Popularity blend and bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PopularityWeights {
    /// Weight of the log-scaled review-volume term.
    pub volume_weight: f64,
    /// Weight of the rating term.
    pub rating_weight: f64,
    /// Review count at which the volume term saturates.
    pub review_cap: u32,
    /// Ratings below the floor contribute nothing; above the ceiling, fully.
    pub rating_floor: f64,
    pub rating_ceiling: f64,
    /// Strictly positive floor so the factor can never zero the product.
    pub floor: f64,
}

impl Default for PopularityWeights {
    fn default() -> Self {
        Self {
            volume_weight: 0.65,
            rating_weight: 0.35,
            review_cap: 5000,
            rating_floor: 4.0,
            rating_ceiling: 5.0,
            floor: 0.05,
        }
    }
}

/// A party-size step: applies to parties of at least `min_size`.
#[derive(Debug, Clone, Deserialize)]
pub struct PartyStep {
    pub min_size: u32,
    pub multiplier: f64,
}

/// A format keyword with its multiplier. Hard keywords multiply up, easy
/// keywords multiply down; the strongest match wins within its list.
#[derive(Debug, Clone, Deserialize)]
pub struct FormatKeyword {
    pub keyword: String,
    pub multiplier: f64,
}

/// Demand-model multiplier tables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemandTables {
    /// Per-day multipliers, Monday first.
    pub day_multipliers: [f64; 7],
    /// Per-hour multipliers, midnight first.
    pub hour_multipliers: [f64; 24],
    /// Ascending by `min_size`; the last applicable step wins.
    pub party_steps: Vec<PartyStep>,
    /// Indexed by price tier minus one.
    pub price_multipliers: [f64; 4],
    /// Unlabeled venues skew toward easier booking, hence the slight discount.
    pub price_unknown_multiplier: f64,
    pub hard_formats: Vec<FormatKeyword>,
    pub easy_formats: Vec<FormatKeyword>,
    /// Indexed by star count minus one.
    pub star_multipliers: [f64; 3],
    pub distinction_multiplier: f64,
    /// Press-source tags that count toward the press bonus.
    pub press_sources: Vec<String>,
    /// Per-source bonus, compounded per distinct source.
    pub press_source_multiplier: f64,
    /// Upper bound on the combined press bonus.
    pub press_cap: f64,
    pub borough_multipliers: BTreeMap<String, f64>,
    /// Names known to book out that the automatic signals miss. Matched exact
    /// or by prefix after normalization.
    pub override_names: Vec<String>,
    pub override_multiplier: f64,
}

impl Default for DemandTables {
    fn default() -> Self {
        let mut hour_multipliers = [0.55; 24];
        for (hour, slot) in hour_multipliers.iter_mut().enumerate() {
            *slot = match hour {
                0..=5 => 0.55,
                6..=10 => 0.60,
                11 => 0.75,
                12 | 13 => 0.90,
                14..=16 => 0.70,
                17 => 1.10,
                18 => 1.30,
                19 => 1.35,
                20 => 1.30,
                21 => 1.00,
                22 => 0.80,
                _ => 0.60,
            };
        }

        let keyword = |kw: &str, multiplier: f64| FormatKeyword {
            keyword: kw.to_string(),
            multiplier,
        };

        Self {
            day_multipliers: [0.85, 0.90, 0.95, 1.05, 1.25, 1.30, 1.00],
            hour_multipliers,
            party_steps: vec![
                PartyStep {
                    min_size: 1,
                    multiplier: 1.0,
                },
                PartyStep {
                    min_size: 3,
                    multiplier: 1.10,
                },
                PartyStep {
                    min_size: 5,
                    multiplier: 1.25,
                },
                PartyStep {
                    min_size: 7,
                    multiplier: 1.45,
                },
            ],
            price_multipliers: [0.85, 0.95, 1.15, 1.30],
            price_unknown_multiplier: 0.90,
            hard_formats: vec![
                keyword("omakase", 1.50),
                keyword("kaiseki", 1.45),
                keyword("tasting menu", 1.45),
                keyword("chef's counter", 1.40),
                keyword("counter-only", 1.35),
                keyword("speakeasy", 1.25),
                keyword("supper club", 1.20),
                keyword("prix fixe", 1.20),
            ],
            easy_formats: vec![
                keyword("food court", 0.70),
                keyword("food truck", 0.70),
                keyword("buffet", 0.75),
                keyword("cafeteria", 0.75),
                keyword("diner", 0.80),
                keyword("fast casual", 0.80),
            ],
            star_multipliers: [1.35, 1.50, 1.70],
            distinction_multiplier: 1.15,
            press_sources: [
                "nytimes",
                "eater",
                "infatuation",
                "timeout",
                "grubstreet",
                "newyorker",
                "michelin_guide",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            press_source_multiplier: 1.08,
            press_cap: 1.30,
            borough_multipliers: [
                ("manhattan", 1.10),
                ("brooklyn", 1.05),
                ("queens", 1.00),
                ("bronx", 0.95),
                ("staten island", 0.90),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
            override_names: [
                "carbone",
                "don angie",
                "4 charles prime rib",
                "rao's",
                "polo bar",
                "tatiana",
                "lilia",
                "misi",
                "via carota",
                "i sodi",
                "semma",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            override_multiplier: 1.50,
        }
    }
}

/// Reservation-type classifier thresholds and the walk-in lexicon.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierRules {
    /// No link, but at least this price tier and review count still implies a
    /// reservation culture.
    pub linkless_price_tier: u8,
    pub linkless_review_count: u32,
    /// Moderate price with heavy reviews is still maybe-reservable.
    pub moderate_price_tier: u8,
    pub moderate_review_count: u32,
    /// Quick-service cuisine words that mark a venue as walk-in.
    pub walk_in_keywords: Vec<String>,
    /// Review count at or above which the walk-in rule no longer applies.
    pub walk_in_review_ceiling: u32,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            linkless_price_tier: 3,
            linkless_review_count: 300,
            moderate_price_tier: 2,
            moderate_review_count: 800,
            walk_in_keywords: [
                "pizza", "slice", "ramen", "taco", "taqueria", "bagel", "deli", "burger",
                "sandwich", "bakery", "cafe", "coffee", "noodle", "dumpling", "halal", "falafel",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            walk_in_review_ceiling: 1200,
        }
    }
}

/// Confidence-dampening penalties. The cap bounds the factor in [0, 0.45].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DampeningPenalties {
    pub low_review_threshold: u32,
    pub low_review_penalty: f64,
    pub missing_price_penalty: f64,
    pub missing_link_penalty: f64,
    pub cap: f64,
}

impl Default for DampeningPenalties {
    fn default() -> Self {
        Self {
            low_review_threshold: 200,
            low_review_penalty: 0.20,
            missing_price_penalty: 0.15,
            missing_link_penalty: 0.15,
            cap: 0.45,
        }
    }
}

/// Label thresholds and the per-label score sub-ranges.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LabelThresholds {
    /// Percentiles at or below this are High.
    pub high_percentile_max: f64,
    /// Percentiles at or below this (and above High) are Medium.
    pub medium_percentile_max: f64,
    /// Score at the easiest end of each label's range.
    pub high_score_top: u32,
    pub high_score_bottom: u32,
    pub medium_score_top: u32,
    pub medium_score_bottom: u32,
    pub low_score_top: u32,
    pub low_score_bottom: u32,
    /// Fixed neutral score for walk-in-only venues.
    pub walk_in_score: u32,
    /// Popularity at or above which it is surfaced as a driver.
    pub popularity_driver_threshold: f64,
    /// Day multiplier at or above which a day counts as peak.
    pub peak_day_threshold: f64,
    /// Party size at or above which it counts as large.
    pub large_party_threshold: u32,
}

impl Default for LabelThresholds {
    fn default() -> Self {
        Self {
            high_percentile_max: 40.0,
            medium_percentile_max: 75.0,
            high_score_top: 90,
            high_score_bottom: 65,
            medium_score_top: 64,
            medium_score_bottom: 35,
            low_score_top: 34,
            low_score_bottom: 5,
            walk_in_score: 50,
            popularity_driver_threshold: 0.75,
            peak_day_threshold: 1.20,
            large_party_threshold: 5,
        }
    }
}

/// The whole tuning surface, versioned for auditability.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub version: TuningVersion,
    pub popularity: PopularityWeights,
    pub demand: DemandTables,
    pub classifier: ClassifierRules,
    pub dampening: DampeningPenalties,
    pub labels: LabelThresholds,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TuningVersion(pub String);

impl Default for TuningVersion {
    fn default() -> Self {
        Self("2026.1".to_string())
    }
}

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse tuning file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Tuning {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let contents = std::fs::read_to_string(path)?;
        let tuning: Tuning = serde_json::from_str(&contents)?;
        Ok(tuning)
    }
}
