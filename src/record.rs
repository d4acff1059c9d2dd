//! Restaurant records and population loading.
//!
//! Records are produced by the enrichment pipelines and read here as-is.
//! Missing fields are valid "unknown" states, never errors; they feed the
//! confidence dampening downstream.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use thiserror::Error;

/// Structured prestige badge attached by the enrichment pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prestige {
    /// Star count, 1 through 3.
    Stars { count: u8 },
    /// Qualitative distinction tier (listed but unstarred).
    Distinction,
}

/// One restaurant as supplied by the data pipelines. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantRecord {
    pub name: String,
    /// Rating in [0, 5]; 0 means unknown.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    /// Price tier 1..=4; 0 or absent means unknown.
    #[serde(default)]
    pub price_level: Option<u8>,
    #[serde(default)]
    pub has_booking_link: bool,
    /// Free-text cuisine and venue-type keywords.
    #[serde(default)]
    pub format_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prestige: Option<Prestige>,
    /// Distinct press-source tags; each source counts at most once.
    #[serde(default)]
    pub press_links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borough: Option<String>,
}

impl RestaurantRecord {
    /// Price tier normalized to 1..=4, treating 0 and out-of-range as unknown.
    pub fn price_tier(&self) -> Option<u8> {
        self.price_level.filter(|p| (1..=4).contains(p))
    }

    /// Name plus format tags, lowercased, for keyword scanning.
    pub fn search_text(&self) -> String {
        let mut text = self.name.to_lowercase();
        for tag in &self.format_tags {
            text.push(' ');
            text.push_str(&tag.to_lowercase());
        }
        text
    }

    /// Normalized display name used for override matching.
    pub fn normalized_name(&self) -> String {
        self.name.trim().to_lowercase()
    }

    fn fingerprint(&self, hasher: &mut DefaultHasher) {
        self.name.hash(hasher);
        self.rating.to_bits().hash(hasher);
        self.review_count.hash(hasher);
        self.price_level.hash(hasher);
        self.has_booking_link.hash(hasher);
        self.format_tags.hash(hasher);
        self.press_links.hash(hasher);
        self.borough.hash(hasher);
        match &self.prestige {
            Some(Prestige::Stars { count }) => (1u8, *count).hash(hasher),
            Some(Prestige::Distinction) => (2u8, 0u8).hash(hasher),
            None => (0u8, 0u8).hash(hasher),
        }
    }
}

/// The candidate population a calibration table is built over.
///
/// The version token fingerprints the exact snapshot; calibration tables are
/// stamped with it so a table can never silently outlive its population.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    records: Vec<RestaurantRecord>,
    version: u64,
}

impl Population {
    pub fn new(records: Vec<RestaurantRecord>) -> Self {
        let mut hasher = DefaultHasher::new();
        records.len().hash(&mut hasher);
        for record in &records {
            record.fingerprint(&mut hasher);
        }
        Self {
            version: hasher.finish(),
            records,
        }
    }

    pub fn records(&self) -> &[RestaurantRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Error)]
pub enum PopulationError {
    #[error("failed to read population file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse population file: {0}")]
    Parse(#[from] serde_json::Error),
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Population, PopulationError> {
    let contents = std::fs::read_to_string(path)?;
    let records: Vec<RestaurantRecord> = serde_json::from_str(&contents)?;
    Ok(Population::new(records))
}
