//! Booking scenarios: day of week, time window, party size.
//!
//! Every scenario maps to exactly one archetype (weekday dinner, weekend
//! dinner, off-peak). The archetype selects which calibration table a raw
//! difficulty score is ranked against, so the mapping must be deterministic
//! and side-effect free.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hours (inclusive start, exclusive end) treated as the dinner band when
/// assigning an archetype.
pub const DINNER_START_HOUR: u8 = 17;
pub const DINNER_END_HOUR: u8 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// Index into per-day multiplier tables, Monday = 0.
    pub fn index(self) -> usize {
        match self {
            DayOfWeek::Monday => 0,
            DayOfWeek::Tuesday => 1,
            DayOfWeek::Wednesday => 2,
            DayOfWeek::Thursday => 3,
            DayOfWeek::Friday => 4,
            DayOfWeek::Saturday => 5,
            DayOfWeek::Sunday => 6,
        }
    }

    pub fn is_weekend(self) -> bool {
        matches!(
            self,
            DayOfWeek::Friday | DayOfWeek::Saturday | DayOfWeek::Sunday
        )
    }
}

/// Time of day at minute precision, parsed from "HH:MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("expected HH:MM, got {0:?}")]
    Format(String),
    #[error("time out of range: {0:?}")]
    Range(String),
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    pub fn parse(text: &str) -> Result<Self, TimeParseError> {
        let (hh, mm) = text
            .split_once(':')
            .ok_or_else(|| TimeParseError::Format(text.to_string()))?;
        let hour: u8 = hh
            .trim()
            .parse()
            .map_err(|_| TimeParseError::Format(text.to_string()))?;
        let minute: u8 = mm
            .trim()
            .parse()
            .map_err(|_| TimeParseError::Format(text.to_string()))?;
        Self::new(hour, minute).ok_or_else(|| TimeParseError::Range(text.to_string()))
    }

    fn render(self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

/// A single time of day or a half-open interval.
///
/// Interval demand is the arithmetic mean of the per-hour multiplier across
/// every hour the interval touches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimeWindowRepr", into = "TimeWindowRepr")]
pub enum TimeWindow {
    At(TimeOfDay),
    Between { start: TimeOfDay, end: TimeOfDay },
}

/// Wire shape: either "19:00" or ["18:00", "20:00"].
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum TimeWindowRepr {
    Single(String),
    Range([String; 2]),
}

impl TryFrom<TimeWindowRepr> for TimeWindow {
    type Error = TimeParseError;

    fn try_from(repr: TimeWindowRepr) -> Result<Self, Self::Error> {
        match repr {
            TimeWindowRepr::Single(text) => Ok(TimeWindow::At(TimeOfDay::parse(&text)?)),
            TimeWindowRepr::Range([start, end]) => Ok(TimeWindow::Between {
                start: TimeOfDay::parse(&start)?,
                end: TimeOfDay::parse(&end)?,
            }),
        }
    }
}

impl From<TimeWindow> for TimeWindowRepr {
    fn from(window: TimeWindow) -> Self {
        match window {
            TimeWindow::At(t) => TimeWindowRepr::Single(t.render()),
            TimeWindow::Between { start, end } => {
                TimeWindowRepr::Range([start.render(), end.render()])
            }
        }
    }
}

impl TimeWindow {
    /// Hours covered by the window. A single time covers its own hour; a
    /// half-open interval covers every hour it touches, including a partial
    /// trailing hour. A degenerate or inverted interval covers its start hour.
    pub fn hours(&self) -> Vec<u8> {
        match self {
            TimeWindow::At(t) => vec![t.hour],
            TimeWindow::Between { start, end } => {
                let last = if end.minute > 0 { end.hour } else { end.hour.saturating_sub(1) };
                if last < start.hour {
                    vec![start.hour]
                } else {
                    (start.hour..=last).collect()
                }
            }
        }
    }

    fn overlaps_dinner(&self) -> bool {
        self.hours()
            .iter()
            .any(|&h| (DINNER_START_HOUR..DINNER_END_HOUR).contains(&h))
    }
}

/// One estimation call's booking parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub day: DayOfWeek,
    pub time: TimeWindow,
    pub party: u32,
}

/// The three calibration archetypes a scenario can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    WeekdayDinner,
    WeekendDinner,
    OffPeak,
}

impl Archetype {
    pub const ALL: [Archetype; 3] = [
        Archetype::WeekdayDinner,
        Archetype::WeekendDinner,
        Archetype::OffPeak,
    ];

    /// Index into per-archetype calibration storage.
    pub fn index(self) -> usize {
        match self {
            Archetype::WeekdayDinner => 0,
            Archetype::WeekendDinner => 1,
            Archetype::OffPeak => 2,
        }
    }

    /// The scenario a calibration table is built under for this archetype.
    pub fn representative(self) -> Scenario {
        let at = |hour| TimeWindow::At(TimeOfDay { hour, minute: 0 });
        match self {
            Archetype::WeekdayDinner => Scenario {
                day: DayOfWeek::Tuesday,
                time: at(19),
                party: 2,
            },
            Archetype::WeekendDinner => Scenario {
                day: DayOfWeek::Saturday,
                time: at(19),
                party: 2,
            },
            Archetype::OffPeak => Scenario {
                day: DayOfWeek::Wednesday,
                time: at(15),
                party: 2,
            },
        }
    }
}

impl Scenario {
    /// Maps the scenario to its archetype. Dinner-band windows split on
    /// weekend vs weekday; everything else is off-peak.
    pub fn archetype(&self) -> Archetype {
        if self.time.overlaps_dinner() {
            if self.day.is_weekend() {
                Archetype::WeekendDinner
            } else {
                Archetype::WeekdayDinner
            }
        } else {
            Archetype::OffPeak
        }
    }
}
