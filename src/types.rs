use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// A historical flight counts as delayed when its departure delay is strictly
/// greater than this many minutes.
pub const DELAY_THRESHOLD_MINUTES: f64 = 15.0;

/// Delay probabilities below this are `Tier::Low`.
pub const LOW_TIER_CEILING: f64 = 0.30;

/// Delay probabilities at or above this are `Tier::High`.
pub const HIGH_TIER_FLOOR: f64 = 0.70;

/// Name of the numeric passthrough column carrying the scheduled hour.
pub const SCHEDULED_HOUR_COLUMN: &str = "Scheduled Hour";

// ---------- Categorical fields ----------

/// The categorical attributes that get one-hot expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    Carrier,
    Origin,
    Destination,
    Weather,
}

impl CategoricalField {
    /// Expansion order. Column position depends on it, so never reorder.
    pub const ALL: [CategoricalField; 4] = [
        CategoricalField::Carrier,
        CategoricalField::Origin,
        CategoricalField::Destination,
        CategoricalField::Weather,
    ];

    /// Dataset header for the field; also the prefix of its one-hot columns.
    pub fn label(self) -> &'static str {
        match self {
            CategoricalField::Carrier => "Carrier Code",
            CategoricalField::Origin => "Origin Airport",
            CategoricalField::Destination => "Destination Airport",
            CategoricalField::Weather => "Weather Conditions",
        }
    }

    /// One-hot column name for `value` under this field, e.g. `Carrier Code_AA`.
    pub fn column_name(self, value: &str) -> String {
        format!("{}_{}", self.label(), value)
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------- Records ----------

/// One historical flight as loaded from the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    pub carrier: String,
    pub origin: String,
    pub destination: String,
    pub weather: String,
    pub scheduled_hour: u8,
    pub departure_delay_minutes: f64,
    /// Carried for reference only; never encoded.
    pub date: Option<NaiveDate>,
}

impl FlightRecord {
    pub fn category(&self, field: CategoricalField) -> &str {
        match field {
            CategoricalField::Carrier => &self.carrier,
            CategoricalField::Origin => &self.origin,
            CategoricalField::Destination => &self.destination,
            CategoricalField::Weather => &self.weather,
        }
    }

    pub fn is_delayed(&self) -> bool {
        self.departure_delay_minutes > DELAY_THRESHOLD_MINUTES
    }

    /// Checks the record is usable for training: every category present,
    /// hour in 0..=23, finite delay. `row` only labels the error.
    pub fn validate(&self, row: usize) -> Result<()> {
        let invalid = |reason: String| -> Result<()> { Err(Error::InvalidRecord { row, reason }) };

        for field in CategoricalField::ALL {
            if self.category(field).is_empty() {
                return invalid(format!("missing {field}"));
            }
        }
        if self.scheduled_hour > 23 {
            return invalid(format!(
                "scheduled hour {} is outside 0..=23",
                self.scheduled_hour
            ));
        }
        if !self.departure_delay_minutes.is_finite() {
            return invalid("departure delay is not a finite number".into());
        }
        Ok(())
    }
}

/// A live inference request. Any categorical field may be absent, in which
/// case every one-hot column for that field encodes as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightQuery {
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub weather: Option<String>,
    pub scheduled_hour: u8,
    /// Accepted from callers but deliberately not part of the feature vector.
    #[serde(default)]
    pub travel_date: Option<NaiveDate>,
}

impl FlightQuery {
    pub fn new(
        carrier: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        weather: impl Into<String>,
        scheduled_hour: u8,
    ) -> Self {
        Self {
            carrier: Some(carrier.into()),
            origin: Some(origin.into()),
            destination: Some(destination.into()),
            weather: Some(weather.into()),
            scheduled_hour,
            travel_date: None,
        }
    }

    pub fn category(&self, field: CategoricalField) -> Option<&str> {
        match field {
            CategoricalField::Carrier => self.carrier.as_deref(),
            CategoricalField::Origin => self.origin.as_deref(),
            CategoricalField::Destination => self.destination.as_deref(),
            CategoricalField::Weather => self.weather.as_deref(),
        }
    }

    /// Rejects hours outside 0..=23. Category values are never validated.
    pub fn validate(&self) -> Result<()> {
        if self.scheduled_hour > 23 {
            return Err(Error::InvalidHour(self.scheduled_hour));
        }
        Ok(())
    }
}

impl From<&FlightRecord> for FlightQuery {
    fn from(r: &FlightRecord) -> Self {
        Self {
            carrier: Some(r.carrier.clone()),
            origin: Some(r.origin.clone()),
            destination: Some(r.destination.clone()),
            weather: Some(r.weather.clone()),
            scheduled_hour: r.scheduled_hour,
            travel_date: r.date,
        }
    }
}

// ---------- Outcomes ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    OnTime,
    Delayed,
}

impl Label {
    pub fn from_delayed(delayed: bool) -> Self {
        if delayed {
            Label::Delayed
        } else {
            Label::OnTime
        }
    }

    pub fn is_delayed(self) -> bool {
        self == Label::Delayed
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::OnTime => f.write_str("On Time"),
            Label::Delayed => f.write_str("Delayed"),
        }
    }
}

/// Coarse risk bucket for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl Tier {
    /// `< 0.30` is Low, `[0.30, 0.70)` is Medium, `>= 0.70` is High.
    pub fn from_probability(p: f64) -> Self {
        if p < LOW_TIER_CEILING {
            Tier::Low
        } else if p < HIGH_TIER_FLOOR {
            Tier::Medium
        } else {
            Tier::High
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Low => f.write_str("Low"),
            Tier::Medium => f.write_str("Medium"),
            Tier::High => f.write_str("High"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: Label,
    pub delay_probability: f64,
    pub tier: Tier,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries_are_exact() {
        assert_eq!(Tier::from_probability(0.0), Tier::Low);
        assert_eq!(Tier::from_probability(0.2999), Tier::Low);
        assert_eq!(Tier::from_probability(0.30), Tier::Medium);
        assert_eq!(Tier::from_probability(0.6999), Tier::Medium);
        assert_eq!(Tier::from_probability(0.70), Tier::High);
        assert_eq!(Tier::from_probability(1.0), Tier::High);
    }

    #[test]
    fn label_threshold_is_strict() {
        let mut r = FlightRecord {
            carrier: "AA".into(),
            origin: "JFK".into(),
            destination: "LAX".into(),
            weather: "Clear".into(),
            scheduled_hour: 9,
            departure_delay_minutes: 15.0,
            date: None,
        };
        assert!(!r.is_delayed(), "exactly 15 minutes is on time");
        r.departure_delay_minutes = 15.5;
        assert!(r.is_delayed());
    }

    #[test]
    fn record_validation_names_the_defect() {
        let good = FlightRecord {
            carrier: "AA".into(),
            origin: "JFK".into(),
            destination: "LAX".into(),
            weather: "Clear".into(),
            scheduled_hour: 23,
            departure_delay_minutes: 4.0,
            date: None,
        };
        assert!(good.validate(1).is_ok());

        let blank = FlightRecord {
            destination: String::new(),
            ..good.clone()
        };
        match blank.validate(7) {
            Err(Error::InvalidRecord { row, reason }) => {
                assert_eq!(row, 7);
                assert!(reason.contains("Destination Airport"), "{reason}");
            }
            other => panic!("expected InvalidRecord, got {other:?}"),
        }

        let late = FlightRecord {
            scheduled_hour: 24,
            ..good.clone()
        };
        assert!(matches!(late.validate(1), Err(Error::InvalidRecord { .. })));

        let nan = FlightRecord {
            departure_delay_minutes: f64::NAN,
            ..good
        };
        assert!(matches!(nan.validate(1), Err(Error::InvalidRecord { .. })));
    }

    #[test]
    fn query_hour_validation() {
        assert!(FlightQuery::new("A", "X", "Y", "Clear", 23).validate().is_ok());
        assert!(matches!(
            FlightQuery::new("A", "X", "Y", "Clear", 24).validate(),
            Err(Error::InvalidHour(24))
        ));
    }

    #[test]
    fn column_names_follow_field_label() {
        assert_eq!(CategoricalField::Carrier.column_name("AA"), "Carrier Code_AA");
        assert_eq!(
            CategoricalField::Weather.column_name("Light Rain"),
            "Weather Conditions_Light Rain"
        );
    }
}
