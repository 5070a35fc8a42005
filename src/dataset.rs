//! Historical flight data loading.
//!
//! The loader expects the column headers of the reference dataset
//! (`Carrier Code`, `Origin Airport`, ...). Columns it does not know about,
//! such as `Holiday Indicator`, are ignored. Any row that is missing a
//! required value or carries an unparseable time, date, or delay fails the
//! whole load.

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::Deserialize;
use std::{fs::File, io::Read, path::Path};

use crate::error::{Error, Result};
use crate::types::FlightRecord;

const TIME_FORMAT: &str = "%H:%M";
const DATE_FORMAT: &str = "%m/%d/%Y";

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Carrier Code")]
    carrier: String,
    #[serde(rename = "Origin Airport")]
    origin: String,
    #[serde(rename = "Destination Airport")]
    destination: String,
    #[serde(rename = "Weather Conditions")]
    weather: String,
    #[serde(rename = "Scheduled departure time")]
    scheduled_departure_time: String,
    #[serde(rename = "Departure delay (Minutes)")]
    departure_delay_minutes: f64,
    #[serde(rename = "Date (MM/DD/YYYY)")]
    date: String,
}

/// A historical record paired with its derived delay label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledExample {
    pub record: FlightRecord,
    pub is_delayed: bool,
}

impl LabeledExample {
    pub fn new(record: FlightRecord) -> Self {
        let is_delayed = record.is_delayed();
        Self { record, is_delayed }
    }
}

pub fn label_records(records: Vec<FlightRecord>) -> Vec<LabeledExample> {
    records.into_iter().map(LabeledExample::new).collect()
}

/// Loads every record from a CSV file.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<FlightRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let records = read_csv(file)?;
    tracing::info!("loaded {} flight records from {}", records.len(), path.display());
    Ok(records)
}

pub fn read_csv<R: Read>(reader: R) -> Result<Vec<FlightRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut out = Vec::new();
    for (i, row) in rdr.deserialize::<RawRow>().enumerate() {
        // header is line 1
        let line = i + 2;
        out.push(into_record(row?, line)?);
    }
    Ok(out)
}

fn into_record(raw: RawRow, row: usize) -> Result<FlightRecord> {
    let invalid = |reason: String| Error::InvalidRecord { row, reason };

    let time = NaiveTime::parse_from_str(&raw.scheduled_departure_time, TIME_FORMAT)
        .map_err(|e| {
            invalid(format!(
                "bad scheduled departure time {:?}: {e}",
                raw.scheduled_departure_time
            ))
        })?;
    let date = NaiveDate::parse_from_str(&raw.date, DATE_FORMAT)
        .map_err(|e| invalid(format!("bad date {:?}: {e}", raw.date)))?;

    let record = FlightRecord {
        carrier: raw.carrier,
        origin: raw.origin,
        destination: raw.destination,
        weather: raw.weather,
        scheduled_hour: time.hour() as u8,
        departure_delay_minutes: raw.departure_delay_minutes,
        date: Some(date),
    };
    record.validate(row)?;
    Ok(record)
}
