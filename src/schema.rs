//! Feature-column registry.
//!
//! The registry is the authoritative input order for a fitted classifier.
//! It is built once from the training set and persisted next to the
//! classifier; inference never derives columns on its own.
//!
//! Column order: the `Scheduled Hour` passthrough first, then one block per
//! categorical field in [`CategoricalField::ALL`] order, each block sorted
//! lexicographically by value.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::types::{CategoricalField, FlightRecord, SCHEDULED_HOUR_COLUMN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    ScheduledHour,
    OneHot {
        field: CategoricalField,
        value: String,
    },
}

impl Column {
    pub fn name(&self) -> String {
        match self {
            Column::ScheduledHour => SCHEDULED_HOUR_COLUMN.to_string(),
            Column::OneHot { field, value } => field.column_name(value),
        }
    }

    fn parse(name: &str) -> Result<Self> {
        if name == SCHEDULED_HOUR_COLUMN {
            return Ok(Column::ScheduledHour);
        }
        for field in CategoricalField::ALL {
            let value = name
                .strip_prefix(field.label())
                .and_then(|rest| rest.strip_prefix('_'));
            if let Some(value) = value {
                if value.is_empty() {
                    break;
                }
                return Ok(Column::OneHot {
                    field,
                    value: value.to_string(),
                });
            }
        }
        Err(Error::InvalidColumn {
            column: name.to_string(),
            reason: "not a known feature column".into(),
        })
    }
}

/// Ordered, immutable list of feature columns.
///
/// Serialized as a plain list of column names; deserializing re-parses every
/// name and rejects unknown or duplicate columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct SchemaRegistry {
    columns: Vec<Column>,
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl SchemaRegistry {
    fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let names: Vec<String> = columns.iter().map(Column::name).collect();
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(Error::InvalidColumn {
                    column: name.clone(),
                    reason: "duplicate column".into(),
                });
            }
        }
        Ok(Self {
            columns,
            names,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Values seen for `field` at training time, in column order.
    pub fn categories(&self, field: CategoricalField) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| match c {
                Column::OneHot { field: f, value } if *f == field => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl PartialEq for SchemaRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl Eq for SchemaRegistry {}

impl TryFrom<Vec<String>> for SchemaRegistry {
    type Error = Error;

    fn try_from(names: Vec<String>) -> Result<Self> {
        let columns = names
            .iter()
            .map(|n| Column::parse(n))
            .collect::<Result<Vec<_>>>()?;
        Self::from_columns(columns)
    }
}

impl From<SchemaRegistry> for Vec<String> {
    fn from(schema: SchemaRegistry) -> Self {
        schema.names
    }
}

/// Expands every categorical field over the full value space of `records`.
pub fn build_schema<'a, I>(records: I) -> SchemaRegistry
where
    I: IntoIterator<Item = &'a FlightRecord>,
{
    let mut seen: [BTreeSet<&'a str>; 4] = Default::default();
    for r in records {
        for (slot, field) in seen.iter_mut().zip(CategoricalField::ALL) {
            slot.insert(r.category(field));
        }
    }

    let mut columns = vec![Column::ScheduledHour];
    for (values, field) in seen.iter().zip(CategoricalField::ALL) {
        columns.extend(values.iter().map(|v| Column::OneHot {
            field,
            value: (*v).to_string(),
        }));
    }

    // distinct (field, value) pairs give distinct names, so no duplicate check
    let names: Vec<String> = columns.iter().map(Column::name).collect();
    let index = names
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();
    SchemaRegistry {
        columns,
        names,
        index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(carrier: &str, origin: &str, dest: &str, weather: &str) -> FlightRecord {
        FlightRecord {
            carrier: carrier.into(),
            origin: origin.into(),
            destination: dest.into(),
            weather: weather.into(),
            scheduled_hour: 12,
            departure_delay_minutes: 0.0,
            date: None,
        }
    }

    #[test]
    fn columns_are_sorted_per_field() {
        let records = vec![
            rec("UA", "JFK", "LAX", "Snow"),
            rec("AA", "ATL", "JFK", "Clear"),
            rec("UA", "JFK", "ATL", "Clear"),
        ];
        let schema = build_schema(&records);
        assert_eq!(
            schema.names(),
            &[
                "Scheduled Hour",
                "Carrier Code_AA",
                "Carrier Code_UA",
                "Origin Airport_ATL",
                "Origin Airport_JFK",
                "Destination Airport_ATL",
                "Destination Airport_JFK",
                "Destination Airport_LAX",
                "Weather Conditions_Clear",
                "Weather Conditions_Snow",
            ]
        );
        assert_eq!(schema.categories(CategoricalField::Carrier), vec!["AA", "UA"]);
    }

    #[test]
    fn every_column_is_indexed_at_its_position() {
        let records = vec![
            rec("UA", "JFK", "LAX", "Snow"),
            rec("AA", "ATL", "JFK", "Clear"),
            rec("A_A", "JFK", "ATL", "Light Rain"),
        ];
        let schema = build_schema(&records);
        assert_eq!(schema.names().len(), schema.len());
        for (i, name) in schema.names().iter().enumerate() {
            assert_eq!(schema.position(name), Some(i), "{name}");
        }
        let reparsed = SchemaRegistry::try_from(schema.names().to_vec()).unwrap();
        assert_eq!(reparsed, schema);
    }

    #[test]
    fn order_does_not_depend_on_record_order() {
        let mut records = vec![
            rec("B", "Y", "X", "Rain"),
            rec("A", "X", "Y", "Clear"),
        ];
        let first = build_schema(&records);
        records.reverse();
        assert_eq!(first, build_schema(&records));
    }

    #[test]
    fn json_round_trip_preserves_order() {
        let schema = build_schema(&[rec("A", "X", "Y", "Clear"), rec("B", "Y", "X", "Rain")]);
        let json = serde_json::to_string(&schema).unwrap();
        let back: SchemaRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, back);
        assert_eq!(back.position("Origin Airport_Y"), Some(4));
    }

    #[test]
    fn rejects_foreign_and_duplicate_columns() {
        let foreign: std::result::Result<SchemaRegistry, _> =
            serde_json::from_str(r#"["Scheduled Hour", "Tyre Compound_C3"]"#);
        assert!(foreign.is_err());

        let dup = SchemaRegistry::try_from(vec![
            "Carrier Code_AA".to_string(),
            "Carrier Code_AA".to_string(),
        ]);
        assert!(matches!(dup, Err(Error::InvalidColumn { .. })));
    }

    #[test]
    fn values_with_underscores_parse_back() {
        let schema = SchemaRegistry::try_from(vec!["Weather Conditions_Light_Rain".to_string()])
            .unwrap();
        assert_eq!(
            schema.categories(CategoricalField::Weather),
            vec!["Light_Rain"]
        );
    }
}
