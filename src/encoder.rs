use ndarray::{Array1, Array2};
use std::collections::HashMap;

use crate::dataset::LabeledExample;
use crate::schema::SchemaRegistry;
use crate::types::{CategoricalField, FlightQuery, FlightRecord, SCHEDULED_HOUR_COLUMN};

pub type FeatureVector = Array1<f32>;

/// Anything that can be expanded into feature columns.
pub trait FeatureSource {
    /// `None` means the field is absent; all of its one-hot columns stay 0.
    fn category(&self, field: CategoricalField) -> Option<&str>;
    fn scheduled_hour(&self) -> u8;
}

impl FeatureSource for FlightRecord {
    fn category(&self, field: CategoricalField) -> Option<&str> {
        Some(FlightRecord::category(self, field))
    }

    fn scheduled_hour(&self) -> u8 {
        self.scheduled_hour
    }
}

impl FeatureSource for FlightQuery {
    fn category(&self, field: CategoricalField) -> Option<&str> {
        FlightQuery::category(self, field)
    }

    fn scheduled_hour(&self) -> u8 {
        self.scheduled_hour
    }
}

impl FeatureSource for LabeledExample {
    fn category(&self, field: CategoricalField) -> Option<&str> {
        Some(self.record.category(field))
    }

    fn scheduled_hour(&self) -> u8 {
        self.record.scheduled_hour
    }
}

// ---------- Expansion ----------

/// Flat column -> value map for one source, independent of any schema.
fn expand<S: FeatureSource + ?Sized>(src: &S) -> HashMap<String, f32> {
    let mut flat = HashMap::with_capacity(1 + CategoricalField::ALL.len());
    flat.insert(SCHEDULED_HOUR_COLUMN.to_string(), f32::from(src.scheduled_hour()));
    for field in CategoricalField::ALL {
        if let Some(value) = src.category(field) {
            flat.insert(field.column_name(value), 1.0);
        }
    }
    flat
}

/// Orders a flat map by the schema: missing columns are 0, columns the
/// schema does not know are dropped.
fn order_from_flat(flat: &HashMap<String, f32>, schema: &SchemaRegistry) -> FeatureVector {
    schema
        .names()
        .iter()
        .map(|k| flat.get(k).copied().unwrap_or(0.0))
        .collect()
}

/// Encodes one source against `schema`. The result always has
/// `schema.len()` entries; unseen categories contribute nothing.
pub fn encode<S: FeatureSource + ?Sized>(src: &S, schema: &SchemaRegistry) -> FeatureVector {
    let flat = expand(src);
    let v = order_from_flat(&flat, schema);

    if tracing::enabled!(tracing::Level::DEBUG) {
        for name in flat.keys().filter(|k| schema.position(k).is_none()) {
            tracing::debug!(column = %name, "dropping column unseen at training time");
        }
    }
    v
}

/// Encodes every source into one row of the returned matrix.
pub fn encode_batch<S: FeatureSource>(rows: &[S], schema: &SchemaRegistry) -> Array2<f32> {
    let mut x = Array2::zeros((rows.len(), schema.len()));
    for (mut out, src) in x.rows_mut().into_iter().zip(rows) {
        out.assign(&encode(src, schema));
    }
    x
}
