//! Process-wide predictor.
//!
//! The first successful [`init`] loads the artifact; every later call, and
//! every [`predictor`] call, hands out the same instance. The predictor is
//! never replaced or mutated for the rest of the process.

use once_cell::sync::OnceCell;
use std::{path::Path, sync::Arc};

use crate::error::Result;
use crate::predictor::Predictor;

static PREDICTOR: OnceCell<Arc<Predictor>> = OnceCell::new();

/// Loads the artifact on first call. Later calls ignore `path` and return
/// the already loaded predictor. A failed load leaves the cell empty.
pub fn init(path: impl AsRef<Path>) -> Result<Arc<Predictor>> {
    PREDICTOR
        .get_or_try_init(|| Predictor::load(path).map(Arc::new))
        .cloned()
}

/// The loaded predictor, if [`init`] has succeeded.
pub fn predictor() -> Option<Arc<Predictor>> {
    PREDICTOR.get().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainConfig;
    use crate::trainer::Trainer;
    use crate::types::FlightRecord;

    #[test]
    fn loads_once_and_reuses() {
        let dir = tempfile::tempdir().unwrap();

        assert!(init(dir.path().join("missing.json")).is_err());
        assert!(predictor().is_none());

        let records: Vec<FlightRecord> = (0..10)
            .map(|i| FlightRecord {
                carrier: "A".into(),
                origin: "X".into(),
                destination: "Y".into(),
                weather: "Clear".into(),
                scheduled_hour: i,
                departure_delay_minutes: f64::from(i) * 5.0,
                date: None,
            })
            .collect();
        let path = dir.path().join("model.json");
        Trainer::new(TrainConfig {
            n_trees: 3,
            ..Default::default()
        })
        .unwrap()
        .train_to_file(&records, &path)
        .unwrap();

        let first = init(&path).unwrap();
        let again = init(dir.path().join("ignored.json")).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert!(Arc::ptr_eq(&first, &predictor().unwrap()));
    }
}
