use ndarray::{Array1, Axis};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::Serialize;
use std::path::Path;

use crate::artifact::ModelArtifact;
use crate::classifier::{Classifier, ForestParams, RandomForest};
use crate::config::TrainConfig;
use crate::dataset::label_records;
use crate::encoder::encode_batch;
use crate::error::{Error, Result};
use crate::schema::build_schema;
use crate::types::FlightRecord;

/// Summary of a training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub n_features: usize,
    /// Share of all rows labelled delayed.
    pub delayed_share: f64,
    /// Accuracy on the held-out rows; `None` when nothing was held out.
    pub test_accuracy: Option<f64>,
}

/// Splits `0..n` into (train, test) index lists from a seeded shuffle.
/// The test side gets `ceil(n * test_fraction)` rows but never all of them.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let n_test = ((n as f64 * test_fraction).ceil() as usize).min(n.saturating_sub(1));
    let train = order.split_off(n_test);
    (train, order)
}

pub struct Trainer {
    config: TrainConfig,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Trains the default forest over `records`.
    pub fn train(&self, records: &[FlightRecord]) -> Result<(ModelArtifact, TrainingReport)> {
        let forest = RandomForest::new(ForestParams::from(&self.config));
        self.train_with(records, forest)
    }

    /// Trains `classifier` over `records` and bundles it with the schema
    /// derived from the full record set. One invalid record fails the run;
    /// its 1-based position is reported as the row.
    pub fn train_with<C: Classifier>(
        &self,
        records: &[FlightRecord],
        mut classifier: C,
    ) -> Result<(ModelArtifact<C>, TrainingReport)> {
        if records.is_empty() {
            return Err(Error::EmptyDataset);
        }
        for (i, r) in records.iter().enumerate() {
            r.validate(i + 1)?;
        }

        let labeled = label_records(records.to_vec());
        let schema = build_schema(records);
        let x = encode_batch(&labeled, &schema);
        let y: Array1<bool> = labeled.iter().map(|e| e.is_delayed).collect();
        let delayed_share = y.iter().filter(|d| **d).count() as f64 / y.len() as f64;
        tracing::info!(
            "encoded {} records into {} features ({:.1}% delayed)",
            records.len(),
            schema.len(),
            delayed_share * 100.0
        );

        let (train_idx, test_idx) =
            train_test_split(records.len(), self.config.test_fraction, self.config.seed);
        let x_train = x.select(Axis(0), &train_idx);
        let y_train = y.select(Axis(0), &train_idx);
        tracing::info!(
            "split {} train / {} test rows (seed {})",
            train_idx.len(),
            test_idx.len(),
            self.config.seed
        );

        classifier.fit(x_train.view(), y_train.view())?;

        let test_accuracy = if test_idx.is_empty() {
            None
        } else {
            let x_test = x.select(Axis(0), &test_idx);
            let y_test = y.select(Axis(0), &test_idx);
            let predicted = classifier.predict(x_test.view())?;
            let hits = predicted
                .iter()
                .zip(y_test.iter())
                .filter(|(p, t)| p == t)
                .count();
            Some(hits as f64 / test_idx.len() as f64)
        };
        if let Some(acc) = test_accuracy {
            tracing::info!("held-out accuracy {:.3}", acc);
        }

        let report = TrainingReport {
            rows: records.len(),
            train_rows: train_idx.len(),
            test_rows: test_idx.len(),
            n_features: schema.len(),
            delayed_share,
            test_accuracy,
        };
        let artifact = ModelArtifact::new(schema, classifier)?;
        Ok((artifact, report))
    }

    /// Trains and writes the artifact to `path`, replacing any previous one.
    pub fn train_to_file(
        &self,
        records: &[FlightRecord],
        path: impl AsRef<Path>,
    ) -> Result<TrainingReport> {
        let (artifact, report) = self.train(records)?;
        artifact.save(path)?;
        Ok(report)
    }
}
