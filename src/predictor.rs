use ndarray::{Array2, Axis};
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::artifact::ModelArtifact;
use crate::classifier::{Classifier, RandomForest};
use crate::encoder::encode;
use crate::error::{Error, Result};
use crate::schema::SchemaRegistry;
use crate::types::{FlightQuery, Label, PredictionResult, Tier};

/// Scores one query against `artifact`: encode with the artifact's own
/// schema, ask the classifier for label and delayed-class probability, then
/// bucket the probability into a tier.
pub fn predict<C: Classifier>(
    query: &FlightQuery,
    artifact: &ModelArtifact<C>,
) -> Result<PredictionResult> {
    query.validate()?;
    let x = encode(query, artifact.schema()).insert_axis(Axis(0));

    let classifier = artifact.classifier();
    let delay_probability = first(classifier.predict_proba(x.view())?.to_vec())?;
    let delayed = first(classifier.predict(x.view())?.to_vec())?;

    Ok(PredictionResult {
        label: Label::from_delayed(delayed),
        delay_probability,
        tier: Tier::from_probability(delay_probability),
    })
}

fn first<T>(v: Vec<T>) -> Result<T> {
    v.into_iter()
        .next()
        .ok_or_else(|| Error::Classifier("classifier returned no rows".into()))
}

/// A loaded, validated artifact ready to serve predictions. Holds no mutable
/// state, so one instance can be shared across threads.
pub struct Predictor<C = RandomForest> {
    artifact: ModelArtifact<C>,
    log_pred: bool,
}

impl Predictor {
    /// Loads and warms up the artifact at `path`. Any failure here means the
    /// artifact is unusable.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_as(path)
    }
}

impl<C: Classifier> Predictor<C> {
    pub fn load_as(path: impl AsRef<Path>) -> Result<Self>
    where
        C: DeserializeOwned,
    {
        let path = path.as_ref();
        let artifact = ModelArtifact::<C>::load(path)?;
        tracing::info!(
            "loaded model from {} (trained {}); feat_list[{}]",
            path.display(),
            artifact.trained_at(),
            artifact.schema().len()
        );
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ModelArtifact<C>) -> Result<Self> {
        artifact.validate()?;

        // warmup: push an all-zero row through the classifier
        let zeros = Array2::<f32>::zeros((1, artifact.schema().len()));
        let p = first(artifact.classifier().predict_proba(zeros.view())?.to_vec())?;
        if !(0.0..=1.0).contains(&p) {
            return Err(Error::Classifier(format!(
                "warmup probability {p} is outside [0, 1]"
            )));
        }
        tracing::info!("warmup forward ok");

        Ok(Self {
            artifact,
            log_pred: std::env::var("LOG_PRED").ok().as_deref() == Some("1"),
        })
    }

    pub fn schema(&self) -> &SchemaRegistry {
        self.artifact.schema()
    }

    pub fn artifact(&self) -> &ModelArtifact<C> {
        &self.artifact
    }

    pub fn predict(&self, query: &FlightQuery) -> Result<PredictionResult> {
        let result = predict(query, &self.artifact)?;

        if self.log_pred {
            let v = encode(query, self.schema());
            let active: Vec<String> = self
                .schema()
                .names()
                .iter()
                .zip(v.iter())
                .filter(|(_, x)| **x != 0.0)
                .take(6)
                .map(|(name, x)| format!("{}={:.3}", name, x))
                .collect();
            tracing::info!(
                "in_dim={} nonzero={} sample=[{}] p={:.4} label={} tier={}",
                v.len(),
                v.iter().filter(|x| **x != 0.0).count(),
                active.join(", "),
                result.delay_probability,
                result.label,
                result.tier
            );
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainConfig;
    use crate::trainer::Trainer;
    use crate::types::FlightRecord;
    use ndarray::{Array1, ArrayView1, ArrayView2};

    /// Classifier stub with a fixed probability for exercising the tiering.
    struct Fixed {
        p: f64,
        d: usize,
    }

    impl Classifier for Fixed {
        fn fit(&mut self, x: ArrayView2<f32>, _y: ArrayView1<bool>) -> Result<()> {
            self.d = x.ncols();
            Ok(())
        }

        fn predict_proba(&self, x: ArrayView2<f32>) -> Result<Array1<f64>> {
            Ok(Array1::from_elem(x.nrows(), self.p))
        }

        fn n_features(&self) -> Option<usize> {
            Some(self.d)
        }
    }

    fn records() -> Vec<FlightRecord> {
        (0..20)
            .map(|i| FlightRecord {
                carrier: if i % 2 == 0 { "A" } else { "B" }.into(),
                origin: "X".into(),
                destination: "Y".into(),
                weather: if i % 5 == 0 { "Rain" } else { "Clear" }.into(),
                scheduled_hour: (i % 24) as u8,
                departure_delay_minutes: if i % 5 == 0 { 60.0 } else { 0.0 },
                date: None,
            })
            .collect()
    }

    fn with_probability(p: f64) -> Predictor<Fixed> {
        let trainer = Trainer::new(TrainConfig::default()).unwrap();
        let (artifact, _) = trainer.train_with(&records(), Fixed { p, d: 0 }).unwrap();
        Predictor::from_artifact(artifact).unwrap()
    }

    #[test]
    fn tiers_follow_probability_cuts() {
        let q = FlightQuery::new("A", "X", "Y", "Clear", 9);
        for (p, tier) in [
            (0.2999, Tier::Low),
            (0.30, Tier::Medium),
            (0.6999, Tier::Medium),
            (0.70, Tier::High),
            (1.0, Tier::High),
        ] {
            let r = with_probability(p).predict(&q).unwrap();
            assert_eq!(r.tier, tier, "p={p}");
            assert_eq!(r.delay_probability, p);
        }
    }

    #[test]
    fn default_label_rule_is_above_half() {
        let q = FlightQuery::new("A", "X", "Y", "Clear", 9);
        assert_eq!(with_probability(0.5).predict(&q).unwrap().label, Label::OnTime);
        assert_eq!(with_probability(0.51).predict(&q).unwrap().label, Label::Delayed);
    }

    #[test]
    fn unseen_values_still_predict() {
        let q = FlightQuery::new("NEW", "NOWHERE", "ELSEWHERE", "Hail", 4);
        let r = with_probability(0.1).predict(&q).unwrap();
        assert_eq!(r.tier, Tier::Low);
    }

    #[test]
    fn out_of_range_hour_is_rejected() {
        let q = FlightQuery::new("A", "X", "Y", "Clear", 24);
        assert!(matches!(
            with_probability(0.1).predict(&q),
            Err(Error::InvalidHour(24))
        ));
    }

    #[test]
    fn warmup_rejects_out_of_range_probability() {
        let trainer = Trainer::new(TrainConfig::default()).unwrap();
        let (artifact, _) = trainer
            .train_with(&records(), Fixed { p: 1.5, d: 0 })
            .unwrap();
        assert!(matches!(
            Predictor::from_artifact(artifact),
            Err(Error::Classifier(_))
        ));
    }
}
