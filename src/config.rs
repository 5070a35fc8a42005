use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::error::{Error, Result};

/// Parameters for a training run. Defaults reproduce the reference model:
/// 100 fully grown trees over bootstrap samples, 80/20 split, seed 42.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrainConfig {
    pub n_trees: usize,
    /// `None` grows every tree until its leaves are pure.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Candidate features per split; `None` means `sqrt(n_features)`.
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
    /// Share of rows held out for evaluation.
    pub test_fraction: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
            test_fraction: 0.2,
        }
    }
}

impl TrainConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let cfg: TrainConfig = serde_json::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(Error::InvalidConfig("n_trees must be at least 1".into()));
        }
        if self.min_samples_split < 2 {
            return Err(Error::InvalidConfig(
                "min_samples_split must be at least 2".into(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(Error::InvalidConfig(
                "min_samples_leaf must be at least 1".into(),
            ));
        }
        if self.max_features == Some(0) {
            return Err(Error::InvalidConfig("max_features must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&self.test_fraction) {
            return Err(Error::InvalidConfig(format!(
                "test_fraction {} is outside [0, 1)",
                self.test_fraction
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"n_trees": 10, "seed": 7}}"#).unwrap();

        let cfg = TrainConfig::load(f.path()).unwrap();
        assert_eq!(cfg.n_trees, 10);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.test_fraction, 0.2);
        assert!(cfg.bootstrap);
    }

    #[test]
    fn rejects_bad_values() {
        let cfg = TrainConfig {
            n_trees: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));

        let cfg = TrainConfig {
            test_fraction: 1.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = TrainConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
