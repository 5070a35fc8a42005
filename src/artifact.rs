//! Persisted model bundle.
//!
//! An artifact always carries the fitted classifier together with the
//! schema it was trained against, plus the format version and input width.
//! Loading validates all of them; a file that fails any check is rejected
//! as a whole.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::classifier::{Classifier, RandomForest};
use crate::error::{Error, Result};
use crate::schema::SchemaRegistry;
use crate::types::DELAY_THRESHOLD_MINUTES;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Deserialize)]
struct Header {
    format_version: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact<C = RandomForest> {
    format_version: u32,
    in_dim: usize,
    label_threshold_minutes: f64,
    trained_at: DateTime<Utc>,
    schema: SchemaRegistry,
    classifier: C,
}

impl<C: Classifier> ModelArtifact<C> {
    /// Bundles a fitted classifier with its schema.
    pub fn new(schema: SchemaRegistry, classifier: C) -> Result<Self> {
        let artifact = Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            in_dim: schema.len(),
            label_threshold_minutes: DELAY_THRESHOLD_MINUTES,
            trained_at: Utc::now(),
            schema,
            classifier,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn validate(&self) -> Result<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(Error::UnsupportedArtifactVersion {
                found: self.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }
        if self.in_dim != self.schema.len() {
            return Err(Error::SchemaMismatch {
                expected: self.schema.len(),
                found: self.in_dim,
            });
        }
        match self.classifier.n_features() {
            Some(d) if d == self.schema.len() => Ok(()),
            Some(d) => Err(Error::SchemaMismatch {
                expected: self.schema.len(),
                found: d,
            }),
            None => Err(Error::Classifier(
                "artifact holds an unfitted or malformed classifier".into(),
            )),
        }
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn label_threshold_minutes(&self) -> f64 {
        self.label_threshold_minutes
    }
}

impl<C: Classifier + Serialize> ModelArtifact<C> {
    /// Writes the artifact, replacing whatever is at `path`. The bytes go
    /// to `<path>.tmp` first, which never outlives a failed save.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_vec(self)?;
        let tmp = tmp_path(path);
        if let Err(e) = fs::write(&tmp, json) {
            let _ = fs::remove_file(&tmp);
            return Err(Error::io(tmp, e));
        }
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(Error::io(path, e));
        }
        tracing::info!(
            "saved model artifact to {} ({} features)",
            path.display(),
            self.in_dim
        );
        Ok(())
    }
}

/// `model.json` -> `model.json.tmp`, so sibling artifacts never share one.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

impl<C: Classifier + DeserializeOwned> ModelArtifact<C> {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        // version first, so an old file reports that instead of a field error
        let header: Header = serde_json::from_str(text)?;
        if header.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(Error::UnsupportedArtifactVersion {
                found: header.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }
        let artifact: Self = serde_json::from_str(text)?;
        artifact.validate()?;
        Ok(artifact)
    }
}
