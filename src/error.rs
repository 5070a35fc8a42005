use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid record at row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },

    #[error("dataset contains no records")]
    EmptyDataset,

    #[error("scheduled hour {0} is outside 0..=23")]
    InvalidHour(u8),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported artifact format version {found} (expected {expected})")]
    UnsupportedArtifactVersion { found: u32, expected: u32 },

    #[error("feature length mismatch: schema has {expected} columns, got {found}")]
    SchemaMismatch { expected: usize, found: usize },

    #[error("invalid schema column {column:?}: {reason}")]
    InvalidColumn { column: String, reason: String },

    #[error("invalid training config: {0}")]
    InvalidConfig(String),

    #[error("classifier error: {0}")]
    Classifier(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
