//! Flight departure delay prediction engine.
//!
//! Training turns historical flights into a [`ModelArtifact`] holding a
//! fitted classifier and the [`SchemaRegistry`] of feature columns it was
//! fitted on. Inference encodes a [`FlightQuery`] against that same registry,
//! so the vector handed to the classifier always has the training-time
//! column order, and buckets the delay probability into a [`Tier`].

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod predictor;
pub mod schema;
pub mod server;
pub mod state;
pub mod trainer;
pub mod types;

pub use artifact::ModelArtifact;
pub use classifier::{Classifier, RandomForest};
pub use config::TrainConfig;
pub use encoder::{encode, FeatureSource, FeatureVector};
pub use error::{Error, Result};
pub use predictor::{predict, Predictor};
pub use schema::{build_schema, SchemaRegistry};
pub use trainer::{Trainer, TrainingReport};
pub use types::{
    CategoricalField, FlightQuery, FlightRecord, Label, PredictionResult, Tier,
    DELAY_THRESHOLD_MINUTES, HIGH_TIER_FLOOR, LOW_TIER_CEILING,
};
