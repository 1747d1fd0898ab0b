pub mod dataset;
pub mod engine;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod prediction;
pub mod registry;
pub mod worker;

pub use crate::domain::model::{PredictionRequest, PredictionResult, RetrainOutcome, TrainingRow};
pub use crate::domain::ports::{ArtifactStore, ConfigProvider, EvaluationSource, Pipeline};
pub use crate::utils::error::Result;
