pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::ServiceConfig;
pub use config::TomlConfig;

pub use adapters::{HttpEvaluationExport, LocalArtifactStore};
pub use app::{router, AppState};
pub use core::{
    engine::RetrainEngine, pipeline::RetrainingPipeline, prediction::PredictionService,
    registry::ModelRegistry, worker::RetrainWorker,
};
pub use utils::error::{Result, ServiceError};
