// Adapters layer: concrete implementations of the domain ports.

pub mod export;
pub mod storage;

pub use export::HttpEvaluationExport;
pub use storage::LocalArtifactStore;
