use crate::core::model::CareerModel;
use crate::domain::model::{
    ColumnSynonyms, ExportRecord, PersistedArtifact, StoredFile, TrainingRow,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Flat file storage holding model artifacts and the training dataset.
pub trait ArtifactStore: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn list_files(&self) -> impl std::future::Future<Output = Result<Vec<StoredFile>>> + Send;
}

/// Source of freshly labeled examples from the evaluation backend.
pub trait EvaluationSource: Send + Sync {
    fn fetch(&self) -> impl std::future::Future<Output = Result<Vec<ExportRecord>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn model_dir(&self) -> &str;
    fn dataset_file(&self) -> &str;
    fn export_endpoint(&self) -> &str;
    fn export_timeout(&self) -> Duration;
    fn merge_export(&self) -> bool;
    fn column_synonyms(&self) -> &ColumnSynonyms;
}

/// The three stages of a retraining run. Persistence happens only in `load`.
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<TrainingRow>>;
    async fn transform(&self, rows: Vec<TrainingRow>) -> Result<CareerModel>;
    async fn load(&self, model: CareerModel) -> Result<PersistedArtifact>;
}
