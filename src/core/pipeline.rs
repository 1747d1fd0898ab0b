//! Retraining stages: fetch + dataset load, fit, persist.

use chrono::{Local, NaiveDateTime, TimeDelta};

use crate::core::dataset::{parse_dataset, rows_from_export};
use crate::core::features::row_feature_text;
use crate::core::model::{CareerModel, ForestParams};
use crate::core::registry::{artifact_name, ARTIFACT_PREFIX, ARTIFACT_SUFFIX, TIMESTAMP_FORMAT};
use crate::domain::model::{PersistedArtifact, TrainingRow};
use crate::domain::ports::{ArtifactStore, ConfigProvider, EvaluationSource, Pipeline};
use crate::utils::error::{Result, ServiceError};

fn artifact_timestamp(name: &str) -> Option<NaiveDateTime> {
    let stamp = name.strip_prefix(ARTIFACT_PREFIX)?.strip_suffix(ARTIFACT_SUFFIX)?;
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

/// `now`, unless an existing artifact is at or past it; then one second after the newest.
pub fn next_artifact_time<'a>(
    now: NaiveDateTime,
    existing: impl IntoIterator<Item = &'a str>,
) -> NaiveDateTime {
    let newest = existing.into_iter().filter_map(artifact_timestamp).max();
    match newest {
        Some(newest) if newest >= now => newest + TimeDelta::seconds(1),
        _ => now,
    }
}

pub struct RetrainingPipeline<S: ArtifactStore, E: EvaluationSource, C: ConfigProvider> {
    store: S,
    source: E,
    config: C,
    params: ForestParams,
}

impl<S: ArtifactStore, E: EvaluationSource, C: ConfigProvider> RetrainingPipeline<S, E, C> {
    pub fn new(store: S, source: E, config: C) -> Self {
        Self {
            store,
            source,
            config,
            params: ForestParams::default(),
        }
    }

    /// Never fails: an unreachable export only means training on the dataset alone.
    async fn fetch_export_rows(&self) -> Vec<TrainingRow> {
        tracing::info!("Fetching data from {}...", self.config.export_endpoint());
        match self.source.fetch().await {
            Ok(records) if self.config.merge_export() => {
                let rows = rows_from_export(&records);
                tracing::info!(
                    "Merging {} of {} exported evaluation rows",
                    rows.len(),
                    records.len()
                );
                rows
            }
            Ok(records) => {
                tracing::info!(
                    "Export returned {} rows; merging is disabled",
                    records.len()
                );
                Vec::new()
            }
            Err(e) if e.is_expected_unavailability() => {
                tracing::info!(
                    "Could not fetch new data, retraining on existing dataset only: {}",
                    e
                );
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(
                    "Unexpected error fetching export, retraining on existing dataset only: {}",
                    e
                );
                Vec::new()
            }
        }
    }

    async fn read_dataset(&self) -> Result<Vec<TrainingRow>> {
        let path = self.config.dataset_file();
        let data = self.store.read_file(path).await.map_err(|e| match e {
            ServiceError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
                ServiceError::DatasetMissing {
                    path: path.to_string(),
                }
            }
            other => other,
        })?;
        parse_dataset(&data, self.config.column_synonyms())
    }
}

#[async_trait::async_trait]
impl<S, E, C> Pipeline for RetrainingPipeline<S, E, C>
where
    S: ArtifactStore,
    E: EvaluationSource,
    C: ConfigProvider,
{
    async fn extract(&self) -> Result<Vec<TrainingRow>> {
        let exported = self.fetch_export_rows().await;

        let mut rows = self.read_dataset().await?;
        tracing::debug!("Loaded {} rows from {}", rows.len(), self.config.dataset_file());
        rows.extend(exported);

        if rows.is_empty() {
            return Err(ServiceError::retraining("dataset has no rows"));
        }
        Ok(rows)
    }

    async fn transform(&self, rows: Vec<TrainingRow>) -> Result<CareerModel> {
        let (documents, labels): (Vec<String>, Vec<String>) = rows
            .into_iter()
            .map(|row| (row_feature_text(&row), row.career_label))
            .unzip();
        tracing::debug!("Built {} feature strings", documents.len());

        let params = self.params;
        tokio::task::spawn_blocking(move || CareerModel::fit(&documents, &labels, params))
            .await
            .map_err(|e| ServiceError::retraining(format!("training task aborted: {}", e)))?
    }

    async fn load(&self, model: CareerModel) -> Result<PersistedArtifact> {
        let existing = self.store.list_files().await?;
        let at = next_artifact_time(
            Local::now().naive_local(),
            existing.iter().map(|f| f.name.as_str()),
        );
        let trained_at = at.format(TIMESTAMP_FORMAT).to_string();
        let version = artifact_name(&trained_at);

        let bytes = model.to_bytes()?;
        tracing::debug!("Writing artifact {} ({} bytes)", version, bytes.len());
        self.store.write_file(&version, &bytes).await?;

        Ok(PersistedArtifact {
            version,
            trained_at,
        })
    }
}
