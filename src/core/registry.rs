//! Model registry: owns the active artifact and swaps it atomically on reload.

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::model::CareerModel;
use crate::domain::model::{LoadOutcome, StoredFile, INIT_VERSION};
use crate::domain::ports::ArtifactStore;
use crate::utils::error::{Result, ServiceError};

pub const ARTIFACT_PREFIX: &str = "career_model_";
pub const ARTIFACT_SUFFIX: &str = ".pkl";
pub const FALLBACK_ARTIFACT: &str = "model.joblib";
/// Sorts lexicographically in chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub fn artifact_name(timestamp: &str) -> String {
    format!("{}{}{}", ARTIFACT_PREFIX, timestamp, ARTIFACT_SUFFIX)
}

/// `career_model_*.pkl`
pub fn is_timestamped_artifact(name: &str) -> bool {
    name.len() > ARTIFACT_PREFIX.len() + ARTIFACT_SUFFIX.len()
        && name.starts_with(ARTIFACT_PREFIX)
        && name.ends_with(ARTIFACT_SUFFIX)
}

/// Newest timestamped artifact by creation time, falling back to the default file.
/// Equal timestamps are broken by file name.
pub fn select_latest(files: &[StoredFile]) -> Option<&StoredFile> {
    files
        .iter()
        .filter(|f| is_timestamped_artifact(&f.name))
        .max_by(|a, b| a.created.cmp(&b.created).then_with(|| a.name.cmp(&b.name)))
        .or_else(|| files.iter().find(|f| f.name == FALLBACK_ARTIFACT))
}

/// An artifact and the version string it was loaded under. Swapped as one unit.
#[derive(Debug)]
pub struct LoadedModel {
    pub model: CareerModel,
    pub version: String,
}

pub struct ModelRegistry<S: ArtifactStore> {
    store: S,
    current: ArcSwapOption<LoadedModel>,
    reload_lock: Mutex<()>,
}

impl<S: ArtifactStore> ModelRegistry<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            current: ArcSwapOption::empty(),
            reload_lock: Mutex::new(()),
        }
    }

    /// Loads the newest artifact from the store and swaps it in. Failures are
    /// logged and reported in the outcome; the previous model stays active.
    pub async fn load_latest(&self) -> LoadOutcome {
        let _guard = self.reload_lock.lock().await;

        let files = match self.store.list_files().await {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("❌ Could not list artifact store: {}", e);
                return LoadOutcome::Failed {
                    artifact: String::new(),
                    message: e.to_string(),
                };
            }
        };

        let Some(latest) = select_latest(&files) else {
            tracing::warn!(
                "No model found (looked for {}*{} and {}). Train one first.",
                ARTIFACT_PREFIX,
                ARTIFACT_SUFFIX,
                FALLBACK_ARTIFACT
            );
            return LoadOutcome::NoModel;
        };
        let version = latest.name.clone();

        tracing::info!("Loading model: {}", version);
        match self.read_artifact(&version).await {
            Ok(model) => {
                tracing::info!(
                    "✅ Model {} loaded ({} classes, {} terms, {} trees)",
                    version,
                    model.classes().len(),
                    model.vocabulary_size(),
                    model.n_trees()
                );
                self.current.store(Some(Arc::new(LoadedModel {
                    model,
                    version: version.clone(),
                })));
                LoadOutcome::Loaded { version }
            }
            Err(e) => {
                tracing::error!(
                    "❌ {} (Category: {:?}, Severity: {:?}); keeping version {}",
                    e,
                    e.category(),
                    e.severity(),
                    self.version()
                );
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                let message = match e {
                    ServiceError::ArtifactLoadFailure { message, .. } => message,
                    other => other.to_string(),
                };
                LoadOutcome::Failed {
                    artifact: version,
                    message,
                }
            }
        }
    }

    /// Reads and validates one artifact. Every failure is an `ArtifactLoadFailure`.
    async fn read_artifact(&self, name: &str) -> Result<CareerModel> {
        let bytes = self
            .store
            .read_file(name)
            .await
            .map_err(|e| ServiceError::ArtifactLoadFailure {
                artifact: name.to_string(),
                message: e.to_string(),
            })?;
        CareerModel::from_bytes(name, &bytes)
    }

    /// Snapshot of the active model; unaffected by reloads that happen afterwards.
    pub fn current(&self) -> Option<Arc<LoadedModel>> {
        self.current.load_full()
    }

    pub fn version(&self) -> String {
        match &*self.current.load() {
            Some(loaded) => loaded.version.clone(),
            None => INIT_VERSION.to_string(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }
}
