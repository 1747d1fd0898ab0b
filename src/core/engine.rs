use std::fmt;

use crate::core::Pipeline;
use crate::domain::model::RetrainOutcome;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrainStage {
    Idle,
    Fetching,
    DatasetLoaded,
    FeatureBuilt,
    Trained,
    Persisted,
}

impl fmt::Display for RetrainStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::DatasetLoaded => "dataset loaded",
            Self::FeatureBuilt => "features built",
            Self::Trained => "trained",
            Self::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Drives a retraining [`Pipeline`] and turns any failure into a
/// [`RetrainOutcome::Error`] so callers on the serving path never see an `Err`.
pub struct RetrainEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> RetrainEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> RetrainOutcome {
        self.monitor.reset();
        let mut stage = RetrainStage::Idle;

        match self.run_stages(&mut stage).await {
            Ok(outcome) => {
                self.monitor.log_final_stats();
                outcome
            }
            Err(e) => {
                tracing::error!(
                    "❌ Retraining failed after stage '{}': {} (Category: {:?}, Severity: {:?})",
                    stage,
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                RetrainOutcome::Error {
                    message: e.to_string(),
                }
            }
        }
    }

    fn advance(&self, stage: &mut RetrainStage, next: RetrainStage) {
        tracing::debug!("Retraining stage: {} -> {}", stage, next);
        *stage = next;
        self.monitor.log_stats(&next.to_string());
    }

    async fn run_stages(&self, stage: &mut RetrainStage) -> Result<RetrainOutcome> {
        tracing::info!("Starting retraining...");
        self.advance(stage, RetrainStage::Fetching);

        let rows = self.pipeline.extract().await?;
        let data_points = rows.len();
        self.advance(stage, RetrainStage::DatasetLoaded);
        tracing::info!("Training on {} rows", data_points);

        // Feature construction and fitting share one stage call; the model only
        // exists once both have succeeded.
        self.advance(stage, RetrainStage::FeatureBuilt);
        let model = self.pipeline.transform(rows).await?;
        self.advance(stage, RetrainStage::Trained);
        tracing::info!(
            "Model fitted: {} classes, {} terms",
            model.classes().len(),
            model.vocabulary_size()
        );

        let persisted = self.pipeline.load(model).await?;
        self.advance(stage, RetrainStage::Persisted);
        tracing::info!("✅ Saved new model version {}", persisted.version);

        Ok(RetrainOutcome::Success {
            model_version: persisted.version,
            trained_at: persisted.trained_at,
            data_points,
        })
    }
}
