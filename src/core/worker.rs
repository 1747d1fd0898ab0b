//! Single-worker execution context for retraining.
//!
//! Submissions queue on a channel and run one at a time; each caller gets a
//! oneshot receiver for its outcome. The HTTP handler still awaits that result
//! inline, so a retrain blocks the request that triggered it.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::core::engine::RetrainEngine;
use crate::core::registry::ModelRegistry;
use crate::domain::model::{LoadOutcome, RetrainOutcome};
use crate::domain::ports::{ArtifactStore, Pipeline};

const QUEUE_DEPTH: usize = 8;

struct RetrainJob {
    resp: oneshot::Sender<RetrainOutcome>,
}

#[derive(Clone)]
pub struct RetrainWorker {
    tx: mpsc::Sender<RetrainJob>,
}

impl RetrainWorker {
    /// Spawns the worker task on the current tokio runtime. After every
    /// successful run the registry is reloaded before the caller is answered.
    pub fn spawn<P, S>(engine: RetrainEngine<P>, registry: Arc<ModelRegistry<S>>) -> Self
    where
        P: Pipeline + 'static,
        S: ArtifactStore + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<RetrainJob>(QUEUE_DEPTH);

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let outcome = engine.run().await;
                if outcome.is_success() {
                    match registry.load_latest().await {
                        LoadOutcome::Loaded { version } => {
                            tracing::info!("🔄 Registry now serving {}", version)
                        }
                        other => tracing::warn!("Reload after retraining did not swap: {:?}", other),
                    }
                }
                if job.resp.send(outcome).is_err() {
                    tracing::debug!("Retrain caller went away before the result was ready");
                }
            }
            tracing::debug!("Retrain worker stopped");
        });

        Self { tx }
    }

    /// Queues a retraining run and waits for its outcome.
    pub async fn submit(&self) -> RetrainOutcome {
        let (resp, rx) = oneshot::channel();
        if self.tx.send(RetrainJob { resp }).await.is_err() {
            return RetrainOutcome::Error {
                message: "retraining worker is not running".to_string(),
            };
        }
        rx.await.unwrap_or_else(|_| RetrainOutcome::Error {
            message: "retraining worker dropped the job".to_string(),
        })
    }
}
