use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::core::prediction::PredictionService;
use crate::core::registry::ModelRegistry;
use crate::core::worker::RetrainWorker;
use crate::domain::model::{
    LoadOutcome, PredictionRequest, PredictionResult, RetrainOutcome, INIT_VERSION,
};
use crate::domain::ports::ArtifactStore;
use crate::utils::error::ServiceError;

pub struct AppState<S: ArtifactStore> {
    pub registry: Arc<ModelRegistry<S>>,
    pub predictor: PredictionService<S>,
    pub retrainer: RetrainWorker,
}

impl<S: ArtifactStore> AppState<S> {
    pub fn new(registry: Arc<ModelRegistry<S>>, retrainer: RetrainWorker) -> Self {
        Self {
            predictor: PredictionService::new(Arc::clone(&registry)),
            registry,
            retrainer,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub model_version: String,
}

#[derive(Debug, Serialize)]
pub struct ForceLoadResponse {
    pub status: String,
    pub model_version: String,
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!("Request failed: {} (Category: {:?})", self, self.category());
        }
        (
            status,
            Json(ErrorResponse {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Loaded flag and version read from one registry snapshot.
fn model_status<S: ArtifactStore>(registry: &ModelRegistry<S>) -> (bool, String) {
    match registry.current() {
        Some(loaded) => (true, loaded.version.clone()),
        None => (false, INIT_VERSION.to_string()),
    }
}

pub fn router<S: ArtifactStore + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/predict-career", post(predict_career::<S>))
        .route("/retrain", post(retrain::<S>))
        .route("/health", get(health::<S>))
        .route("/force-load", post(force_load::<S>))
        .with_state(state)
}

/// POST /predict-career
async fn predict_career<S: ArtifactStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<PredictionResult>, ServiceError> {
    state.predictor.predict(&request).map(Json)
}

/// POST /retrain - runs synchronously and answers with the pipeline outcome verbatim.
async fn retrain<S: ArtifactStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<RetrainOutcome> {
    Json(state.retrainer.submit().await)
}

/// GET /health
async fn health<S: ArtifactStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<HealthResponse> {
    let (model_loaded, model_version) = model_status(&state.registry);
    Json(HealthResponse {
        status: "ok".to_string(),
        model_loaded,
        model_version,
    })
}

/// POST /force-load
async fn force_load<S: ArtifactStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<ForceLoadResponse> {
    let error = match state.registry.load_latest().await {
        LoadOutcome::Loaded { .. } => None,
        LoadOutcome::NoModel => Some("no model artifact found".to_string()),
        LoadOutcome::Failed { artifact, message } => {
            Some(format!("failed to load {}: {}", artifact, message))
        }
    };

    let (loaded, model_version) = model_status(&state.registry);
    Json(ForceLoadResponse {
        status: "reloaded".to_string(),
        model_version,
        loaded,
        error,
    })
}
