mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use career_ml::core::ConfigProvider;
use career_ml::{
    router, AppState, HttpEvaluationExport, LocalArtifactStore, ModelRegistry, RetrainEngine,
    RetrainWorker, RetrainingPipeline,
};
use common::{config_for, tiny_model_bytes, write_dataset, UNREACHABLE_EXPORT};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn app_for(model_dir: &Path) -> Router {
    let config = config_for(model_dir, UNREACHABLE_EXPORT, false);
    let store = LocalArtifactStore::new(config.model_dir());
    let registry = Arc::new(ModelRegistry::new(store.clone()));
    let source = HttpEvaluationExport::new(config.export_endpoint(), config.export_timeout());
    let engine = RetrainEngine::new(RetrainingPipeline::new(store, source, config));
    let retrainer = RetrainWorker::spawn(engine, Arc::clone(&registry));
    router(Arc::new(AppState::new(registry, retrainer)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn sample_request() -> Value {
    json!({
        "education": "BSc Computer Science",
        "skills": ["python", "sql"],
        "interests": "data analysis"
    })
}

#[tokio::test]
async fn test_health_before_any_model() {
    let temp_dir = TempDir::new().unwrap();
    let app = app_for(temp_dir.path());

    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "ok", "model_loaded": false, "model_version": "v1-init"})
    );
}

#[tokio::test]
async fn test_predict_without_model_is_503() {
    let temp_dir = TempDir::new().unwrap();
    let app = app_for(temp_dir.path());

    let (status, body) = send(&app, "POST", "/predict-career", Some(sample_request())).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"detail": "Model not loaded"}));
}

#[tokio::test]
async fn test_retrain_then_predict() {
    let temp_dir = TempDir::new().unwrap();
    write_dataset(temp_dir.path());
    let app = app_for(temp_dir.path());

    let (status, retrained) = send(&app, "POST", "/retrain", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(retrained["status"], "success");
    assert_eq!(retrained["data_points"], 4);
    let version = retrained["model_version"].as_str().unwrap().to_string();

    let (status, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["model_loaded"], true);
    assert_eq!(health["model_version"], version.as_str());

    let (status, body) = send(&app, "POST", "/predict-career", Some(sample_request())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["model_version"], version.as_str());
    assert_eq!(body["meta"]["model_type"], "RandomForest");

    let careers = body["recommendedCareers"].as_array().unwrap();
    assert!(!careers.is_empty() && careers.len() <= 2);
    let confidences: Vec<f64> = careers
        .iter()
        .map(|c| c["confidence"].as_f64().unwrap())
        .collect();
    assert!(confidences.iter().all(|c| *c > 0.01 && *c <= 1.0));
    assert!(confidences.windows(2).all(|w| w[0] >= w[1]));
    for career in careers {
        let role = career["role"].as_str().unwrap();
        assert!(role == "Data Scientist" || role == "UX Designer");
    }
}

#[tokio::test]
async fn test_retrain_without_dataset_returns_error_body() {
    let temp_dir = TempDir::new().unwrap();
    let app = app_for(temp_dir.path());

    let (status, body) = send(&app, "POST", "/retrain", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("dataset.csv"));

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["model_loaded"], false);
}

#[tokio::test]
async fn test_force_load_picks_up_new_artifact() {
    let temp_dir = TempDir::new().unwrap();
    let app = app_for(temp_dir.path());

    let (status, body) = send(&app, "POST", "/force-load", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "reloaded");
    assert_eq!(body["loaded"], false);
    assert_eq!(body["model_version"], "v1-init");

    std::fs::write(
        temp_dir.path().join("career_model_20240101_120000.pkl"),
        tiny_model_bytes(["Data Scientist", "UX Designer"]),
    )
    .unwrap();

    let (status, body) = send(&app, "POST", "/force-load", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "reloaded");
    assert_eq!(body["loaded"], true);
    assert_eq!(body["model_version"], "career_model_20240101_120000.pkl");

    let (status, _) = send(&app, "POST", "/predict-career", Some(sample_request())).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_predict_rejects_malformed_body() {
    let temp_dir = TempDir::new().unwrap();
    let app = app_for(temp_dir.path());

    let (status, _) = send(
        &app,
        "POST",
        "/predict-career",
        Some(json!({"education": "BSc", "skills": "python"})),
    )
    .await;

    assert!(status.is_client_error());
}
