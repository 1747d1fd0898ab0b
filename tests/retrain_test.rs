mod common;

use career_ml::core::ConfigProvider;
use career_ml::domain::model::RetrainOutcome;
use career_ml::{
    HttpEvaluationExport, LocalArtifactStore, ModelRegistry, RetrainEngine, RetrainWorker,
    RetrainingPipeline, TomlConfig,
};
use common::{artifact_files, config_for, tiny_model_bytes, write_dataset, UNREACHABLE_EXPORT};
use httpmock::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

type LocalPipeline = RetrainingPipeline<LocalArtifactStore, HttpEvaluationExport, TomlConfig>;

fn engine_for(config: TomlConfig) -> RetrainEngine<LocalPipeline> {
    let store = LocalArtifactStore::new(config.model_dir());
    let source = HttpEvaluationExport::new(config.export_endpoint(), config.export_timeout());
    RetrainEngine::new(RetrainingPipeline::new(store, source, config))
}

#[tokio::test]
async fn test_retrain_writes_one_newer_artifact() {
    let temp_dir = TempDir::new().unwrap();
    write_dataset(temp_dir.path());
    // Far-future name: the new artifact must still sort after it.
    let existing = "career_model_20990101_000000.pkl";
    std::fs::write(
        temp_dir.path().join(existing),
        tiny_model_bytes(["Data Scientist", "UX Designer"]),
    )
    .unwrap();

    let engine = engine_for(config_for(temp_dir.path(), UNREACHABLE_EXPORT, false));
    let outcome = engine.run().await;

    match &outcome {
        RetrainOutcome::Success {
            model_version,
            trained_at,
            data_points,
        } => {
            assert_eq!(*data_points, 4);
            assert_eq!(model_version, "career_model_20990101_000001.pkl");
            assert_eq!(trained_at, "20990101_000001");
        }
        RetrainOutcome::Error { message } => panic!("retrain failed: {}", message),
    }

    let files = artifact_files(temp_dir.path());
    assert_eq!(files.len(), 2);
    assert!(files[1].as_str() > existing);

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["data_points"], 4);
}

#[tokio::test]
async fn test_missing_dataset_reports_error_and_changes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(temp_dir.path(), UNREACHABLE_EXPORT, false);

    let registry = Arc::new(ModelRegistry::new(LocalArtifactStore::new(temp_dir.path())));
    let worker = RetrainWorker::spawn(engine_for(config), Arc::clone(&registry));

    let outcome = worker.submit().await;
    match &outcome {
        RetrainOutcome::Error { message } => assert!(message.contains("dataset.csv")),
        other => panic!("expected error, got {:?}", other),
    }

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "error");
    assert!(artifact_files(temp_dir.path()).is_empty());
    assert!(!registry.is_loaded());
    assert_eq!(registry.version(), "v1-init");
}

#[tokio::test]
async fn test_worker_reloads_registry_after_success() {
    let temp_dir = TempDir::new().unwrap();
    write_dataset(temp_dir.path());
    let config = config_for(temp_dir.path(), UNREACHABLE_EXPORT, false);

    let registry = Arc::new(ModelRegistry::new(LocalArtifactStore::new(temp_dir.path())));
    let worker = RetrainWorker::spawn(engine_for(config), Arc::clone(&registry));

    let outcome = worker.submit().await;
    let RetrainOutcome::Success { model_version, .. } = outcome else {
        panic!("retrain failed: {:?}", outcome);
    };

    assert!(registry.is_loaded());
    assert_eq!(registry.version(), model_version);
    let loaded = registry.current().unwrap();
    assert_eq!(loaded.model.classes(), ["Data Scientist", "UX Designer"]);
}

#[tokio::test]
async fn test_export_rows_merged_when_enabled() {
    let temp_dir = TempDir::new().unwrap();
    write_dataset(temp_dir.path());

    let server = MockServer::start_async().await;
    let export_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/evaluation/export");
            then.status(200).json_body(serde_json::json!([
                {"role": "Backend Developer", "education": "BSc", "startSkills": "rust;sql", "finalCompletionRate": 0.8, "outcome": "Completed"},
                {"role": "Backend Developer", "education": "BEng", "startSkills": "go;docker", "finalCompletionRate": 0.6, "outcome": "Completed"},
                {"role": "Unknown", "education": "BSc", "startSkills": "excel", "finalCompletionRate": 0.1, "outcome": "Dropped"}
            ]));
        })
        .await;

    let engine = engine_for(config_for(
        temp_dir.path(),
        &server.url("/api/evaluation/export"),
        true,
    ));
    let outcome = engine.run().await;

    export_mock.assert_async().await;
    match outcome {
        RetrainOutcome::Success { data_points, .. } => assert_eq!(data_points, 6),
        RetrainOutcome::Error { message } => panic!("retrain failed: {}", message),
    }
}

#[tokio::test]
async fn test_export_ignored_when_merge_disabled() {
    let temp_dir = TempDir::new().unwrap();
    write_dataset(temp_dir.path());

    let server = MockServer::start_async().await;
    let export_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/evaluation/export");
            then.status(200).json_body(serde_json::json!([
                {"role": "Backend Developer", "education": "BSc", "startSkills": "rust;sql"}
            ]));
        })
        .await;

    let engine = engine_for(config_for(
        temp_dir.path(),
        &server.url("/api/evaluation/export"),
        false,
    ));
    let outcome = engine.run().await;

    export_mock.assert_async().await;
    match outcome {
        RetrainOutcome::Success { data_points, .. } => assert_eq!(data_points, 4),
        RetrainOutcome::Error { message } => panic!("retrain failed: {}", message),
    }
}

#[tokio::test]
async fn test_failing_export_does_not_fail_retrain() {
    let temp_dir = TempDir::new().unwrap();
    write_dataset(temp_dir.path());

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/evaluation/export");
            then.status(500);
        })
        .await;

    let engine = engine_for(config_for(
        temp_dir.path(),
        &server.url("/api/evaluation/export"),
        true,
    ));

    assert!(engine.run().await.is_success());
    assert_eq!(artifact_files(temp_dir.path()).len(), 1);
}

#[tokio::test]
async fn test_unreachable_export_does_not_fail_retrain() {
    let temp_dir = TempDir::new().unwrap();
    write_dataset(temp_dir.path());

    let engine = engine_for(config_for(temp_dir.path(), UNREACHABLE_EXPORT, true));
    assert!(engine.run().await.is_success());
}

#[tokio::test]
async fn test_dataset_with_job_role_header() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("dataset.csv"),
        "Education,Skills,Interests,Job_Role\n\
         BSc,python sql,data,Data Scientist\n\
         BA,figma,art,UX Designer\n",
    )
    .unwrap();

    let engine = engine_for(config_for(temp_dir.path(), UNREACHABLE_EXPORT, false));
    let outcome = engine.run().await;
    assert!(outcome.is_success(), "{:?}", outcome);
}
