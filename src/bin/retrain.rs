//! One-shot retraining: runs the pipeline against the configured model
//! directory, prints the outcome as JSON and exits non-zero on failure.

use career_ml::core::ConfigProvider;
use career_ml::domain::model::RetrainOutcome;
use career_ml::utils::{logger, validation::Validate};
use career_ml::{
    HttpEvaluationExport, LocalArtifactStore, RetrainEngine, RetrainingPipeline, ServiceConfig,
    TomlConfig,
};
use clap::Parser;

async fn run_once<C: ConfigProvider + 'static>(config: C, monitor_enabled: bool) -> RetrainOutcome {
    let store = LocalArtifactStore::new(config.model_dir());
    let source = HttpEvaluationExport::new(config.export_endpoint(), config.export_timeout());
    let pipeline = RetrainingPipeline::new(store, source, config);
    RetrainEngine::new_with_monitoring(pipeline, monitor_enabled)
        .run()
        .await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::parse();

    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    let monitor_enabled = config.monitor;
    let outcome = match config.config.clone() {
        Some(path) => match TomlConfig::from_file(&path).and_then(|c| c.validate().map(|_| c)) {
            Ok(toml_config) => run_once(toml_config, monitor_enabled).await,
            Err(e) => RetrainOutcome::Error {
                message: e.to_string(),
            },
        },
        None => match config.validate() {
            Ok(()) => run_once(config, monitor_enabled).await,
            Err(e) => RetrainOutcome::Error {
                message: e.to_string(),
            },
        },
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
