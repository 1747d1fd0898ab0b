use career_ml::core::ConfigProvider;
use career_ml::domain::model::LoadOutcome;
use career_ml::utils::{logger, validation::Validate};
use career_ml::{
    router, AppState, HttpEvaluationExport, LocalArtifactStore, ModelRegistry, RetrainEngine,
    RetrainWorker, RetrainingPipeline, ServiceConfig, TomlConfig,
};
use clap::Parser;
use std::sync::Arc;

fn or_exit<T>(result: career_ml::Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::parse();

    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting career-ml service");
    if config.verbose {
        tracing::debug!("Service config: {:?}", config);
    }

    or_exit(config.validate());

    let bind_address = config.bind_address();
    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    match config.config.clone() {
        Some(path) => {
            tracing::info!("Loading settings from {}", path);
            let toml_config = or_exit(TomlConfig::from_file(&path));
            or_exit(toml_config.validate());
            serve(toml_config, &bind_address, monitor_enabled).await
        }
        None => serve(config, &bind_address, monitor_enabled).await,
    }
}

async fn serve<C>(config: C, bind_address: &str, monitor_enabled: bool) -> anyhow::Result<()>
where
    C: ConfigProvider + 'static,
{
    let store = LocalArtifactStore::new(config.model_dir());
    let registry = Arc::new(ModelRegistry::new(store.clone()));

    match registry.load_latest().await {
        LoadOutcome::Loaded { version } => tracing::info!("📦 Serving model {}", version),
        LoadOutcome::NoModel => {
            tracing::warn!(
                "No model artifact in {}; predictions return 503 until retrained",
                config.model_dir()
            )
        }
        LoadOutcome::Failed { artifact, message } => {
            tracing::error!("Startup load of {} failed: {}", artifact, message)
        }
    }

    let source = HttpEvaluationExport::new(config.export_endpoint(), config.export_timeout());
    let pipeline = RetrainingPipeline::new(store, source, config);
    let engine = RetrainEngine::new_with_monitoring(pipeline, monitor_enabled);
    let retrainer = RetrainWorker::spawn(engine, Arc::clone(&registry));

    let app = router(Arc::new(AppState::new(registry, retrainer)));

    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    tracing::info!("🚀 Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
