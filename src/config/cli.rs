use crate::core::ConfigProvider;
use crate::domain::model::ColumnSynonyms;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extension, validate_path, validate_positive_number, validate_range,
    validate_url, Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_EXPORT_ENDPOINT: &str = "http://localhost:5000/api/evaluation/export";

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "career-ml")]
#[command(about = "Career recommendation model server with on-demand retraining")]
pub struct ServiceConfig {
    #[arg(long, env = "CAREER_ML_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "CAREER_ML_PORT", default_value = "8000")]
    pub port: u16,

    /// Directory holding model artifacts and the training dataset
    #[arg(long, env = "CAREER_ML_MODEL_DIR", default_value = "./models")]
    pub model_dir: String,

    /// Training CSV, relative to the model directory unless absolute
    #[arg(long, env = "CAREER_ML_DATASET_FILE", default_value = "dataset.csv")]
    pub dataset_file: String,

    #[arg(long, env = "CAREER_ML_EXPORT_ENDPOINT", default_value = DEFAULT_EXPORT_ENDPOINT)]
    pub export_endpoint: String,

    #[arg(long, env = "CAREER_ML_EXPORT_TIMEOUT_SECS", default_value = "2")]
    pub export_timeout_secs: u64,

    /// Append exported evaluation rows to the dataset when retraining
    #[arg(long, env = "CAREER_ML_MERGE_EXPORT")]
    pub merge_export: bool,

    /// TOML file overriding the artifact, dataset and export settings
    #[arg(long, env = "CAREER_ML_CONFIG")]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage during retraining")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(skip)]
    #[serde(default)]
    pub column_synonyms: ColumnSynonyms,
}

impl ServiceConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ConfigProvider for ServiceConfig {
    fn model_dir(&self) -> &str {
        &self.model_dir
    }

    fn dataset_file(&self) -> &str {
        &self.dataset_file
    }

    fn export_endpoint(&self) -> &str {
        &self.export_endpoint
    }

    fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_secs)
    }

    fn merge_export(&self) -> bool {
        self.merge_export
    }

    fn column_synonyms(&self) -> &ColumnSynonyms {
        &self.column_synonyms
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("port", usize::from(self.port), 1)?;
        validate_path("model_dir", &self.model_dir)?;
        validate_file_extension("dataset_file", &self.dataset_file, &["csv"])?;
        validate_url("export_endpoint", &self.export_endpoint)?;
        validate_range("export_timeout_secs", self.export_timeout_secs, 1, 60)?;
        Ok(())
    }
}
