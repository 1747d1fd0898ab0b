use crate::core::ConfigProvider;
use crate::domain::model::{ColumnSynonyms, CANONICAL_COLUMNS};
use crate::utils::error::{Result, ServiceError};
use crate::utils::validation::{
    validate_file_extension, validate_path, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    pub model_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_dataset_file")]
    pub file: String,
    #[serde(default)]
    pub synonyms: ColumnSynonyms,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub merge: bool,
}

fn default_dataset_file() -> String {
    "dataset.csv".to_string()
}

fn default_export_endpoint() -> String {
    "http://localhost:5000/api/evaluation/export".to_string()
}

fn default_timeout_seconds() -> u64 {
    2
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            file: default_dataset_file(),
            synonyms: ColumnSynonyms::default(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            endpoint: default_export_endpoint(),
            timeout_seconds: default_timeout_seconds(),
            merge: false,
        }
    }
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(&path).map_err(|e| ServiceError::ConfigError {
                message: format!("cannot read {}: {}", path.as_ref().display(), e),
            })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ServiceError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }
}

impl ConfigProvider for TomlConfig {
    fn model_dir(&self) -> &str {
        &self.artifacts.model_dir
    }

    fn dataset_file(&self) -> &str {
        &self.dataset.file
    }

    fn export_endpoint(&self) -> &str {
        &self.export.endpoint
    }

    fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export.timeout_seconds)
    }

    fn merge_export(&self) -> bool {
        self.export.merge
    }

    fn column_synonyms(&self) -> &ColumnSynonyms {
        &self.dataset.synonyms
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_path("artifacts.model_dir", &self.artifacts.model_dir)?;
        validate_file_extension("dataset.file", &self.dataset.file, &["csv"])?;
        validate_url("export.endpoint", &self.export.endpoint)?;
        validate_range("export.timeout_seconds", self.export.timeout_seconds, 1, 60)?;

        for canonical in self.dataset.synonyms.synonyms.keys() {
            if !CANONICAL_COLUMNS.contains(&canonical.as_str()) {
                return Err(ServiceError::InvalidConfigValueError {
                    field: "dataset.synonyms".to_string(),
                    value: canonical.clone(),
                    reason: format!(
                        "Unknown column. Valid columns: {}",
                        CANONICAL_COLUMNS.join(", ")
                    ),
                });
            }
        }
        Ok(())
    }
}
