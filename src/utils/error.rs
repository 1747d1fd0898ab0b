use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Inference failed: {message}")]
    InferenceError { message: String },

    #[error("Dataset not found: {path}")]
    DatasetMissing { path: String },

    #[error("Retraining failed: {message}")]
    RetrainingFailure { message: String },

    #[error("Failed to load artifact {artifact}: {message}")]
    ArtifactLoadFailure { artifact: String, message: String },

    #[error("Evaluation export unavailable: {message}")]
    DataFetchFailure { message: String },

    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Model,
    Inference,
    Dataset,
    Network,
    Configuration,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ServiceError {
    pub fn retraining(message: impl Into<String>) -> Self {
        Self::RetrainingFailure {
            message: message.into(),
        }
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::InferenceError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ModelUnavailable | Self::ArtifactLoadFailure { .. } => ErrorCategory::Model,
            Self::InferenceError { .. } => ErrorCategory::Inference,
            Self::DatasetMissing { .. } | Self::RetrainingFailure { .. } | Self::CsvError(_) => {
                ErrorCategory::Dataset
            }
            Self::DataFetchFailure { .. } | Self::ApiError(_) => ErrorCategory::Network,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::DataFetchFailure { .. } | Self::ApiError(_) => ErrorSeverity::Low,
            Self::ModelUnavailable | Self::ArtifactLoadFailure { .. } => ErrorSeverity::Medium,
            Self::InferenceError { .. }
            | Self::DatasetMissing { .. }
            | Self::RetrainingFailure { .. }
            | Self::CsvError(_)
            | Self::SerializationError(_) => ErrorSeverity::High,
            Self::IoError(_)
            | Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    /// Timeouts, refused connections and non-200 replies from the export
    /// endpoint. Anything else reaching the fetch path is unexpected.
    pub fn is_expected_unavailability(&self) -> bool {
        match self {
            Self::ApiError(e) => e.is_timeout() || e.is_connect(),
            Self::DataFetchFailure { .. } => true,
            _ => false,
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::ModelUnavailable => 503,
            Self::ConfigValidationError { .. } | Self::InvalidConfigValueError { .. } => 400,
            _ => 500,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ModelUnavailable => "Train a model (POST /retrain or the retrain binary) and reload",
            Self::InferenceError { .. } => "Check that the loaded artifact matches the request format",
            Self::DatasetMissing { .. } => "Place the training CSV at the configured dataset path",
            Self::RetrainingFailure { .. } | Self::CsvError(_) => {
                "Check the dataset columns: education, skills, interests and a label column"
            }
            Self::ArtifactLoadFailure { .. } => "Remove or regenerate the corrupt artifact file",
            Self::DataFetchFailure { .. } | Self::ApiError(_) => {
                "Check that the evaluation backend is running"
            }
            Self::IoError(_) | Self::SerializationError(_) => {
                "Check file permissions and free disk space in the model directory"
            }
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => "Fix the configuration and restart",
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
