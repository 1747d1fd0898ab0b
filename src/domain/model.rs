use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::SystemTime;

/// Label attached to every prediction so callers know which model family answered.
pub const MODEL_FAMILY: &str = "RandomForest";

/// Version reported before any artifact has been loaded.
pub const INIT_VERSION: &str = "v1-init";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionRequest {
    pub education: String,
    pub skills: Vec<String>,
    pub interests: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CareerScore {
    pub role: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionMeta {
    pub model_version: String,
    pub model_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResult {
    #[serde(rename = "recommendedCareers")]
    pub recommended_careers: Vec<CareerScore>,
    pub meta: PredictionMeta,
}

/// One row of the training set after column normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrainingRow {
    pub education: String,
    pub skills: String,
    pub interests: String,
    pub career_label: String,
}

/// Row shape served by the evaluation export endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub start_skills: String,
    #[serde(default)]
    pub final_completion_rate: Option<f64>,
    #[serde(default)]
    pub outcome: Option<String>,
}

/// A file in the artifact store together with the timestamp used for "latest" selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub created: SystemTime,
}

/// Where a freshly trained artifact was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedArtifact {
    pub version: String,
    pub trained_at: String,
}

/// Structured result of a retraining run; failures are reported here, never raised.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RetrainOutcome {
    Success {
        model_version: String,
        trained_at: String,
        data_points: usize,
    },
    Error {
        message: String,
    },
}

impl RetrainOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Result of an explicit registry reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { version: String },
    NoModel,
    Failed { artifact: String, message: String },
}

/// Columns every training row must resolve to, in feature order followed by the label.
pub const CANONICAL_COLUMNS: [&str; 4] = ["education", "skills", "interests", "career_label"];

/// Accepted alternate header names per canonical column, tried in order after the
/// canonical name itself. Header matching is case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ColumnSynonyms {
    pub synonyms: BTreeMap<String, Vec<String>>,
}

impl ColumnSynonyms {
    pub fn candidates<'a>(&'a self, canonical: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        std::iter::once(canonical).chain(
            self.synonyms
                .get(canonical)
                .into_iter()
                .flatten()
                .map(String::as_str),
        )
    }
}

impl Default for ColumnSynonyms {
    fn default() -> Self {
        let mut synonyms = BTreeMap::new();
        synonyms.insert(
            "career_label".to_string(),
            vec!["job_role".to_string(), "role".to_string()],
        );
        Self { synonyms }
    }
}
