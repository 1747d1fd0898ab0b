use std::sync::Arc;

use crate::core::features::request_feature_text;
use crate::core::registry::ModelRegistry;
use crate::domain::model::{
    CareerScore, PredictionMeta, PredictionRequest, PredictionResult, MODEL_FAMILY,
};
use crate::domain::ports::ArtifactStore;
use crate::utils::error::{Result, ServiceError};

/// Probabilities at or below this are treated as noise and never returned.
pub const MIN_CONFIDENCE: f64 = 0.01;
pub const TOP_K: usize = 3;

/// Filters, ranks and truncates class probabilities.
///
/// The sort is stable, so exact ties keep the classifier's class order.
pub fn rank_careers(classes: &[String], probabilities: &[f64]) -> Vec<CareerScore> {
    let mut ranked: Vec<(&String, f64)> = classes
        .iter()
        .zip(probabilities.iter().copied())
        .filter(|(_, p)| *p > MIN_CONFIDENCE)
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .take(TOP_K)
        .map(|(role, p)| CareerScore {
            role: role.clone(),
            confidence: (p * 100.0).round() / 100.0,
        })
        .collect()
}

/// Stateless request handler over the shared registry.
pub struct PredictionService<S: ArtifactStore> {
    registry: Arc<ModelRegistry<S>>,
}

impl<S: ArtifactStore> Clone for PredictionService<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<S: ArtifactStore> PredictionService<S> {
    pub fn new(registry: Arc<ModelRegistry<S>>) -> Self {
        Self { registry }
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult> {
        let loaded = self.registry.current().ok_or(ServiceError::ModelUnavailable)?;

        let text = request_feature_text(request);
        let probabilities = loaded.model.predict_proba(&text)?;
        if probabilities.len() != loaded.model.classes().len() {
            return Err(ServiceError::inference(format!(
                "model returned {} probabilities for {} classes",
                probabilities.len(),
                loaded.model.classes().len()
            )));
        }

        Ok(PredictionResult {
            recommended_careers: rank_careers(loaded.model.classes(), &probabilities),
            meta: PredictionMeta {
                model_version: loaded.version.clone(),
                model_type: MODEL_FAMILY.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::StoredFile;

    fn classes(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_rank_filters_noise_and_truncates() {
        let ranked = rank_careers(
            &classes(&["A", "B", "C", "D", "E"]),
            &[0.005, 0.4, 0.3, 0.2, 0.095],
        );

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].role, "B");
        assert_eq!(ranked[1].role, "C");
        assert_eq!(ranked[2].role, "D");
        assert!(ranked.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn test_rank_threshold_is_exclusive() {
        let ranked = rank_careers(&classes(&["A", "B"]), &[0.01, 0.99]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].role, "B");
    }

    #[test]
    fn test_rank_rounds_to_two_decimals_and_keeps_tie_order() {
        let ranked = rank_careers(&classes(&["A", "B", "C"]), &[0.333, 0.333, 0.334]);
        assert_eq!(ranked[0].role, "C");
        assert_eq!(ranked[0].confidence, 0.33);
        assert_eq!(ranked[1].role, "A");
        assert_eq!(ranked[2].role, "B");
    }

    struct EmptyStore;

    impl ArtifactStore for EmptyStore {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            Err(ServiceError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path),
            )))
        }

        async fn write_file(&self, _path: &str, _data: &[u8]) -> Result<()> {
            Ok(())
        }

        async fn list_files(&self) -> Result<Vec<StoredFile>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_predict_without_model_is_unavailable() {
        let service = PredictionService::new(Arc::new(ModelRegistry::new(EmptyStore)));
        let request = PredictionRequest {
            education: "BSc".to_string(),
            skills: vec!["python".to_string()],
            interests: "data".to_string(),
        };

        let err = service.predict(&request).unwrap_err();
        assert!(matches!(err, ServiceError::ModelUnavailable));
        assert_eq!(err.http_status(), 503);
    }
}
