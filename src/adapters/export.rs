use crate::domain::model::ExportRecord;
use crate::domain::ports::EvaluationSource;
use crate::utils::error::{Result, ServiceError};
use reqwest::Client;
use std::time::Duration;

/// Client for the evaluation backend's `GET /api/evaluation/export`.
#[derive(Debug, Clone)]
pub struct HttpEvaluationExport {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpEvaluationExport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

impl EvaluationSource for HttpEvaluationExport {
    async fn fetch(&self) -> Result<Vec<ExportRecord>> {
        tracing::debug!("Fetching evaluation export from: {}", self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .timeout(self.timeout)
            .send()
            .await?;

        tracing::debug!("Export response status: {}", response.status());
        if response.status() != reqwest::StatusCode::OK {
            return Err(ServiceError::DataFetchFailure {
                message: format!("export endpoint returned {}", response.status()),
            });
        }

        let records: Vec<ExportRecord> = response.json().await?;
        Ok(records)
    }
}
