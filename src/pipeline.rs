//! End-to-end request handling: validate, summarise, validate, persist.

use crate::agent::AgentError;
use crate::processor::SummaryProcessor;
use crate::storage::{Storage, StorageError};
use crate::summary::{HistoricalRecord, SummaryOptions, SummaryResult};
use crate::validation::{self, ValidationError};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The caller's text or options failed the pre-conditions
    #[error("{0}")]
    InvalidInput(String),
    /// The generated summary failed the post-conditions
    #[error("{0}")]
    InvalidOutput(String),
    #[error("provider error: {0}")]
    Provider(#[from] AgentError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<ValidationError> for PipelineError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidInput(msg) => PipelineError::InvalidInput(msg),
            ValidationError::InvalidOutput(msg) => PipelineError::InvalidOutput(msg),
        }
    }
}

/// The summarisation service shared by all requests.
#[derive(Clone)]
pub struct SummaryService {
    processor: SummaryProcessor,
    storage: Storage,
}

impl SummaryService {
    pub fn new(processor: SummaryProcessor, storage: Storage) -> Self {
        Self { processor, storage }
    }

    /// Run the whole pipeline for one text.
    ///
    /// Nothing is stored unless every step succeeds; a summary is dropped if
    /// the store write fails.
    pub async fn handle_request(
        &self,
        text: &str,
        options: &SummaryOptions,
    ) -> Result<SummaryResult, PipelineError> {
        validation::validate_input(text)?;
        validation::validate_options(options)?;

        let result = self.processor.process(text, options).await.map_err(|e| {
            error!(error = %e, model = self.processor.model_name(), "summary generation failed");
            e
        })?;

        if let Err(e) = validation::validate_output(&result.summary) {
            warn!(error = %e, summary_len = result.summary.len(), "rejected generated summary");
            return Err(e.into());
        }

        let original = text.to_string();
        let summary = result.summary.clone();
        let classification = result.classification.clone();
        let (id, _created_at) = self
            .with_storage(move |storage| storage.save(&original, &summary, &classification))
            .await
            .map_err(|e| {
                error!(error = %e, "failed to persist summary");
                e
            })?;
        info!(id, "summary stored");

        Ok(result)
    }

    /// Stored results, newest first
    pub async fn history(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<HistoricalRecord>, PipelineError> {
        let records = self
            .with_storage(move |storage| storage.list(limit, offset))
            .await
            .map_err(|e| {
                error!(error = %e, limit, offset, "failed to read history");
                e
            })?;
        Ok(records)
    }

    /// sled reads and flushes block, so they run off the async workers
    async fn with_storage<T, F>(&self, func: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Storage) -> Result<T, StorageError> + Send + 'static,
    {
        let storage = self.storage.clone();
        tokio::task::spawn_blocking(move || func(&storage))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::LlmClient;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct FakeClient {
        response: Result<String, String>,
        calls: AtomicUsize,
    }

    impl FakeClient {
        fn ok(response: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(response.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                response: Err("503 Service Unavailable".to_string()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmClient for FakeClient {
        async fn invoke(&self, _prompt: &str) -> Result<String, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone().map_err(AgentError::RequestFailed)
        }

        fn model_name(&self) -> &str {
            "fake"
        }
    }

    fn service(client: Arc<FakeClient>) -> (tempfile::TempDir, SummaryService) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path().join("db")).unwrap();
        let processor = SummaryProcessor::new(client, Duration::from_secs(5));
        (dir, SummaryService::new(processor, storage))
    }

    const PHOTOSYNTHESIS: &str = "A fotossíntese é o processo pelo qual as plantas convertem energia luminosa em energia química.";

    #[tokio::test]
    async fn stores_accepted_summary() {
        let (_dir, service) = service(FakeClient::ok("As plantas usam luz para produzir energia."));

        let result = service
            .handle_request(PHOTOSYNTHESIS, &SummaryOptions::default())
            .await
            .unwrap();
        assert!(!result.summary.is_empty());
        assert_eq!(result.classification, "");
        assert_eq!(
            result.metadata.as_ref().unwrap().original_length,
            PHOTOSYNTHESIS.chars().count()
        );

        let history = service.history(10, 0).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].original_text, PHOTOSYNTHESIS);
        assert_eq!(history[0].summary, result.summary);
    }

    #[tokio::test]
    async fn empty_input_never_reaches_provider() {
        let client = FakeClient::ok("irrelevante para este teste");
        let (_dir, service) = service(client.clone());

        let err = service
            .handle_request("", &SummaryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn out_of_range_max_length_is_invalid_input() {
        let (_dir, service) = service(FakeClient::ok("resumo com palavras suficientes"));
        let options = SummaryOptions {
            max_length: 50,
            ..SummaryOptions::default()
        };

        let err = service.handle_request(PHOTOSYNTHESIS, &options).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn provider_failure_is_reported_and_nothing_stored() {
        let client = FakeClient::failing();
        let (_dir, service) = service(client.clone());

        let err = service
            .handle_request("vinte caracteres ok!", &SummaryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Provider(_)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert!(service.history(10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn short_summary_is_invalid_output_and_not_stored() {
        let (_dir, service) = service(FakeClient::ok("```\nFotossíntese.\n```"));

        let err = service
            .handle_request(PHOTOSYNTHESIS, &SummaryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidOutput(_)));
        assert!(service.history(10, 0).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_requests_persist_on_single_worker() {
        let (_dir, service) = service(FakeClient::ok("As plantas usam luz para produzir energia."));
        let options = SummaryOptions::default();

        let (first, second, third) = tokio::join!(
            service.handle_request(PHOTOSYNTHESIS, &options),
            service.handle_request(PHOTOSYNTHESIS, &options),
            service.handle_request(PHOTOSYNTHESIS, &options),
        );
        assert!(first.is_ok() && second.is_ok() && third.is_ok());

        let history = service.history(10, 0).await.unwrap();
        assert_eq!(history.len(), 3);
        assert!(history[0].id > history[1].id && history[1].id > history[2].id);
        assert_eq!(service.history(10, 2).await.unwrap().len(), 1);
    }
}
