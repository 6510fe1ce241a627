use super::retry::retry_with_backoff;
use crate::config::{Config, PromptConfig, RetryConfig};
use crate::error::{AnalysisError, ProviderError};
use crate::parser::{ParserManager, RequirementAnalysis};
use crate::prompt::build_analysis_prompt;
use crate::provider::LlmClient;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Prompt, call and parse for one requirement at a time
pub struct Analyzer {
    client: Arc<dyn LlmClient>,
    manager: Arc<ParserManager>,
    retry: RetryConfig,
    prompt: PromptConfig,
    timeout: Duration,
}

impl Analyzer {
    pub fn new(client: Arc<dyn LlmClient>, manager: Arc<ParserManager>) -> Self {
        Self {
            client,
            manager,
            retry: RetryConfig::default(),
            prompt: PromptConfig::default(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn from_config(client: Arc<dyn LlmClient>, config: &Config) -> Self {
        Self {
            client,
            manager: Arc::new(ParserManager::from_config(config)),
            retry: config.retry.clone(),
            prompt: config.prompt.clone(),
            timeout: Duration::from_secs(config.provider.timeout_sec),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn manager(&self) -> &ParserManager {
        &self.manager
    }

    pub async fn analyze(
        &self,
        requirement_id: &str,
        requirement_text: &str,
    ) -> Result<RequirementAnalysis, AnalysisError> {
        if requirement_text.trim().is_empty() {
            return Err(AnalysisError::EmptyRequirement);
        }

        let prompt = build_analysis_prompt(requirement_text, &self.prompt);
        debug!(
            requirement_id,
            client = self.client.name(),
            prompt_chars = prompt.len(),
            "Requesting analysis"
        );

        let client = self.client.as_ref();
        let prompt = prompt.as_str();
        let timeout = self.timeout;
        let response = retry_with_backoff(&self.retry, requirement_id, is_transient, || {
            client.complete(prompt, timeout)
        })
        .await?;

        match self.manager.parse_response(&response, requirement_id) {
            Some(analysis) => {
                info!(
                    requirement_id,
                    parser = %analysis.parser,
                    score = analysis.original_quality_score,
                    "Requirement analyzed"
                );
                Ok(analysis)
            }
            None => {
                warn!(requirement_id, "Model response could not be interpreted");
                Err(AnalysisError::Unparseable {
                    requirement_id: requirement_id.to_string(),
                })
            }
        }
    }
}

/// A missing binary or denied permission will not fix itself between attempts
fn is_transient(error: &ProviderError) -> bool {
    match error {
        ProviderError::Io(e) => !matches!(
            e.kind(),
            ErrorKind::NotFound | ErrorKind::PermissionDenied
        ),
        ProviderError::Timeout(_) | ProviderError::NonZeroExit { .. } => true,
        ProviderError::EmptyResponse => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted responses and records the prompts it received
    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<String, ProviderError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn complete(&self, prompt: &str, _timeout: Duration) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ProviderError::EmptyResponse))
        }
    }

    fn analyzer(client: Arc<ScriptedClient>) -> Analyzer {
        Analyzer::new(client, Arc::new(ParserManager::default())).with_retry(RetryConfig {
            max_attempts: 3,
            backoff_base_ms: 1,
        })
    }

    #[tokio::test]
    async fn test_analyze_parses_response() {
        let client = ScriptedClient::new(vec![Ok(
            "=== QUALITY_SCORE ===\n7\n=== ISSUES ===\n- Clarity (Low): vague\n=== END ===".into(),
        )]);
        let analysis = analyzer(client.clone())
            .analyze("REQ-1", "The system shall be fast.")
            .await
            .unwrap();

        assert_eq!(analysis.original_quality_score, 7);
        assert_eq!(analysis.parser, "Delimited");
        assert_eq!(client.calls(), 1);
        assert!(client.prompts.lock().unwrap()[0].contains("The system shall be fast."));
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let client = ScriptedClient::new(vec![
            Err(ProviderError::Timeout(Duration::from_secs(1))),
            Ok(r#"{"QualityScore": 4}"#.into()),
        ]);
        let analysis = analyzer(client.clone())
            .analyze("REQ-2", "Users may export data.")
            .await
            .unwrap();

        assert_eq!(analysis.original_quality_score, 4);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_binary_not_retried() {
        let client = ScriptedClient::new(vec![Err(ProviderError::Io(std::io::Error::new(
            ErrorKind::NotFound,
            "no such command",
        )))]);
        let err = analyzer(client.clone())
            .analyze("REQ-3", "text")
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Provider(ProviderError::Io(_))));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_response() {
        let client = ScriptedClient::new(vec![Ok("OK".into())]);
        let err = analyzer(client)
            .analyze("REQ-4", "text")
            .await
            .unwrap_err();

        match err {
            AnalysisError::Unparseable { requirement_id } => assert_eq!(requirement_id, "REQ-4"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_requirement_skips_provider() {
        let client = ScriptedClient::new(vec![]);
        let err = analyzer(client.clone())
            .analyze("REQ-5", "   ")
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::EmptyRequirement));
        assert_eq!(client.calls(), 0);
    }
}
