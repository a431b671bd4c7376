//! Stage definitions and the retrying stage runner.
//!
//! A [`StageSpec`] names a template and the generation parameters to run
//! it with; the [`StageRunner`] resolves the template against the current
//! context, calls the backend with bounded exponential-backoff retry, and
//! extracts the output bindings for the stages that follow.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::error::{LlmError, TemplateError};
use crate::fountain;
use crate::llm::{GenerationRequest, GenerationResponse, LlmProvider, Usage};
use crate::template::{self, Context, Template};

/// Errors surfaced by a single stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// Template lookup or resolution failed. Never retried.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// The backend call failed fatally, or transiently past the retry cap.
    #[error("Backend error: {0}")]
    Llm(#[from] LlmError),

    /// The run was cancelled while this stage was pending or in flight.
    #[error("Stage cancelled")]
    Cancelled,

    /// The backend returned an empty completion.
    #[error("Backend returned an empty completion")]
    EmptyResponse,
}

/// Retry policy for transient backend failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first.
    pub max_attempts: u32,
    /// Base backoff delay; retry n waits base * 2^(n-1).
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay before the given retry (1-based): 1x, 2x, 4x, ... the base.
    fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(retry.saturating_sub(1))
    }
}

/// Generation parameters for one stage.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Model override; `None` means the pipeline default.
    pub model: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum output tokens.
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: 4096,
        }
    }
}

/// How a stage's raw response becomes context bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    /// Bind the trimmed response text unchanged.
    Raw,
    /// Bind the contents of the fenced fountain block.
    FountainBlock,
    /// Bind the fountain block, plus `episode_title` and `pitch_paragraph`
    /// parsed out of it.
    PitchFields,
}

impl Extractor {
    /// Apply the extractor to a raw response.
    ///
    /// Returns the primary output (bound under the stage's output key) and
    /// any derived bindings.
    pub fn apply(&self, raw: &str) -> (String, Vec<(String, String)>) {
        match self {
            Extractor::Raw => (raw.trim().to_string(), Vec::new()),
            Extractor::FountainBlock => (fountain::extract_block(raw), Vec::new()),
            Extractor::PitchFields => {
                let block = fountain::extract_block(raw);
                let fields = fountain::parse_pitch(&block);
                let derived = vec![
                    ("episode_title".to_string(), fields.episode_title),
                    ("pitch_paragraph".to_string(), fields.pitch_paragraph),
                ];
                (block, derived)
            }
        }
    }
}

/// Definition of one pipeline stage.
#[derive(Debug, Clone)]
pub struct StageSpec {
    /// Stage name, used for artifacts and error reporting.
    pub name: String,
    /// Name of the template to resolve from the store.
    pub template: String,
    /// Generation parameters.
    pub params: GenerationParams,
    /// Context key the extracted output is bound under.
    pub output_key: String,
    /// Output extraction mode.
    pub extractor: Extractor,
}

impl StageSpec {
    /// Create a stage with default parameters. The output key defaults to
    /// the stage name and the extractor to [`Extractor::Raw`].
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            output_key: name.clone(),
            name,
            template: template.into(),
            params: GenerationParams::default(),
            extractor: Extractor::Raw,
        }
    }

    /// Set a model override for this stage.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.params.model = Some(model.into());
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.params.temperature = temperature;
        self
    }

    /// Set the maximum output tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.params.max_tokens = max_tokens;
        self
    }

    /// Set the context key the output is bound under.
    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = key.into();
        self
    }

    /// Set the output extractor.
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }
}

/// Result of one completed stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageResult {
    /// Name of the stage that produced this result.
    pub stage: String,
    /// Extracted output, as bound into the context.
    pub output: String,
    /// Full raw response text from the backend.
    pub raw_response: String,
    /// Token usage for the final (successful) attempt.
    pub usage: Usage,
    /// Backend attempts made, including the successful one.
    pub attempts: u32,
    /// When the stage completed.
    pub completed_at: DateTime<Utc>,
}

/// Executes a single stage against a backend, with retry and cancellation.
pub struct StageRunner<'a> {
    provider: &'a dyn LlmProvider,
    retry: RetryPolicy,
}

impl<'a> StageRunner<'a> {
    /// Create a runner over the given provider.
    pub fn new(provider: &'a dyn LlmProvider, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    /// Run one stage: resolve the template, call the backend, extract the
    /// output bindings.
    pub async fn run(
        &self,
        spec: &StageSpec,
        template: &Template,
        context: &Context,
        default_model: &str,
        cancel: &CancellationToken,
    ) -> Result<(StageResult, Vec<(String, String)>), StageError> {
        let prompt = template::resolve(template, context)?;

        let model = spec.params.model.as_deref().unwrap_or(default_model);
        let request = GenerationRequest::new(model, prompt.messages)
            .with_system(prompt.system)
            .with_temperature(spec.params.temperature)
            .with_max_tokens(spec.params.max_tokens);

        let (response, attempts) = self
            .generate_with_retry(&spec.name, request, cancel)
            .await?;

        if response.text.trim().is_empty() {
            return Err(StageError::EmptyResponse);
        }

        let (output, derived) = spec.extractor.apply(&response.text);

        Ok((
            StageResult {
                stage: spec.name.clone(),
                output,
                raw_response: response.text,
                usage: response.usage,
                attempts,
                completed_at: Utc::now(),
            },
            derived,
        ))
    }

    /// Call the backend, retrying transient failures with exponential
    /// backoff. Non-transient errors fail immediately.
    async fn generate_with_retry(
        &self,
        stage: &str,
        request: GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<(GenerationResponse, u32), StageError> {
        let mut last_error = None;

        for attempt in 1..=self.retry.max_attempts {
            if attempt > 1 {
                let delay = self.retry.delay_for(attempt - 1);
                tracing::debug!(
                    stage,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying backend call after transient failure"
                );
                tokio::select! {
                    _ = cancel.cancelled() => return Err(StageError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            if cancel.is_cancelled() {
                return Err(StageError::Cancelled);
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(StageError::Cancelled),
                result = self.provider.generate(request.clone()) => result,
            };

            match result {
                Ok(response) => return Ok((response, attempt)),
                Err(err) if err.is_transient() => {
                    tracing::warn!(
                        stage,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %err,
                        "Transient backend error, will retry"
                    );
                    last_error = Some(err);
                }
                Err(err) => return Err(StageError::Llm(err)),
            }
        }

        Err(StageError::Llm(last_error.unwrap_or_else(|| {
            LlmError::RequestFailed("retry attempts exhausted with no error captured".to_string())
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_delays() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_stage_spec_defaults() {
        let spec = StageSpec::new("pitch", "pitch");
        assert_eq!(spec.name, "pitch");
        assert_eq!(spec.template, "pitch");
        assert_eq!(spec.output_key, "pitch");
        assert_eq!(spec.extractor, Extractor::Raw);
        assert!(spec.params.model.is_none());
    }

    #[test]
    fn test_stage_spec_builder() {
        let spec = StageSpec::new("tagging", "tagging")
            .with_model("claude-sonnet-4-20250514")
            .with_temperature(0.4)
            .with_max_tokens(32_000)
            .with_output_key("script_tagged")
            .with_extractor(Extractor::FountainBlock);

        assert_eq!(spec.params.model.as_deref(), Some("claude-sonnet-4-20250514"));
        assert!((spec.params.temperature - 0.4).abs() < f64::EPSILON);
        assert_eq!(spec.params.max_tokens, 32_000);
        assert_eq!(spec.output_key, "script_tagged");
        assert_eq!(spec.extractor, Extractor::FountainBlock);
    }

    #[test]
    fn test_extractor_raw() {
        let (output, derived) = Extractor::Raw.apply("  some text  ");
        assert_eq!(output, "some text");
        assert!(derived.is_empty());
    }

    #[test]
    fn test_extractor_fountain_block() {
        let raw = "Sure!\n\n```fountain\nINT. TREEHOUSE - DAY\n```\n";
        let (output, derived) = Extractor::FountainBlock.apply(raw);
        assert_eq!(output, "INT. TREEHOUSE - DAY");
        assert!(derived.is_empty());
    }

    #[test]
    fn test_extractor_pitch_fields() {
        let raw = "```fountain\nEpisode Title: The Soup Rebellion\n\nPitch Paragraph: Kiddo refuses soup.\n```";
        let (output, derived) = Extractor::PitchFields.apply(raw);
        assert!(output.contains("Episode Title"));
        assert_eq!(
            derived,
            vec![
                ("episode_title".to_string(), "The Soup Rebellion".to_string()),
                ("pitch_paragraph".to_string(), "Kiddo refuses soup.".to_string()),
            ]
        );
    }
}
