//! Sequential pipeline orchestration.
//!
//! The orchestrator runs stages strictly in order, binding each stage's
//! extracted output into the context before the next stage resolves. It
//! stops at the first failing stage and hands back the results of the
//! stages that completed; nothing is rolled back or silently swallowed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::llm::{LlmProvider, Usage};
use crate::template::{Context, TemplateStore};

use super::config::PipelineConfig;
use super::stage::{RetryPolicy, StageError, StageResult, StageRunner, StageSpec};

/// A pipeline run that stopped at a failing stage.
///
/// Results from the stages that completed before the failure are carried
/// alongside the error.
#[derive(Debug, Error)]
#[error("Stage '{stage}' failed: {source}")]
pub struct PipelineFailure {
    /// Name of the failing stage.
    pub stage: String,
    /// The underlying stage error.
    #[source]
    pub source: StageError,
    /// Results of the stages that completed before the failure.
    pub partial: Vec<StageResult>,
}

/// A completed pipeline run.
#[derive(Debug)]
pub struct PipelineRun {
    /// Unique id for this run.
    pub id: uuid::Uuid,
    /// Results for every stage, in execution order.
    pub results: Vec<StageResult>,
    /// Final context, including every stage's bindings.
    pub context: Context,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the last stage completed.
    pub finished_at: DateTime<Utc>,
}

impl PipelineRun {
    /// Total token usage across all stages.
    pub fn total_usage(&self) -> Usage {
        self.results.iter().fold(Usage::default(), |acc, result| Usage {
            input_tokens: acc.input_tokens + result.usage.input_tokens,
            output_tokens: acc.output_tokens + result.usage.output_tokens,
        })
    }
}

/// Coordinates sequential execution of pipeline stages.
///
/// Holds no per-run state; a host process can drive several independent
/// runs concurrently from one instance.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    store: TemplateStore,
    provider: Arc<dyn LlmProvider>,
}

impl PipelineOrchestrator {
    /// Create an orchestrator over the given template store and backend.
    pub fn new(
        config: PipelineConfig,
        store: TemplateStore,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            config,
            store,
            provider,
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Get the template store.
    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// Run the given stages in order, threading each stage's output into
    /// the context of the next.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineFailure`] naming the failing stage and carrying
    /// the results of every stage that completed before it. Cancellation
    /// aborts the in-flight backend call and prevents later stages from
    /// starting.
    pub async fn run(
        &self,
        stages: &[StageSpec],
        initial: Context,
        cancel: CancellationToken,
    ) -> Result<PipelineRun, PipelineFailure> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4();
        let runner = StageRunner::new(
            self.provider.as_ref(),
            RetryPolicy::new(self.config.max_attempts, self.config.retry_base_delay),
        );

        let mut context = initial;
        let mut results: Vec<StageResult> = Vec::with_capacity(stages.len());

        for spec in stages {
            if cancel.is_cancelled() {
                return Err(PipelineFailure {
                    stage: spec.name.clone(),
                    source: StageError::Cancelled,
                    partial: results,
                });
            }

            tracing::info!(run = %run_id, stage = %spec.name, "Running stage");

            let template = match self.store.get(&spec.template) {
                Ok(template) => template,
                Err(err) => {
                    return Err(PipelineFailure {
                        stage: spec.name.clone(),
                        source: StageError::Template(err),
                        partial: results,
                    })
                }
            };

            match runner
                .run(spec, template, &context, &self.config.default_model, &cancel)
                .await
            {
                Ok((result, derived)) => {
                    context.insert(spec.output_key.clone(), result.output.clone());
                    for (key, value) in derived {
                        context.insert(key, value);
                    }
                    tracing::info!(
                        run = %run_id,
                        stage = %spec.name,
                        attempts = result.attempts,
                        output_tokens = result.usage.output_tokens,
                        "Stage completed"
                    );
                    results.push(result);
                }
                Err(source) => {
                    tracing::error!(
                        run = %run_id,
                        stage = %spec.name,
                        error = %source,
                        "Stage failed"
                    );
                    return Err(PipelineFailure {
                        stage: spec.name.clone(),
                        source,
                        partial: results,
                    });
                }
            }
        }

        Ok(PipelineRun {
            id: run_id,
            results,
            context,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Usage;

    fn result(stage: &str, input: u32, output: u32) -> StageResult {
        StageResult {
            stage: stage.to_string(),
            output: String::new(),
            raw_response: String::new(),
            usage: Usage {
                input_tokens: input,
                output_tokens: output,
            },
            attempts: 1,
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn test_total_usage_sums_stages() {
        let run = PipelineRun {
            id: uuid::Uuid::new_v4(),
            results: vec![result("pitch", 100, 50), result("script", 200, 150)],
            context: Context::new(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };

        let usage = run.total_usage();
        assert_eq!(usage.input_tokens, 300);
        assert_eq!(usage.output_tokens, 200);
        assert_eq!(usage.total_tokens(), 500);
    }

    #[test]
    fn test_pipeline_failure_display() {
        let failure = PipelineFailure {
            stage: "script".to_string(),
            source: StageError::EmptyResponse,
            partial: vec![result("pitch", 10, 5)],
        };

        let msg = failure.to_string();
        assert!(msg.contains("script"));
        assert!(msg.contains("empty completion"));
        assert_eq!(failure.partial.len(), 1);
    }
}
