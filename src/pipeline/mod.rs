//! Pipeline orchestration for multi-stage text generation.
//!
//! # Architecture
//!
//! The pipeline consists of several components:
//!
//! - **Orchestrator**: Runs stages strictly in order, threading each
//!   stage's output into the context of the next
//! - **Stage runner**: Resolves a template, calls the backend with bounded
//!   retry, and extracts the output
//! - **Config**: Engine settings (model, retry policy, artifact root)
//! - **Job**: The per-run inputs loaded from a YAML file
//!
//! # Pipeline Flow
//!
//! 1. A job file supplies the initial context (story bible, user requests)
//! 2. Each stage resolves its template against the current context
//! 3. The resolved prompt is sent to the backend; transient failures are
//!    retried with exponential backoff
//! 4. The stage's extractor turns the raw response into context bindings
//!    for the stages that follow
//! 5. On failure the run stops; completed stage results are returned
//!    alongside the error
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use storyforge::llm::AnthropicClient;
//! use storyforge::pipeline::{Job, PipelineConfig, PipelineOrchestrator};
//! use storyforge::prompts;
//!
//! let config = PipelineConfig::default();
//! let client = Arc::new(AnthropicClient::from_env()?);
//! let orchestrator = PipelineOrchestrator::new(config, prompts::builtin_store(), client);
//!
//! let job = Job::load("configs/episode.yaml".as_ref())?;
//! let run = orchestrator
//!     .run(&prompts::builtin_stages(), job.initial_context(), CancellationToken::new())
//!     .await?;
//!
//! println!("episode: {:?}", run.context.get("episode_title"));
//! ```
//!
//! Stages execute strictly sequentially because later stages depend on
//! earlier outputs; backend calls are the only suspension points. The
//! orchestrator holds no per-run state, so one instance can drive several
//! independent runs concurrently.

pub mod config;
pub mod job;
pub mod orchestrator;
pub mod stage;

// Re-export main types for convenience
pub use config::{ConfigError, PipelineConfig};
pub use job::{Guidance, Job};
pub use orchestrator::{PipelineFailure, PipelineOrchestrator, PipelineRun};
pub use stage::{
    Extractor, GenerationParams, RetryPolicy, StageError, StageResult, StageRunner, StageSpec,
};
