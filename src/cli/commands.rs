//! Command definitions and handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::llm::AnthropicClient;
use crate::output::RunWriter;
use crate::pipeline::{Job, PipelineConfig, PipelineOrchestrator};
use crate::prompts;
use crate::template;

/// Name used for the run artifact directory.
const PIPELINE_NAME: &str = "pitch_to_tagged_script";

#[derive(Debug, Parser)]
#[command(
    name = "storyforge",
    about = "Multi-stage LLM content generation: pitch, script and production tagging",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full pipeline from a job file.
    Run(RunArgs),
    /// Resolve a template against a job file without calling the backend.
    Render(RenderArgs),
    /// List built-in templates and their placeholders.
    Templates,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to the job YAML file.
    #[arg(long)]
    pub job: PathBuf,

    /// Root directory for run artifacts.
    #[arg(long, default_value = "outputs")]
    pub output_root: PathBuf,

    /// Override the default model.
    #[arg(long, env = "STORYFORGE_MODEL")]
    pub model: Option<String>,

    /// Maximum backend attempts per stage.
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Name of the template to resolve.
    #[arg(long)]
    pub template: String,

    /// Path to the job YAML file supplying bindings.
    #[arg(long)]
    pub job: PathBuf,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Entry point used by main after logging is initialized.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_pipeline(args).await,
        Commands::Render(args) => render_template(args),
        Commands::Templates => list_templates(),
    }
}

/// Execute the full pipeline and write run artifacts.
async fn run_pipeline(args: RunArgs) -> anyhow::Result<()> {
    let job = Job::load(&args.job)
        .with_context(|| format!("loading job file {}", args.job.display()))?;

    // Environment supplies the base configuration; CLI flags override it.
    let mut config = PipelineConfig::from_env()?
        .with_output_root(args.output_root)
        .with_max_attempts(args.max_attempts);
    if let Some(model) = args.model {
        config = config.with_default_model(model);
    }
    config.validate()?;

    let client = AnthropicClient::from_env()?;
    tracing::debug!(api_key = %client.api_key_masked(), "Backend client ready");

    let stages = prompts::builtin_stages();
    let orchestrator = PipelineOrchestrator::new(
        config.clone(),
        prompts::builtin_store(),
        Arc::new(client),
    );

    // Ctrl-C aborts the in-flight stage and stops the run.
    let cancel = CancellationToken::new();
    let ctrlc_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling run");
            ctrlc_token.cancel();
        }
    });

    let mut writer = RunWriter::create(&config.output_root, PIPELINE_NAME)?;
    writer.save_job(&job)?;
    tracing::info!(dir = %writer.dir().display(), "Writing run artifacts");

    match orchestrator.run(&stages, job.initial_context(), cancel).await {
        Ok(run) => {
            for (number, result) in run.results.iter().enumerate() {
                writer.save_stage(number + 1, result)?;
            }
            writer.write_summary(&run)?;

            let usage = run.total_usage();
            println!(
                "Pipeline completed: {} stages, {} output tokens",
                run.results.len(),
                usage.output_tokens
            );
            if let Some(title) = run.context.get("episode_title") {
                println!("Episode: {}", title);
            }
            println!("Artifacts: {}", writer.dir().display());
            Ok(())
        }
        Err(failure) => {
            for (number, result) in failure.partial.iter().enumerate() {
                writer.save_stage(number + 1, result)?;
            }
            eprintln!(
                "Pipeline failed at stage '{}': {}",
                failure.stage, failure.source
            );
            eprintln!("Partial artifacts: {}", writer.dir().display());
            Err(failure.into())
        }
    }
}

/// Resolve one template against a job file and print the result.
fn render_template(args: RenderArgs) -> anyhow::Result<()> {
    let job = Job::load(&args.job)
        .with_context(|| format!("loading job file {}", args.job.display()))?;

    let store = prompts::builtin_store();
    let tmpl = store.get(&args.template)?;
    let resolved = template::resolve(tmpl, &job.initial_context())?;

    println!("# system\n\n{}\n", resolved.system);
    for message in &resolved.messages {
        println!("# {}\n\n{}\n", message.role, message.content);
    }
    Ok(())
}

/// List the built-in templates and the placeholders each declares.
fn list_templates() -> anyhow::Result<()> {
    let store = prompts::builtin_store();
    for name in store.names() {
        let tmpl = store.get(name)?;
        let placeholders: Vec<&str> = tmpl.placeholders().iter().map(String::as_str).collect();
        println!("{}: {}", name, placeholders.join(", "));
    }
    Ok(())
}
