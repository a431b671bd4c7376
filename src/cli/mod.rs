//! Command-line interface for storyforge.
//!
//! Provides commands for running the generation pipeline, dry-run template
//! resolution, and template inspection.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli, Commands};
