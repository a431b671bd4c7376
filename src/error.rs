//! Error types for storyforge operations.
//!
//! Defines error types for the major subsystems:
//! - Template registration and resolution
//! - LLM API interactions
//! - Job file loading and validation

use thiserror::Error;

/// Errors that can occur during template operations.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Template '{0}' already registered")]
    Duplicate(String),

    /// Resolution was attempted with placeholders left unbound. The list
    /// contains every missing name, sorted, not just the first one hit.
    #[error("Template '{template}' has unbound placeholders: {}", .names.join(", "))]
    UnboundPlaceholders {
        template: String,
        names: Vec<String>,
    },

    #[error("Invalid template name '{0}': must be non-empty and contain only alphanumeric characters, hyphens, and underscores")]
    InvalidTemplateName(String),
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: ANTHROPIC_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Backend overloaded: {0}")]
    Overloaded(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },
}

impl LlmError {
    /// Whether the error is transient and worth retrying.
    ///
    /// Rate limits, overload responses, server errors and network-level
    /// failures qualify. Auth failures, client errors and malformed
    /// responses do not.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RateLimited(_) | LlmError::Overloaded(_) => true,
            LlmError::ApiError { code, .. } => *code >= 500,
            LlmError::RequestFailed(msg) => {
                msg.contains("timeout")
                    || msg.contains("timed out")
                    || msg.contains("connection")
                    || msg.contains("Connection refused")
            }
            _ => false,
        }
    }
}

/// Errors that can occur while loading a job file.
#[derive(Debug, Error)]
pub enum JobError {
    /// One or more required fields were absent or empty. Every missing
    /// field is reported.
    #[error("Missing required job fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
