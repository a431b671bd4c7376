//! Pipeline configuration for the orchestrator.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::prompts;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration for the pipeline orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Model used when a stage does not override it.
    pub default_model: String,
    /// Root directory for run artifacts.
    pub output_root: PathBuf,
    /// Maximum backend attempts per stage, including the first.
    pub max_attempts: u32,
    /// Base delay for exponential backoff between retries.
    pub retry_base_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_model: prompts::DEFAULT_MODEL.to_string(),
            output_root: PathBuf::from("outputs"),
            max_attempts: 3,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

impl PipelineConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `STORYFORGE_DEFAULT_MODEL`: Default model (default: claude-opus-4-1-20250805)
    /// - `STORYFORGE_OUTPUT_ROOT`: Artifact root directory (default: outputs)
    /// - `STORYFORGE_MAX_ATTEMPTS`: Backend attempts per stage (default: 3)
    /// - `STORYFORGE_RETRY_BASE_MS`: Backoff base delay in milliseconds (default: 1000)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value or the
    /// resulting configuration fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("STORYFORGE_DEFAULT_MODEL") {
            config.default_model = val;
        }

        if let Ok(val) = std::env::var("STORYFORGE_OUTPUT_ROOT") {
            config.output_root = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("STORYFORGE_MAX_ATTEMPTS") {
            config.max_attempts = parse_env_value(&val, "STORYFORGE_MAX_ATTEMPTS")?;
        }

        if let Ok(val) = std::env::var("STORYFORGE_RETRY_BASE_MS") {
            let ms: u64 = parse_env_value(&val, "STORYFORGE_RETRY_BASE_MS")?;
            config.retry_base_delay = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_model.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "default_model cannot be empty".to_string(),
            ));
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.retry_base_delay.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "retry_base_delay must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder method to set the default model.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Builder method to set the artifact root directory.
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Builder method to set maximum backend attempts per stage.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Builder method to set the backoff base delay.
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.default_model, "claude-opus-4-1-20250805");
        assert_eq!(config.output_root, PathBuf::from("outputs"));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_base_delay, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::new()
            .with_default_model("claude-sonnet-4-20250514")
            .with_output_root("/tmp/runs")
            .with_max_attempts(5)
            .with_retry_base_delay(Duration::from_millis(250));

        assert_eq!(config.default_model, "claude-sonnet-4-20250514");
        assert_eq!(config.output_root, PathBuf::from("/tmp/runs"));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.retry_base_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_validation_empty_model() {
        let config = PipelineConfig::default().with_default_model("");
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("default_model"));
    }

    #[test]
    fn test_validation_zero_attempts() {
        let config = PipelineConfig::default().with_max_attempts(0);
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_attempts"));
    }

    #[test]
    fn test_validation_zero_delay() {
        let config = PipelineConfig::default().with_retry_base_delay(Duration::ZERO);
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("retry_base_delay"));
    }

    #[test]
    fn test_parse_env_value() {
        let parsed: u32 = parse_env_value("7", "KEY").expect("valid number");
        assert_eq!(parsed, 7);

        let result: Result<u32, _> = parse_env_value("not-a-number", "KEY");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("KEY"));
    }
}
