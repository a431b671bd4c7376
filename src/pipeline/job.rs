//! Job files: the per-run inputs a pipeline starts from.
//!
//! A job is a YAML file supplying the story bible and the free-form user
//! requests for the writing stages. Loading validates the required fields
//! up front, reporting every missing one, and `initial_context` turns the
//! job into the context the first stage resolves against.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::JobError;
use crate::template::Context;

/// The preset guidance line used by the `preset` and `append` modes.
const PRESET_GUIDANCE: &str = "Focus on friendship and problem-solving themes.";

/// Optional guidance instruction for a writing stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Guidance {
    /// No extra guidance; the placeholder resolves to an empty string.
    #[default]
    Null,
    /// The built-in preset guidance line.
    Preset,
    /// The preset line followed by extra text.
    Append { append_text: String },
}

impl Guidance {
    /// Render the guidance to the string bound into the context.
    pub fn render(&self) -> String {
        match self {
            Guidance::Null => String::new(),
            Guidance::Preset => PRESET_GUIDANCE.to_string(),
            Guidance::Append { append_text } => {
                format!("{} {}", PRESET_GUIDANCE, append_text).trim().to_string()
            }
        }
    }
}

/// A pipeline job loaded from YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Job {
    /// The story bible the whole pipeline draws on.
    #[serde(default)]
    pub bible: String,
    /// Free-form request appended to the pitch stage.
    #[serde(default)]
    pub pitch_user_message: String,
    /// Free-form request appended to the script stage.
    #[serde(default)]
    pub script_user_message: String,
    /// Optional guidance for the pitch stage.
    #[serde(default)]
    pub kiddo_pitch_instruction: Guidance,
    /// Optional guidance for the script stage.
    #[serde(default)]
    pub kiddo_script_instruction: Guidance,
}

impl Job {
    /// Load and validate a job file.
    ///
    /// # Errors
    ///
    /// Returns `JobError::Io` / `JobError::Yaml` on read or parse failure,
    /// and `JobError::MissingFields` listing every required field that is
    /// absent or empty.
    pub fn load(path: &Path) -> Result<Self, JobError> {
        let raw = std::fs::read_to_string(path)?;
        let job: Job = serde_yaml::from_str(&raw)?;
        job.validate()?;
        Ok(job)
    }

    /// Check that all required fields are present, reporting every missing
    /// one.
    pub fn validate(&self) -> Result<(), JobError> {
        let mut missing = Vec::new();
        if self.bible.trim().is_empty() {
            missing.push("bible".to_string());
        }
        if self.pitch_user_message.trim().is_empty() {
            missing.push("pitch_user_message".to_string());
        }
        if self.script_user_message.trim().is_empty() {
            missing.push("script_user_message".to_string());
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(JobError::MissingFields(missing))
        }
    }

    /// Build the initial context for a run.
    pub fn initial_context(&self) -> Context {
        Context::new()
            .bind("bible", &self.bible)
            .bind("pitch_user_message", &self.pitch_user_message)
            .bind("script_user_message", &self.script_user_message)
            .bind(
                "kiddo_pitch_instruction",
                self.kiddo_pitch_instruction.render(),
            )
            .bind(
                "kiddo_script_instruction",
                self.kiddo_script_instruction.render(),
            )
    }
}
