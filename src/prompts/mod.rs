//! Built-in prompt templates for the generation pipeline.
//!
//! This module contains the prompts for each stage of the episode
//! generation pipeline and the stage definitions that wire them together:
//!
//! - [`pitch`] - a story bible becomes an episode title and pitch paragraph
//! - [`script`] - the pitch becomes a full episode script
//! - [`tagging`] - the script gains voice-delivery tags and SFX annotations
//!
//! # Usage
//!
//! ```no_run
//! use storyforge::prompts::{builtin_stages, builtin_store};
//!
//! let store = builtin_store();
//! let stages = builtin_stages();
//!
//! assert_eq!(stages.len(), 3);
//! assert!(store.contains("pitch"));
//! ```

pub mod pitch;
pub mod script;
pub mod tagging;

use crate::pipeline::stage::{Extractor, StageSpec};
use crate::template::TemplateStore;

pub use pitch::{pitch_template, PITCH_MAX_TOKENS, PITCH_TEMPERATURE};
pub use script::{script_template, SCRIPT_MAX_TOKENS, SCRIPT_TEMPERATURE};
pub use tagging::{tagging_template, TAGGING_MAX_TOKENS, TAGGING_TEMPERATURE};

/// Default model used by all built-in stages.
pub const DEFAULT_MODEL: &str = "claude-opus-4-1-20250805";

/// Build a store containing the built-in stage templates.
pub fn builtin_store() -> TemplateStore {
    let mut store = TemplateStore::new();
    store
        .insert(pitch_template())
        .expect("built-in templates have unique names");
    store
        .insert(script_template())
        .expect("built-in templates have unique names");
    store
        .insert(tagging_template())
        .expect("built-in templates have unique names");
    store
}

/// Build the built-in three-stage pipeline definition.
///
/// The pitch stage binds `pitch` plus the derived `episode_title` and
/// `pitch_paragraph`; the script stage binds `script`; the tagging stage
/// binds `script_tagged`.
pub fn builtin_stages() -> Vec<StageSpec> {
    vec![
        StageSpec::new("pitch", "pitch")
            .with_temperature(PITCH_TEMPERATURE)
            .with_max_tokens(PITCH_MAX_TOKENS)
            .with_extractor(Extractor::PitchFields),
        StageSpec::new("script", "script")
            .with_temperature(SCRIPT_TEMPERATURE)
            .with_max_tokens(SCRIPT_MAX_TOKENS)
            .with_extractor(Extractor::FountainBlock),
        StageSpec::new("tagging", "tagging")
            .with_temperature(TAGGING_TEMPERATURE)
            .with_max_tokens(TAGGING_MAX_TOKENS)
            .with_output_key("script_tagged")
            .with_extractor(Extractor::FountainBlock),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_store_contains_all_stages() {
        let store = builtin_store();
        assert_eq!(store.names(), vec!["pitch", "script", "tagging"]);
    }

    #[test]
    fn test_builtin_stages_chain_through_context_keys() {
        let store = builtin_store();
        let stages = builtin_stages();
        assert_eq!(stages.len(), 3);

        // The script template consumes what the pitch stage binds, and the
        // tagging template consumes what the script stage binds.
        let script = store.get("script").expect("script template");
        assert!(script.declares("episode_title"));
        assert!(script.declares("pitch_paragraph"));

        let tagging = store.get("tagging").expect("tagging template");
        assert!(tagging.declares(&stages[1].output_key));
    }

    #[test]
    fn test_builtin_stage_parameters() {
        let stages = builtin_stages();

        assert_eq!(stages[0].name, "pitch");
        assert!((stages[0].params.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(stages[0].params.max_tokens, 30_000);

        assert_eq!(stages[2].name, "tagging");
        assert!((stages[2].params.temperature - 0.4).abs() < f64::EPSILON);
        assert_eq!(stages[2].output_key, "script_tagged");
    }
}
