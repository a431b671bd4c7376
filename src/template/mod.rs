//! Prompt templates with declared placeholder slots.
//!
//! A [`Template`] is an immutable prompt shape: a system instruction and an
//! ordered list of message turns whose text may contain `{{name}}`
//! placeholder tokens. The set of placeholder names is extracted when the
//! template is constructed, so callers can see what a template needs before
//! attempting to resolve it against a [`Context`].
//!
//! Placeholder names are restricted to `[A-Za-z0-9_]+`. Double-brace tokens
//! whose inner text does not match that charset (for example the
//! `{{SFX: ...}}` sound annotations the tagging stage produces) are treated
//! as literal text and pass through resolution untouched.

pub mod context;

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TemplateError;

pub use context::{resolve, Context, ResolvedPrompt};

/// The placeholder token pattern: `{{name}}` with an identifier-only name.
pub(crate) fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder pattern is valid")
    })
}

/// Role of a single template turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    /// Wire-format role string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// One turn in a template's message history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTurn {
    /// Who speaks this turn.
    pub role: TurnRole,
    /// Turn text, possibly containing `{{name}}` placeholders.
    pub text: String,
}

impl MessageTurn {
    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
        }
    }
}

/// An immutable prompt template.
///
/// Created at startup from the built-in prompt set; never mutated.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    system: String,
    turns: Vec<MessageTurn>,
    placeholders: BTreeSet<String>,
}

impl Template {
    /// Create a template, extracting its declared placeholder set from the
    /// system instruction and every turn.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::InvalidTemplateName` if the name is empty or
    /// contains characters outside `[A-Za-z0-9_-]`.
    pub fn new(
        name: impl Into<String>,
        system: impl Into<String>,
        turns: Vec<MessageTurn>,
    ) -> Result<Self, TemplateError> {
        let name = name.into();
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(TemplateError::InvalidTemplateName(name));
        }

        let system = system.into();
        let mut placeholders = BTreeSet::new();
        scan_placeholders(&system, &mut placeholders);
        for turn in &turns {
            scan_placeholders(&turn.text, &mut placeholders);
        }

        Ok(Self {
            name,
            system,
            turns,
            placeholders,
        })
    }

    /// Template name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// System instruction text.
    pub fn system(&self) -> &str {
        &self.system
    }

    /// Ordered message turns.
    pub fn turns(&self) -> &[MessageTurn] {
        &self.turns
    }

    /// The set of placeholder names this template declares, sorted.
    pub fn placeholders(&self) -> &BTreeSet<String> {
        &self.placeholders
    }

    /// Whether this template declares the given placeholder.
    pub fn declares(&self, name: &str) -> bool {
        self.placeholders.contains(name)
    }
}

/// Collect placeholder names appearing in `text`.
fn scan_placeholders(text: &str, into: &mut BTreeSet<String>) {
    for captures in placeholder_regex().captures_iter(text) {
        into.insert(captures[1].to_string());
    }
}

/// Named registry of templates.
///
/// Read-only after construction; safe to share across concurrent runs.
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: HashMap<String, Template>,
}

impl TemplateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Duplicate` if a template with the same name
    /// is already registered.
    pub fn insert(&mut self, template: Template) -> Result<(), TemplateError> {
        if self.templates.contains_key(template.name()) {
            return Err(TemplateError::Duplicate(template.name().to_string()));
        }
        self.templates.insert(template.name().to_string(), template);
        Ok(())
    }

    /// Look up a template by name.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::NotFound` for unknown names.
    pub fn get(&self, name: &str) -> Result<&Template, TemplateError> {
        self.templates
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }

    /// Whether the store contains a template with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Registered template names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_extracts_placeholders() {
        let template = Template::new(
            "pitch",
            "You write pitches.",
            vec![
                MessageTurn::user("Here is the project:\n\n{{bible}}"),
                MessageTurn::assistant("Anything in particular?"),
                MessageTurn::user("{{kiddo_pitch_instruction}}\n\n{{pitch_user_message}}"),
            ],
        )
        .expect("valid template");

        let names: Vec<&str> = template.placeholders().iter().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["bible", "kiddo_pitch_instruction", "pitch_user_message"]
        );
        assert!(template.declares("bible"));
        assert!(!template.declares("script"));
    }

    #[test]
    fn test_template_extracts_from_system() {
        let template = Template::new(
            "t",
            "System referencing {{show_name}}.",
            vec![MessageTurn::user("hello")],
        )
        .expect("valid template");

        assert!(template.declares("show_name"));
    }

    #[test]
    fn test_repeated_placeholder_counted_once() {
        let template = Template::new(
            "t",
            "",
            vec![MessageTurn::user("{{bible}} and again {{bible}}")],
        )
        .expect("valid template");

        assert_eq!(template.placeholders().len(), 1);
    }

    #[test]
    fn test_sfx_annotation_is_not_a_placeholder() {
        let template = Template::new(
            "tagging",
            "Mark sound effects as {{SFX: description}}.",
            vec![MessageTurn::user("Here is the script: {{script}}")],
        )
        .expect("valid template");

        let names: Vec<&str> = template.placeholders().iter().map(String::as_str).collect();
        assert_eq!(names, vec!["script"]);
    }

    #[test]
    fn test_invalid_template_name() {
        let result = Template::new("bad name!", "", vec![]);
        assert!(matches!(
            result,
            Err(TemplateError::InvalidTemplateName(_))
        ));

        let result = Template::new("", "", vec![]);
        assert!(matches!(
            result,
            Err(TemplateError::InvalidTemplateName(_))
        ));
    }

    #[test]
    fn test_turn_role_as_str() {
        assert_eq!(TurnRole::User.as_str(), "user");
        assert_eq!(TurnRole::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_store_insert_and_get() {
        let mut store = TemplateStore::new();
        assert!(store.is_empty());

        let template = Template::new("pitch", "", vec![]).expect("valid template");
        store.insert(template).expect("insert succeeds");

        assert_eq!(store.len(), 1);
        assert!(store.contains("pitch"));
        assert_eq!(store.get("pitch").expect("found").name(), "pitch");
    }

    #[test]
    fn test_store_duplicate_rejected() {
        let mut store = TemplateStore::new();
        store
            .insert(Template::new("pitch", "", vec![]).expect("valid template"))
            .expect("first insert succeeds");

        let result = store.insert(Template::new("pitch", "other", vec![]).expect("valid template"));
        assert!(matches!(result, Err(TemplateError::Duplicate(name)) if name == "pitch"));
    }

    #[test]
    fn test_store_not_found() {
        let store = TemplateStore::new();
        let result = store.get("missing");
        assert!(matches!(result, Err(TemplateError::NotFound(name)) if name == "missing"));
    }

    #[test]
    fn test_store_names_sorted() {
        let mut store = TemplateStore::new();
        for name in ["tagging", "pitch", "script"] {
            store
                .insert(Template::new(name, "", vec![]).expect("valid template"))
                .expect("insert succeeds");
        }
        assert_eq!(store.names(), vec!["pitch", "script", "tagging"]);
    }
}
