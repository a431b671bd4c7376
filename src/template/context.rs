//! Per-run placeholder bindings and template resolution.
//!
//! A [`Context`] maps placeholder names to resolved string values. It is
//! built for a single pipeline run and discarded afterwards; the
//! orchestrator inserts each stage's output into it before the next stage
//! resolves.

use std::collections::HashMap;

use crate::error::TemplateError;
use crate::llm::Message;

use super::{placeholder_regex, Template};

/// A mapping from placeholder name to resolved string value.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: HashMap<String, String>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value, builder style.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Bind a value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Get a bound value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Whether the given name is bound. An empty string is a valid binding.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of bound values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the context has no bindings.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A fully resolved prompt, ready to send to the backend.
#[derive(Debug, Clone)]
pub struct ResolvedPrompt {
    /// Resolved system instruction.
    pub system: String,
    /// Resolved conversation messages, in template order.
    pub messages: Vec<Message>,
}

/// Resolve a template against a context.
///
/// Produces a message list with every placeholder substituted. Fails with
/// [`TemplateError::UnboundPlaceholders`] listing every declared
/// placeholder the context does not bind. Side-effect free.
pub fn resolve(template: &Template, context: &Context) -> Result<ResolvedPrompt, TemplateError> {
    let missing: Vec<String> = template
        .placeholders()
        .iter()
        .filter(|name| !context.contains(name))
        .cloned()
        .collect();

    if !missing.is_empty() {
        return Err(TemplateError::UnboundPlaceholders {
            template: template.name().to_string(),
            names: missing,
        });
    }

    let system = substitute(template.system(), context);
    let messages = template
        .turns()
        .iter()
        .map(|turn| Message {
            role: turn.role.as_str().to_string(),
            content: substitute(&turn.text, context),
        })
        .collect();

    Ok(ResolvedPrompt { system, messages })
}

/// Substitute every placeholder occurrence in `text`.
///
/// Missing names cannot occur here; `resolve` has already checked the full
/// declared set.
fn substitute(text: &str, context: &Context) -> String {
    placeholder_regex()
        .replace_all(text, |captures: &regex::Captures<'_>| {
            context.get(&captures[1]).unwrap_or_default().to_string()
        })
        .into_owned()
}
