//! Prompt templates.
//!
//! Prompts are plain-text fragments stored under `config/prompts/`. A
//! [`PromptBuilder`] stacks fragments in order, joins them with blank lines,
//! and substitutes `{{key}}` placeholders once at [`build()`](PromptBuilder::build)
//! time. Missing files are skipped, or replaced by an inline fallback when one
//! is given.
//!
//! ## Templates
//!
//! ```text
//! system.md        system instructions for answers and chat turns
//! entity_system.md system instructions for entity queries
//! answer.md        {{context}} {{question}}
//! entity_query.md  {{context}} {{entity}}
//! chat.md          {{history}} {{context}} {{question}}
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const SEPARATOR: &str = "\n\n";

pub const SYSTEM_FILE: &str = "system.md";
pub const ENTITY_SYSTEM_FILE: &str = "entity_system.md";
pub const ANSWER_FILE: &str = "answer.md";
pub const ENTITY_QUERY_FILE: &str = "entity_query.md";
pub const CHAT_FILE: &str = "chat.md";

const DEFAULT_SYSTEM: &str =
    "You are a helpful assistant using a knowledge graph for accurate responses.";
const DEFAULT_ENTITY_SYSTEM: &str = "You are a helpful assistant using a knowledge graph.";
const DEFAULT_ANSWER: &str =
    "Based on this knowledge graph context: {{context}}\n\nUser question: {{question}}";
const DEFAULT_ENTITY_QUERY: &str =
    "Based on this knowledge: {{context}}. Answer: What is related to {{entity}}?";
const DEFAULT_CHAT: &str = "Conversation so far:\n{{history}}\n\nBased on this knowledge graph context:\n{{context}}\n\nUser question: {{question}}";

/// Fluent builder that assembles a prompt from template files and fragments.
pub struct PromptBuilder {
    prompts_dir: PathBuf,
    parts: Vec<String>,
    vars: HashMap<String, String>,
}

impl PromptBuilder {
    /// Create a builder rooted at `prompts_dir` (e.g. `"config/prompts"`).
    pub fn new(prompts_dir: impl Into<PathBuf>) -> Self {
        Self {
            prompts_dir: prompts_dir.into(),
            parts: Vec::new(),
            vars: HashMap::new(),
        }
    }

    /// Append a layer by loading `filename` from the prompts directory.
    /// Silently skips the layer when the file does not exist.
    pub fn layer(self, filename: &str) -> Self {
        self.load_layer(filename, None)
    }

    /// Like [`layer`](Self::layer), but appends `fallback` when the file is
    /// missing or empty.
    pub fn layer_or(self, filename: &str, fallback: &str) -> Self {
        self.load_layer(filename, Some(fallback))
    }

    fn load_layer(mut self, filename: &str, fallback: Option<&str>) -> Self {
        let path = self.prompts_dir.join(filename);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(_) => {
                tracing::debug!("prompt: layer '{}' not found, skipped", path.display());
                String::new()
            }
        };
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            self.parts.push(trimmed.to_string());
        } else if let Some(fallback) = fallback {
            self.parts.push(fallback.to_string());
        }
        self
    }

    /// Directly append a text fragment (e.g. an already-loaded template body).
    pub fn append(mut self, text: impl Into<String>) -> Self {
        let s = text.into();
        let trimmed = s.trim().to_string();
        if !trimmed.is_empty() {
            self.parts.push(trimmed);
        }
        self
    }

    /// Register `{{key}}` → `value` substitution pairs applied at build time.
    pub fn with_vars<'a, I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (k, v) in vars {
            self.vars.insert(k.to_string(), v.to_string());
        }
        self
    }

    /// Assemble all layers, join with blank lines, and apply variable substitution.
    pub fn build(self) -> String {
        render(&self.parts.join(SEPARATOR), &self.vars)
    }
}

/// Substitute `{{key}}` placeholders in one left-to-right pass.
///
/// Substituted values are not rescanned, so a value containing `{{x}}` is
/// inserted verbatim. Unknown placeholders are left in place.
pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        match after_open.find("}}") {
            Some(close) => {
                let key = &after_open[..close];
                match vars.get(key.trim()) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after_open[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

// ── PromptSet ─────────────────────────────────────────────────────────────────

/// The templates the answer composer needs, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    pub system: String,
    pub entity_system: String,
    pub answer: String,
    pub entity_query: String,
    pub chat: String,
}

impl PromptSet {
    /// Load every template from `prompts_dir`, falling back to the built-in
    /// text for any file that is missing.
    pub fn load(prompts_dir: impl AsRef<Path>) -> Self {
        let dir = prompts_dir.as_ref();
        let load = |file: &str, fallback: &str| {
            PromptBuilder::new(dir).layer_or(file, fallback).build()
        };
        Self {
            system: load(SYSTEM_FILE, DEFAULT_SYSTEM),
            entity_system: load(ENTITY_SYSTEM_FILE, DEFAULT_ENTITY_SYSTEM),
            answer: load(ANSWER_FILE, DEFAULT_ANSWER),
            entity_query: load(ENTITY_QUERY_FILE, DEFAULT_ENTITY_QUERY),
            chat: load(CHAT_FILE, DEFAULT_CHAT),
        }
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM.to_string(),
            entity_system: DEFAULT_ENTITY_SYSTEM.to_string(),
            answer: DEFAULT_ANSWER.to_string(),
            entity_query: DEFAULT_ENTITY_QUERY.to_string(),
            chat: DEFAULT_CHAT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompts_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("config/prompts")
    }

    #[test]
    fn builder_skips_missing_file() {
        let result = PromptBuilder::new(prompts_dir())
            .layer("nonexistent_file_xyz.md")
            .append("hello")
            .build();
        assert_eq!(result.trim(), "hello");
    }

    #[test]
    fn builder_uses_fallback_for_missing_file() {
        let result = PromptBuilder::new(prompts_dir())
            .layer_or("nonexistent_file_xyz.md", "fallback text")
            .build();
        assert_eq!(result, "fallback text");
    }

    #[test]
    fn builder_joins_layers_with_blank_line() {
        let result = PromptBuilder::new(prompts_dir()).append("one").append("two").build();
        assert_eq!(result, "one\n\ntwo");
    }

    #[test]
    fn builder_substitutes_variable() {
        let result = PromptBuilder::new(prompts_dir())
            .append("Facts: {{context}}")
            .with_vars([("context", "a knows b")])
            .build();
        assert_eq!(result, "Facts: a knows b");
    }

    #[test]
    fn values_are_not_rescanned() {
        let result = PromptBuilder::new(prompts_dir())
            .append("{{context}} / {{question}}")
            .with_vars([("context", "{{question}}"), ("question", "why?")])
            .build();
        assert_eq!(result, "{{question}} / why?");
    }

    #[test]
    fn unknown_and_unclosed_placeholders_kept() {
        let mut vars = HashMap::new();
        vars.insert("a".to_string(), "1".to_string());
        assert_eq!(render("{{a}} {{b}} {{c", &vars), "1 {{b}} {{c");
    }

    #[test]
    fn prompt_set_loads_repo_templates() {
        let set = PromptSet::load(prompts_dir());
        assert!(set.answer.contains("{{context}}"));
        assert!(set.entity_query.contains("{{entity}}"));
        assert!(set.chat.contains("{{history}}"));
        assert!(!set.system.is_empty());
        assert_eq!(set.entity_system, "You are a helpful assistant using a knowledge graph.");
        assert_ne!(set.entity_system, set.system);
    }

    #[test]
    fn prompt_set_falls_back_when_dir_missing() {
        let set = PromptSet::load("/nonexistent/prompts");
        assert_eq!(set, PromptSet::default());
    }
}
