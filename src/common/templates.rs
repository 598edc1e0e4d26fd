//! `${NAME}` placeholder substitution for config values.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{([\w-]+)\}").expect("placeholder regex is valid"))
}

/// Expands `${NAME}` placeholders against a fixed set of variables.
///
/// Unknown names expand to the empty string. Text that only looks like a
/// placeholder (`$NAME`, `${}`) is left untouched.
#[derive(Debug, Clone, Default)]
pub struct TemplateProcessor {
    variables: HashMap<String, String>,
}

impl TemplateProcessor {
    /// Create a processor with no variables
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Substitute every placeholder in `template`
    pub fn process(&self, template: &str) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &regex::Captures<'_>| {
                self.variables
                    .get(&caps[1])
                    .cloned()
                    .unwrap_or_default()
            })
            .into_owned()
    }
}
