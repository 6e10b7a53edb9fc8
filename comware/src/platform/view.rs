//! CLI view definition.

use regex::bytes::Regex;

/// A command view on the device, recognized by its prompt.
///
/// Views form a tree: each view but the root names the view it is entered
/// from, plus the commands that move between the two.
#[derive(Debug, Clone)]
pub struct View {
    /// Name of the view (e.g. "user_view", "system_view").
    pub name: String,

    /// Regex matching this view's prompt.
    pub pattern: Regex,

    /// View this one is entered from (None for the root view).
    pub parent: Option<String>,

    /// Command that enters this view from its parent.
    pub enter_command: Option<String>,

    /// Command that leaves this view for its parent.
    pub exit_command: Option<String>,

    /// Substrings that rule a prompt out even when `pattern` matches.
    pub not_contains: Vec<String>,
}

impl View {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            parent: None,
            enter_command: None,
            exit_command: None,
            not_contains: vec![],
        })
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_enter(mut self, command: impl Into<String>) -> Self {
        self.enter_command = Some(command.into());
        self
    }

    pub fn with_exit(mut self, command: impl Into<String>) -> Self {
        self.exit_command = Some(command.into());
        self
    }

    pub fn with_not_contains(mut self, pattern: impl Into<String>) -> Self {
        self.not_contains.push(pattern.into());
        self
    }

    /// Check whether `prompt` belongs to this view.
    pub fn matches(&self, prompt: &str) -> bool {
        if self.not_contains.iter().any(|nc| prompt.contains(nc.as_str())) {
            return false;
        }
        self.pattern.is_match(prompt.as_bytes())
    }
}
