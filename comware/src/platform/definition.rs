//! Platform definition: prompts, views and device quirks.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::bytes::Regex;

use super::VendorBehavior;
use super::view::View;
use crate::error::{ChannelError, PlatformError, Result};

/// Everything the CLI driver needs to know about a device family.
#[derive(Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g. "comware").
    pub name: String,

    /// Views, in prompt-matching order.
    pub views: IndexMap<String, View>,

    /// View commands are sent from.
    pub default_view: String,

    /// View configuration commands are sent from.
    pub config_view: String,

    /// Output substrings that mark a command as rejected.
    pub failed_when_contains: Vec<String>,

    /// Commands run once the first prompt is seen.
    pub on_open_commands: Vec<String>,

    /// Commands run before the channel is closed.
    pub on_close_commands: Vec<String>,

    /// Output normalization and failure detection hooks.
    pub behavior: Option<Arc<dyn VendorBehavior>>,
}

impl PlatformDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            views: IndexMap::new(),
            default_view: String::new(),
            config_view: String::new(),
            failed_when_contains: vec![],
            on_open_commands: vec![],
            on_close_commands: vec![],
            behavior: None,
        }
    }

    pub fn with_view(mut self, view: View) -> Self {
        self.views.insert(view.name.clone(), view);
        self
    }

    pub fn with_default_view(mut self, name: impl Into<String>) -> Self {
        self.default_view = name.into();
        self
    }

    pub fn with_config_view(mut self, name: impl Into<String>) -> Self {
        self.config_view = name.into();
        self
    }

    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    pub fn with_on_close_command(mut self, command: impl Into<String>) -> Self {
        self.on_close_commands.push(command.into());
        self
    }

    pub fn with_behavior(mut self, behavior: Arc<dyn VendorBehavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    pub fn get_view(&self, name: &str) -> Option<&View> {
        self.views.get(name)
    }

    /// First configured failure substring found in `output`.
    pub fn failure_in(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .map(String::as_str)
            .find(|pattern| output.contains(pattern))
    }

    /// Check that the named views exist and the view tree is connected.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| PlatformError::InvalidDefinition { message };

        if self.views.is_empty() {
            return Err(invalid(format!("platform '{}' defines no views", self.name)).into());
        }
        for name in [&self.default_view, &self.config_view] {
            if !self.views.contains_key(name) {
                return Err(invalid(format!("unknown view '{}'", name)).into());
            }
        }
        for view in self.views.values() {
            if let Some(parent) = &view.parent {
                if !self.views.contains_key(parent) {
                    return Err(invalid(format!(
                        "view '{}' has unknown parent '{}'",
                        view.name, parent
                    ))
                    .into());
                }
                if view.enter_command.is_none() {
                    return Err(
                        invalid(format!("view '{}' has no enter command", view.name)).into(),
                    );
                }
            }
        }
        Ok(())
    }

    /// One regex matching the prompt of any view.
    pub fn prompt_pattern(&self) -> Result<Regex> {
        let combined = self
            .views
            .values()
            .map(|view| format!("(?:{})", view.pattern.as_str()))
            .collect::<Vec<_>>()
            .join("|");
        Ok(Regex::new(&combined).map_err(ChannelError::from)?)
    }
}

impl fmt::Debug for PlatformDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformDefinition")
            .field("name", &self.name)
            .field("views", &self.views)
            .field("default_view", &self.default_view)
            .field("config_view", &self.config_view)
            .field("failed_when_contains", &self.failed_when_contains)
            .field("on_open_commands", &self.on_open_commands)
            .field("on_close_commands", &self.on_close_commands)
            .field(
                "behavior",
                &self.behavior.as_ref().map(|_| "<VendorBehavior>"),
            )
            .finish()
    }
}
