//! Platform definitions for the CLI driver.
//!
//! A platform tells the driver how to recognize each view from its prompt,
//! how to move between views, and how to tell a rejected command from a
//! successful one. [`comware::platform`] is the built-in definition; a
//! modified copy can be handed to the driver builder for odd firmware.

pub mod comware;
mod definition;
mod view;

pub use comware::ComwareBehavior;
pub use definition::PlatformDefinition;
pub use view::View;

/// Device-specific output handling.
pub trait VendorBehavior: Send + Sync {
    /// Strip the command echo and the trailing prompt from raw output.
    fn normalize_output(&self, raw: &str, command: &str) -> String;

    /// Error message if the output shows the command was rejected.
    fn detect_failure(&self, output: &str) -> Option<String>;
}
