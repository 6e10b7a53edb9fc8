//! H3C Comware platform definition.
//!
//! # Prompt Examples
//!
//! ```text
//! <HPE>                              # user view
//! [HPE]                              # system view
//! [HPE-vlan10]                       # VLAN view (a system sub-view)
//! [HPE-GigabitEthernet1/0/1]         # interface view
//! ```
//!
//! Sub-views are treated as system view: `return` leaves any of them
//! straight for user view.
//!
//! # View Graph
//!
//! ```text
//! ┌───────────┐  system-view  ┌─────────────┐
//! │ user_view ├───────────────► system_view │
//! │  <name>   │    return     │   [name*]   │
//! └───────────┘◄──────────────┴─────────────┘
//! ```

use std::sync::Arc;

use super::{PlatformDefinition, VendorBehavior, View};

/// Create the Comware platform definition.
pub fn platform() -> PlatformDefinition {
    let user_view = View::new("user_view", r"(?m)^<[^<>\r\n]{1,64}>\s*$").unwrap();

    let system_view = View::new("system_view", r"(?m)^\[[^\[\]\r\n]{1,64}\]\s*$")
        .unwrap()
        .with_parent("user_view")
        .with_enter("system-view")
        .with_exit("return");

    PlatformDefinition::new("comware")
        .with_view(user_view)
        .with_view(system_view)
        .with_default_view("user_view")
        .with_config_view("system_view")
        .with_failure_pattern("% Unrecognized command found at")
        .with_failure_pattern("% Incomplete command found at")
        .with_failure_pattern("% Wrong parameter found at")
        .with_failure_pattern("% Too many parameters found at")
        .with_failure_pattern("% Ambiguous command found at")
        .with_on_open_command("screen-length disable")
        .with_behavior(Arc::new(ComwareBehavior))
}

/// Output handling for Comware shells.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComwareBehavior;

impl VendorBehavior for ComwareBehavior {
    fn normalize_output(&self, raw: &str, command: &str) -> String {
        let text = raw.replace("\r\n", "\n").replace('\r', "");
        let mut lines: Vec<&str> = text.lines().collect();

        // The echo may carry the prompt in front of it after a view change.
        if lines
            .first()
            .is_some_and(|first| !command.is_empty() && first.trim_end().ends_with(command.trim()))
        {
            lines.remove(0);
        }
        lines.pop();

        lines.join("\n").trim_end().to_string()
    }

    fn detect_failure(&self, output: &str) -> Option<String> {
        output
            .lines()
            .map(str::trim)
            .find(|line| line.starts_with("% ") && line.contains(" found at "))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comware_platform() {
        let platform = platform();
        assert_eq!(platform.name, "comware");
        assert_eq!(platform.views.len(), 2);
        assert_eq!(platform.default_view, "user_view");
        assert_eq!(platform.config_view, "system_view");
        assert_eq!(platform.on_open_commands, vec!["screen-length disable"]);
        assert!(platform.validate().is_ok());
    }

    #[test]
    fn test_user_view_prompt_match() {
        let platform = platform();
        let user = platform.get_view("user_view").unwrap();

        assert!(user.pattern.is_match(b"<HPE>"));
        assert!(user.pattern.is_match(b"<HPE> "));
        assert!(user.pattern.is_match(b"<core-sw.lab_01>"));
        assert!(user.pattern.is_match(b"display vlan\r\n VLAN ID: 1\r\n<HPE>"));

        assert!(!user.pattern.is_match(b"[HPE]"));
        assert!(!user.pattern.is_match(b"<HPE>display vlan"));
    }

    #[test]
    fn test_system_view_prompt_match() {
        let platform = platform();
        let system = platform.get_view("system_view").unwrap();

        assert!(system.pattern.is_match(b"[HPE]"));
        assert!(system.pattern.is_match(b"[HPE-vlan10]"));
        assert!(system.pattern.is_match(b"[HPE-GigabitEthernet1/0/1]"));
        assert!(system.pattern.is_match(b"System View: return to User View with Ctrl+Z.\r\n[HPE]"));

        assert!(!system.pattern.is_match(b"<HPE>"));
        assert!(!system.pattern.is_match(b"[HPE]vlan 10"));
    }

    #[test]
    fn test_view_transitions() {
        let platform = platform();
        let system = platform.get_view("system_view").unwrap();
        assert_eq!(system.parent.as_deref(), Some("user_view"));
        assert_eq!(system.enter_command.as_deref(), Some("system-view"));
        assert_eq!(system.exit_command.as_deref(), Some("return"));
    }

    #[test]
    fn test_failure_patterns() {
        let platform = platform();
        let output = " ^\n % Unrecognized command found at '^' position.";
        assert_eq!(
            platform.failure_in(output),
            Some("% Unrecognized command found at")
        );
        assert_eq!(
            ComwareBehavior.detect_failure(output).as_deref(),
            Some("% Unrecognized command found at '^' position.")
        );
        assert_eq!(ComwareBehavior.detect_failure("VLAN ID: 10"), None);
    }

    #[test]
    fn test_normalize_output() {
        let raw = "display vlan\r\n Total VLANs: 2\r\n The VLANs include:\r\n 1, 10\r\n<HPE>";
        assert_eq!(
            ComwareBehavior.normalize_output(raw, "display vlan"),
            " Total VLANs: 2\n The VLANs include:\n 1, 10"
        );
    }

    #[test]
    fn test_normalize_output_without_body() {
        assert_eq!(
            ComwareBehavior.normalize_output("vlan 10\r\n[HPE-vlan10]", "vlan 10"),
            ""
        );
    }
}
