//! What the shell answered to one command.

use std::fmt;
use std::time::Duration;

use crate::error::{DriverError, Result};

/// Output of one command, without its echo and the closing prompt.
///
/// A command the switch refuses still reads up to a prompt, so it gets a
/// `Response` too; the `% ...` line lands in `rejection`.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub command: String,
    pub output: String,
    /// Prompt line that ended the read, e.g. `[HPE-vlan10]`.
    pub prompt: String,
    pub elapsed: Duration,
    pub rejection: Option<String>,
}

impl Response {
    pub fn new(command: impl Into<String>, output: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            prompt: prompt.into(),
            elapsed: Duration::ZERO,
            rejection: None,
        }
    }

    pub fn timed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn rejected(mut self, message: impl Into<String>) -> Self {
        self.rejection = Some(message.into());
        self
    }

    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }

    /// The output, or [`DriverError::CommandFailed`] if the switch refused
    /// the command.
    pub fn into_output(self) -> Result<String> {
        match self.rejection {
            Some(message) => Err(DriverError::CommandFailed {
                command: self.command,
                message,
            }
            .into()),
            None => Ok(self.output),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.prompt, self.command)?;
        if !self.output.is_empty() {
            write!(f, "\n{}", self.output)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_accepted_command_yields_output() {
        let response = Response::new("display vlan", "VLAN 1", "<HPE>").timed(Duration::from_millis(40));
        assert!(!response.is_rejected());
        assert_eq!(response.to_string(), "<HPE> display vlan\nVLAN 1");
        assert_eq!(response.into_output().unwrap(), "VLAN 1");
    }

    #[test]
    fn test_rejected_command_becomes_command_failed() {
        let response = Response::new("vlan 5000", "", "[HPE]").rejected("% Wrong parameter found at '^' position.");
        assert!(response.is_rejected());
        assert_eq!(response.to_string(), "[HPE] vlan 5000");

        match response.into_output() {
            Err(Error::Driver(DriverError::CommandFailed { command, message })) => {
                assert_eq!(command, "vlan 5000");
                assert_eq!(message, "% Wrong parameter found at '^' position.");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
