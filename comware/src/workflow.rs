//! Top-level run of a staged batch, as a module entry point would do it.
//!
//! [`apply`] decides between "nothing to do", check mode, and a real
//! execution, and turns the outcome into a serializable result or failure
//! report. Failure reports always echo the commands that were staged.

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::connection::{Reply, SessionHandle};
use crate::device::{Device, StagedText};
use crate::error::Error;

/// How a batch execution ended.
#[derive(Debug)]
pub enum Outcome {
    /// Every operation ran.
    Applied(Vec<Reply>),
    /// The session dropped while a disconnect was expected (reboot).
    ExpectedTimeout,
    /// Anything else.
    UnexpectedFailure(Error),
}

/// Run the staged batch and classify the result.
///
/// With `disconnect_expected`, a timeout or a closed session counts as the
/// device going down as asked.
pub async fn execute<H: SessionHandle>(device: &mut Device<H>, disconnect_expected: bool) -> Outcome {
    match device.execute_staged().await {
        Ok(replies) => Outcome::Applied(replies),
        Err(e) if disconnect_expected && (e.is_timeout() || e.is_connection_closed()) => {
            info!("Device dropped the session as expected: {}", e);
            Outcome::ExpectedTimeout
        }
        Err(e) => Outcome::UnexpectedFailure(e),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Report what would be sent without sending it.
    pub check_mode: bool,

    /// The batch ends in a reboot-class command.
    pub disconnect_expected: bool,
}

/// Successful run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleResult {
    pub changed: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub rebooted: bool,

    pub commands: Option<Vec<StagedText>>,

    pub response: Option<Vec<Reply>>,
}

/// Failed run report.
#[derive(Error, Debug, Serialize)]
#[error("{msg}")]
pub struct ModuleFailure {
    pub msg: String,

    pub descr: String,

    pub commands: Option<Vec<StagedText>>,
}

impl ModuleFailure {
    fn new(msg: impl Into<String>, descr: &str, commands: Option<Vec<StagedText>>) -> Self {
        Self {
            msg: msg.into(),
            descr: descr.to_string(),
            commands,
        }
    }
}

/// Execute whatever is staged on `device` and build the run report.
///
/// In check mode the queue is left as it was.
pub async fn apply<H: SessionHandle>(
    device: &mut Device<H>,
    options: RunOptions,
) -> Result<ModuleResult, ModuleFailure> {
    if device.staged().is_empty() {
        return Ok(ModuleResult {
            changed: false,
            rebooted: false,
            commands: None,
            response: None,
        });
    }

    let commands = device
        .staged_to_string()
        .map_err(|e| ModuleFailure::new(e.to_string(), "error rendering staged commands", None))?;

    if options.check_mode {
        return Ok(ModuleResult {
            changed: true,
            rebooted: false,
            commands: Some(commands),
            response: None,
        });
    }

    match execute(device, options.disconnect_expected).await {
        Outcome::Applied(replies) => Ok(ModuleResult {
            changed: true,
            rebooted: false,
            commands: Some(commands),
            response: Some(replies),
        }),
        Outcome::ExpectedTimeout => Ok(ModuleResult {
            changed: true,
            rebooted: true,
            commands: Some(commands),
            response: None,
        }),
        Outcome::UnexpectedFailure(e) => {
            warn!("Execution failed: {}", e);
            Err(ModuleFailure::new(
                e.to_string(),
                "error during execution",
                Some(commands),
            ))
        }
    }
}
