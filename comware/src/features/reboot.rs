//! Immediate and scheduled reboots.

use super::Submission;
use crate::connection::{Reply, SessionHandle};
use crate::device::Device;
use crate::error::Result;

/// When the switch should reboot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebootSchedule {
    /// Right away, without confirmation.
    Now,
    /// After this many minutes.
    Delay(String),
    /// At `HH:MM`, optionally on `MM/DD/YYYY`.
    At { time: String, date: Option<String> },
}

impl RebootSchedule {
    pub fn commands(&self) -> Vec<String> {
        let command = match self {
            RebootSchedule::Now => "reboot force".to_string(),
            RebootSchedule::Delay(minutes) => format!("scheduler reboot delay {minutes}"),
            RebootSchedule::At { time, date: None } => format!("scheduler reboot at {time}"),
            RebootSchedule::At {
                time,
                date: Some(date),
            } => format!("scheduler reboot at {time} {date}"),
        };
        vec![command]
    }

    /// Whether a timeout or a closed session while the commands run counts
    /// as the reboot having happened. A scheduled reboot may still drop a
    /// session that is slow to answer, so every schedule says yes.
    pub fn drops_session(&self) -> bool {
        true
    }

    /// Stage the reboot commands, or run them now.
    pub async fn build<H: SessionHandle>(&self, device: &mut Device<H>, stage: bool) -> Result<Submission> {
        if stage {
            device.stage_config(self.commands(), "cli_display")?;
            Ok(Submission::Staged)
        } else {
            let output = device.cli_display(self.commands()).await?;
            Ok(Submission::Sent(Reply::Text(output)))
        }
    }
}
