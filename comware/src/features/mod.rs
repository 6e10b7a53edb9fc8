//! Feature builders: map feature parameters onto staged operations.
//!
//! Every builder can either stage its payload for the next batch or send it
//! straight away; [`Submission`] says which happened.

pub mod reboot;
pub mod startup;
pub mod vlan;

pub use reboot::RebootSchedule;
pub use startup::{BootImage, BootImages, SetStartup};
pub use vlan::{Vlan, VlanState};

use crate::connection::Reply;
use crate::xml::Element;

/// Result of handing a payload to the device.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Queued for [`Device::execute_staged`](crate::device::Device::execute_staged).
    Staged,
    /// Sent immediately; this is the device's answer.
    Sent(Reply),
}

/// Root element of a `get` reply, if the transport returned XML.
fn reply_root(reply: &Reply) -> Option<&Element> {
    reply.as_xml()
}
