//! # Comware
//!
//! Staged configuration for H3C Comware switches over NETCONF or the CLI.
//!
//! Configuration is built up front, staged on a [`Device`], and sent in
//! order with [`Device::execute_staged`]. Whether the session speaks
//! NETCONF or only the CLI is negotiated once from its capabilities; the
//! staged operations do not need to know.
//!
//! ## Features
//!
//! - XML helpers for H3C's NETCONF namespaces, with key/value maps between
//!   field names and device tags
//! - A staging queue of `edit_config`, `action`, `save`, `rollback`,
//!   `cli_config` and `cli_display` operations, executed FIFO
//! - CLI output extraction from NETCONF `<CLI>` replies
//! - Reboot-aware execution: a dropped session after `reboot` counts as
//!   success
//! - An async SSH CLI driver for devices without NETCONF
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use comware::{CliSession, Device, Driver, DriverBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), comware::Error> {
//!     let mut driver = DriverBuilder::new("192.0.2.10")
//!         .username("admin")
//!         .password("secret")
//!         .build()?;
//!     driver.open().await?;
//!
//!     let mut device = Device::new(CliSession::new(driver));
//!     device.stage_config(vec!["vlan 10", "name servers"], "cli_config")?;
//!
//!     for reply in device.execute_staged().await? {
//!         println!("{:?}", reply);
//!     }
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod cliconf;
pub mod connection;
pub mod device;
pub mod driver;
pub mod error;
pub mod features;
pub mod platform;
pub mod transport;
pub mod workflow;
pub mod xml;

pub use cliconf::CliSession;
pub use connection::{Capabilities, Connection, Datastore, GetQuery, Reply, SessionContext, SessionHandle};
pub use device::{Device, OperationKind, Payload, StagedOperation};
pub use driver::{CliDriver, Driver, DriverBuilder, Response};
pub use error::{Error, Result};
pub use platform::PlatformDefinition;
pub use transport::{AuthMethod, HostKeyVerification, SshConfig};
pub use workflow::{ModuleFailure, ModuleResult, Outcome, RunOptions};
pub use xml::{Element, ElementMaker};
