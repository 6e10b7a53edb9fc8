//! [`SessionHandle`] over the CLI driver.
//!
//! This is the `cliconf` side of capability negotiation: the capability
//! document always reports `network_api: "cliconf"`, so a
//! [`SessionContext`](crate::connection::SessionContext) built on it
//! resolves to the CLI facade.

use log::debug;
use regex::Regex;

use crate::connection::{Capabilities, DeviceInfo, NetworkApi, SessionHandle};
use crate::driver::{Driver, Response};
use crate::error::{ChannelError, ConnectionError, Result};

/// Operations the CLI facade can carry out.
pub const CLI_RPCS: &[&str] = &["get", "get_capabilities", "cli_display", "cli_config", "reboot"];

/// A CLI driver seen as a device session.
pub struct CliSession<D> {
    driver: D,
}

impl<D: Driver> CliSession<D> {
    /// Wrap an already opened driver.
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_inner(self) -> D {
        self.driver
    }
}

impl DeviceInfo {
    /// Pick OS version and model out of `display version` output.
    pub fn from_display_version(output: &str) -> Result<Self> {
        let version = Regex::new(r"(?m)^H3C.+Version\s+(\S+)").map_err(ChannelError::from)?;
        let hostname = Regex::new(r"(?m)H3C\s+(\S+)\s+uptime").map_err(ChannelError::from)?;

        Ok(DeviceInfo {
            network_os: Some("comware".to_string()),
            network_os_version: version
                .captures(output)
                .map(|c| c[1].trim_end_matches(',').to_string()),
            network_os_hostname: hostname.captures(output).map(|c| c[1].to_string()),
        })
    }
}

impl<D: Driver> SessionHandle for CliSession<D> {
    async fn get_capabilities(&mut self) -> Result<String> {
        let version = self.driver.send_command("display version").await?.into_output()?;
        let capabilities = Capabilities {
            network_api: NetworkApi::Cliconf.as_str().to_string(),
            rpc: CLI_RPCS.iter().map(|rpc| rpc.to_string()).collect(),
            device_info: DeviceInfo::from_display_version(&version)?,
        };
        debug!("CLI capabilities: {:?}", capabilities.device_info);
        Ok(serde_json::to_string(&capabilities).map_err(ConnectionError::CapabilitiesParse)?)
    }

    async fn send_command(&mut self, command: &str) -> Result<String> {
        self.driver.send_command(command).await?.into_output()
    }

    async fn send_config(&mut self, commands: &[String]) -> Result<String> {
        let commands: Vec<&str> = commands.iter().map(String::as_str).collect();
        let responses = self.driver.send_config(&commands).await?;

        let outputs = responses
            .into_iter()
            .map(Response::into_output)
            .collect::<Result<Vec<_>>>()?;
        Ok(outputs.join("\n"))
    }

    async fn rpc(&mut self, _body: &str) -> Result<String> {
        Err(ConnectionError::UnsupportedOperation {
            operation: "rpc",
            network_api: "cliconf",
        }
        .into())
    }
}
