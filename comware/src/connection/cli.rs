//! Facade for sessions that only speak the interactive CLI.

use log::{debug, info};

use super::{Datastore, GetQuery, Reply, SessionHandle, is_expected_disconnect};
use crate::error::{ConnectionError, Result};

const NETWORK_API: &str = "cliconf";

/// CLI-backed connection.
///
/// Display and configuration commands go straight to the session; the
/// NETCONF-only primitives are refused.
#[derive(Debug)]
pub struct CliConnection<H> {
    handle: H,
}

impl<H: SessionHandle> CliConnection<H> {
    pub fn new(handle: H) -> Self {
        Self { handle }
    }

    pub async fn get(&mut self, query: &GetQuery) -> Result<Reply> {
        match query {
            GetQuery::Command(command) => {
                let output = self.handle.send_command(command).await?;
                Ok(Reply::Text(output))
            }
            GetQuery::Subtree(_) => Err(unsupported("get (subtree)")),
        }
    }

    pub async fn edit_config(&mut self, _config: &str, _target: Datastore) -> Result<Reply> {
        Err(unsupported("edit_config"))
    }

    pub async fn action(&mut self, _element: &str) -> Result<Reply> {
        Err(unsupported("action"))
    }

    pub async fn save(&mut self, _filename: Option<&str>) -> Result<Reply> {
        Err(unsupported("save"))
    }

    pub async fn rollback(&mut self, _filename: &str) -> Result<Reply> {
        Err(unsupported("rollback"))
    }

    /// Run each command in user view; outputs are joined with newlines.
    pub async fn cli_display(&mut self, commands: &[String]) -> Result<Reply> {
        let mut outputs = Vec::with_capacity(commands.len());
        for command in commands {
            outputs.push(self.handle.send_command(command).await?);
        }
        Ok(Reply::Text(outputs.join("\n")))
    }

    pub async fn cli_config(&mut self, commands: &[String]) -> Result<Reply> {
        debug!("Sending {} configuration commands", commands.len());
        let output = self.handle.send_config(commands).await?;
        Ok(Reply::Text(output))
    }

    pub async fn reboot(&mut self) -> Result<()> {
        match self.handle.send_command("reboot force").await {
            Ok(_) => Ok(()),
            Err(e) if is_expected_disconnect(&e) => {
                info!("Session dropped after reboot: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn unsupported(operation: &'static str) -> crate::error::Error {
    ConnectionError::UnsupportedOperation {
        operation,
        network_api: NETWORK_API,
    }
    .into()
}
