//! Connection facade over the CLI and NETCONF transports.
//!
//! A [`SessionHandle`] is the raw session to the device (an SSH CLI driver,
//! a NETCONF client, or a test double). [`SessionContext`] fetches the
//! handle's capability document once, picks the matching facade, and keeps
//! both for the rest of the run.

mod cli;
mod netconf;

pub use cli::CliConnection;
pub use netconf::NetconfConnection;

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ConnectionError, Error, Result};
use crate::xml::Element;

/// Raw session to a device.
///
/// Implementations own framing and message ids; the facades only build
/// request bodies and interpret replies.
pub trait SessionHandle: Send {
    /// JSON capability document (see [`Capabilities`]).
    fn get_capabilities(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Run one command in the default view and return its output.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<String>> + Send;

    /// Run commands in configuration view and return the combined output.
    fn send_config(&mut self, commands: &[String]) -> impl Future<Output = Result<String>> + Send;

    /// Send an rpc body and return the raw `rpc-reply` document.
    fn rpc(&mut self, body: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Decoded capability document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub network_api: String,

    #[serde(default)]
    pub rpc: Vec<String>,

    #[serde(default)]
    pub device_info: DeviceInfo,
}

impl Capabilities {
    pub fn from_json(document: &str) -> Result<Self> {
        serde_json::from_str(document).map_err(|e| ConnectionError::CapabilitiesParse(e).into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub network_os: Option<String>,

    #[serde(default)]
    pub network_os_version: Option<String>,

    #[serde(default)]
    pub network_os_hostname: Option<String>,
}

/// Transports a device session can negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkApi {
    Cliconf,
    Netconf,
}

impl NetworkApi {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkApi::Cliconf => "cliconf",
            NetworkApi::Netconf => "netconf",
        }
    }
}

impl FromStr for NetworkApi {
    type Err = ConnectionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cliconf" => Ok(NetworkApi::Cliconf),
            "netconf" => Ok(NetworkApi::Netconf),
            other => Err(ConnectionError::UnsupportedTransport {
                network_api: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for NetworkApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// NETCONF datastore targeted by `edit-config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Datastore {
    #[default]
    Running,
    Candidate,
    Startup,
}

impl fmt::Display for Datastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Datastore::Running => "running",
            Datastore::Candidate => "candidate",
            Datastore::Startup => "startup",
        })
    }
}

/// Read request for [`Connection::get`].
#[derive(Debug, Clone, PartialEq)]
pub enum GetQuery {
    /// Subtree filter, sent inside `<filter type="subtree">`.
    Subtree(Element),
    /// A display command.
    Command(String),
}

/// What a transport call returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Parsed `rpc-reply`.
    Xml(Element),
    /// CLI output.
    Text(String),
    /// Nothing to report.
    Empty,
}

impl Reply {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_xml(&self) -> Option<&Element> {
        match self {
            Reply::Xml(element) => Some(element),
            _ => None,
        }
    }
}

impl Serialize for Reply {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Reply::Xml(element) => {
                let xml = element.to_xml().map_err(serde::ser::Error::custom)?;
                serializer.serialize_str(&xml)
            }
            Reply::Text(text) => serializer.serialize_str(text),
            Reply::Empty => serializer.serialize_none(),
        }
    }
}

/// The facade selected for a session.
#[derive(Debug)]
pub enum Connection<H> {
    Cli(CliConnection<H>),
    Netconf(NetconfConnection<H>),
}

impl<H: SessionHandle> Connection<H> {
    pub fn network_api(&self) -> NetworkApi {
        match self {
            Connection::Cli(_) => NetworkApi::Cliconf,
            Connection::Netconf(_) => NetworkApi::Netconf,
        }
    }

    pub async fn get(&mut self, query: &GetQuery) -> Result<Reply> {
        match self {
            Connection::Cli(c) => c.get(query).await,
            Connection::Netconf(c) => c.get(query).await,
        }
    }

    pub async fn edit_config(&mut self, config: &str, target: Datastore) -> Result<Reply> {
        match self {
            Connection::Cli(c) => c.edit_config(config, target).await,
            Connection::Netconf(c) => c.edit_config(config, target).await,
        }
    }

    pub async fn action(&mut self, element: &str) -> Result<Reply> {
        match self {
            Connection::Cli(c) => c.action(element).await,
            Connection::Netconf(c) => c.action(element).await,
        }
    }

    pub async fn save(&mut self, filename: Option<&str>) -> Result<Reply> {
        match self {
            Connection::Cli(c) => c.save(filename).await,
            Connection::Netconf(c) => c.save(filename).await,
        }
    }

    pub async fn rollback(&mut self, filename: &str) -> Result<Reply> {
        match self {
            Connection::Cli(c) => c.rollback(filename).await,
            Connection::Netconf(c) => c.rollback(filename).await,
        }
    }

    pub async fn cli_display(&mut self, commands: &[String]) -> Result<Reply> {
        match self {
            Connection::Cli(c) => c.cli_display(commands).await,
            Connection::Netconf(c) => c.cli_display(commands).await,
        }
    }

    pub async fn cli_config(&mut self, commands: &[String]) -> Result<Reply> {
        match self {
            Connection::Cli(c) => c.cli_config(commands).await,
            Connection::Netconf(c) => c.cli_config(commands).await,
        }
    }

    /// Ask the device to reboot now.
    ///
    /// The session is expected to drop; a timeout or close on the way out
    /// is not an error.
    pub async fn reboot(&mut self) -> Result<()> {
        match self {
            Connection::Cli(c) => c.reboot().await,
            Connection::Netconf(c) => c.reboot().await,
        }
    }
}

/// Per-run connection state: the raw handle, its capabilities, and the
/// facade built from them. Each is resolved at most once.
#[derive(Debug)]
pub struct SessionContext<H> {
    handle: Option<H>,
    capabilities: Option<Capabilities>,
    connection: Option<Connection<H>>,
}

impl<H: SessionHandle> SessionContext<H> {
    pub fn new(handle: H) -> Self {
        Self {
            handle: Some(handle),
            capabilities: None,
            connection: None,
        }
    }

    /// Capabilities of the session, fetched on first use.
    pub async fn capabilities(&mut self) -> Result<&Capabilities> {
        let capabilities = match self.capabilities.take() {
            Some(capabilities) => capabilities,
            None => self.fetch_capabilities().await?,
        };
        Ok(self.capabilities.insert(capabilities))
    }

    /// The connection facade, resolved on first use.
    pub async fn connection(&mut self) -> Result<&mut Connection<H>> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => self.resolve().await?,
        };
        Ok(self.connection.insert(connection))
    }

    pub fn is_resolved(&self) -> bool {
        self.connection.is_some()
    }

    async fn fetch_capabilities(&mut self) -> Result<Capabilities> {
        let handle = self
            .handle
            .as_mut()
            .ok_or(ConnectionError::HandleUnavailable)?;

        debug!("Fetching device capabilities");
        let document = handle
            .get_capabilities()
            .await
            .map_err(|e| ConnectionError::CapabilitiesFetch(Box::new(e)))?;
        let capabilities = Capabilities::from_json(&document)?;
        debug!(
            "Capabilities: network_api={}, {} rpcs",
            capabilities.network_api,
            capabilities.rpc.len()
        );
        Ok(capabilities)
    }

    async fn resolve(&mut self) -> Result<Connection<H>> {
        let api: NetworkApi = self.capabilities().await?.network_api.parse()?;
        let handle = self
            .handle
            .take()
            .ok_or(ConnectionError::HandleUnavailable)?;

        info!("Using {} connection", api);
        Ok(match api {
            NetworkApi::Cliconf => Connection::Cli(CliConnection::new(handle)),
            NetworkApi::Netconf => Connection::Netconf(NetconfConnection::new(handle)),
        })
    }
}

/// Whether an error is the session going away, as a reboot does.
pub(crate) fn is_expected_disconnect(err: &Error) -> bool {
    err.is_timeout() || err.is_connection_closed()
}


#[cfg(test)]
mod tests {
    use super::mock::{Call, MockSession, calls};
    use super::*;
    use crate::error::DriverError;

    #[tokio::test]
    async fn test_capabilities_fetched_once() {
        let session = MockSession::netconf();
        let log = session.log();
        let mut ctx = SessionContext::new(session);

        assert_eq!(ctx.capabilities().await.unwrap().network_api, "netconf");
        assert_eq!(ctx.capabilities().await.unwrap().rpc, vec!["get".to_string()]);
        assert_eq!(calls(&log), vec![Call::Capabilities]);
    }

    #[tokio::test]
    async fn test_connection_resolved_once() {
        let session = MockSession::cliconf();
        let log = session.log();
        let mut ctx = SessionContext::new(session);

        assert!(!ctx.is_resolved());
        assert_eq!(ctx.connection().await.unwrap().network_api(), NetworkApi::Cliconf);
        assert_eq!(ctx.connection().await.unwrap().network_api(), NetworkApi::Cliconf);
        assert!(ctx.is_resolved());
        assert_eq!(calls(&log), vec![Call::Capabilities]);
    }

    #[tokio::test]
    async fn test_unknown_network_api_is_fatal() {
        let mut ctx = SessionContext::new(MockSession::new("restconf"));
        let err = ctx.connection().await.unwrap_err();
        assert_eq!(err.to_string(), "Connection error: Invalid connection type restconf");
        assert!(!ctx.is_resolved());
    }

    #[tokio::test]
    async fn test_malformed_capabilities() {
        let session = MockSession::netconf().with_capabilities("{not json");
        let mut ctx = SessionContext::new(session);
        assert!(matches!(
            ctx.capabilities().await,
            Err(Error::Connection(ConnectionError::CapabilitiesParse(_)))
        ));
    }

    #[tokio::test]
    async fn test_capabilities_fetch_failure_is_wrapped() {
        struct Unreachable;

        impl SessionHandle for Unreachable {
            async fn get_capabilities(&mut self) -> Result<String> {
                Err(DriverError::NotConnected.into())
            }
            async fn send_command(&mut self, _: &str) -> Result<String> {
                Err(DriverError::NotConnected.into())
            }
            async fn send_config(&mut self, _: &[String]) -> Result<String> {
                Err(DriverError::NotConnected.into())
            }
            async fn rpc(&mut self, _: &str) -> Result<String> {
                Err(DriverError::NotConnected.into())
            }
        }

        let mut ctx = SessionContext::new(Unreachable);
        assert!(matches!(
            ctx.connection().await,
            Err(Error::Connection(ConnectionError::CapabilitiesFetch(_)))
        ));
    }

    #[test]
    fn test_capabilities_decode_device_info() {
        let caps = Capabilities::from_json(
            r#"{"network_api":"cliconf","device_info":{"network_os":"comware","network_os_version":"7.1.070"}}"#,
        )
        .unwrap();
        assert!(caps.rpc.is_empty());
        assert_eq!(caps.device_info.network_os.as_deref(), Some("comware"));
        assert_eq!(caps.device_info.network_os_hostname, None);
    }

    #[test]
    fn test_reply_serializes_as_text() {
        let replies = vec![
            Reply::Text("ok".to_string()),
            Reply::Empty,
            Reply::Xml(crate::xml::ElementMaker::netconf().empty("ok")),
        ];
        assert_eq!(
            serde_json::to_string(&replies).unwrap(),
            r#"["ok",null,"<ok xmlns=\"urn:ietf:params:xml:ns:netconf:base:1.0\"/>"]"#
        );
    }

    #[test]
    fn test_datastore_names() {
        assert_eq!(Datastore::default().to_string(), "running");
        assert_eq!(Datastore::Candidate.to_string(), "candidate");
    }
}
