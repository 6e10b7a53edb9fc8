//! Error types for comware.

use std::time::Duration;

use thiserror::Error;

use crate::connection::Reply;
use crate::device::OperationKind;

/// Main error type for comware operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// CLI driver errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Platform definition errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Staging area misuse
    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    /// Connection facade errors
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// XML build or parse errors
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    /// A staged batch stopped part way through
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl Error {
    /// Whether this error is a client-side timeout, at any layer.
    ///
    /// Timeouts right after a reboot-class command are how a device
    /// signals that it went down as asked.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Connection(ConnectionError::Timeout(_)) => true,
            Error::Transport(TransportError::Timeout(_)) => true,
            Error::Channel(ChannelError::PatternTimeout(_)) => true,
            Error::Execution(e) => e.source.is_timeout(),
            _ => false,
        }
    }

    /// Whether the session dropped underneath the operation.
    pub fn is_connection_closed(&self) -> bool {
        match self {
            Error::Connection(ConnectionError::Closed) => true,
            Error::Transport(TransportError::Disconnected) => true,
            Error::Channel(ChannelError::Closed) => true,
            Error::Execution(e) => e.source.is_connection_closed(),
            _ => false,
        }
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host is not in known_hosts and verification is strict
    #[error("Host key for {host}:{port} is not known")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the recorded one
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Channel layer errors (prompt matching, PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Prompt not seen in time
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// CLI driver errors (command execution, view navigation).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Driver not connected - call open() first")]
    NotConnected,

    /// Driver already connected
    #[error("Driver already connected")]
    AlreadyConnected,

    /// The device rejected a command
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Prompt after a view transition was not the expected one
    #[error("Failed to enter view '{target}', prompt is '{prompt}'")]
    ViewAcquisitionFailed { target: String, prompt: String },

    /// Invalid configuration in the driver builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Prompt matched no known view
    #[error("Unknown view from prompt: '{prompt}'")]
    UnknownView { prompt: String },

    /// No path found between views
    #[error("No path from view '{from}' to '{to}'")]
    NoViewPath { from: String, to: String },
}

/// Platform definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Invalid platform definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },
}

/// Staging area errors, raised when an operation is staged.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StagingError {
    /// Operation kind is not one of the recognized kinds
    #[error("Invalid config type '{kind}' for staging. Must be one of the following: {}", .allowed.join(", "))]
    InvalidKind {
        kind: String,
        allowed: Vec<&'static str>,
    },
}

/// Connection facade errors.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Capability negotiation reported a transport we cannot drive
    #[error("Invalid connection type {network_api}")]
    UnsupportedTransport { network_api: String },

    /// Capabilities could not be fetched from the session
    #[error("Unable to fetch capabilities: {0}")]
    CapabilitiesFetch(#[source] Box<Error>),

    /// Capabilities document is not valid JSON
    #[error("Malformed capabilities document: {0}")]
    CapabilitiesParse(#[from] serde_json::Error),

    /// Primitive not available on this transport
    #[error("'{operation}' is not supported over {network_api}")]
    UnsupportedOperation {
        operation: &'static str,
        network_api: &'static str,
    },

    /// Device answered with an rpc-error
    #[error("RPC error ({tag}): {message}")]
    Rpc { tag: String, message: String },

    /// Client-side timeout waiting for the device
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Session dropped mid-operation
    #[error("Session closed by the device")]
    Closed,

    /// Session handle was already bound to a connection
    #[error("Session handle is no longer available")]
    HandleUnavailable,
}

/// XML errors.
#[derive(Error, Debug)]
pub enum XmlError {
    /// Malformed XML
    #[error("XML parse error: {0}")]
    Parse(#[from] quick_xml::Error),

    /// Serialized output was not UTF-8
    #[error("XML output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Document has no root element
    #[error("XML document has no root element")]
    NoRoot,
}

/// A staged batch failed part way through.
///
/// The staging queue is already empty when this is returned; `completed`
/// holds the replies of the operations that ran before the failure.
#[derive(Error, Debug)]
#[error("staged operation #{index} ({kind}) failed: {source}")]
pub struct ExecutionError {
    /// Position of the failed operation in the batch.
    pub index: usize,

    /// Kind of the failed operation.
    pub kind: OperationKind,

    /// Replies of the operations that completed.
    pub completed: Vec<Reply>,

    /// The underlying failure.
    #[source]
    pub source: Box<Error>,
}

/// Result type alias using comware's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        assert!(Error::from(ConnectionError::Timeout(Duration::from_secs(5))).is_timeout());
        assert!(Error::from(TransportError::Timeout(Duration::from_secs(5))).is_timeout());
        assert!(Error::from(ChannelError::PatternTimeout(Duration::from_secs(5))).is_timeout());
        assert!(!Error::from(ConnectionError::Closed).is_timeout());
    }

    #[test]
    fn test_execution_error_delegates_classification() {
        let err = Error::from(ExecutionError {
            index: 2,
            kind: OperationKind::CliDisplay,
            completed: vec![],
            source: Box::new(ConnectionError::Closed.into()),
        });
        assert!(err.is_connection_closed());
        assert!(!err.is_timeout());
        assert_eq!(
            err.to_string(),
            "staged operation #2 (cli_display) failed: Connection error: Session closed by the device"
        );
    }

    #[test]
    fn test_invalid_kind_message_lists_allowed() {
        let err = StagingError::InvalidKind {
            kind: "commit".to_string(),
            allowed: vec!["edit_config", "action"],
        };
        assert_eq!(
            err.to_string(),
            "Invalid config type 'commit' for staging. Must be one of the following: edit_config, action"
        );
    }
}
