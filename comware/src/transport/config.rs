//! SSH connection settings for the CLI endpoint.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// How the switch's host key is checked against known_hosts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyVerification {
    /// Only hosts already in known_hosts are accepted.
    Strict,

    /// Unknown hosts are learned; changed keys are rejected.
    #[default]
    AcceptNew,

    /// Any key is accepted. Lab use only.
    Disabled,
}

/// Everything needed to reach and log into a switch.
#[derive(Debug)]
pub struct SshConfig {
    pub host: String,

    /// Default 22.
    pub port: u16,

    pub username: String,

    pub auth: AuthMethod,

    /// Applies to connecting and to every prompt wait.
    pub timeout: Duration,

    pub terminal_width: u32,

    pub terminal_height: u32,

    pub host_key_verification: HostKeyVerification,

    /// Defaults to the user's `~/.ssh/known_hosts`.
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// Port 22, no credentials, 30 s timeout and a 511x24 terminal
    /// (511 is the widest Comware accepts).
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: String::new(),
            auth: AuthMethod::None,
            timeout: Duration::from_secs(30),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Credentials for the SSH login.
#[derive(Debug)]
pub enum AuthMethod {
    None,

    Password(SecretString),

    PrivateKey {
        path: PathBuf,
        passphrase: Option<SecretString>,
    },
}
