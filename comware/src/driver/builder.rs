//! Fluent setup for [`CliDriver`].

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::cli::CliDriver;
use crate::error::{DriverError, Result};
use crate::platform::{PlatformDefinition, comware};
use crate::transport::{AuthMethod, HostKeyVerification, SshConfig};

/// Collects SSH settings and a platform, then checks them in [`build`](Self::build).
///
/// Starts from [`SshConfig::new`] and the stock Comware platform.
///
/// ```rust,no_run
/// use comware::driver::{Driver, DriverBuilder};
///
/// # async fn example() -> Result<(), comware::Error> {
/// let mut driver = DriverBuilder::new("192.0.2.10")
///     .username("admin")
///     .password("secret")
///     .build()?;
/// driver.open().await?;
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    ssh: SshConfig,
    platform: PlatformDefinition,
}

impl DriverBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            ssh: SshConfig::new(host),
            platform: comware::platform(),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.ssh.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.ssh.username = username.into();
        self
    }

    pub fn password(self, password: impl Into<String>) -> Self {
        self.auth(AuthMethod::Password(SecretString::from(password.into())))
    }

    /// Log in with a key file; `passphrase` unlocks an encrypted key.
    pub fn private_key(self, path: impl Into<PathBuf>, passphrase: Option<&str>) -> Self {
        self.auth(AuthMethod::PrivateKey {
            path: path.into(),
            passphrase: passphrase.map(SecretString::from),
        })
    }

    fn auth(mut self, auth: AuthMethod) -> Self {
        self.ssh.auth = auth;
        self
    }

    /// Swap in another platform, e.g. [`comware::platform`] with extra
    /// failure patterns.
    pub fn platform(mut self, platform: PlatformDefinition) -> Self {
        self.platform = platform;
        self
    }

    /// Bounds the SSH handshake and every prompt wait.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.ssh.timeout = timeout;
        self
    }

    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.ssh.terminal_width = width;
        self.ssh.terminal_height = height;
        self
    }

    pub fn host_keys(mut self, mode: HostKeyVerification, known_hosts: Option<PathBuf>) -> Self {
        self.ssh.host_key_verification = mode;
        self.ssh.known_hosts_path = known_hosts;
        self
    }

    /// Check the settings and hand them to a closed [`CliDriver`].
    pub fn build(self) -> Result<CliDriver> {
        let missing = match (self.ssh.host.trim().is_empty(), self.ssh.username.is_empty()) {
            (true, _) => Some("host"),
            (false, true) => Some("username"),
            (false, false) => None,
        };
        if let Some(field) = missing {
            return Err(DriverError::InvalidConfig {
                message: format!("{field} is required"),
            }
            .into());
        }

        CliDriver::new(self.ssh, self.platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn config_error(result: Result<CliDriver>) -> String {
        match result {
            Err(Error::Driver(DriverError::InvalidConfig { message })) => message,
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("build should have failed"),
        }
    }

    #[test]
    fn test_username_is_required() {
        let result = DriverBuilder::new("192.0.2.1").password("secret").build();
        assert_eq!(config_error(result), "username is required");
    }

    #[test]
    fn test_host_is_required() {
        assert_eq!(config_error(DriverBuilder::new(" ").username("admin").build()), "host is required");
    }

    #[test]
    fn test_key_login_on_comware_platform() {
        let driver = DriverBuilder::new("192.0.2.1")
            .username("admin")
            .private_key("/tmp/id_ed25519", Some("hunter2"))
            .port(830)
            .timeout(Duration::from_secs(5))
            .terminal_size(200, 50)
            .host_keys(HostKeyVerification::Strict, Some("/tmp/known_hosts".into()))
            .build()
            .unwrap();
        assert_eq!(driver.platform().name, "comware");
        assert_eq!(driver.platform().config_view, "system_view");
        assert_eq!(driver.host(), "192.0.2.1");
    }
}
