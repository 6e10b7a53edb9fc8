//! russh-backed SSH session.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use russh::Channel;
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use secrecy::ExposeSecret;

use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use crate::error::{Result, TransportError};

/// An authenticated SSH session to a switch.
pub struct SshTransport {
    session: Handle<KnownHostsHandler>,
    terminal_width: u32,
    terminal_height: u32,
}

impl SshTransport {
    /// Connect, verify the host key, and log in.
    pub async fn connect(config: &SshConfig) -> Result<Self> {
        let client_config = Arc::new(client::Config {
            inactivity_timeout: Some(config.timeout),
            ..Default::default()
        });

        let rejection: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));
        let handler = KnownHostsHandler {
            host: config.host.clone(),
            port: config.port,
            verification: config.host_key_verification,
            known_hosts_path: config.known_hosts_path.clone(),
            rejection: Arc::clone(&rejection),
        };

        debug!("Connecting to {}", config.socket_addr());
        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(client_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|e| {
            // Prefer the handler's specific host key error over russh's UnknownKey.
            rejection
                .lock()
                .ok()
                .and_then(|mut slot| slot.take())
                .unwrap_or(TransportError::Ssh(e))
        })?;

        Self::authenticate(&mut session, config).await?;
        info!("Logged into {} as {}", config.socket_addr(), config.username);

        Ok(Self {
            session,
            terminal_width: config.terminal_width,
            terminal_height: config.terminal_height,
        })
    }

    /// Open a shell channel with a PTY attached.
    pub async fn open_shell(&self) -> Result<Channel<Msg>> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(
                true,
                "vt100",
                self.terminal_width,
                self.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;
        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        Ok(channel)
    }

    async fn authenticate(session: &mut Handle<KnownHostsHandler>, config: &SshConfig) -> Result<()> {
        let user = config.username.as_str();
        let result = match &config.auth {
            AuthMethod::None => session.authenticate_none(user).await,
            AuthMethod::Password(password) => {
                session
                    .authenticate_password(user, password.expose_secret())
                    .await
            }
            AuthMethod::PrivateKey { path, passphrase } => {
                let key = load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
                    .map_err(|e| TransportError::Key(e.to_string()))?;
                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(TransportError::Ssh)?
                    .flatten();
                session
                    .authenticate_publickey(user, PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg))
                    .await
            }
        };

        if !result.map_err(TransportError::Ssh)?.success() {
            return Err(TransportError::AuthenticationFailed {
                user: user.to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub async fn close(self) -> Result<()> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// Checks server keys against known_hosts.
struct KnownHostsHandler {
    host: String,
    port: u16,
    verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Why a key was rejected, picked up by `connect`.
    rejection: Arc<Mutex<Option<TransportError>>>,
}

impl KnownHostsHandler {
    /// `Ok(true)` if known and matching, `Ok(false)` if unknown.
    fn lookup(&self, key: &PublicKey) -> std::result::Result<bool, TransportError> {
        let result = match &self.known_hosts_path {
            Some(path) => russh::keys::check_known_hosts_path(&self.host, self.port, key, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, key),
        };

        match result {
            Ok(known) => Ok(known),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    fn learn(&self, key: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = match &self.known_hosts_path {
            Some(path) => {
                russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, key, path)
            }
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, key),
        };
        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, err: TransportError) -> bool {
        warn!("Rejecting host key for {}:{}: {}", self.host, self.port, err);
        if let Ok(mut slot) = self.rejection.lock() {
            *slot = Some(err);
        }
        false
    }
}

impl client::Handler for KnownHostsHandler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, key: &PublicKey) -> std::result::Result<bool, Self::Error> {
        if self.verification == HostKeyVerification::Disabled {
            return Ok(true);
        }

        Ok(match self.lookup(key) {
            Ok(true) => true,
            Ok(false) if self.verification == HostKeyVerification::AcceptNew => {
                info!("Learning host key for {}:{}", self.host, self.port);
                if let Err(e) = self.learn(key) {
                    warn!("Failed to save host key: {}", e);
                }
                true
            }
            Ok(false) => self.reject(TransportError::HostKeyUnknown {
                host: self.host.clone(),
                port: self.port,
            }),
            Err(e) => self.reject(e),
        })
    }
}
