//! SSH shell driver for Comware devices.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use regex::bytes::Regex;

use super::Driver;
use super::response::Response;
use super::views::ViewManager;
use crate::channel::{PtyChannel, PtyConfig, last_line};
use crate::error::{DriverError, Result};
use crate::platform::{ComwareBehavior, PlatformDefinition, VendorBehavior};
use crate::transport::{SshConfig, SshTransport};

/// Drives a device's CLI over an SSH shell.
///
/// Commands are written one at a time; each one is complete when a prompt
/// of a known view shows up at the end of the output.
pub struct CliDriver {
    ssh_config: SshConfig,
    platform: PlatformDefinition,
    behavior: Arc<dyn VendorBehavior>,
    session: Option<Session>,
    views: ViewManager,
    /// Matches the prompt of any view.
    prompt_pattern: Regex,
}

struct Session {
    transport: SshTransport,
    channel: PtyChannel,
}

impl CliDriver {
    /// Create a driver; nothing is connected until [`Driver::open`].
    pub fn new(ssh_config: SshConfig, platform: PlatformDefinition) -> Result<Self> {
        platform.validate()?;
        let prompt_pattern = platform.prompt_pattern()?;
        let views = ViewManager::new(platform.views.clone());
        let behavior = platform
            .behavior
            .clone()
            .unwrap_or_else(|| Arc::new(ComwareBehavior));

        Ok(Self {
            ssh_config,
            platform,
            behavior,
            session: None,
            views,
            prompt_pattern,
        })
    }

    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    pub fn views(&self) -> &ViewManager {
        &self.views
    }

    pub fn host(&self) -> &str {
        &self.ssh_config.host
    }

    /// Change how long each prompt wait may take.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.ssh_config.timeout = timeout;
        if let Some(session) = self.session.as_mut() {
            session.channel.set_timeout(timeout);
        }
    }

    /// Read until a prompt; returns the output and the prompt line.
    async fn read_until_prompt(&mut self) -> Result<(String, String)> {
        let session = self.session.as_mut().ok_or(DriverError::NotConnected)?;
        let data = session
            .channel
            .read_until_pattern(&self.prompt_pattern)
            .await?;

        let output = String::from_utf8_lossy(&data).into_owned();
        let prompt = String::from_utf8_lossy(last_line(data.trim_ascii_end()))
            .trim()
            .to_string();

        if let Err(e) = self.views.update_from_prompt(&prompt) {
            debug!("{}", e);
        }

        Ok((output, prompt))
    }

    fn failure(&self, output: &str) -> Option<String> {
        self.behavior
            .detect_failure(output)
            .or_else(|| self.platform.failure_in(output).map(str::to_string))
    }
}

impl Driver for CliDriver {
    async fn open(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        let transport = SshTransport::connect(&self.ssh_config).await?;
        let channel = transport.open_shell().await?;
        let channel = PtyChannel::new(
            channel,
            PtyConfig {
                timeout: self.ssh_config.timeout,
                ..Default::default()
            },
        );
        self.session = Some(Session { transport, channel });

        let (_, prompt) = self.read_until_prompt().await?;
        info!(
            "Connected to {} ({}), prompt '{}'",
            self.ssh_config.host, self.platform.name, prompt
        );

        for command in self.platform.on_open_commands.clone() {
            let response = self.send_command(&command).await?;
            if let Some(message) = response.rejection {
                warn!("On-open command '{}' was rejected: {}", command, message);
            }
        }

        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.session.is_none() {
            return Ok(());
        }

        for command in self.platform.on_close_commands.clone() {
            if let Err(e) = self.send_command(&command).await {
                warn!("On-close command '{}' failed: {}", command, e);
            }
        }

        if let Some(Session { transport, channel }) = self.session.take() {
            if let Err(e) = channel.close().await {
                debug!("Closing shell channel: {}", e);
            }
            transport.close().await?;
        }
        info!("Disconnected from {}", self.ssh_config.host);
        Ok(())
    }

    async fn send_command(&mut self, command: &str) -> Result<Response> {
        let start = Instant::now();
        let session = self.session.as_mut().ok_or(DriverError::NotConnected)?;
        session.channel.send(command).await?;

        let (raw, prompt) = self.read_until_prompt().await?;
        let output = self.behavior.normalize_output(&raw, command);
        let failure = self.failure(&output);
        let response = Response::new(command, output, prompt).timed(start.elapsed());

        Ok(match failure {
            Some(message) => {
                debug!("'{}' rejected: {}", command, message);
                response.rejected(message)
            }
            None => response,
        })
    }

    async fn send_config(&mut self, commands: &[&str]) -> Result<Vec<Response>> {
        let config_view = self.platform.config_view.clone();
        let return_to = self
            .views
            .current()
            .map(|view| view.name.clone())
            .filter(|name| *name != config_view)
            .unwrap_or_else(|| self.platform.default_view.clone());

        self.enter_view(&config_view).await?;

        let mut responses = Vec::with_capacity(commands.len());
        for command in commands {
            let response = self.send_command(command).await?;
            let rejected = response.is_rejected();
            responses.push(response);
            if rejected {
                warn!("Stopping configuration at rejected command '{}'", command);
                break;
            }
        }

        self.enter_view(&return_to).await?;
        Ok(responses)
    }

    async fn enter_view(&mut self, target: &str) -> Result<()> {
        let current = self
            .views
            .current()
            .map(|view| view.name.clone())
            .unwrap_or_default();
        if current == target {
            return Ok(());
        }

        let path = self.views.find_path(&current, target)?;
        for step in path.windows(2) {
            let (from, to) = (&step[0], &step[1]);
            let command = self
                .views
                .transition(from, to)
                .ok_or_else(|| DriverError::NoViewPath {
                    from: from.clone(),
                    to: to.clone(),
                })?
                .to_string();

            debug!("View {} -> {} via '{}'", from, to, command);
            let session = self.session.as_mut().ok_or(DriverError::NotConnected)?;
            session.channel.send(&command).await?;

            let (_, prompt) = self.read_until_prompt().await?;
            if self.current_view() != Some(to.as_str()) {
                return Err(DriverError::ViewAcquisitionFailed {
                    target: to.clone(),
                    prompt,
                }
                .into());
            }
        }

        Ok(())
    }

    fn is_open(&self) -> bool {
        self.session.is_some()
    }

    fn current_view(&self) -> Option<&str> {
        self.views.current().map(|view| view.name.as_str())
    }
}
