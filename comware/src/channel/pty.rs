//! Interactive PTY shell channel.

use std::time::Duration;

use bytes::Bytes;
use log::trace;
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use crate::error::{ChannelError, Result};

/// Settings for a shell channel.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// How long to wait for a pattern before giving up.
    pub timeout: Duration,

    /// Bytes from the end of the output searched for prompts.
    pub search_depth: usize,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            search_depth: 1000,
        }
    }
}

/// A PTY shell: write lines, read until a prompt shows up.
pub struct PtyChannel {
    channel: Channel<Msg>,
    buffer: PatternBuffer,
    timeout: Duration,
}

impl PtyChannel {
    pub fn new(channel: Channel<Msg>, config: PtyConfig) -> Self {
        Self {
            channel,
            buffer: PatternBuffer::new(config.search_depth),
            timeout: config.timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Write `line` followed by a newline.
    pub async fn send(&mut self, line: &str) -> Result<()> {
        trace!("send: {:?}", line);
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.channel
            .data(&data[..])
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    /// Read until `pattern` matches the tail of the output.
    ///
    /// Returns everything up to and including the match; anything after it
    /// stays buffered for the next read.
    pub async fn read_until_pattern(&mut self, pattern: &Regex) -> Result<Bytes> {
        let deadline = Instant::now() + self.timeout;

        loop {
            if let Some(found) = self.buffer.find_tail(pattern) {
                return Ok(self.buffer.take_through(found.end));
            }

            let msg = tokio::time::timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| ChannelError::PatternTimeout(self.timeout))?;

            match msg {
                Some(ChannelMsg::Data { ref data }) | Some(ChannelMsg::ExtendedData { ref data, .. }) => {
                    trace!("recv {} bytes", data.len());
                    self.buffer.extend(&data[..]);
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    return Err(ChannelError::Closed.into());
                }
                Some(_) => {}
            }
        }
    }

    /// Drop whatever is buffered.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub async fn close(self) -> Result<()> {
        self.channel.close().await.map_err(ChannelError::Ssh)?;
        Ok(())
    }
}
