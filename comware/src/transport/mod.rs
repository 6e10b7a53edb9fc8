//! SSH transport for the Comware CLI endpoint.
//!
//! Connects and authenticates with russh and opens the PTY shell channel
//! the CLI driver talks through.

pub mod config;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::SshTransport;
