//! Shell channel: prompt matching over a PTY.

mod buffer;
mod pty;

pub use buffer::{PatternBuffer, last_line};
pub use pty::{PtyChannel, PtyConfig};
