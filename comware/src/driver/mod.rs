//! Prompt-driven CLI driver.
//!
//! The driver sends commands over an SSH shell, reads until a known prompt
//! comes back, and keeps track of which view the device is in.

mod builder;
mod cli;
mod response;
mod views;

pub use builder::DriverBuilder;
pub use cli::CliDriver;
pub use response::Response;
pub use views::ViewManager;

use std::future::Future;

use crate::error::Result;

/// Trait for CLI drivers.
pub trait Driver: Send {
    /// Connect and wait for the first prompt.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Close the connection.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send a command from the current view and wait for the prompt.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send;

    /// Send commands in the platform's configuration view.
    ///
    /// Enters the configuration view, sends the commands until one is
    /// rejected, then goes back to the view the driver started in.
    ///
    /// ```rust,no_run
    /// use comware::driver::Driver;
    ///
    /// # async fn example(driver: &mut impl Driver) -> Result<(), comware::Error> {
    /// let responses = driver.send_config(&[
    ///     "vlan 10",
    ///     "name servers",
    /// ]).await?;
    /// # Ok(())
    /// # }
    /// ```
    fn send_config(
        &mut self,
        commands: &[&str],
    ) -> impl Future<Output = Result<Vec<Response>>> + Send;

    /// Move to the named view.
    fn enter_view(&mut self, view: &str) -> impl Future<Output = Result<()>> + Send;

    fn is_open(&self) -> bool;

    /// Name of the view the last prompt belonged to.
    fn current_view(&self) -> Option<&str>;
}
