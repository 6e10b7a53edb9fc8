//! Device session: staging, batched execution, and direct primitives.
//!
//! Feature builders either call a primitive directly or stage a payload
//! with [`Device::stage_config`]; the workflow then runs the whole batch
//! once with [`Device::execute_staged`].

mod extract;
mod staging;

pub use extract::{EXTRACTION_FAILED, extract_cli_text, strip_return};
pub use staging::{OperationKind, Payload, StagedOperation, StagedText, StagingQueue};

use log::{debug, info, warn};

use crate::connection::{
    Capabilities, Connection, Datastore, GetQuery, Reply, SessionContext, SessionHandle,
};
use crate::error::{ExecutionError, Result};
use crate::xml::Element;

/// One managed device for the duration of an automation run.
#[derive(Debug)]
pub struct Device<H> {
    context: SessionContext<H>,
    staged: StagingQueue,
}

impl<H: SessionHandle> Device<H> {
    /// Wrap a session without touching the device.
    pub fn new(handle: H) -> Self {
        Self {
            context: SessionContext::new(handle),
            staged: StagingQueue::new(),
        }
    }

    /// Wrap a session and resolve its connection up front.
    pub async fn open(handle: H) -> Result<Self> {
        let mut device = Self::new(handle);
        device.context.connection().await?;
        Ok(device)
    }

    pub async fn capabilities(&mut self) -> Result<&Capabilities> {
        self.context.capabilities().await
    }

    pub async fn connection(&mut self) -> Result<&mut Connection<H>> {
        self.context.connection().await
    }

    pub fn staged(&self) -> &StagingQueue {
        &self.staged
    }

    pub fn staged_mut(&mut self) -> &mut StagingQueue {
        &mut self.staged
    }

    /// Queue an operation. `kind` must name one of [`OperationKind::ALLOWED`].
    pub fn stage_config(&mut self, payload: impl Into<Payload>, kind: &str) -> Result<bool> {
        self.staged.stage(payload, kind)
    }

    /// Staged payloads as text, for check mode and failure reports.
    pub fn staged_to_string(&self) -> Result<Vec<StagedText>> {
        self.staged.to_display_strings()
    }

    /// Run every staged operation against the running datastore.
    pub async fn execute_staged(&mut self) -> Result<Vec<Reply>> {
        self.execute_staged_on(Datastore::Running).await
    }

    /// Run every staged operation in order; `target` applies to `edit_config`.
    ///
    /// The queue is emptied before the first call, so it is empty afterwards
    /// whether or not every operation succeeded. The first failure stops the
    /// batch and comes back as an [`ExecutionError`] carrying the replies
    /// that completed before it.
    pub async fn execute_staged_on(&mut self, target: Datastore) -> Result<Vec<Reply>> {
        let operations = self.staged.drain();
        if operations.is_empty() {
            return Ok(Vec::new());
        }

        info!("Executing {} staged operations", operations.len());
        let mut replies = Vec::with_capacity(operations.len());
        for (index, operation) in operations.into_iter().enumerate() {
            let (kind, payload) = operation.into_parts();
            debug!("Staged operation #{}: {}", index, kind);
            match self.dispatch(kind, payload, target).await {
                Ok(reply) => replies.push(reply),
                Err(source) => {
                    warn!("Staged operation #{} ({}) failed: {}", index, kind, source);
                    return Err(ExecutionError {
                        index,
                        kind,
                        completed: replies,
                        source: Box::new(source),
                    }
                    .into());
                }
            }
        }

        info!("Staged batch complete");
        Ok(replies)
    }

    async fn dispatch(&mut self, kind: OperationKind, payload: Payload, target: Datastore) -> Result<Reply> {
        let connection = self.context.connection().await?;
        match (kind, payload) {
            (OperationKind::EditConfig, payload) => {
                connection.edit_config(&xml_text(payload)?, target).await
            }
            (OperationKind::Action, payload) => connection.action(&xml_text(payload)?).await,
            (OperationKind::Save, Payload::Text(filename)) => connection.save(Some(filename.as_str())).await,
            (OperationKind::Save, _) => connection.save(None).await,
            (OperationKind::Rollback, payload) => {
                connection.rollback(&payload.lines().concat()).await
            }
            (OperationKind::CliConfig, payload) => {
                let reply = connection.cli_config(&command_lines(payload)?).await?;
                Ok(cli_reply(reply))
            }
            (OperationKind::CliDisplay, payload) => {
                let reply = connection.cli_display(&command_lines(payload)?).await?;
                Ok(cli_reply(reply))
            }
        }
    }

    /// Read-only `get`. No query means nothing to ask, and nothing is sent.
    pub async fn get(&mut self, query: Option<&GetQuery>) -> Result<Reply> {
        match query {
            Some(query) => self.context.connection().await?.get(query).await,
            None => Ok(Reply::Empty),
        }
    }

    pub async fn edit_config(&mut self, config: &Element, target: Datastore) -> Result<Reply> {
        let xml = config.to_xml()?;
        self.context.connection().await?.edit_config(&xml, target).await
    }

    pub async fn action(&mut self, element: &Element) -> Result<Reply> {
        let xml = element.to_xml()?;
        self.context.connection().await?.action(&xml).await
    }

    pub async fn save(&mut self, filename: Option<&str>) -> Result<Reply> {
        self.context.connection().await?.save(filename).await
    }

    pub async fn rollback(&mut self, filename: &str) -> Result<Reply> {
        self.context.connection().await?.rollback(filename).await
    }

    /// Run display commands now and return their text.
    pub async fn cli_display(&mut self, commands: impl Into<Payload>) -> Result<String> {
        let commands = commands.into().lines();
        let reply = self.context.connection().await?.cli_display(&commands).await?;
        Ok(cli_text(reply))
    }

    /// Run configuration commands now and return their text.
    pub async fn cli_config(&mut self, commands: impl Into<Payload>) -> Result<String> {
        let commands = commands.into().lines();
        let reply = self.context.connection().await?.cli_config(&commands).await?;
        Ok(cli_text(reply))
    }

    pub async fn reboot(&mut self) -> Result<()> {
        self.context.connection().await?.reboot().await
    }
}

fn xml_text(payload: Payload) -> Result<String> {
    Ok(match payload {
        Payload::Xml(element) => element.to_xml()?,
        Payload::Text(text) => text,
        Payload::Lines(lines) => lines.concat(),
        Payload::Empty => String::new(),
    })
}

/// An XML payload under a CLI kind goes out as one serialized line.
fn command_lines(payload: Payload) -> Result<Vec<String>> {
    Ok(match payload {
        Payload::Xml(element) => vec![element.to_xml()?],
        other => other.lines(),
    })
}

fn cli_text(reply: Reply) -> String {
    match reply {
        Reply::Xml(element) => extract_cli_text(&element),
        Reply::Text(text) => text,
        Reply::Empty => String::new(),
    }
}

fn cli_reply(reply: Reply) -> Reply {
    Reply::Text(cli_text(reply))
}
