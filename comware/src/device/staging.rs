//! Staging queue for batched device operations.

use std::fmt;
use std::mem;
use std::str::FromStr;

use log::debug;
use serde::Serialize;

use crate::error::{Result, StagingError};
use crate::xml::Element;

/// Which transport primitive a staged operation is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    EditConfig,
    Action,
    Save,
    Rollback,
    CliConfig,
    CliDisplay,
}

impl OperationKind {
    /// Recognized kind names, in the order they are reported back.
    pub const ALLOWED: [&'static str; 6] = [
        "edit_config",
        "action",
        "cli_config",
        "cli_display",
        "save",
        "rollback",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::EditConfig => "edit_config",
            OperationKind::Action => "action",
            OperationKind::Save => "save",
            OperationKind::Rollback => "rollback",
            OperationKind::CliConfig => "cli_config",
            OperationKind::CliDisplay => "cli_display",
        }
    }

    /// Whether replies to this kind are CLI text wrapped in XML.
    pub fn is_cli(&self) -> bool {
        matches!(self, OperationKind::CliConfig | OperationKind::CliDisplay)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = StagingError;

    /// Exact, case-sensitive match on the kind name.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "edit_config" => Ok(OperationKind::EditConfig),
            "action" => Ok(OperationKind::Action),
            "save" => Ok(OperationKind::Save),
            "rollback" => Ok(OperationKind::Rollback),
            "cli_config" => Ok(OperationKind::CliConfig),
            "cli_display" => Ok(OperationKind::CliDisplay),
            other => Err(StagingError::InvalidKind {
                kind: other.to_string(),
                allowed: Self::ALLOWED.to_vec(),
            }),
        }
    }
}

/// Body of a staged operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// An XML tree (edit-config or action body).
    Xml(Element),
    /// A single string: a command, a file name, or raw XML.
    Text(String),
    /// An ordered list of commands.
    Lines(Vec<String>),
    /// No argument (save to the default startup file).
    Empty,
}

impl Payload {
    /// Commands carried by a text or lines payload.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Payload::Text(text) => vec![text.clone()],
            Payload::Lines(lines) => lines.clone(),
            Payload::Xml(_) | Payload::Empty => Vec::new(),
        }
    }
}

impl From<Element> for Payload {
    fn from(element: Element) -> Self {
        Payload::Xml(element)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<Vec<String>> for Payload {
    fn from(lines: Vec<String>) -> Self {
        Payload::Lines(lines)
    }
}

impl From<Vec<&str>> for Payload {
    fn from(lines: Vec<&str>) -> Self {
        Payload::Lines(lines.into_iter().map(String::from).collect())
    }
}

impl From<Option<String>> for Payload {
    fn from(text: Option<String>) -> Self {
        text.map_or(Payload::Empty, Payload::Text)
    }
}

/// One pending operation.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedOperation {
    kind: OperationKind,
    payload: Payload,
}

impl StagedOperation {
    /// Pair a payload with a kind. Any shape goes; dispatch converts it.
    pub fn new(kind: OperationKind, payload: Payload) -> Self {
        Self { kind, payload }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_parts(self) -> (OperationKind, Payload) {
        (self.kind, self.payload)
    }
}

/// Textual projection of a staged payload, for check-mode reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StagedText {
    Text(String),
    Lines(Vec<String>),
    Empty,
}

impl fmt::Display for StagedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StagedText::Text(text) => f.write_str(text),
            StagedText::Lines(lines) => f.write_str(&lines.join("\n")),
            StagedText::Empty => Ok(()),
        }
    }
}

/// Ordered operations waiting for [`Device::execute_staged`](super::Device::execute_staged).
///
/// Insertion order is execution order. Nothing is deduplicated or merged.
#[derive(Debug, Clone, Default)]
pub struct StagingQueue {
    operations: Vec<StagedOperation>,
}

impl StagingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `kind` and append the operation.
    ///
    /// Returns `Ok(true)` once staged. An unknown kind is rejected here,
    /// before anything reaches the device.
    pub fn stage(&mut self, payload: impl Into<Payload>, kind: &str) -> Result<bool> {
        let kind: OperationKind = kind.parse()?;
        self.push(StagedOperation::new(kind, payload.into()));
        Ok(true)
    }

    pub fn push(&mut self, operation: StagedOperation) {
        debug!(
            "Staging {} operation (#{} in queue)",
            operation.kind,
            self.operations.len()
        );
        self.operations.push(operation);
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Remove and return every staged operation, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<StagedOperation> {
        mem::take(&mut self.operations)
    }

    /// What would be sent, in staging order. XML payloads are pretty-printed.
    pub fn to_display_strings(&self) -> Result<Vec<StagedText>> {
        self.operations
            .iter()
            .map(|op| {
                Ok(match &op.payload {
                    Payload::Xml(element) => StagedText::Text(element.to_pretty_xml()?),
                    Payload::Text(text) => StagedText::Text(text.clone()),
                    Payload::Lines(lines) => StagedText::Lines(lines.clone()),
                    Payload::Empty => StagedText::Empty,
                })
            })
            .collect()
    }
}
