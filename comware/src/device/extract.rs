//! CLI text extraction from NETCONF replies.

use log::warn;

use crate::xml::{Element, NETCONFBASE};

/// Returned in place of device output when a reply carries no CLI text.
///
/// Treat it as a soft failure; it is never real device output.
pub const EXTRACTION_FAILED: &str = "Unable to extract CLI data.";

/// Pull the CLI text out of a reply and tidy its line endings.
///
/// `Execution` wins over `Configuration` when both are present. An element
/// with no text yields an empty string.
pub fn extract_cli_text(reply: &Element) -> String {
    let node = reply
        .find(NETCONFBASE, "Execution")
        .or_else(|| reply.find(NETCONFBASE, "Configuration"));

    match node {
        Some(node) => strip_return(node.text().unwrap_or_default()),
        None => {
            warn!("Reply has no Execution or Configuration element");
            EXTRACTION_FAILED.to_string()
        }
    }
}

/// Collapse doubled and tripled line endings.
///
/// Four literal substitutions applied once each, in order. Longer runs are
/// only partially collapsed.
pub fn strip_return(text: &str) -> String {
    text.replace("\r\r\r", "\r")
        .replace("\r\r", "\r")
        .replace("\n\n\n", "\n")
        .replace("\n\n", "\n")
}
