//! Output accumulator with tail-only prompt search.
//!
//! Prompts only ever appear at the end of the output, so the buffer is
//! searched from `search_depth` bytes before its end instead of from the
//! start. This keeps `display current-configuration` sized outputs cheap.

use std::ops::Range;

use bytes::{Bytes, BytesMut};
use regex::bytes::Regex;
use vte::{Parser, Perform};

/// Accumulates channel output with terminal escape sequences removed.
pub struct PatternBuffer {
    buffer: BytesMut,
    search_depth: usize,
    /// Kept across chunks so a sequence split over two reads is still removed.
    parser: Parser,
}

impl PatternBuffer {
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
            parser: Parser::new(),
        }
    }

    /// Append raw channel bytes, dropping ANSI escapes and control codes
    /// other than line breaks and tabs.
    pub fn extend(&mut self, data: &[u8]) {
        let mut sink = Printable {
            out: &mut self.buffer,
        };
        self.parser.advance(&mut sink, data);
    }

    /// Find `pattern` in the tail; the range is relative to the whole buffer.
    pub fn find_tail(&self, pattern: &Regex) -> Option<Range<usize>> {
        let start = self.tail_start();
        pattern
            .find(&self.buffer[start..])
            .map(|m| start + m.start()..start + m.end())
    }

    /// Search everything buffered.
    pub fn find_full(&self, pattern: &Regex) -> Option<Range<usize>> {
        pattern.find(&self.buffer).map(|m| m.range())
    }

    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.find_tail(pattern).is_some()
    }

    /// Remove and return the first `end` bytes, keeping the rest.
    pub fn take_through(&mut self, end: usize) -> Bytes {
        self.buffer.split_to(end.min(self.buffer.len())).freeze()
    }

    /// Remove and return everything.
    pub fn take(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn search_depth(&self) -> usize {
        self.search_depth
    }

    fn tail_start(&self) -> usize {
        self.buffer.len().saturating_sub(self.search_depth)
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl std::fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.buffer.len())
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

/// Text after the last line break of `data`.
pub fn last_line(data: &[u8]) -> &[u8] {
    match memchr::memrchr(b'\n', data) {
        Some(pos) => &data[pos + 1..],
        None => data,
    }
}

struct Printable<'a> {
    out: &'a mut BytesMut,
}

impl Perform for Printable<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.extend_from_slice(&[byte]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passes_through() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"display vlan\r\n<HPE>");
        assert_eq!(buffer.as_slice(), b"display vlan\r\n<HPE>");
    }

    #[test]
    fn test_escapes_are_removed() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mVLAN 10\x1b[0m\x07");
        assert_eq!(buffer.as_slice(), b"VLAN 10");
    }

    #[test]
    fn test_escape_split_across_reads() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"a\x1b[3");
        buffer.extend(b"1mb");
        assert_eq!(buffer.as_slice(), b"ab");
    }

    #[test]
    fn test_tail_search_is_bounded() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(b"<HPE>");
        buffer.extend(&[b'x'; 100]);

        let prompt = Regex::new(r"<HPE>").unwrap();
        assert!(buffer.find_tail(&prompt).is_none());
        assert_eq!(buffer.find_full(&prompt), Some(0..5));
    }

    #[test]
    fn test_tail_range_is_absolute() {
        let mut buffer = PatternBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\n[HPE]");

        let prompt = Regex::new(r"\[HPE\]").unwrap();
        assert_eq!(buffer.find_tail(&prompt), Some(101..106));
    }

    #[test]
    fn test_take_through_keeps_remainder() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"out\n<HPE>more");
        assert_eq!(&buffer.take_through(9)[..], b"out\n<HPE>");
        assert_eq!(buffer.as_slice(), b"more");
        assert_eq!(&buffer.take()[..], b"more");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_last_line() {
        assert_eq!(last_line(b"a\r\nb\n<HPE>"), b"<HPE>");
        assert_eq!(last_line(b"<HPE>"), b"<HPE>");
    }
}
