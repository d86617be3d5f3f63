//! Stream collaborator (§6): `OutStream`/`InStream` cursor pairs and the
//! `TextInStream` overlay the YAML parser drives character-at-a-time.

use crate::error::{Error, Result};

/// Growable output sink. The source's `OutStream` wraps a fixed,
/// caller-owned buffer; this crate owns the buffer itself and grows it, so
/// callers never have to pre-size it. `pos()` stands in for the source's
/// `pos` field.
#[derive(Debug, Default)]
pub struct OutStream {
    buffer: Vec<u8>,
}

impl OutStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_octets(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn write_str(&mut self, text: &str) {
        self.buffer.extend_from_slice(text.as_bytes());
    }

    pub fn pos(&self) -> usize {
        self.buffer.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Read-only input cursor over a caller-owned byte slice.
#[derive(Debug, Clone)]
pub struct InStream<'a> {
    buffer: &'a [u8],
    pos: usize,
}

impl<'a> InStream<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.buffer[self.pos..]
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.buffer.get(self.pos).ok_or(Error::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_octets(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.read_octets(4)?;
        Ok(i32::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_octets(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(count).ok_or(Error::UnexpectedEof)?;
        let bytes = self.buffer.get(self.pos..end).ok_or(Error::UnexpectedEof)?;
        self.pos = end;
        Ok(bytes)
    }
}

/// Overlay used by the YAML parser: single-character read/unread, plus
/// `column` tracking needed to detect indentation.
#[derive(Debug, Clone)]
pub struct TextInStream<'a> {
    buffer: &'a [u8],
    pos: usize,
    prev_column: usize,
    pub column: usize,
}

impl<'a> TextInStream<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            buffer: text.as_bytes(),
            pos: 0,
            prev_column: 0,
            column: 0,
        }
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.buffer.len());
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.buffer.len()
    }

    pub fn peek_ch(&self) -> Option<u8> {
        self.buffer.get(self.pos).copied()
    }

    pub fn read_ch(&mut self) -> Option<u8> {
        let ch = self.buffer.get(self.pos).copied()?;
        self.pos += 1;
        self.prev_column = self.column;
        if ch == b'\n' {
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Undo exactly one `read_ch`.
    pub fn unread_ch(&mut self) {
        if self.pos > 0 {
            self.pos -= 1;
            self.column = self.prev_column;
        }
    }

    pub fn position_string(&self) -> String {
        format!("offset {}, column {}", self.pos, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_stream_round_trips_primitives() {
        let mut out = OutStream::new();
        out.write_u8(7);
        out.write_i32(-42);
        out.write_u32(1_000_000);
        out.write_octets(&[1, 2, 3]);

        let bytes = out.into_bytes();
        let mut src = InStream::new(&bytes);
        assert_eq!(src.read_u8().unwrap(), 7);
        assert_eq!(src.read_i32().unwrap(), -42);
        assert_eq!(src.read_u32().unwrap(), 1_000_000);
        assert_eq!(src.read_octets(3).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn in_stream_reports_unexpected_eof() {
        let bytes = [1u8, 2];
        let mut src = InStream::new(&bytes);
        assert!(matches!(src.read_i32(), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn text_in_stream_tracks_column_and_supports_unread() {
        let mut ts = TextInStream::new("ab\nc");
        assert_eq!(ts.read_ch(), Some(b'a'));
        assert_eq!(ts.column, 1);
        assert_eq!(ts.read_ch(), Some(b'b'));
        assert_eq!(ts.column, 2);
        ts.unread_ch();
        assert_eq!(ts.column, 1);
        assert_eq!(ts.read_ch(), Some(b'b'));
        assert_eq!(ts.read_ch(), Some(b'\n'));
        assert_eq!(ts.column, 0);
        assert!(!ts.eof());
        assert_eq!(ts.read_ch(), Some(b'c'));
        assert!(ts.eof());
    }

    #[test]
    fn text_in_stream_seek_restores_position() {
        let mut ts = TextInStream::new("hello");
        let saved = ts.tell();
        ts.read_ch();
        ts.read_ch();
        ts.seek(saved);
        assert_eq!(ts.tell(), saved);
        assert_eq!(ts.peek_ch(), Some(b'h'));
    }
}
