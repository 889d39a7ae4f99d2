//! Bounds-checked little-endian reader and writer over raw blob bytes.
//!
//! Every read is attributed to a named field so a malformed blob reports
//! exactly which part of the structure could not be read, and at what offset.

use crate::error::{RecurError, Result};

/// Little-endian reader over a borrowed byte buffer.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Take `len` raw bytes belonging to `field`.
    pub fn bytes(&mut self, field: &'static str, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(RecurError::Truncated {
                field,
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    /// Take a block whose length was declared elsewhere in the blob.
    ///
    /// Same as [`Reader::bytes`] but reports the failure as a declared-length
    /// overrun rather than a plain truncation.
    pub fn block(&mut self, field: &'static str, declared: usize) -> Result<&'a [u8]> {
        if declared > self.remaining() {
            return Err(RecurError::Overrun {
                field,
                declared,
                offset: self.pos,
                remaining: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + declared];
        self.pos += declared;
        Ok(out)
    }

    pub fn u8(&mut self, field: &'static str) -> Result<u8> {
        Ok(self.bytes(field, 1)?[0])
    }

    pub fn u16(&mut self, field: &'static str) -> Result<u16> {
        let b = self.bytes(field, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self, field: &'static str) -> Result<u32> {
        let b = self.bytes(field, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Little-endian writer that appends to an owned buffer.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Writer { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Writer {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn bytes(&mut self, value: &[u8]) {
        self.buf.extend_from_slice(value);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
