use crate::error::{Result, TokenError};
use crate::payload::{decode_base64, decode_percent};
use crate::tag::SEPARATOR;

/// Scans raw token pieces from an immutable input buffer.
///
/// The reader only moves forward. Callers dispatch on tag bytes themselves and
/// use the `read_*` helpers for the digit runs and payloads that follow them.
#[derive(Debug, Clone)]
pub struct TokenReader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> TokenReader<'a> {
    /// Create a reader positioned at the start of `input`.
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total input length.
    pub fn len(&self) -> usize {
        self.input.len()
    }

    /// Returns true if the input is empty.
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    /// Returns true once every byte has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// The byte under the cursor, if any.
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Consume and return the byte under the cursor.
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Consume the byte under the cursor, failing at end of input.
    pub fn next_tag(&mut self) -> Result<u8> {
        self.next_byte()
            .ok_or(TokenError::UnexpectedEof { pos: self.pos })
    }

    /// Consume the byte under the cursor if it equals `byte`.
    pub fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Read a decimal digit run with an optional leading `-`.
    ///
    /// Stops at the first non-digit. An empty run reads as `0`, as the legacy
    /// decoders do.
    pub fn read_digits(&mut self) -> Result<i64> {
        let start = self.pos;
        let negative = self.eat(b'-');
        let mut value: i64 = 0;
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(i64::from(c - b'0')))
                .ok_or_else(|| TokenError::MalformedNumber {
                    text: String::from_utf8_lossy(&self.input[start..=self.pos]).into_owned(),
                    pos: start,
                })?;
            self.pos += 1;
        }
        Ok(if negative { -value } else { value })
    }

    /// Read a float literal: a contiguous run of digits, `+`, `-`, `.`, `e`
    /// and `E`, parsed as a whole.
    pub fn read_float(&mut self) -> Result<f64> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || matches!(c, b'+' | b'-' | b'.' | b'e' | b'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let raw = &self.input[start..self.pos];
        std::str::from_utf8(raw)
            .ok()
            .and_then(|text| text.parse::<f64>().ok())
            .ok_or_else(|| TokenError::MalformedNumber {
                text: String::from_utf8_lossy(raw).into_owned(),
                pos: start,
            })
    }

    /// Read `<len>:<body>` and return the body slice.
    pub fn read_length_prefixed(&mut self, what: &'static str) -> Result<&'a [u8]> {
        let start = self.pos;
        let declared = self.read_digits()?;
        if !self.eat(SEPARATOR) {
            return Err(TokenError::MissingSeparator { pos: self.pos });
        }
        let available = self.remaining();
        let len = usize::try_from(declared)
            .ok()
            .filter(|len| *len <= available)
            .ok_or(TokenError::InvalidLength {
                what,
                declared,
                available,
                pos: start,
            })?;
        let body = &self.input[self.pos..self.pos + len];
        self.pos += len;
        Ok(body)
    }

    /// Read a percent-encoded string payload (`<len>:<escaped>`).
    pub fn read_string_payload(&mut self) -> Result<String> {
        let body = self.read_length_prefixed("string")?;
        decode_percent(body, self.pos - body.len())
    }

    /// Read a base64 bytes payload (`<len>:<base64>`).
    pub fn read_bytes_payload(&mut self) -> Result<Vec<u8>> {
        let body = self.read_length_prefixed("bytes")?;
        decode_base64(body)
    }
}
