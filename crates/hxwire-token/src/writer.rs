use std::borrow::Cow;

use bytes::{BufMut, Bytes, BytesMut};

use crate::number::format_float;
use crate::payload::{encode_base64, encode_percent};
use crate::tag::SEPARATOR;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Appends tokens to a growing buffer.
///
/// Every write goes through a typed helper, so the buffer only ever holds
/// ASCII.
#[derive(Debug, Clone)]
pub struct TokenWriter {
    buf: BytesMut,
}

impl TokenWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Append a single tag, terminator or separator byte.
    pub fn put_tag(&mut self, tag: u8) {
        self.buf.put_u8(tag);
    }

    /// Append a decimal integer.
    pub fn put_int(&mut self, value: i64) {
        self.buf.put_slice(value.to_string().as_bytes());
    }

    /// Append a finite float in its wire text form.
    pub fn put_float(&mut self, value: f64) {
        self.buf.put_slice(format_float(value).as_bytes());
    }

    /// Append `<len>:<percent-encoded>`; the length counts encoded bytes.
    pub fn put_string_payload(&mut self, s: &str) {
        let encoded = encode_percent(s);
        self.put_length_prefixed(encoded.as_bytes());
    }

    /// Append `<len>:<base64>`; the length counts base64 characters.
    pub fn put_bytes_payload(&mut self, bytes: &[u8]) {
        let encoded = encode_base64(bytes);
        self.put_length_prefixed(encoded.as_bytes());
    }

    fn put_length_prefixed(&mut self, body: &[u8]) {
        self.buf.reserve(body.len() + 12);
        self.put_int(body.len() as i64);
        self.buf.put_u8(SEPARATOR);
        self.buf.put_slice(body);
    }

    /// Buffer contents as text.
    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buf)
    }

    /// Buffer contents as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Snapshot of the buffer; the writer keeps its contents.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buf)
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for TokenWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::TokenReader;
    use crate::tag;

    #[test]
    fn string_length_counts_encoded_bytes() {
        let mut writer = TokenWriter::new();
        writer.put_tag(tag::STRING);
        writer.put_string_payload("a b");
        assert_eq!(writer.as_str(), "y5:a%20b");
    }

    #[test]
    fn bytes_payload_is_base64() {
        let mut writer = TokenWriter::new();
        writer.put_tag(tag::BYTES);
        writer.put_bytes_payload(b"hello");
        assert_eq!(writer.as_str(), "s8:aGVsbG8=");
    }

    #[test]
    fn numbers_are_decimal_text() {
        let mut writer = TokenWriter::new();
        writer.put_tag(tag::INT);
        writer.put_int(-5);
        writer.put_tag(tag::FLOAT);
        writer.put_float(1e21);
        assert_eq!(writer.as_bytes(), b"i-5d1e+21");
    }

    #[test]
    fn snapshot_does_not_reset() {
        let mut writer = TokenWriter::new();
        writer.put_tag(tag::NULL);
        let first = writer.to_bytes();
        writer.put_tag(tag::TRUE);
        assert_eq!(first.as_ref(), b"n");
        assert_eq!(writer.to_bytes().as_ref(), b"nt");
        assert_eq!(writer.len(), 2);
    }

    #[test]
    fn written_payloads_scan_back() {
        let mut writer = TokenWriter::new();
        writer.put_string_payload("héllo: wörld");
        writer.put_bytes_payload(&[0, 1, 2, 254, 255]);

        let mut reader = TokenReader::new(writer.as_bytes());
        assert_eq!(reader.read_string_payload().unwrap(), "héllo: wörld");
        assert_eq!(reader.read_bytes_payload().unwrap(), vec![0, 1, 2, 254, 255]);
        assert!(reader.is_at_end());
    }
}
