//! Payload codecs for length-prefixed tokens.
//!
//! Strings travel percent-encoded with the escaping rules of the receiving
//! ecosystem's `encodeURIComponent`; byte buffers travel as standard base64.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use percent_encoding::{percent_decode, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{Result, TokenError};

/// Bytes `encodeURIComponent` leaves unescaped, besides ASCII alphanumerics.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Standard alphabet, padded on encode, padding optional on decode.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Percent-encode a string payload.
pub fn encode_percent(s: &str) -> String {
    utf8_percent_encode(s, URI_COMPONENT).to_string()
}

/// Percent-decode a string payload that starts at input offset `pos`.
///
/// Unlike a lenient URL decoder, a `%` not followed by two hex digits is an
/// error, as is a decoded byte sequence that is not UTF-8.
pub fn decode_percent(raw: &[u8], pos: usize) -> Result<String> {
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let valid = raw.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && raw.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
            if !valid {
                return Err(TokenError::InvalidPercentEncoding { pos: pos + i });
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| TokenError::InvalidUtf8 { pos })
}

/// Base64-encode a bytes payload.
pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Base64-decode a bytes payload.
pub fn decode_base64(raw: &[u8]) -> Result<Vec<u8>> {
    Ok(BASE64.decode(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreserved_characters_pass_through() {
        assert_eq!(encode_percent("hi"), "hi");
        assert_eq!(encode_percent("A-z_0.9!~*'()"), "A-z_0.9!~*'()");
    }

    #[test]
    fn reserved_and_non_ascii_are_escaped() {
        assert_eq!(encode_percent("a b"), "a%20b");
        assert_eq!(encode_percent("x:y/z?"), "x%3Ay%2Fz%3F");
        assert_eq!(encode_percent("é"), "%C3%A9");
        assert_eq!(encode_percent("%"), "%25");
    }

    #[test]
    fn decode_reverses_encode() {
        let text = "héllo wörld: 100% ✓";
        let encoded = encode_percent(text);
        assert_eq!(decode_percent(encoded.as_bytes(), 0).unwrap(), text);
    }

    #[test]
    fn plus_is_not_a_space() {
        assert_eq!(decode_percent(b"a+b", 0).unwrap(), "a+b");
    }

    #[test]
    fn truncated_escape_is_rejected() {
        assert!(matches!(
            decode_percent(b"ab%4", 10),
            Err(TokenError::InvalidPercentEncoding { pos: 12 })
        ));
        assert!(matches!(
            decode_percent(b"%zz", 0),
            Err(TokenError::InvalidPercentEncoding { pos: 0 })
        ));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(matches!(
            decode_percent(b"%FF%FE", 3),
            Err(TokenError::InvalidUtf8 { pos: 3 })
        ));
    }

    #[test]
    fn base64_is_padded_and_accepts_unpadded() {
        assert_eq!(encode_base64(b"hello"), "aGVsbG8=");
        assert_eq!(decode_base64(b"aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_base64(b"aGVsbG8").unwrap(), b"hello");
        assert!(matches!(
            decode_base64(b"a?b"),
            Err(TokenError::InvalidBase64(_))
        ));
    }
}
