/// Errors that can occur while scanning or emitting tokens.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// A byte that does not start any token was found in tag position.
    #[error("invalid char {found:?} at position {pos}")]
    InvalidChar { found: char, pos: usize },

    /// The input ended where a token was expected.
    #[error("unexpected end of input at position {pos}")]
    UnexpectedEof { pos: usize },

    /// A declared payload length does not fit in the remaining input.
    #[error("invalid {what} length at position {pos} (declared {declared}, available {available})")]
    InvalidLength {
        what: &'static str,
        declared: i64,
        available: usize,
        pos: usize,
    },

    /// The `:` between a payload length and its body is missing.
    #[error("missing length separator at position {pos}")]
    MissingSeparator { pos: usize },

    /// A numeric literal could not be parsed.
    #[error("malformed number {text:?} at position {pos}")]
    MalformedNumber { text: String, pos: usize },

    /// A `%` escape in a string payload is not followed by two hex digits.
    #[error("invalid percent escape at position {pos}")]
    InvalidPercentEncoding { pos: usize },

    /// A percent-decoded string payload is not valid UTF-8.
    #[error("string payload at position {pos} is not valid UTF-8")]
    InvalidUtf8 { pos: usize },

    /// A bytes payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

pub type Result<T> = std::result::Result<T, TokenError>;
