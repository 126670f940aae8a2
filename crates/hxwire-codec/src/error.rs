use hxwire_token::TokenError;

use crate::value::Value;

/// Errors that can occur while encoding or decoding values.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Token-level error (bad tag, bad length, bad payload).
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// The value has no wire representation.
    #[error("serialization of {kind} not implemented")]
    Unsupported { kind: String },

    /// A container ran to the end of input without its terminator.
    #[error("missing terminator {expected:?} before end of input at position {pos}")]
    MissingTerminator { expected: char, pos: usize },

    /// An object or string map key is not a string.
    #[error("invalid object key at position {pos}")]
    InvalidKey { pos: usize },

    /// An integer map entry is not introduced by `:` and the map is not closed.
    #[error("invalid int map format at position {pos}")]
    InvalidIntMap { pos: usize },

    /// An object back-reference points outside the object cache.
    #[error("invalid reference {index} (object cache holds {len})")]
    InvalidReference { index: i64, len: usize },

    /// A string back-reference points outside the string cache.
    #[error("invalid string reference {index} (string cache holds {len})")]
    InvalidStringReference { index: i64, len: usize },

    /// The class name cannot be registered or is not a string on the wire.
    #[error("invalid class name: {0:?}")]
    InvalidClassName(String),

    /// The class name is not known to the resolver.
    #[error("class not found: {0}")]
    ClassNotFound(String),

    /// A custom payload was found for a class without a decode hook.
    #[error("class {0} has no custom decode hook")]
    MissingHook(String),

    /// A custom decode hook left the cursor off the object terminator.
    #[error("invalid custom data for class {class} at position {pos}")]
    InvalidCustomData { class: String, pos: usize },

    /// A class does not accept or does not expose the named field.
    #[error("class {class} has no field {field:?}")]
    UnknownField { class: String, field: String },

    /// The tag is part of the format but not supported by this codec.
    #[error("unserialization of {0} not implemented")]
    NotImplemented(&'static str),

    /// An exception value was decoded and re-raised.
    #[error("exception: {0}")]
    Exception(Box<Value>),

    /// The value cannot be expressed in the requested representation.
    #[error("value not representable: {0}")]
    NotRepresentable(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodecError {
    /// The exception payload, if this error is a re-raised exception value.
    pub fn exception(&self) -> Option<&Value> {
        match self {
            CodecError::Exception(value) => Some(value),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
