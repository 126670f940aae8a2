use std::fmt;
use std::io;

use hxwire_codec::CodecError;

// Exit codes follow the sysexits-style table used across our CLIs.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => USAGE,
        io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn codec_error(context: &str, err: CodecError) -> CliError {
    let code = match err {
        CodecError::Exception(_) => FAILURE,
        CodecError::Unsupported { .. } => INTERNAL,
        _ => DATA_INVALID,
    };
    CliError::new(code, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hxwire_codec::Value;

    #[test]
    fn malformed_input_is_data_invalid() {
        let err = codec_error("decode", CodecError::InvalidKey { pos: 3 });
        assert_eq!(err.code, DATA_INVALID);
        assert_eq!(err.to_string(), "decode: invalid object key at position 3");
    }

    #[test]
    fn exception_is_a_plain_failure() {
        let err = codec_error(
            "decode",
            CodecError::Exception(Box::new(Value::string("boom"))),
        );
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn missing_file_is_usage() {
        let err = io_error("read x", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.code, USAGE);
    }
}
