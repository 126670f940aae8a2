//! Token layer of the hxwire text serialization format.
//!
//! A stream is a flat run of ASCII tokens, each introduced by a single tag
//! byte (see [`tag`]). This crate knows how to scan and emit the raw pieces
//! of those tokens:
//! - decimal digit runs for integers, lengths and cache indices
//! - floating point literals in the receiving ecosystem's text form
//! - length-prefixed payloads (percent-encoded strings, base64 bytes)
//!
//! It has no notion of values, caches or classes; that lives in
//! `hxwire-codec`.

pub mod error;
pub mod number;
pub mod payload;
pub mod reader;
pub mod tag;
pub mod writer;

pub use error::{Result, TokenError};
pub use number::{format_float, is_wire_int, INT_MODULUS};
pub use payload::{decode_base64, decode_percent, encode_base64, encode_percent};
pub use reader::TokenReader;
pub use tag::tag_name;
pub use writer::TokenWriter;
