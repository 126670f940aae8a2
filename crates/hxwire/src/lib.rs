//! Encoder and decoder for the Haxe text serialization format.
//!
//! hxwire reads and writes the compact, tag-prefixed text format used by
//! Haxe's `Serializer`/`Unserializer`, including shared references, cycles,
//! string interning and named class instances.
//!
//! # Crate Structure
//!
//! - [`token`]: tags, number formatting and payload codecs
//! - [`codec`]: the value model, encoder, decoder and class registry
//!
//! ```
//! use hxwire::{Decoder, Encoder, Value};
//!
//! let wire = Encoder::run(&Value::array(vec![Value::Int(1), Value::Null])).unwrap();
//! assert_eq!(wire, "ai1nh");
//! assert_eq!(Decoder::run(&wire).unwrap(), Value::array(vec![Value::Int(1), Value::Null]));
//! ```

/// Re-export token types.
pub mod token {
    pub use hxwire_token::*;
}

/// Re-export codec types.
pub mod codec {
    pub use hxwire_codec::*;
}

pub use hxwire_codec::{
    ClassRegistry, CodecError, CustomCodec, Decoder, DecoderConfig, Encoder, EncoderConfig,
    Serializable, Value,
};
