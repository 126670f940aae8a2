//! Value encoding and decoding for the hxwire text serialization format.
//!
//! [`Encoder`] turns a [`Value`] graph into wire text and [`Decoder`] reads
//! it back, preserving sharing and cycles through back-references. Named
//! classes travel through the [`Serializable`] trait and are recreated on
//! decode via a [`ClassResolver`], usually a [`ClassRegistry`].

pub mod cache;
pub mod class;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod json;
pub mod registry;
pub mod value;

pub use class::{unknown_field, CustomCodec, DynamicClass, InstanceRef, Serializable};
pub use config::{DecoderConfig, EncoderConfig};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{CodecError, Result};
pub use json::{from_json, to_json};
pub use registry::{
    register_global_class, with_global_registry, ClassFactory, ClassRegistry, ClassResolver,
    GlobalResolver,
};
pub use value::{Date, Entries, Fields, Opaque, Shared, Value, ValueKind};
