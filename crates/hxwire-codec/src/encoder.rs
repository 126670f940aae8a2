use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;
use hxwire_token::{is_wire_int, tag, TokenWriter};

use crate::cache::{ObjectCache, StringTable};
use crate::class::{unknown_field, Serializable};
use crate::config::EncoderConfig;
use crate::error::{CodecError, Result};
use crate::value::Value;

/// Walks value graphs and appends their tokens to a growing buffer.
///
/// Successive [`serialize`](Self::serialize) calls append to the same buffer
/// and share the same caches, so the output is a concatenated stream.
#[derive(Debug, Default)]
pub struct Encoder {
    writer: TokenWriter,
    config: EncoderConfig,
    objects: ObjectCache,
    strings: StringTable,
}

impl Encoder {
    /// Create an encoder with default configuration (no reference cache).
    pub fn new() -> Self {
        Self::with_config(EncoderConfig::default())
    }

    /// Create an encoder with explicit configuration.
    pub fn with_config(config: EncoderConfig) -> Self {
        Self {
            writer: TokenWriter::new(),
            config,
            objects: ObjectCache::new(),
            strings: StringTable::new(),
        }
    }

    /// Encode a single value with a fresh default encoder.
    pub fn run(value: &Value) -> Result<String> {
        let mut encoder = Self::new();
        encoder.serialize(value)?;
        Ok(encoder.to_string())
    }

    /// Whether composites are tracked in the object cache.
    pub fn use_cache(&self) -> bool {
        self.config.use_cache
    }

    /// Toggle the object cache for subsequent calls.
    pub fn set_use_cache(&mut self, use_cache: bool) {
        self.config.use_cache = use_cache;
    }

    /// Current encoder configuration.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Append the encoding of `value`.
    pub fn serialize(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.writer.put_tag(tag::NULL),
            Value::Bool(true) => self.writer.put_tag(tag::TRUE),
            Value::Bool(false) => self.writer.put_tag(tag::FALSE),
            // i32::MIN fails the wire integer rule and goes out as `d`.
            Value::Int(i) => self.serialize_float(f64::from(*i)),
            Value::Float(f) => self.serialize_float(*f),
            Value::String(s) => self.serialize_str(s),
            Value::Opaque(opaque) => {
                return Err(CodecError::Unsupported {
                    kind: opaque.type_name().to_string(),
                })
            }
            _ => {
                if self.config.use_cache && self.serialize_ref(value) {
                    return Ok(());
                }
                self.serialize_composite(value)?;
            }
        }
        Ok(())
    }

    /// Append `x` followed by `value`; decoding re-raises it as an error.
    pub fn serialize_exception(&mut self, value: &Value) -> Result<()> {
        self.writer.put_tag(tag::EXCEPTION);
        self.serialize(value)
    }

    /// Append an interned string: a back-reference if it was written before,
    /// the literal otherwise.
    pub fn serialize_str(&mut self, s: &str) {
        match self.strings.intern(s) {
            Some(index) => {
                self.writer.put_tag(tag::STRING_REF);
                self.writer.put_int(index as i64);
            }
            None => {
                self.writer.put_tag(tag::STRING);
                self.writer.put_string_payload(s);
            }
        }
    }

    fn serialize_float(&mut self, f: f64) {
        if f.is_nan() {
            self.writer.put_tag(tag::NAN);
        } else if f.is_infinite() {
            self.writer.put_tag(if f < 0.0 {
                tag::NEG_INFINITY
            } else {
                tag::POS_INFINITY
            });
        } else if is_wire_int(f) {
            if f == 0.0 {
                self.writer.put_tag(tag::ZERO);
            } else {
                self.writer.put_tag(tag::INT);
                self.writer.put_int(f as i64);
            }
        } else {
            self.writer.put_tag(tag::FLOAT);
            self.writer.put_float(f);
        }
    }

    /// Emit `r<index>` if `value` was seen before; register it otherwise.
    fn serialize_ref(&mut self, value: &Value) -> bool {
        match self.objects.lookup_or_register(value) {
            Some(index) => {
                self.writer.put_tag(tag::REF);
                self.writer.put_int(index as i64);
                true
            }
            None => false,
        }
    }

    fn serialize_composite(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Bytes(bytes) => {
                self.writer.put_tag(tag::BYTES);
                self.writer.put_bytes_payload(bytes);
            }
            Value::Date(date) => {
                if !date.millis().is_finite() {
                    return Err(CodecError::Unsupported {
                        kind: "invalid date".to_string(),
                    });
                }
                self.writer.put_tag(tag::DATE);
                self.writer.put_float(date.millis());
            }
            Value::Array(items) => {
                self.writer.put_tag(tag::ARRAY);
                let mut nulls = 0usize;
                for item in items.borrow().iter() {
                    if item.is_null() {
                        nulls += 1;
                        continue;
                    }
                    self.flush_nulls(&mut nulls);
                    self.serialize(item)?;
                }
                self.flush_nulls(&mut nulls);
                self.writer.put_tag(tag::LIST_END);
            }
            Value::List(items) => {
                self.writer.put_tag(tag::LIST);
                for item in items.borrow().iter() {
                    self.serialize(item)?;
                }
                self.writer.put_tag(tag::LIST_END);
            }
            Value::Object(fields) => {
                self.writer.put_tag(tag::OBJECT);
                for (key, field) in fields.borrow().iter() {
                    self.serialize_str(key);
                    self.serialize(field)?;
                }
                self.writer.put_tag(tag::OBJECT_END);
            }
            Value::StringMap(entries) => {
                self.writer.put_tag(tag::STRING_MAP);
                for (key, entry) in entries.borrow().iter() {
                    self.serialize_str(key);
                    self.serialize(entry)?;
                }
                self.writer.put_tag(tag::LIST_END);
            }
            Value::IntMap(entries) => {
                self.writer.put_tag(tag::INT_MAP);
                for (key, entry) in entries.borrow().iter() {
                    self.writer.put_tag(tag::SEPARATOR);
                    self.writer.put_int(i64::from(*key));
                    self.serialize(entry)?;
                }
                self.writer.put_tag(tag::LIST_END);
            }
            Value::ObjectMap(entries) => {
                self.writer.put_tag(tag::OBJECT_MAP);
                for (key, entry) in entries.borrow().iter() {
                    self.serialize(key)?;
                    self.serialize(entry)?;
                }
                self.writer.put_tag(tag::LIST_END);
            }
            Value::Instance(instance) => {
                let instance = instance.borrow();
                match instance.as_custom() {
                    Some(custom) => {
                        self.writer.put_tag(tag::CUSTOM);
                        self.serialize_str(instance.class_name());
                        custom.encode(self)?;
                        self.writer.put_tag(tag::OBJECT_END);
                    }
                    None => {
                        self.writer.put_tag(tag::CLASS);
                        self.serialize_str(instance.class_name());
                        self.serialize_fields(&*instance)?;
                    }
                }
            }
            other => {
                return Err(CodecError::Unsupported {
                    kind: other.kind().name().to_string(),
                })
            }
        }
        Ok(())
    }

    fn serialize_fields(&mut self, instance: &dyn Serializable) -> Result<()> {
        for name in instance.field_names() {
            let field = instance
                .get_field(name)
                .ok_or_else(|| unknown_field(instance.class_name(), name))?;
            self.serialize_str(name);
            self.serialize(&field)?;
        }
        self.writer.put_tag(tag::OBJECT_END);
        Ok(())
    }

    fn flush_nulls(&mut self, nulls: &mut usize) {
        match *nulls {
            0 => {}
            1 => self.writer.put_tag(tag::NULL),
            n => {
                self.writer.put_tag(tag::NULL_RUN);
                self.writer.put_int(n as i64);
            }
        }
        *nulls = 0;
    }

    /// Buffer contents as bytes; the buffer is not reset.
    pub fn to_bytes(&self) -> Bytes {
        self.writer.to_bytes()
    }

    /// Buffer contents as text.
    pub fn as_str(&self) -> Cow<'_, str> {
        self.writer.as_str()
    }

    /// Buffer contents as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.writer.as_bytes()
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.writer.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.writer.is_empty()
    }
}

/// Buffer contents as text; the buffer is not reset.
impl fmt::Display for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.writer.as_str())
    }
}
