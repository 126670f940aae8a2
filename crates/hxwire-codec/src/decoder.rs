use std::cell::RefCell;
use std::rc::Rc;

use bytes::Bytes;
use hxwire_token::{tag, TokenError, TokenReader};
use tracing::{debug, warn};

use crate::cache::DecodeCache;
use crate::class::{DynamicClass, InstanceRef};
use crate::config::DecoderConfig;
use crate::error::{CodecError, Result};
use crate::registry::{ClassResolver, GlobalResolver};
use crate::value::{Date, Entries, Fields, Value};

static GLOBAL_RESOLVER: GlobalResolver = GlobalResolver;

/// Reads values back from a token stream.
///
/// Each [`unserialize`](Self::unserialize) call consumes exactly one value
/// and leaves the cursor after it; later calls continue from there and share
/// the same caches.
pub struct Decoder<'a> {
    reader: TokenReader<'a>,
    cache: DecodeCache,
    resolver: &'a dyn ClassResolver,
    config: DecoderConfig,
}

impl<'a> Decoder<'a> {
    /// Create a decoder that resolves classes against the global registry.
    pub fn new<T>(input: &'a T) -> Self
    where
        T: AsRef<[u8]> + ?Sized,
    {
        Self::with_resolver(input, &GLOBAL_RESOLVER)
    }

    /// Create a decoder with an explicit class resolver.
    pub fn with_resolver<T>(input: &'a T, resolver: &'a dyn ClassResolver) -> Self
    where
        T: AsRef<[u8]> + ?Sized,
    {
        Self {
            reader: TokenReader::new(input.as_ref()),
            cache: DecodeCache::new(),
            resolver,
            config: DecoderConfig::default(),
        }
    }

    /// Replace the decoder configuration.
    pub fn with_config(mut self, config: DecoderConfig) -> Self {
        self.config = config;
        self
    }

    /// Decode the first value of `input` with the global registry.
    pub fn run<T>(input: &T) -> Result<Value>
    where
        T: AsRef<[u8]> + ?Sized,
    {
        Decoder::new(input).unserialize()
    }

    /// Current decoder configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Cursor position.
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    /// The byte under the cursor, if any.
    pub fn peek(&self) -> Option<u8> {
        self.reader.peek()
    }

    /// Returns true once the whole input has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.reader.is_at_end()
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.reader.remaining()
    }

    /// Decode every remaining value in the stream.
    pub fn unserialize_all(&mut self) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        while !self.is_at_end() {
            values.push(self.unserialize()?);
        }
        Ok(values)
    }

    /// Decode the next value.
    pub fn unserialize(&mut self) -> Result<Value> {
        let pos = self.reader.position();
        let tag = self.reader.next_tag()?;
        match tag {
            tag::NULL => Ok(Value::Null),
            tag::TRUE => Ok(Value::Bool(true)),
            tag::FALSE => Ok(Value::Bool(false)),
            tag::ZERO => Ok(Value::Int(0)),
            tag::INT => {
                let n = self.reader.read_digits()?;
                Ok(i32::try_from(n).map_or(Value::Float(n as f64), Value::Int))
            }
            tag::FLOAT => Ok(Value::Float(self.reader.read_float()?)),
            tag::NAN => Ok(Value::Float(f64::NAN)),
            tag::NEG_INFINITY => Ok(Value::Float(f64::NEG_INFINITY)),
            tag::POS_INFINITY => Ok(Value::Float(f64::INFINITY)),
            tag::STRING => {
                let s: Rc<str> = Rc::from(self.reader.read_string_payload()?);
                self.cache.push_string(s.clone());
                Ok(Value::String(s))
            }
            tag::STRING_REF => {
                let index = self.reader.read_digits()?;
                Ok(Value::String(self.cache.string(index)?))
            }
            tag::REF => {
                let index = self.reader.read_digits()?;
                self.cache.object(index)
            }
            tag::BYTES => {
                let bytes = self.reader.read_bytes_payload()?;
                let value = Value::Bytes(Rc::new(Bytes::from(bytes)));
                self.cache.push_object(value.clone());
                Ok(value)
            }
            tag::DATE => {
                let value = Value::Date(Rc::new(Date::from_millis(self.reader.read_float()?)));
                self.cache.push_object(value.clone());
                Ok(value)
            }
            tag::ARRAY => self.unserialize_array(),
            tag::LIST => {
                let items = Rc::new(RefCell::new(Vec::new()));
                self.cache.push_object(Value::List(items.clone()));
                while !self.eat_terminator(tag::LIST_END)? {
                    let item = self.unserialize()?;
                    items.borrow_mut().push(item);
                }
                Ok(Value::List(items))
            }
            tag::OBJECT => {
                let fields = Rc::new(RefCell::new(Fields::new()));
                self.cache.push_object(Value::Object(fields.clone()));
                self.unserialize_fields(tag::OBJECT_END, |key, value| {
                    fields.borrow_mut().insert(key, value);
                    Ok(())
                })?;
                Ok(Value::Object(fields))
            }
            tag::STRING_MAP => {
                let entries = Rc::new(RefCell::new(Fields::new()));
                self.cache.push_object(Value::StringMap(entries.clone()));
                self.unserialize_fields(tag::LIST_END, |key, value| {
                    entries.borrow_mut().insert(key, value);
                    Ok(())
                })?;
                Ok(Value::StringMap(entries))
            }
            tag::INT_MAP => self.unserialize_int_map(),
            tag::OBJECT_MAP => {
                let entries = Rc::new(RefCell::new(Vec::new()));
                self.cache.push_object(Value::ObjectMap(entries.clone()));
                while !self.eat_terminator(tag::LIST_END)? {
                    let key = self.unserialize()?;
                    let value = self.unserialize()?;
                    entries.borrow_mut().push((key, value));
                }
                Ok(Value::ObjectMap(entries))
            }
            tag::EXCEPTION => {
                let value = self.unserialize()?;
                Err(CodecError::Exception(Box::new(value)))
            }
            tag::CLASS => {
                let (_, instance) = self.unserialize_class_header()?;
                self.unserialize_fields(tag::OBJECT_END, |key, value| {
                    instance.borrow_mut().set_field(&key, value)
                })?;
                Ok(Value::Instance(instance))
            }
            tag::CUSTOM => self.unserialize_custom(),
            reserved if tag::is_unimplemented(reserved) => {
                debug!(tag = tag::tag_name(reserved), pos, "rejecting reserved tag");
                Err(CodecError::NotImplemented(match reserved {
                    tag::ENUM_BY_NAME => "enum instance by name",
                    tag::ENUM_BY_INDEX => "enum instance by index",
                    tag::CLASS_TYPE => "classes",
                    _ => "enums",
                }))
            }
            other => Err(TokenError::InvalidChar {
                found: char::from(other),
                pos,
            }
            .into()),
        }
    }

    fn unserialize_array(&mut self) -> Result<Value> {
        let items = Rc::new(RefCell::new(Vec::new()));
        self.cache.push_object(Value::Array(items.clone()));
        while !self.eat_terminator(tag::LIST_END)? {
            if self.reader.eat(tag::NULL_RUN) {
                let pos = self.reader.position();
                let run = self.reader.read_digits()?;
                let invalid = || TokenError::InvalidLength {
                    what: "null run",
                    declared: run,
                    available: 0,
                    pos,
                };
                let count = usize::try_from(run).map_err(|_| invalid())?;
                let mut items = items.borrow_mut();
                let len = items.len().checked_add(count).ok_or_else(invalid)?;
                items.try_reserve(count).map_err(|_| invalid())?;
                items.resize(len, Value::Null);
            } else {
                let item = self.unserialize()?;
                items.borrow_mut().push(item);
            }
        }
        Ok(Value::Array(items))
    }

    fn unserialize_int_map(&mut self) -> Result<Value> {
        let entries = Rc::new(RefCell::new(Entries::new()));
        self.cache.push_object(Value::IntMap(entries.clone()));
        loop {
            let pos = self.reader.position();
            match self.reader.next_byte() {
                Some(tag::SEPARATOR) => {
                    let key_pos = self.reader.position();
                    let key = self.reader.read_digits()?;
                    let key = i32::try_from(key).map_err(|_| TokenError::MalformedNumber {
                        text: key.to_string(),
                        pos: key_pos,
                    })?;
                    let value = self.unserialize()?;
                    entries.borrow_mut().insert(key, value);
                }
                Some(tag::LIST_END) => return Ok(Value::IntMap(entries)),
                Some(_) => return Err(CodecError::InvalidIntMap { pos }),
                None => {
                    return Err(CodecError::MissingTerminator {
                        expected: char::from(tag::LIST_END),
                        pos,
                    })
                }
            }
        }
    }

    fn unserialize_custom(&mut self) -> Result<Value> {
        let (name, instance) = self.unserialize_class_header()?;
        {
            let mut guard = instance.borrow_mut();
            let hook = guard
                .as_custom_mut()
                .ok_or_else(|| CodecError::MissingHook(name.to_string()))?;
            hook.decode(self)?;
        }

        let pos = self.reader.position();
        if !self.reader.eat(tag::OBJECT_END) {
            warn!(class = %name, pos, "custom decode hook left cursor off terminator");
            return Err(CodecError::InvalidCustomData {
                class: name.to_string(),
                pos,
            });
        }
        Ok(Value::Instance(instance))
    }

    /// Read a class name, resolve it and register the empty instance.
    fn unserialize_class_header(&mut self) -> Result<(Rc<str>, InstanceRef)> {
        let name = match self.unserialize()? {
            Value::String(name) => name,
            other => return Err(CodecError::InvalidClassName(other.to_string())),
        };

        let instance = match self.resolver.resolve(&name) {
            Some(instance) => instance,
            None if self.config.dynamic_classes => {
                debug!(class = %name, "decoding unknown class dynamically");
                Rc::new(RefCell::new(DynamicClass::new(name.as_ref()))) as InstanceRef
            }
            None => {
                debug!(class = %name, "class not found");
                return Err(CodecError::ClassNotFound(name.to_string()));
            }
        };

        self.cache.push_object(Value::Instance(instance.clone()));
        Ok((name, instance))
    }

    /// Read `key value` pairs with string keys until `terminator`.
    fn unserialize_fields(
        &mut self,
        terminator: u8,
        mut insert: impl FnMut(Rc<str>, Value) -> Result<()>,
    ) -> Result<()> {
        while !self.eat_terminator(terminator)? {
            let pos = self.reader.position();
            let key = match self.unserialize()? {
                Value::String(key) => key,
                _ => return Err(CodecError::InvalidKey { pos }),
            };
            let value = self.unserialize()?;
            insert(key, value)?;
        }
        Ok(())
    }

    /// Consume `terminator` if it is next; fail at end of input.
    fn eat_terminator(&mut self, terminator: u8) -> Result<bool> {
        if self.reader.is_at_end() {
            return Err(CodecError::MissingTerminator {
                expected: char::from(terminator),
                pos: self.reader.position(),
            });
        }
        Ok(self.reader.eat(terminator))
    }
}
