//! Class instances and the custom hook protocol.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use hxwire_token::tag::OBJECT_END;

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{CodecError, Result};
use crate::value::{Fields, Value};

/// A shared, mutable class instance.
pub type InstanceRef = Rc<RefCell<dyn Serializable>>;

/// A type that travels as a named class instance (`c` or `C`).
///
/// Without a [`CustomCodec`], instances are written as their class name
/// followed by every listed field, and read back by creating an empty
/// instance through the class registry and assigning fields in wire order.
pub trait Serializable: Any {
    /// Class name written on the wire and used for registry lookup.
    fn class_name(&self) -> &str;

    /// Own field names, in a stable order.
    fn field_names(&self) -> Vec<&str>;

    fn get_field(&self, name: &str) -> Option<Value>;

    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;

    /// The encode side of the custom hook. Returning `Some` switches the
    /// instance to the `C` form.
    fn as_custom(&self) -> Option<&dyn CustomCodec> {
        None
    }

    /// The decode side of the custom hook, used for `C` payloads.
    fn as_custom_mut(&mut self) -> Option<&mut dyn CustomCodec> {
        None
    }

    /// Structural equality with another instance: same class name and equal
    /// listed fields.
    fn fields_eq(&self, other: &dyn Serializable) -> bool {
        let names = self.field_names();
        self.class_name() == other.class_name()
            && names == other.field_names()
            && names
                .iter()
                .all(|name| self.get_field(name) == other.get_field(name))
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A class that owns its wire representation.
///
/// `encode` writes any number of values into the encoder; `decode` must read
/// back exactly those values, leaving the decoder on the closing `g`.
pub trait CustomCodec {
    fn encode(&self, encoder: &mut Encoder) -> Result<()>;

    fn decode(&mut self, decoder: &mut Decoder<'_>) -> Result<()>;
}

/// Build an error for a field a class does not have.
pub fn unknown_field(class: &str, field: &str) -> CodecError {
    CodecError::UnknownField {
        class: class.to_string(),
        field: field.to_string(),
    }
}

/// A class instance with no Rust type behind it.
///
/// Holds either plain fields (`c`) or the values of a custom payload (`C`).
/// On decode it consumes payload values until the object terminator, so any
/// custom payload made of whole values can be carried through and
/// re-encoded unchanged.
#[derive(Debug, Clone, Default)]
pub struct DynamicClass {
    name: String,
    fields: Fields,
    payload: Option<Vec<Value>>,
}

impl DynamicClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Fields::new(),
            payload: None,
        }
    }

    /// A dynamic instance written in the custom form.
    pub fn with_payload(name: impl Into<String>, payload: Vec<Value>) -> Self {
        Self {
            payload: Some(payload),
            ..Self::new(name)
        }
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn payload(&self) -> Option<&[Value]> {
        self.payload.as_deref()
    }
}

impl Serializable for DynamicClass {
    fn class_name(&self) -> &str {
        &self.name
    }

    fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(|k| k.as_ref()).collect()
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        self.fields.insert(Rc::from(name), value);
        Ok(())
    }

    fn as_custom(&self) -> Option<&dyn CustomCodec> {
        self.payload.as_ref().map(|_| self as &dyn CustomCodec)
    }

    fn as_custom_mut(&mut self) -> Option<&mut dyn CustomCodec> {
        Some(self)
    }

    fn fields_eq(&self, other: &dyn Serializable) -> bool {
        match other.as_any().downcast_ref::<DynamicClass>() {
            Some(other) => {
                self.name == other.name
                    && self.fields == other.fields
                    && self.payload == other.payload
            }
            None => {
                self.payload.is_none()
                    && self.name == other.class_name()
                    && self.field_names() == other.field_names()
                    && self
                        .fields
                        .iter()
                        .all(|(k, v)| other.get_field(k).as_ref() == Some(v))
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl CustomCodec for DynamicClass {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        for value in self.payload.iter().flatten() {
            encoder.serialize(value)?;
        }
        Ok(())
    }

    fn decode(&mut self, decoder: &mut Decoder<'_>) -> Result<()> {
        let mut payload = Vec::new();
        while decoder.peek() != Some(OBJECT_END) {
            payload.push(decoder.unserialize()?);
        }
        self.payload = Some(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_fields_keep_order() {
        let mut instance = DynamicClass::new("Point");
        instance.set_field("y", Value::Int(2)).unwrap();
        instance.set_field("x", Value::Int(1)).unwrap();

        assert_eq!(instance.class_name(), "Point");
        assert_eq!(instance.field_names(), vec!["y", "x"]);
        assert_eq!(instance.get_field("x"), Some(Value::Int(1)));
        assert!(instance.as_custom().is_none());
    }

    #[test]
    fn payload_switches_to_custom_form() {
        let instance = DynamicClass::with_payload("Blob", vec![Value::Int(1)]);
        assert!(instance.as_custom().is_some());
        assert_eq!(instance.payload(), Some(&[Value::Int(1)][..]));
    }

    #[test]
    fn dynamic_equality() {
        let a = Value::instance(DynamicClass::with_payload("Blob", vec![Value::Int(1)]));
        let b = Value::instance(DynamicClass::with_payload("Blob", vec![Value::Float(1.0)]));
        let c = Value::instance(DynamicClass::new("Blob"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn unknown_field_names_class_and_field() {
        let err = unknown_field("Point", "z");
        assert_eq!(err.to_string(), "class Point has no field \"z\"");
    }
}
