//! Bridge between [`Value`] graphs and `serde_json` documents.
//!
//! JSON has no sharing, so a graph is flattened into a tree: shared
//! composites are written once per occurrence and cycles are rejected.
//! Wire-only shapes map onto tagged JSON objects:
//!
//! | Value              | JSON                                   |
//! |--------------------|----------------------------------------|
//! | NaN / ±Infinity    | `"NaN"`, `"Infinity"`, `"-Infinity"`   |
//! | bytes              | base64 string                          |
//! | date               | `{"$date": millis}`                    |
//! | class instance     | `{"$class": name, field: value, ...}`  |
//! | custom instance    | `{"$class": name, "$custom": [...]}`   |
//! | int map            | object with decimal keys               |
//! | object map         | `[[key, value], ...]`                  |

use hxwire_token::encode_base64;
use serde_json::{json, Map, Number, Value as Json};

use crate::class::{DynamicClass, Serializable};
use crate::config::{DecoderConfig, EncoderConfig};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{CodecError, Result};
use crate::registry::ClassRegistry;
use crate::value::{Fields, Value, ValueKind};

pub const CLASS_KEY: &str = "$class";
pub const CUSTOM_KEY: &str = "$custom";
pub const DATE_KEY: &str = "$date";

/// Convert a value graph into a JSON document.
pub fn to_json(value: &Value) -> Result<Json> {
    JsonWriter::default().convert(value)
}

/// Convert a JSON document into a value graph.
///
/// Numbers that are whole and fit in 32 bits become `Int`, every other
/// number becomes `Float`. Objects become anonymous objects with their keys
/// in document order.
pub fn from_json(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64().and_then(|i| i32::try_from(i).ok()) {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::string(s),
        Json::Array(items) => Value::array(items.iter().map(from_json).collect()),
        Json::Object(map) => Value::object(map.iter().map(|(k, v)| (k, from_json(v)))),
    }
}

#[derive(Default)]
struct JsonWriter {
    /// Composites currently being converted, outermost first.
    active: Vec<(ValueKind, usize)>,
}

impl JsonWriter {
    fn convert(&mut self, value: &Value) -> Result<Json> {
        let json = match value {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(v) => match Number::from_f64(*v) {
                Some(n) => Json::Number(n),
                None => Json::String(value.to_string()),
            },
            Value::String(s) => Json::String(s.to_string()),
            Value::Opaque(opaque) => {
                return Err(CodecError::NotRepresentable(format!(
                    "opaque value {}",
                    opaque.type_name()
                )))
            }
            _ => {
                let Some(id) = value.identity() else {
                    return Err(CodecError::NotRepresentable(value.kind().name().to_string()));
                };
                if self.active.contains(&id) {
                    return Err(CodecError::NotRepresentable(format!(
                        "cyclic {}",
                        value.kind().name()
                    )));
                }
                self.active.push(id);
                let json = self.convert_composite(value);
                self.active.pop();
                json?
            }
        };
        Ok(json)
    }

    fn convert_composite(&mut self, value: &Value) -> Result<Json> {
        let json = match value {
            Value::Bytes(bytes) => Json::String(encode_base64(bytes)),
            Value::Date(date) => json!({ DATE_KEY: date.millis() }),
            Value::Array(items) | Value::List(items) => Json::Array(
                items
                    .borrow()
                    .iter()
                    .map(|item| self.convert(item))
                    .collect::<Result<_>>()?,
            ),
            Value::Object(fields) | Value::StringMap(fields) => {
                Json::Object(self.convert_fields(&fields.borrow(), Map::new())?)
            }
            Value::IntMap(entries) => {
                let mut map = Map::new();
                for (key, value) in entries.borrow().iter() {
                    map.insert(key.to_string(), self.convert(value)?);
                }
                Json::Object(map)
            }
            Value::ObjectMap(entries) => {
                let mut pairs = Vec::new();
                for (key, value) in entries.borrow().iter() {
                    pairs.push(Json::Array(vec![self.convert(key)?, self.convert(value)?]));
                }
                Json::Array(pairs)
            }
            Value::Instance(instance) => {
                let instance = instance.borrow();
                if let Some(dynamic) = instance.as_any().downcast_ref::<DynamicClass>() {
                    self.convert_dynamic(dynamic)?
                } else if instance.as_custom().is_some() {
                    self.convert_custom(value)?
                } else {
                    self.convert_instance(&*instance)?
                }
            }
            other => {
                return Err(CodecError::NotRepresentable(other.kind().name().to_string()));
            }
        };
        Ok(json)
    }

    fn convert_fields(&mut self, fields: &Fields, mut map: Map<String, Json>) -> Result<Map<String, Json>> {
        for (key, value) in fields.iter() {
            map.insert(key.to_string(), self.convert(value)?);
        }
        Ok(map)
    }

    fn convert_instance(&mut self, instance: &dyn Serializable) -> Result<Json> {
        let mut map = Map::new();
        map.insert(CLASS_KEY.to_string(), Json::String(instance.class_name().to_string()));
        for name in instance.field_names() {
            let value = instance
                .get_field(name)
                .ok_or_else(|| crate::class::unknown_field(instance.class_name(), name))?;
            map.insert(name.to_string(), self.convert(&value)?);
        }
        Ok(Json::Object(map))
    }

    fn convert_dynamic(&mut self, dynamic: &DynamicClass) -> Result<Json> {
        let mut map = Map::new();
        map.insert(CLASS_KEY.to_string(), Json::String(dynamic.class_name().to_string()));
        let mut map = self.convert_fields(dynamic.fields(), map)?;
        if let Some(payload) = dynamic.payload() {
            let payload = payload
                .iter()
                .map(|value| self.convert(value))
                .collect::<Result<_>>()?;
            map.insert(CUSTOM_KEY.to_string(), Json::Array(payload));
        }
        Ok(Json::Object(map))
    }

    /// Custom payloads are opaque to reflection, so run the hook and read
    /// the result back as a dynamic instance.
    fn convert_custom(&mut self, value: &Value) -> Result<Json> {
        let mut encoder = Encoder::with_config(EncoderConfig { use_cache: true });
        encoder.serialize(value)?;

        let registry = ClassRegistry::new();
        let dynamic = Decoder::with_resolver(encoder.as_bytes(), &registry)
            .with_config(DecoderConfig {
                dynamic_classes: true,
            })
            .unserialize()?;
        self.convert(&dynamic)
    }
}
