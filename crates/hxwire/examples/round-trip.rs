//! Round-trip example: a class with a custom hook, registered and decoded.
//!
//! Run with:
//!   cargo run --example round-trip

use std::any::Any;

use hxwire::codec::{unknown_field, Result};
use hxwire::{
    ClassRegistry, CustomCodec, Decoder, DecoderConfig, Encoder, EncoderConfig, Serializable,
    Value,
};

/// An RGB color packed into a single integer on the wire.
#[derive(Debug, Default)]
struct Color {
    r: u8,
    g: u8,
    b: u8,
}

impl Serializable for Color {
    fn class_name(&self) -> &str {
        "ui.Color"
    }

    fn field_names(&self) -> Vec<&str> {
        vec!["r", "g", "b"]
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        match name {
            "r" => Some(Value::Int(self.r.into())),
            "g" => Some(Value::Int(self.g.into())),
            "b" => Some(Value::Int(self.b.into())),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        let channel = value
            .as_i32()
            .and_then(|v| u8::try_from(v).ok())
            .unwrap_or_default();
        match name {
            "r" => self.r = channel,
            "g" => self.g = channel,
            "b" => self.b = channel,
            _ => return Err(unknown_field("ui.Color", name)),
        }
        Ok(())
    }

    fn as_custom(&self) -> Option<&dyn CustomCodec> {
        Some(self)
    }

    fn as_custom_mut(&mut self) -> Option<&mut dyn CustomCodec> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl CustomCodec for Color {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        let packed = (i32::from(self.r) << 16) | (i32::from(self.g) << 8) | i32::from(self.b);
        encoder.serialize(&Value::Int(packed))
    }

    fn decode(&mut self, decoder: &mut Decoder<'_>) -> Result<()> {
        let packed = decoder.unserialize()?.as_i32().unwrap_or_default();
        self.r = (packed >> 16) as u8;
        self.g = (packed >> 8) as u8;
        self.b = packed as u8;
        Ok(())
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut registry = ClassRegistry::new();
    registry.register_class::<Color>()?;

    // Two slots share one color; with the cache on the second is sent as `r`.
    let accent = Value::instance(Color {
        r: 0xff,
        g: 0x80,
        b: 0x00,
    });
    let theme = Value::object([
        ("name", Value::string("sunset")),
        ("border", accent.clone()),
        ("text", accent),
    ]);

    let mut encoder = Encoder::with_config(EncoderConfig { use_cache: true });
    encoder.serialize(&theme)?;
    let wire = encoder.to_string();
    println!("wire:    {wire}");

    let decoded = Decoder::with_resolver(&wire, &registry)
        .with_config(DecoderConfig::default())
        .unserialize()?;

    let fields = decoded.as_fields().ok_or("theme should decode as an object")?;
    let fields = fields.borrow();
    let border = fields.get("border").ok_or("missing border")?;
    let text = fields.get("text").ok_or("missing text")?;

    let rgb = border.with_instance(|c: &Color| (c.r, c.g, c.b));
    println!("border:  {rgb:?}");
    println!("shared:  {}", border.same_identity(text));
    Ok(())
}
