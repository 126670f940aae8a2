use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value as Json;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One decoded value, rendered through the JSON bridge.
#[derive(Debug, Serialize)]
pub struct DecodedValue {
    pub kind: &'static str,
    pub value: Json,
}

#[derive(Serialize)]
struct EncodeOutput<'a> {
    length: usize,
    wire: &'a str,
}

#[derive(Serialize)]
struct DecodeOutput<'a> {
    count: usize,
    values: &'a [DecodedValue],
}

pub fn print_wire(wire: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EncodeOutput {
                length: wire.len(),
                wire,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["LENGTH", "WIRE"])
                .add_row(vec![wire.len().to_string(), wire.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("length={} wire={wire}", wire.len()),
        OutputFormat::Raw => {
            print_raw(wire.as_bytes());
            println!();
        }
    }
}

pub fn print_values(values: &[DecodedValue], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = DecodeOutput {
                count: values.len(),
                values,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "KIND", "VALUE"]);
            for (index, decoded) in values.iter().enumerate() {
                table.add_row(vec![
                    index.to_string(),
                    decoded.kind.to_string(),
                    decoded.value.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (index, decoded) in values.iter().enumerate() {
                let body = serde_json::to_string_pretty(&decoded.value)
                    .unwrap_or_else(|_| decoded.value.to_string());
                println!("[{index}] {}: {body}", decoded.kind);
            }
        }
        OutputFormat::Raw => {
            for decoded in values {
                println!("{}", decoded.value);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
