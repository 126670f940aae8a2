use hxwire_codec::{from_json, Encoder, EncoderConfig};
use tracing::debug;

use crate::cmd::{read_input, EncodeArgs};
use crate::exit::{codec_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_wire, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let text = read_input(args.json, args.file.as_deref())?;
    let json: serde_json::Value = serde_json::from_str(&text)
        .map_err(|err| CliError::new(DATA_INVALID, format!("parse JSON input: {err}")))?;

    let mut encoder = Encoder::with_config(EncoderConfig {
        use_cache: args.cache,
    });
    encoder
        .serialize(&from_json(&json))
        .map_err(|err| codec_error("encode", err))?;

    let wire = encoder.to_string();
    debug!(length = wire.len(), cache = args.cache, "encoded document");
    print_wire(&wire, format);
    Ok(SUCCESS)
}
