use hxwire_codec::{to_json, CodecError, Decoder, DecoderConfig};
use tracing::debug;

use crate::cmd::{read_input, DecodeArgs};
use crate::exit::{codec_error, CliResult, SUCCESS};
use crate::output::{print_values, DecodedValue, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let text = read_input(args.wire, args.file.as_deref())?;
    let config = DecoderConfig {
        dynamic_classes: args.dynamic_classes,
    };

    // Wire text never contains raw whitespace, so a trailing newline from a
    // file or pipe is not part of the stream.
    let mut decoder = Decoder::new(text.trim_end()).with_config(config);
    let values = decoder
        .unserialize_all()
        .map_err(|err| codec_error("decode", err))?;
    debug!(count = values.len(), "decoded stream");

    let decoded = values
        .iter()
        .map(|value| {
            Ok(DecodedValue {
                kind: value.kind().name(),
                value: to_json(value)?,
            })
        })
        .collect::<Result<Vec<_>, CodecError>>()
        .map_err(|err| codec_error("render", err))?;

    print_values(&decoded, format);
    Ok(SUCCESS)
}
