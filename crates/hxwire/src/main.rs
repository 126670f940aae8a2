mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "hxwire", version, about = "Haxe serialization format CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from(["hxwire", "encode", "--json", "[1,2]", "--cache"])
            .expect("encode args should parse");

        match cli.command {
            Command::Encode(args) => {
                assert_eq!(args.json.as_deref(), Some("[1,2]"));
                assert!(args.cache);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_encode_inputs() {
        let err = Cli::try_parse_from([
            "hxwire",
            "encode",
            "--json",
            "{}",
            "--file",
            "input.json",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_decode_with_global_format() {
        let cli = Cli::try_parse_from([
            "hxwire",
            "decode",
            "ai1nh",
            "--dynamic-classes",
            "--format",
            "raw",
        ])
        .expect("decode args should parse");

        assert!(matches!(cli.format, Some(OutputFormat::Raw)));
        match cli.command {
            Command::Decode(args) => {
                assert_eq!(args.wire.as_deref(), Some("ai1nh"));
                assert!(args.dynamic_classes);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
