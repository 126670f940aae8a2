use clap::{Args, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::exit::{io_error, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a JSON document as wire text.
    Encode(EncodeArgs),
    /// Decode every value in a wire stream.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Inline JSON input. Reads stdin when neither --json nor --file is given.
    #[arg(long, conflicts_with = "file")]
    pub json: Option<String>,
    /// Read JSON input from file.
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
    /// Write shared containers once and back-reference them.
    #[arg(long)]
    pub cache: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Inline wire text. Reads stdin when neither WIRE nor --file is given.
    #[arg(conflicts_with = "file")]
    pub wire: Option<String>,
    /// Read wire text from file.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Decode unknown class names as dynamic instances instead of failing.
    #[arg(long)]
    pub dynamic_classes: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Resolve command input: inline text, then file, then stdin.
fn read_input(inline: Option<String>, file: Option<&Path>) -> CliResult<String> {
    if let Some(text) = inline {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("read {}", path.display()), err));
    }
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .map_err(|err| io_error("read stdin", err))?;
    Ok(text)
}
