mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use jsonsock_frame::{Endianness, FrameConfig, DEFAULT_MAX_PAYLOAD};

use crate::cmd::{Command, RunContext};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "jsonsock", version, about = "Length-prefixed JSON messages over TCP")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). JSONSOCK_LOG overrides with a filter directive.
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Use little-endian length headers (default: big-endian).
    #[arg(long, global = true)]
    little_endian: bool,

    /// Largest payload accepted or sent, in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_PAYLOAD, global = true)]
    max_payload: usize,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_payload,
            endianness: if self.little_endian {
                Endianness::Little
            } else {
                Endianness::Big
            },
            ..FrameConfig::default()
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let ctx = RunContext {
        format: cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
        frame: cli.frame_config(),
    };
    let result = cmd::run(cli.command, &ctx);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
