use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Args, Subcommand};
use jsonsock_frame::FrameConfig;
use jsonsock_transport::DEFAULT_BACKLOG;

use crate::exit::{CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod echo;
pub mod listen;
pub mod send;
pub mod version;

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub format: OutputFormat,
    pub frame: FrameConfig,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept peers one at a time and print every message received.
    Listen(ListenArgs),
    /// Accept peers one at a time and send every message back.
    Echo(EchoArgs),
    /// Connect, send one message, and optionally print the reply.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, ctx: &RunContext) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, ctx),
        Command::Echo(args) => echo::run(args, ctx),
        Command::Send(args) => send::run(args, ctx),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to bind (e.g. 127.0.0.1:9000).
    pub addr: String,
    /// Pending-connection backlog.
    #[arg(long, default_value_t = DEFAULT_BACKLOG)]
    pub backlog: i32,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// JSON document sent back after every received message.
    #[arg(long, value_name = "JSON")]
    pub reply: Option<String>,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Address to bind (e.g. 127.0.0.1:9000).
    pub addr: String,
    /// Pending-connection backlog.
    #[arg(long, default_value_t = DEFAULT_BACKLOG)]
    pub backlog: i32,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Address to connect to.
    pub addr: String,
    /// JSON payload.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub json: Option<String>,
    /// Read the JSON payload from a file.
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
    /// Wait for one reply and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for connect and reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// First Ctrl-C asks the serve loops to stop after the current message; a
/// second one exits immediately (a blocking accept cannot observe the flag).
pub(crate) fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        if !running.swap(false, Ordering::SeqCst) {
            std::process::exit(130);
        }
        tracing::info!("stopping after current message; press Ctrl-C again to exit now");
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

/// Parse a JSON document given on the command line.
pub(crate) fn parse_json_arg(flag: &str, text: &str) -> CliResult<serde_json::Value> {
    serde_json::from_str(text)
        .map_err(|err| CliError::new(USAGE, format!("{flag} is not valid JSON: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_json_arg_accepts_documents() {
        let value = parse_json_arg("--json", r#"{"name":"Daisy","age":24}"#).unwrap();
        assert_eq!(value["age"], 24);
    }

    #[test]
    fn parse_json_arg_rejects_garbage_as_usage() {
        let err = parse_json_arg("--reply", "{oops").unwrap_err();
        assert_eq!(err.code, USAGE);
        assert!(err.message.starts_with("--reply is not valid JSON"));
    }
}
