use std::fs;
use std::time::Duration;

use jsonsock_peer::{Connector, ConnectorConfig};
use serde_json::Value;

use crate::cmd::{parse_json_arg, RunContext, SendArgs};
use crate::exit::{endpoint_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::print_message;

pub fn run(args: SendArgs, ctx: &RunContext) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let message = resolve_payload(&args)?;

    let mut frame = ctx.frame.clone();
    if args.wait {
        frame.read_timeout = Some(wait_timeout);
    }
    let mut connector = Connector::with_config(ConnectorConfig {
        connect_timeout: Some(wait_timeout),
        frame,
    });

    connector
        .connect(args.addr.as_str())
        .map_err(|err| endpoint_error("connect failed", err))?;
    connector
        .send(&message)
        .map_err(|err| endpoint_error("send failed", err))?;

    if args.wait {
        let reply: Value = connector
            .recv()
            .map_err(|err| endpoint_error("receive failed", err))?;
        print_message(&reply, connector.peer_addr(), ctx.frame.endianness, ctx.format);
    }

    connector.close();
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Value> {
    if let Some(json) = &args.json {
        return parse_json_arg("--json", json);
    }
    if let Some(path) = &args.file {
        let raw = fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        return serde_json::from_slice(&raw).map_err(|err| {
            CliError::new(
                DATA_INVALID,
                format!("{} is not valid JSON: {err}", path.display()),
            )
        });
    }
    Err(CliError::new(USAGE, "one of --json or --file is required"))
}

/// Accepts `500ms`, `5s`, or a bare number of seconds.
fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    let (number, millis) = match input.strip_suffix("ms") {
        Some(num) => (num, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input:?}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
