use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use jsonsock_peer::{Listener, ListenerConfig};

use crate::cmd::listen::{send_or_drop, serve};
use crate::cmd::{install_ctrlc_handler, EchoArgs, RunContext};
use crate::exit::{endpoint_error, CliResult, SUCCESS};

pub fn run(args: EchoArgs, ctx: &RunContext) -> CliResult<i32> {
    let config = ListenerConfig {
        backlog: args.backlog,
        frame: ctx.frame.clone(),
    };
    let mut listener = Listener::bind_with_config(args.addr.as_str(), config)
        .map_err(|err| endpoint_error("bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    serve(&mut listener, &running, |listener, message| {
        tracing::info!(
            peer = ?listener.peer_addr(),
            size = message.to_string().len(),
            "echoing message"
        );
        send_or_drop(listener, &message)
    })?;

    Ok(SUCCESS)
}
