use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jsonsock_frame::FrameError;
use jsonsock_peer::{EndpointError, ErrorKind, Listener, ListenerConfig};
use serde_json::Value;

use crate::cmd::{install_ctrlc_handler, parse_json_arg, ListenArgs, RunContext};
use crate::exit::{endpoint_error, CliResult, SUCCESS};
use crate::output::print_message;

/// What the serve loop does after handling one message.
pub(crate) enum Flow {
    Continue,
    NextPeer,
    Stop,
}

enum RecvErrorDisposition {
    NextPeer(EndpointError),
    Skip(EndpointError),
    Fatal(EndpointError),
}

pub fn run(args: ListenArgs, ctx: &RunContext) -> CliResult<i32> {
    let reply = args
        .reply
        .as_deref()
        .map(|text| parse_json_arg("--reply", text))
        .transpose()?;

    let config = ListenerConfig {
        backlog: args.backlog,
        frame: ctx.frame.clone(),
    };
    let mut listener = Listener::bind_with_config(args.addr.as_str(), config)
        .map_err(|err| endpoint_error("bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    serve(&mut listener, &running, |listener, message| {
        print_message(&message, listener.peer_addr(), ctx.frame.endianness, ctx.format);
        printed = printed.saturating_add(1);

        if let Some(reply) = &reply {
            if let Flow::NextPeer = send_or_drop(listener, reply)? {
                return Ok(Flow::NextPeer);
            }
        }

        match args.count {
            Some(count) if printed >= count => Ok(Flow::Stop),
            _ => Ok(Flow::Continue),
        }
    })?;

    Ok(SUCCESS)
}

/// Accept peers one at a time and feed every received message to `on_message`.
pub(crate) fn serve<F>(
    listener: &mut Listener,
    running: &AtomicBool,
    mut on_message: F,
) -> CliResult<()>
where
    F: FnMut(&mut Listener, Value) -> CliResult<Flow>,
{
    while running.load(Ordering::SeqCst) {
        listener
            .accept()
            .map_err(|err| endpoint_error("accept failed", err))?;
        tracing::info!(peer = ?listener.peer_addr(), "peer connected");

        while running.load(Ordering::SeqCst) {
            let message = match listener.recv::<Value>() {
                Ok(message) => message,
                Err(err) => match classify_recv_error(err) {
                    RecvErrorDisposition::NextPeer(err) => {
                        tracing::info!(reason = %err, "peer finished");
                        break;
                    }
                    RecvErrorDisposition::Skip(err) => {
                        tracing::warn!(error = %err, "skipping malformed message");
                        continue;
                    }
                    RecvErrorDisposition::Fatal(err) => {
                        return Err(endpoint_error("receive failed", err));
                    }
                },
            };

            match on_message(listener, message)? {
                Flow::Continue => {}
                Flow::NextPeer => break,
                Flow::Stop => return Ok(()),
            }
        }

        listener.disconnect();
    }

    Ok(())
}

/// Send to the active peer; a broken connection ends that peer, not the server.
/// An oversized message never reaches the wire, so it fails the command instead.
pub(crate) fn send_or_drop(listener: &mut Listener, value: &Value) -> CliResult<Flow> {
    match listener.send(value) {
        Ok(()) => Ok(Flow::Continue),
        Err(err @ EndpointError::Frame(FrameError::PayloadTooLarge { .. })) => {
            Err(endpoint_error("send failed", err))
        }
        Err(err) if err.kind() == ErrorKind::Transport => {
            tracing::warn!(error = %err, "send failed; dropping peer");
            Ok(Flow::NextPeer)
        }
        Err(err) => Err(endpoint_error("send failed", err)),
    }
}

fn classify_recv_error(err: EndpointError) -> RecvErrorDisposition {
    match err.kind() {
        ErrorKind::Deserialization => RecvErrorDisposition::Skip(err),
        ErrorKind::Transport => RecvErrorDisposition::NextPeer(err),
        _ => RecvErrorDisposition::Fatal(err),
    }
}
