//! Minimal echo server: accepts one peer at a time and sends every message back.
//!
//! Run with:
//!   cargo run --example echo-server -- 127.0.0.1:9000
//!
//! In another terminal:
//!   cargo run --features cli -- send 127.0.0.1:9000 \
//!     --json '{"hello":"world"}' --wait --wait-timeout 3

use jsonsock::peer::{ErrorKind, Listener};
use serde_json::Value;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:9000".to_string());

    let mut listener = Listener::bind(addr.as_str())?;
    eprintln!("Listening on {}", listener.local_addr());

    loop {
        listener.accept()?;
        eprintln!("Peer connected: {:?}", listener.peer_addr());

        loop {
            match listener.recv::<Value>() {
                Ok(message) => {
                    eprintln!("Echoing {message}");
                    listener.send(&message)?;
                }
                Err(err) if err.kind() == ErrorKind::Deserialization => {
                    eprintln!("Skipping malformed message: {err}");
                }
                Err(err) => {
                    eprintln!("Peer gone: {err}");
                    break;
                }
            }
        }
    }
}
