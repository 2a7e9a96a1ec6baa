//! One request and one reply between two endpoints in the same process.
//!
//! Run with:
//!   cargo run --example request-reply

use std::thread;

use jsonsock::peer::{Connector, Listener};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Serialize, Deserialize)]
struct Person {
    name: String,
    age: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut listener = Listener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr();

    let client = thread::spawn(move || -> jsonsock::peer::Result<Value> {
        let mut connector = Connector::connect_to(addr)?;
        connector.send(&Person {
            name: "Daisy".to_string(),
            age: 24,
        })?;
        let reply = connector.recv()?;
        connector.close();
        Ok(reply)
    });

    let person: Person = listener.accept()?.recv()?;
    println!("listener received {person:?}");
    listener.send(&json!({ "status": "ok" }))?;

    let reply = client.join().map_err(|_| "client thread panicked")??;
    println!("connector received {reply}");

    listener.close();
    Ok(())
}
