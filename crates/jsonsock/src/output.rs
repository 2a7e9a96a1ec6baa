use std::io::{IsTerminal, Write};
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use jsonsock_frame::Endianness;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    peer: String,
    endianness: &'static str,
    payload_size: usize,
    message: &'a Value,
    timestamp: String,
}

pub fn print_message(
    message: &Value,
    peer: Option<SocketAddr>,
    endianness: Endianness,
    format: OutputFormat,
) {
    let compact = message.to_string();
    let peer = peer
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                peer,
                endianness: endianness.as_str(),
                payload_size: compact.len(),
                message,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PEER", "SIZE", "MESSAGE"])
                .add_row(vec![peer, compact.len().to_string(), compact]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let body = serde_json::to_string_pretty(message).unwrap_or(compact);
            println!("# from {peer}\n{body}");
        }
        OutputFormat::Raw => {
            print_raw(compact.as_bytes());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.write_all(b"\n");
    let _ = out.flush();
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
