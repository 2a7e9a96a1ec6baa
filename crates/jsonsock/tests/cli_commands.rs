#![cfg(feature = "cli")]

use std::net::{SocketAddr, TcpListener};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use jsonsock_peer::Connector;
use serde_json::{json, Value};

fn free_addr() -> SocketAddr {
    let probe = TcpListener::bind("127.0.0.1:0").expect("probe bind should succeed");
    probe.local_addr().expect("probe should have an address")
}

fn jsonsock() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_jsonsock"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn spawn_server(subcommand: &str, addr: SocketAddr, extra: &[&str]) -> Child {
    jsonsock()
        .arg("--format")
        .arg("json")
        .arg(subcommand)
        .arg(addr.to_string())
        .args(extra)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("server command should start")
}

fn wait_for_connect(addr: SocketAddr, timeout: Duration) -> Connector {
    let start = Instant::now();
    loop {
        match Connector::connect_to(addr) {
            Ok(connector) => return connector,
            Err(err) => {
                if start.elapsed() >= timeout {
                    panic!("connect timeout: {err}");
                }
                thread::sleep(Duration::from_millis(25));
            }
        }
    }
}

fn stop(mut child: Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn echo_server_returns_each_message() {
    let addr = free_addr();
    let child = spawn_server("echo", addr, &[]);

    let mut connector = wait_for_connect(addr, Duration::from_secs(5));
    let person = json!({ "name": "Daisy", "age": 24 });
    connector.send(&person).expect("send should succeed");
    let echoed: Value = connector.recv().expect("echo should arrive");
    assert_eq!(echoed, person);

    connector.send(&json!([1, 2, 3])).expect("second send should succeed");
    let echoed: Value = connector.recv().expect("second echo should arrive");
    assert_eq!(echoed, json!([1, 2, 3]));

    connector.close();
    stop(child);
}

#[test]
fn listen_prints_message_and_sends_reply() {
    let addr = free_addr();
    let child = spawn_server(
        "listen",
        addr,
        &["--count", "1", "--reply", r#"{"status":"ok"}"#],
    );

    let mut connector = wait_for_connect(addr, Duration::from_secs(5));
    connector
        .send(&json!({ "name": "Daisy", "age": 24 }))
        .expect("send should succeed");
    let reply: Value = connector.recv().expect("reply should arrive");
    assert_eq!(reply, json!({ "status": "ok" }));
    connector.close();

    let output = child.wait_with_output().expect("listen should exit");
    assert!(output.status.success(), "listen failed: {output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next().expect("one output line");
    let record: Value = serde_json::from_str(line).expect("output should be JSON");
    assert_eq!(record["message"]["name"], "Daisy");
    assert_eq!(record["endianness"], "big-endian");
}

#[test]
fn send_wait_prints_reply_from_echo_server() {
    let addr = free_addr();
    let child = spawn_server("echo", addr, &[]);
    wait_for_connect(addr, Duration::from_secs(5)).close();

    let output = jsonsock()
        .arg("--format")
        .arg("json")
        .arg("send")
        .arg(addr.to_string())
        .arg("--json")
        .arg(r#"{"hello":"world"}"#)
        .arg("--wait")
        .arg("--wait-timeout")
        .arg("3s")
        .output()
        .expect("send should run");
    stop(child);

    assert!(output.status.success(), "send failed: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let record: Value = serde_json::from_str(stdout.trim()).expect("output should be JSON");
    assert_eq!(record["message"], json!({ "hello": "world" }));
}

#[test]
fn little_endian_flag_is_honored_end_to_end() {
    let addr = free_addr();
    let child = spawn_server("echo", addr, &["--little-endian"]);
    wait_for_connect(addr, Duration::from_secs(5)).close();

    let output = jsonsock()
        .arg("--format")
        .arg("raw")
        .arg("--little-endian")
        .arg("send")
        .arg(addr.to_string())
        .arg("--json")
        .arg("[true,null]")
        .arg("--wait")
        .output()
        .expect("send should run");
    stop(child);

    assert!(output.status.success(), "send failed: {output:?}");
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "[true,null]");
}

#[test]
fn send_to_closed_port_fails() {
    let addr = free_addr();
    let output = jsonsock()
        .arg("send")
        .arg(addr.to_string())
        .arg("--json")
        .arg("{}")
        .arg("--wait-timeout")
        .arg("1s")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("connect failed"));
}

#[test]
fn send_rejects_invalid_json_argument() {
    let output = jsonsock()
        .arg("send")
        .arg("127.0.0.1:1")
        .arg("--json")
        .arg("{broken")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_reports_package_version() {
    let output = jsonsock()
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("jsonsock {}", env!("CARGO_PKG_VERSION"))
    );
}
