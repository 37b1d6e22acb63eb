// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// `tether` bound to `data_dir`, isolated from the caller's environment.
pub fn tether(data_dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("tether");
    cmd.arg("--data-dir").arg(data_dir).env_remove("TETHER_DATA_DIR").env_remove("RUST_LOG");
    cmd
}

/// Queue an operation and return its ID.
pub fn queue_add(data_dir: &Path, content: &str) -> String {
    let output = tether(data_dir).args(["queue", "add", content]).output().unwrap();
    assert!(output.status.success(), "queue add failed: {}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Run `tether ... -o json` and parse stdout.
pub fn json_output(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let output = tether(data_dir).args(args).args(["-o", "json"]).output().unwrap();
    assert!(output.status.success(), "command failed: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Write `config.toml` into `data_dir`.
pub fn write_config(data_dir: &Path, content: &str) {
    std::fs::write(data_dir.join("config.toml"), content).unwrap();
}

/// A request seen by [`Backend`].
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }
}

/// Minimal HTTP backend: answers `GET` with 200 and `POST` with a fixed
/// status, one request per connection.
pub struct Backend {
    pub url: String,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl Backend {
    pub fn start(post_status: u16) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                handle(stream, post_status, &seen);
            }
        });

        Backend { url, requests }
    }

    /// POSTed requests, in arrival order.
    pub fn posts(&self) -> Vec<Request> {
        self.requests.lock().unwrap().iter().filter(|r| r.method == "POST").cloned().collect()
    }
}

fn handle(stream: TcpStream, post_status: u16, seen: &Mutex<Vec<Request>>) -> Option<()> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let length: usize = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).ok()?;

    let status = if method == "POST" { post_status } else { 200 };
    let body = String::from_utf8_lossy(&body).into_owned();
    // Recorded before replying so the client never outruns the log
    seen.lock().unwrap().push(Request { method, path, headers, body });

    let reply = if status == 200 { "" } else { "invalid operation" };
    let response = format!(
        "HTTP/1.1 {} STATUS\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reply.len(),
        reply
    );
    let mut stream = stream;
    stream.write_all(response.as_bytes()).ok()
}

/// A local URL nothing listens on.
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    url
}
