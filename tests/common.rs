//! Test utilities & fixtures.
//!
//! Provides a canned Gopher server bound to an ephemeral localhost port so
//! integration tests can exercise real fetches without touching the network.
#![allow(dead_code)] // Each test binary uses its own subset of these helpers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// A fixture Gopher server: maps wire selectors to canned response bodies
/// and records every selector it is asked for.
pub struct FixtureServer {
    pub port: u16,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FixtureServer {
    /// Bind an ephemeral port, then build the selector->response map with
    /// the port number (menus need it to point items back at the fixture).
    pub async fn start<F>(build: F) -> Self
    where
        F: FnOnce(u16) -> HashMap<String, String>,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let responses = Arc::new(build(port));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let request_log = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let responses = responses.clone();
                let request_log = request_log.clone();
                tokio::spawn(async move {
                    let mut reader = BufReader::new(stream);
                    let mut line = String::new();
                    if reader.read_line(&mut line).await.is_ok() {
                        let selector = line.trim_end_matches(['\r', '\n']).to_string();
                        request_log.lock().unwrap().push(selector.clone());
                        let body = responses.get(&selector).cloned().unwrap_or_else(|| {
                            "3nothing here\t\terror.host\t70\r\n.\r\n".to_string()
                        });
                        let mut stream = reader.into_inner();
                        let _ = stream.write_all(body.as_bytes()).await;
                        let _ = stream.shutdown().await;
                    }
                });
            }
        });

        Self { port, requests }
    }

    /// Absolute gopher URL for a path on this fixture (e.g. `/1/` or `/0/docs`).
    pub fn url(&self, path: &str) -> String {
        format!("gopher://127.0.0.1:{}{}", self.port, path)
    }

    /// Every wire selector received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// One menu line pointing back at the fixture server.
pub fn menu_line(port: u16, type_char: char, display: &str, selector: &str) -> String {
    format!("{type_char}{display}\t{selector}\t127.0.0.1\t{port}\r\n")
}

/// An info line (no usable selector/host, as real servers emit them).
pub fn info_line(text: &str) -> String {
    format!("i{text}\t\tnull.host\t1\r\n")
}

/// Assemble menu lines into a response body with the `.` terminator.
pub fn menu_body(lines: &[String]) -> String {
    let mut body = lines.concat();
    body.push_str(".\r\n");
    body
}
