#![forbid(unsafe_code)]
#![allow(dead_code)]

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tempfile::TempDir;

pub(crate) struct Server {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    storage: TempDir,
}

impl Server {
    pub(crate) fn start(role: &str) -> Self {
        let storage = tempfile::tempdir().expect("temp dir");
        Self::start_in(storage, role)
    }

    pub(crate) fn start_in(storage: TempDir, role: &str) -> Self {
        let mut child = spawn(storage.path(), role);
        let stdin = child.stdin.take().expect("stdin");
        let stdout = BufReader::new(child.stdout.take().expect("stdout"));
        Self {
            child,
            stdin,
            stdout,
            storage,
        }
    }

    pub(crate) fn start_initialized(role: &str) -> Self {
        let mut server = Self::start(role);
        server.initialize_default();
        server
    }

    pub(crate) fn send(&mut self, req: Value) {
        writeln!(self.stdin, "{req}").expect("write request");
        self.stdin.flush().expect("flush request");
    }

    pub(crate) fn send_raw(&mut self, line: &str) {
        writeln!(self.stdin, "{line}").expect("write request");
        self.stdin.flush().expect("flush request");
    }

    pub(crate) fn recv(&mut self) -> Value {
        let mut line = String::new();
        self.stdout.read_line(&mut line).expect("read response");
        assert!(!line.trim().is_empty(), "empty response line");
        serde_json::from_str(&line).expect("parse response json")
    }

    pub(crate) fn request(&mut self, req: Value) -> Value {
        self.send(req);
        self.recv()
    }

    pub(crate) fn initialize_default(&mut self) {
        let _ = self.request(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": { "protocolVersion": "2024-11-05", "capabilities": {}, "clientInfo": { "name": "test", "version": "0" } }
        }));
        self.send(json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized",
            "params": {}
        }));
    }

    /// Calls a tool and decodes the envelope carried in the text content.
    pub(crate) fn call(&mut self, id: u64, name: &str, arguments: Value) -> Value {
        let resp = self.request(json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        }));
        extract_tool_text(&resp)
    }

    /// Stops the process and hands back its storage for a restart.
    pub(crate) fn stop(mut self) -> TempDir {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let dir = tempfile::tempdir().expect("placeholder dir");
        std::mem::replace(&mut self.storage, dir)
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn spawn(storage_dir: &Path, role: &str) -> Child {
    Command::new(env!("CARGO_BIN_EXE_lf_api"))
        .arg("--storage-dir")
        .arg(storage_dir)
        .args(["--actor", "protocol-test", "--role", role])
        .env_remove("RUST_LOG")
        .env_remove("LOGFRAME_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn lf_api")
}

pub(crate) fn extract_tool_text(resp: &Value) -> Value {
    let text = resp
        .get("result")
        .and_then(|v| v.get("content"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|v| v.get("text"))
        .and_then(|v| v.as_str())
        .expect("result.content[0].text");
    serde_json::from_str(text).expect("tool text is json")
}
