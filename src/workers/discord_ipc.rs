//! Minimal Discord rich-presence client over the local IPC socket.
//!
//! Frames are `opcode: u32 LE`, `length: u32 LE`, then `length` bytes of
//! JSON. The client sends a handshake, waits for the READY dispatch, then
//! sends `SET_ACTIVITY` commands.

use std::io::{Read, Write};
use std::time::Duration;

use serde_json::{Value, json};

use crate::error::{Error, Result};

const OP_HANDSHAKE: u32 = 0;
const OP_FRAME: u32 = 1;
const OP_CLOSE: u32 = 2;

/// Refuse absurd frames from a misbehaving peer.
const MAX_FRAME: u32 = 1 << 20;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Activity {
    /// First line, usually the track title.
    pub details: String,
    /// Second line, usually the artist.
    pub state: String,
    pub large_text: Option<String>,
    /// Asset key or image URL.
    pub large_image: Option<String>,
    /// Unix seconds the track started, for the elapsed counter.
    pub started_at: Option<i64>,
}

impl Activity {
    pub fn to_json(&self) -> Value {
        let mut activity = json!({
            "details": truncate(&self.details),
            "state": truncate(&self.state),
        });
        if self.large_image.is_some() || self.large_text.is_some() {
            let mut assets = serde_json::Map::new();
            if let Some(img) = &self.large_image {
                assets.insert("large_image".into(), json!(img));
            }
            if let Some(text) = &self.large_text {
                assets.insert("large_text".into(), json!(truncate(text)));
            }
            activity["assets"] = Value::Object(assets);
        }
        if let Some(start) = self.started_at {
            activity["timestamps"] = json!({ "start": start });
        }
        activity
    }
}

/// Discord rejects fields outside 2..=128 characters.
fn truncate(s: &str) -> String {
    let mut out: String = s.chars().take(128).collect();
    while out.chars().count() < 2 {
        out.push(' ');
    }
    out
}

pub fn encode_frame(op: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + payload.len());
    buf.extend_from_slice(&op.to_le_bytes());
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(payload);
    buf
}

pub struct DiscordIpc<S> {
    stream: S,
    nonce: u64,
}

#[cfg(unix)]
impl DiscordIpc<std::os::unix::net::UnixStream> {
    /// Connect to the first available `discord-ipc-N` socket and handshake.
    pub fn connect(client_id: &str, timeout: Duration) -> Result<Self> {
        use std::os::unix::net::UnixStream;

        let mut last_err = None;
        for path in socket_candidates() {
            match UnixStream::connect(&path) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    return Self::handshake(stream, client_id);
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.map_or_else(|| Error::Ipc("no discord socket found".into()), Error::from))
    }
}

#[cfg(not(unix))]
impl DiscordIpc<std::net::TcpStream> {
    pub fn connect(_client_id: &str, _timeout: Duration) -> Result<Self> {
        Err(Error::Ipc("discord ipc is only supported on unix".into()))
    }
}

#[cfg(unix)]
fn socket_candidates() -> Vec<std::path::PathBuf> {
    let mut dirs = Vec::new();
    for var in ["XDG_RUNTIME_DIR", "TMPDIR", "TMP", "TEMP"] {
        if let Some(v) = std::env::var_os(var).filter(|v| !v.is_empty()) {
            dirs.push(std::path::PathBuf::from(v));
        }
    }
    dirs.push("/tmp".into());

    let mut out = Vec::new();
    for dir in dirs {
        for sub in ["", "app/com.discordapp.Discord", "snap.discord"] {
            for n in 0..10 {
                out.push(dir.join(sub).join(format!("discord-ipc-{n}")));
            }
        }
    }
    out
}

impl<S: Read + Write> DiscordIpc<S> {
    /// Send the handshake on an already open stream and wait for READY.
    pub fn handshake(stream: S, client_id: &str) -> Result<Self> {
        let mut ipc = Self { stream, nonce: 0 };
        ipc.send(OP_HANDSHAKE, &json!({ "v": 1, "client_id": client_id }))?;
        let (op, body) = ipc.recv()?;
        match op {
            OP_FRAME if body["evt"] == "READY" => Ok(ipc),
            OP_CLOSE => Err(Error::Ipc(format!(
                "handshake rejected: {}",
                body["message"].as_str().unwrap_or("closed")
            ))),
            _ => Err(Error::Ipc(format!("unexpected handshake reply {op}: {body}"))),
        }
    }

    /// Show `activity`, or clear the presence with `None`.
    pub fn set_activity(&mut self, activity: Option<&Activity>) -> Result<()> {
        self.nonce += 1;
        let payload = json!({
            "cmd": "SET_ACTIVITY",
            "args": {
                "pid": std::process::id(),
                "activity": activity.map(Activity::to_json),
            },
            "nonce": self.nonce.to_string(),
        });
        self.send(OP_FRAME, &payload)?;
        let (op, body) = self.recv()?;
        if op == OP_CLOSE || body["evt"] == "ERROR" {
            return Err(Error::Ipc(format!("SET_ACTIVITY failed: {body}")));
        }
        Ok(())
    }

    fn send(&mut self, op: u32, payload: &Value) -> Result<()> {
        let body = serde_json::to_vec(payload).map_err(|e| Error::Ipc(e.to_string()))?;
        self.stream.write_all(&encode_frame(op, &body))?;
        self.stream.flush()?;
        Ok(())
    }

    fn recv(&mut self) -> Result<(u32, Value)> {
        let mut header = [0u8; 8];
        self.stream.read_exact(&mut header)?;
        let op = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if len > MAX_FRAME {
            return Err(Error::Ipc(format!("frame too large ({len} bytes)")));
        }
        let mut body = vec![0u8; len as usize];
        self.stream.read_exact(&mut body)?;
        let value = serde_json::from_slice(&body).map_err(|e| Error::Ipc(e.to_string()))?;
        Ok((op, value))
    }
}
