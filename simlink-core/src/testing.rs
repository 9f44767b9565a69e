//! Scripted in-memory simulator for tests.
//!
//! [`FakeSimulator::spawn`] returns the client end of a `tokio::io::duplex`
//! pipe and a join handle. A background task decodes each request frame,
//! hands `(command, params)` to the script, and writes back whatever
//! [`Reply`] the script returns. The handle resolves to every request seen
//! once the client side hangs up.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::io::DuplexStream;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

use crate::codec::FrameCodec;
use crate::config::WireFormat;
use crate::protocol::{PlatformObservation, SlotData};

/// What the fake simulator does with one request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Send this JSON value as the reply payload.
    Json(Value),
    /// Send these raw bytes as the reply payload.
    Raw(Vec<u8>),
    /// Send only part of a frame header, then close.
    Truncate,
    /// Close the connection without replying.
    Hangup,
    /// Keep the connection open and never reply.
    Silent,
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Json(json!({"status": "ok"}))
    }

    pub fn error(msg: &str) -> Self {
        Reply::Json(json!({"status": "error", "msg": msg}))
    }

    /// An `ok` reply carrying one slot `"0"` with the given platforms.
    pub fn platforms(sim_time: f64, platforms: Vec<PlatformObservation>) -> Self {
        let mut data = SlotData::new();
        data.insert(
            "0",
            crate::protocol::EnvObservation {
                sim_time,
                platforms,
            },
        );
        Reply::Json(json!({"status": "ok", "data": data}))
    }
}

/// Builder for a scripted fake simulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeSimulator {
    wire: WireFormat,
}

impl FakeSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wire(wire: WireFormat) -> Self {
        Self { wire }
    }

    /// Start serving the script on a fresh in-memory pipe.
    pub fn spawn<F>(self, mut script: F) -> (DuplexStream, JoinHandle<Vec<Value>>)
    where
        F: FnMut(&str, &Value) -> Reply + Send + 'static,
    {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let field = self.wire.command_field.as_str();
        let order = self.wire.length_prefix;

        let handle = tokio::spawn(async move {
            let mut framed = Framed::new(server, FrameCodec::new(order));
            let mut seen = Vec::new();

            while let Some(Ok(frame)) = framed.next().await {
                let request: Value = serde_json::from_slice(&frame).unwrap_or(Value::Null);
                let command = request[field].as_str().unwrap_or_default().to_string();
                let reply = script(&command, &request["params"]);
                seen.push(request);

                match reply {
                    Reply::Json(value) => {
                        let body = serde_json::to_vec(&value).unwrap_or_default();
                        if framed.send(Bytes::from(body)).await.is_err() {
                            break;
                        }
                    }
                    Reply::Raw(body) => {
                        if framed.send(Bytes::from(body)).await.is_err() {
                            break;
                        }
                    }
                    Reply::Truncate => {
                        use tokio::io::AsyncWriteExt;
                        let _ = framed.get_mut().write_all(&[0, 0]).await;
                        break;
                    }
                    Reply::Hangup => break,
                    Reply::Silent => {}
                }
            }
            seen
        });

        (client, handle)
    }
}
