//! Request and response envelopes carried inside frames.
//!
//! ```text
//! request:  { "req_id": "7", "<cmd field>": "step", "params": { ... } }
//! response: { "status": "ok" | "error", "req_id"?, "msg"?, "data"? }
//! ```
//!
//! Replies are parsed through `serde_json::Value` first so that a reply
//! which is valid JSON but not an envelope is reported as a protocol error
//! rather than an opaque decode failure.

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::CommandField;
use crate::error::SimError;
use crate::message::Command;
use crate::protocol::SlotData;

// ── Request ──────────────────────────────────────────────────────

/// An outgoing command envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Per-session increasing id, used for log correlation only.
    pub req_id: String,
    pub command: Command,
    pub params: Value,
}

impl Request {
    pub fn new(req_id: impl Into<String>, command: Command, params: &impl Serialize) -> Result<Self, SimError> {
        Ok(Self {
            req_id: req_id.into(),
            command,
            params: serde_json::to_value(params)?,
        })
    }

    /// Serialize to UTF-8 JSON using the deployment's command field name.
    pub fn to_bytes(&self, field: CommandField) -> Result<Bytes, SimError> {
        let mut envelope = Map::with_capacity(3);
        envelope.insert("req_id".into(), Value::String(self.req_id.clone()));
        envelope.insert(
            field.as_str().into(),
            Value::String(self.command.wire_name().into()),
        );
        envelope.insert("params".into(), self.params.clone());
        Ok(Bytes::from(serde_json::to_vec(&Value::Object(envelope))?))
    }
}

// ── Response ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

/// A decoded reply envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: Status,
    pub req_id: Option<String>,
    pub msg: Option<String>,
    pub data: Option<Value>,
}

impl Response {
    /// Parse a reply payload.
    ///
    /// Anything that is not a JSON object with a recognised `status` is a
    /// [`SimError::Protocol`].
    pub fn parse(payload: &[u8]) -> Result<Self, SimError> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| SimError::protocol(format!("reply is not JSON: {e}")))?;
        let Value::Object(mut map) = value else {
            return Err(SimError::protocol("reply is not a JSON object"));
        };

        let status = match map.get("status") {
            Some(Value::String(s)) if s == "ok" => Status::Ok,
            Some(Value::String(s)) if s == "error" => Status::Error,
            Some(other) => {
                return Err(SimError::protocol(format!("unknown status {other}")));
            }
            None => return Err(SimError::protocol("reply has no status field")),
        };

        // Some builds echo the id as a number.
        let req_id = match map.remove("req_id") {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let msg = match map.remove("msg") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        let data = map.remove("data").filter(|v| !v.is_null());

        Ok(Self {
            status,
            req_id,
            msg,
            data,
        })
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Turn a `status: "error"` reply into [`SimError::Rejected`].
    pub fn into_result(self, command: Command) -> Result<Self, SimError> {
        match self.status {
            Status::Ok => Ok(self),
            Status::Error => Err(SimError::Rejected {
                command: command.wire_name(),
                msg: self.msg.unwrap_or_else(|| "no message".into()),
            }),
        }
    }

    /// Interpret `data` as per-slot observations.
    ///
    /// A missing `data` field yields an empty map.
    pub fn slot_data(&self) -> Result<SlotData, SimError> {
        match &self.data {
            None => Ok(SlotData::new()),
            Some(value) => SlotData::deserialize_from(value),
        }
    }
}
