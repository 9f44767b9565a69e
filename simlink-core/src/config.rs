//! Session and wire-format configuration.
//!
//! Simulator builds disagree on the length-prefix byte order and on the
//! name of the command field. Both are explicit settings here with a
//! canonical default (big-endian prefix, `cmd` field) so a deployment
//! states which dialect its server speaks instead of guessing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Byte order of the 4-byte frame length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Network byte order. Canonical.
    #[default]
    Big,
    /// Little-endian, as spoken by some simulator builds.
    Little,
}

impl ByteOrder {
    pub fn write_len(self, len: u32) -> [u8; 4] {
        match self {
            ByteOrder::Big => len.to_be_bytes(),
            ByteOrder::Little => len.to_le_bytes(),
        }
    }

    pub fn read_len(self, bytes: [u8; 4]) -> u32 {
        match self {
            ByteOrder::Big => u32::from_be_bytes(bytes),
            ByteOrder::Little => u32::from_le_bytes(bytes),
        }
    }
}

/// Name of the JSON field that carries the command in a request envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandField {
    #[default]
    Cmd,
    CmdType,
}

impl CommandField {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandField::Cmd => "cmd",
            CommandField::CmdType => "cmd_type",
        }
    }
}

/// Wire dialect spoken on the command channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WireFormat {
    pub length_prefix: ByteOrder,
    pub command_field: CommandField,
}

/// Connection and lifecycle settings for one simulator session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Simulator host.
    pub host: String,
    /// Simulator command port.
    pub port: u16,
    /// Scenario name passed to `init`.
    pub scenario: String,
    /// Number of environment instances requested by `init`.
    pub count: u32,
    /// Environment ids addressed by `reset` and `close`.
    pub env_ids: Vec<u32>,
    /// Per-reply read timeout in milliseconds. 0 waits forever.
    pub read_timeout_ms: u64,
    /// Readiness deadline in milliseconds.
    pub ready_timeout_ms: u64,
    /// Delay between readiness probes in milliseconds.
    pub poll_interval_ms: u64,
    /// Wire dialect.
    pub wire: WireFormat,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8888,
            scenario: "testWzz".into(),
            count: 1,
            env_ids: vec![0],
            read_timeout_ms: 30_000,
            ready_timeout_ms: 10_000,
            poll_interval_ms: 500,
            wire: WireFormat::default(),
        }
    }
}

impl SessionConfig {
    /// `host:port` string suitable for `TcpStream::connect`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_wire_defaults() {
        let wire = WireFormat::default();
        assert_eq!(wire.length_prefix, ByteOrder::Big);
        assert_eq!(wire.command_field.as_str(), "cmd");
    }

    #[test]
    fn byte_order_is_symmetric() {
        for order in [ByteOrder::Big, ByteOrder::Little] {
            assert_eq!(order.read_len(order.write_len(0x0102_0304)), 0x0102_0304);
        }
        assert_eq!(ByteOrder::Big.write_len(1), [0, 0, 0, 1]);
        assert_eq!(ByteOrder::Little.write_len(1), [1, 0, 0, 0]);
    }

    #[test]
    fn zero_read_timeout_means_none() {
        let cfg = SessionConfig {
            read_timeout_ms: 0,
            ..Default::default()
        };
        assert!(cfg.read_timeout().is_none());
        assert_eq!(SessionConfig::default().address(), "127.0.0.1:8888");
    }

    #[test]
    fn wire_format_deserializes_from_snake_case() {
        let wire: WireFormat =
            serde_json::from_str(r#"{"length_prefix":"little","command_field":"cmd_type"}"#)
                .unwrap();
        assert_eq!(wire.length_prefix, ByteOrder::Little);
        assert_eq!(wire.command_field, CommandField::CmdType);
    }
}
