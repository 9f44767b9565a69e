//! Request/response channel over a framed transport.
//!
//! A [`Channel`] owns the transport and allows exactly one request in
//! flight: `call` writes one frame and then waits for exactly one reply
//! frame. `call` takes `&mut self`, so overlapping calls on one channel do
//! not compile.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::codec::FrameCodec;
use crate::config::WireFormat;
use crate::envelope::{Request, Response};
use crate::error::SimError;
use crate::message::Command;

/// Single-request-in-flight command channel.
#[derive(Debug)]
pub struct Channel<T> {
    framed: Framed<T, FrameCodec>,
    wire: WireFormat,
    /// Last issued request id. Ids start at 1.
    last_id: u64,
    /// Id of a request whose reply has not been read yet.
    in_flight: Option<String>,
    read_timeout: Option<Duration>,
}

impl<T> Channel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(transport: T, wire: WireFormat) -> Self {
        Self {
            framed: Framed::new(transport, FrameCodec::new(wire.length_prefix)),
            wire,
            last_id: 0,
            in_flight: None,
            read_timeout: None,
        }
    }

    /// Bound each reply wait. `None` waits forever.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Number of requests issued so far.
    pub fn requests_sent(&self) -> u64 {
        self.last_id
    }

    /// Send one command and wait for its reply.
    ///
    /// Transport failures come back as fatal errors (see
    /// [`SimError::is_fatal`]); an undecodable reply is a non-fatal
    /// [`SimError::Protocol`] and the channel stays usable. A reply with
    /// `status: "error"` is returned as-is for the caller to judge.
    pub async fn call(
        &mut self,
        command: Command,
        params: &impl Serialize,
    ) -> Result<Response, SimError> {
        if let Some(stale) = &self.in_flight {
            return Err(SimError::Desynchronized(stale.clone()));
        }

        let req_id = (self.last_id + 1).to_string();
        let request = Request::new(req_id, command, params)?;
        let payload = request.to_bytes(self.wire.command_field)?;
        self.last_id += 1;

        debug!(req_id = %request.req_id, %command, bytes = payload.len(), "sending request");
        self.in_flight = Some(request.req_id.clone());
        self.framed.send(payload).await?;

        let frame = match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, self.framed.next())
                .await
                .map_err(|_| SimError::ReadTimeout(limit))?,
            None => self.framed.next().await,
        };
        let frame = frame.ok_or(SimError::ConnectionClosed)??;
        self.in_flight = None;

        let response = Response::parse(&frame)?;
        if let Some(echoed) = response.req_id.as_deref() {
            if echoed != request.req_id {
                warn!(req_id = %request.req_id, echoed, %command, "reply carries a different req_id");
            }
        }
        debug!(req_id = %request.req_id, %command, status = ?response.status, "reply received");
        Ok(response)
    }

    /// Flush and shut down the write half of the transport.
    pub async fn shutdown(&mut self) -> std::io::Result<()> {
        self.framed.get_mut().shutdown().await
    }
}
