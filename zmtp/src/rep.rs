//! REP socket: strict reply pattern, one handshake per accepted client (§4.5).
//!
//! ## State machine (per accepted connection)
//!
//! ```text
//! AwaitingRequest → recv() → ReadyToReply → send() → AwaitingRequest
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use zmtp::rep::RepSocket;
//!
//! # fn main() -> zmtp_core::error::Result<()> {
//! let mut rep = RepSocket::bind("tcp://*:5555")?;
//! loop {
//!     let mut conn = rep.accept()?;
//!     let mut buf = [0u8; 4096];
//!     let n = conn.recv(&mut buf)?;
//!     conn.send(&buf[..n])?;
//! }
//! # }
//! ```

use std::net::TcpListener;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;
use zmtp_core::endpoint::Endpoint;
use zmtp_core::error::{Error, Result};
use zmtp_core::socket_type::SocketType;

use crate::config::Config;
use crate::connection::Connection;
use crate::context::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepState {
    AwaitingRequest,
    ReadyToReply,
}

/// A REP socket: binds and accepts one or more REQ (or compatible) peers.
pub struct RepSocket {
    listener: TcpListener,
    next_id: Arc<AtomicU64>,
    config: Config,
    context_id: u64,
}

impl RepSocket {
    /// `bind(endpoint)`, sized for REQ/REP's small ping-pong traffic
    /// (`Config::small`), under a fresh, unshared [`Context`].
    pub fn bind(endpoint: &str) -> Result<Self> {
        Self::bind_with(endpoint, Config::small(), &Context::new())
    }

    /// `bind(endpoint)` with an explicit buffer/harvest [`Config`], applied
    /// to every connection this socket accepts.
    pub fn bind_with_config(endpoint: &str, config: Config) -> Result<Self> {
        Self::bind_with(endpoint, config, &Context::new())
    }

    /// `socket_new(ctx, Rep)` then `bind(endpoint)` (§6): share an
    /// application's [`Context`] across every socket it opens.
    pub fn bind_with_context(endpoint: &str, ctx: &Context) -> Result<Self> {
        Self::bind_with(endpoint, Config::small(), ctx)
    }

    fn bind_with(endpoint: &str, config: Config, ctx: &Context) -> Result<Self> {
        let ep = Endpoint::from_str(endpoint).map_err(|e| Error::InvalidEndpoint(e.to_string()))?;
        let addr = ep.resolve_bind().map_err(|e| Error::InvalidEndpoint(e.to_string()))?;
        let listener = TcpListener::bind(addr)?;
        debug!(endpoint, context = ctx.id(), "REP bound");
        Ok(Self {
            listener,
            next_id: Arc::new(AtomicU64::new(1)),
            config,
            context_id: ctx.id(),
        })
    }

    /// `accept(sock)`: blocks for the next TCP client, runs the handshake
    /// as acceptor (§4.4), and returns a handle scoped to that one client.
    pub fn accept(&mut self) -> Result<RepConnection> {
        let (stream, peer_addr) = self.listener.accept()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let connection = Connection::handshake_as_acceptor(id, stream, SocketType::Rep, self.config, self.context_id)?;
        debug!(connection = id, %peer_addr, "REP accepted client");
        Ok(RepConnection {
            connection,
            state: RepState::AwaitingRequest,
        })
    }

    /// `socket_close(sock)`: stop accepting. Dropping the listener releases
    /// the bound port; already-accepted `RepConnection`s are unaffected.
    pub fn close(self) {
        debug!("REP socket closed");
    }
}

/// One accepted REQ client's request/reply cycle.
pub struct RepConnection {
    connection: Connection,
    state: RepState,
}

impl RepConnection {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.connection.id()
    }

    /// `recv(buf)` (§4.5, P6): concatenate frames until `MORE` clears.
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.state != RepState::AwaitingRequest {
            return Err(Error::InvalidOperation(
                "REP recv called before matching send".into(),
            ));
        }
        let n = self.connection.recv_concatenated(buf)?;
        self.state = RepState::ReadyToReply;
        Ok(n)
    }

    /// `send(data)` (§4.5): empty delimiter frame with `MORE`, then `data`.
    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        if self.state != RepState::ReadyToReply {
            return Err(Error::InvalidOperation(
                "REP send called before recv".into(),
            ));
        }
        self.connection.send_frame(&[], true)?;
        self.connection.send_frame(data, false)?;
        self.state = RepState::AwaitingRequest;
        Ok(())
    }
}
