//! REQ socket: strict request-reply with enforced alternation (§4.5).
//!
//! ## State machine
//!
//! ```text
//! Idle → send() → AwaitingReply → recv() → Idle
//! ```
//!
//! Calling `send` twice without an intervening `recv` returns
//! `invalid_operation`; this implementation enforces the alternation itself
//! rather than leaving it to the peer.
//!
//! ## Example
//!
//! ```rust,no_run
//! use zmtp::req::ReqSocket;
//!
//! # fn main() -> zmtp_core::error::Result<()> {
//! let mut req = ReqSocket::connect("tcp://127.0.0.1:5555")?;
//! req.send(b"Hello")?;
//! let mut buf = [0u8; 256];
//! let n = req.recv(&mut buf)?;
//! println!("{}", String::from_utf8_lossy(&buf[..n]));
//! # Ok(())
//! # }
//! ```

use std::net::TcpStream;
use std::str::FromStr;

use tracing::debug;
use zmtp_core::endpoint::Endpoint;
use zmtp_core::error::{Error, Result};
use zmtp_core::socket_type::SocketType;

use crate::config::Config;
use crate::connection::Connection;
use crate::context::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReqState {
    Idle,
    AwaitingReply,
}

/// A REQ socket: connects to exactly one REP (or compatible) peer.
pub struct ReqSocket {
    connection: Connection,
    state: ReqState,
}

impl ReqSocket {
    /// `connect(endpoint)`: dial the peer and run the handshake (§4.4),
    /// sized for REQ/REP's small ping-pong traffic (`Config::small`), under
    /// a fresh, unshared [`Context`].
    pub fn connect(endpoint: &str) -> Result<Self> {
        Self::connect_with(endpoint, Config::small(), &Context::new())
    }

    /// `connect(endpoint)` with an explicit buffer/harvest [`Config`].
    pub fn connect_with_config(endpoint: &str, config: Config) -> Result<Self> {
        Self::connect_with(endpoint, config, &Context::new())
    }

    /// `socket_new(ctx, Req)` then `connect(endpoint)` (§6): share an
    /// application's [`Context`] across every socket it opens.
    pub fn connect_with_context(endpoint: &str, ctx: &Context) -> Result<Self> {
        Self::connect_with(endpoint, Config::small(), ctx)
    }

    fn connect_with(endpoint: &str, config: Config, ctx: &Context) -> Result<Self> {
        let ep = Endpoint::from_str(endpoint).map_err(|e| Error::InvalidEndpoint(e.to_string()))?;
        let addr = ep.resolve_connect().map_err(|e| Error::InvalidEndpoint(e.to_string()))?;
        let stream = TcpStream::connect(addr)?;
        let connection = Connection::handshake_as_initiator(0, stream, SocketType::Req, config, ctx.id())?;
        debug!(endpoint, context = ctx.id(), "REQ connected");
        Ok(Self {
            connection,
            state: ReqState::Idle,
        })
    }

    /// `send(data)` (§4.5): empty delimiter frame with `MORE`, then `data`
    /// with `MORE` clear (P5).
    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        if self.state != ReqState::Idle {
            return Err(Error::InvalidOperation(
                "REQ send called before matching recv".into(),
            ));
        }
        self.connection.send_frame(&[], true)?;
        self.connection.send_frame(data, false)?;
        self.state = ReqState::AwaitingReply;
        Ok(())
    }

    /// `recv(buf)` (§4.5): concatenates frames until `MORE` clears.
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.state != ReqState::AwaitingReply {
            return Err(Error::InvalidOperation(
                "REQ recv called before send".into(),
            ));
        }
        let n = self.connection.recv_concatenated(buf)?;
        self.state = ReqState::Idle;
        Ok(n)
    }

    /// `socket_close(sock)`: tear down the connection. Dropping the
    /// underlying stream closes the TCP association.
    pub fn close(self) {
        debug!(connection = self.connection.id(), "REQ socket closed");
    }
}
