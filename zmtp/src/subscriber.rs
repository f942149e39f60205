//! SUB socket: subscribe/unsubscribe plus plain message receive (§4.5).
//!
//! Per the source's asymmetry (§9, open question iii), a SUB connection is
//! never switched to non-blocking mode — only PUB-side accepted connections
//! are. Subscription writes from this socket are therefore ordinary
//! blocking sends.
//!
//! ## Example
//!
//! ```rust,no_run
//! use zmtp::subscriber::SubSocket;
//!
//! # fn main() -> zmtp_core::error::Result<()> {
//! let mut sub = SubSocket::connect("tcp://127.0.0.1:5555")?;
//! sub.subscribe(b"weather")?;
//! let mut buf = [0u8; 256];
//! let n = sub.recv(&mut buf)?;
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

const SUBSCRIBE_MARKER: u8 = 0x01;
const CANCEL_MARKER: u8 = 0x00;

/// A SUB socket: connects to one PUB (or compatible) peer.
pub struct SubSocket {
    connection: Connection,
}

impl SubSocket {
    /// `connect(endpoint)`, sized for PUB/SUB's larger fan-out payloads
    /// (`Config::large`), under a fresh, unshared [`Context`].
    pub fn connect(endpoint: &str) -> Result<Self> {
        Self::connect_with(endpoint, Config::large(), &Context::new())
    }

    /// `connect(endpoint)` with an explicit buffer/harvest [`Config`].
    pub fn connect_with_config(endpoint: &str, config: Config) -> Result<Self> {
        Self::connect_with(endpoint, config, &Context::new())
    }

    /// `socket_new(ctx, Sub)` then `connect(endpoint)` (§6): share an
    /// application's [`Context`] across every socket it opens.
    pub fn connect_with_context(endpoint: &str, ctx: &Context) -> Result<Self> {
        Self::connect_with(endpoint, Config::large(), ctx)
    }

    fn connect_with(endpoint: &str, config: Config, ctx: &Context) -> Result<Self> {
        let ep = Endpoint::from_str(endpoint).map_err(|e| Error::InvalidEndpoint(e.to_string()))?;
        let addr = ep.resolve_connect().map_err(|e| Error::InvalidEndpoint(e.to_string()))?;
        let stream = TcpStream::connect(addr)?;
        let connection = Connection::handshake_as_initiator(0, stream, SocketType::Sub, config, ctx.id())?;
        debug!(endpoint, context = ctx.id(), "SUB connected");
        Ok(Self { connection })
    }

    /// `subscribe(sock, topic)`: writes `0x01 || topic` (§4.5, §6). An
    /// empty topic subscribes to everything.
    pub fn subscribe(&mut self, topic: &[u8]) -> Result<()> {
        self.write_marked(SUBSCRIBE_MARKER, topic)
    }

    /// `unsubscribe(sock, topic)`: writes `0x00 || topic`.
    pub fn unsubscribe(&mut self, topic: &[u8]) -> Result<()> {
        self.write_marked(CANCEL_MARKER, topic)
    }

    fn write_marked(&mut self, marker: u8, topic: &[u8]) -> Result<()> {
        let mut payload = Vec::with_capacity(1 + topic.len());
        payload.push(marker);
        payload.extend_from_slice(topic);
        self.connection.send_frame(&payload, false)
    }

    /// `send` is illegal on a SUB socket (§4.5).
    pub fn send(&mut self, _data: &[u8]) -> Result<()> {
        Err(Error::InvalidOperation("send is not valid on a SUB socket".into()))
    }

    /// `recv(buf)`: one message frame, copied into `buf`.
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let frame = self.connection.recv_frame()?;
        if frame.payload.len() > buf.len() {
            return Err(Error::BufferTooSmall {
                needed: frame.payload.len(),
                available: buf.len(),
            });
        }
        buf[..frame.payload.len()].copy_from_slice(&frame.payload);
        Ok(frame.payload.len())
    }

    /// `socket_close(sock)`: tear down the connection. Dropping the
    /// underlying stream closes the TCP association.
    pub fn close(self) {
        debug!(connection = self.connection.id(), "SUB socket closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn send_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            Connection::handshake_as_acceptor(1, stream, SocketType::Pub, Config::large(), 0).unwrap();
        });

        let mut sub = SubSocket::connect(&format!("tcp://{addr}")).unwrap();
        assert!(matches!(sub.send(b"nope"), Err(Error::InvalidOperation(_))));

        server.join().unwrap();
    }
}
