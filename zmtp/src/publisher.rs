//! PUB socket: subscription-filtered fan-out to every matching subscriber (§4.5).
//!
//! `accept` and `send` are expected to run concurrently — one task driving
//! an accept loop while another publishes — so the connection set and its
//! id counter live behind one mutex (§5), held for the full duration of
//! `send`'s fan-out (harvest-then-write per connection) so no connection's
//! stream is ever observed mid-frame by a second task.
//!
//! ## Example
//!
//! ```rust,no_run
//! use zmtp::publisher::PubSocket;
//! use std::thread;
//!
//! # fn main() -> zmtp_core::error::Result<()> {
//! let pub_socket = PubSocket::bind("tcp://*:5555")?;
//! let accept_socket = pub_socket.clone();
//! thread::spawn(move || loop {
//!     if accept_socket.accept().is_err() {
//!         break;
//!     }
//! });
//! pub_socket.send(b"weather T=25")?;
//! # Ok(())
//! # }
//! ```

use std::net::TcpListener;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};
use zmtp_core::endpoint::Endpoint;
use zmtp_core::error::{Error, Result};
use zmtp_core::socket_type::SocketType;

use crate::config::Config;
use crate::connection::Connection;
use crate::context::Context;

struct Shared {
    listener: TcpListener,
    connections: Mutex<Vec<Connection>>,
    next_id: AtomicU64,
    config: Config,
    context_id: u64,
}

/// A PUB socket. Cloning shares the same listener and connection set — the
/// clone is how an accept-loop task and a publishing task cooperate on one
/// socket (§5).
#[derive(Clone)]
pub struct PubSocket {
    shared: Arc<Shared>,
}

impl PubSocket {
    /// `bind(endpoint)`, sized for PUB/SUB's larger fan-out payloads
    /// (`Config::large`), under a fresh, unshared [`Context`].
    pub fn bind(endpoint: &str) -> Result<Self> {
        Self::bind_with(endpoint, Config::large(), &Context::new())
    }

    /// `bind(endpoint)` with an explicit buffer/harvest [`Config`], applied
    /// to every connection this socket accepts — including the post-accept
    /// grace period before the first subscription harvest (§4.6).
    pub fn bind_with_config(endpoint: &str, config: Config) -> Result<Self> {
        Self::bind_with(endpoint, config, &Context::new())
    }

    /// `socket_new(ctx, Pub)` then `bind(endpoint)` (§6): share an
    /// application's [`Context`] across every socket it opens.
    pub fn bind_with_context(endpoint: &str, ctx: &Context) -> Result<Self> {
        Self::bind_with(endpoint, Config::large(), ctx)
    }

    fn bind_with(endpoint: &str, config: Config, ctx: &Context) -> Result<Self> {
        let ep = Endpoint::from_str(endpoint).map_err(|e| Error::InvalidEndpoint(e.to_string()))?;
        let addr = ep.resolve_bind().map_err(|e| Error::InvalidEndpoint(e.to_string()))?;
        let listener = TcpListener::bind(addr)?;
        debug!(endpoint, context = ctx.id(), "PUB bound");
        Ok(Self {
            shared: Arc::new(Shared {
                listener,
                connections: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                config,
                context_id: ctx.id(),
            }),
        })
    }

    /// `accept(sock)`: blocks for the next TCP client, completes the
    /// handshake, switches the connection to non-blocking, gives it a
    /// grace period to send its initial subscriptions, then inserts it
    /// into the socket's connection set (§4.4, §4.6).
    pub fn accept(&self) -> Result<()> {
        let (stream, peer_addr) = self.shared.listener.accept()?;
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let mut connection = Connection::handshake_as_acceptor(
            id,
            stream,
            SocketType::Pub,
            self.shared.config,
            self.shared.context_id,
        )?;
        connection.set_nonblocking(true)?;

        std::thread::sleep(self.shared.config.initial_harvest_delay);
        let _ = connection.harvest_subscriptions()?;

        debug!(connection = id, %peer_addr, "PUB accepted subscriber");
        self.shared
            .connections
            .lock()
            .expect("connection set mutex poisoned")
            .push(connection);
        Ok(())
    }

    /// `send(data)` (§4.5, P7): for every connection, harvest pending
    /// subscription traffic, then write `data` iff it matches. A dead
    /// connection is dropped from the set rather than failing the call.
    pub fn send(&self, data: &[u8]) -> Result<()> {
        let mut connections = self
            .shared
            .connections
            .lock()
            .expect("connection set mutex poisoned");

        let mut i = 0;
        while i < connections.len() {
            let alive = match connections[i].harvest_subscriptions() {
                Ok(alive) => alive,
                Err(e) => {
                    warn!(connection = connections[i].id(), error = %e, "harvest failed, dropping");
                    false
                }
            };
            if !alive {
                connections.swap_remove(i);
                continue;
            }

            if connections[i].subscriptions().matches(data) {
                if let Err(e) = connections[i].send_frame(data, false) {
                    warn!(connection = connections[i].id(), error = %e, "publish write failed, dropping");
                    connections.swap_remove(i);
                    continue;
                }
            }
            i += 1;
        }

        Ok(())
    }

    /// `connection_count(sock)`.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.shared
            .connections
            .lock()
            .expect("connection set mutex poisoned")
            .len()
    }

    /// `socket_close(sock)`: drop every accepted connection under the same
    /// mutex fan-out holds (§5). The listener itself keeps accepting until
    /// every clone of this socket is dropped — `close` only tears down the
    /// connection set, mirroring the Connection-vs-Socket ownership split
    /// in §3.
    pub fn close(&self) {
        let mut connections = self
            .shared
            .connections
            .lock()
            .expect("connection set mutex poisoned");
        let count = connections.len();
        connections.clear();
        debug!(count, "PUB socket closed, connections dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::subscriber::SubSocket;
    use std::thread;

    fn spawn_accept_loop(sock: PubSocket, rounds: usize) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            for _ in 0..rounds {
                if sock.accept().is_err() {
                    break;
                }
            }
        })
    }

    #[test]
    fn p10_single_subscriber_topic_filter() {
        let port = portpicker::pick_unused_port().expect("no free port");
        let endpoint = format!("tcp://127.0.0.1:{port}");

        let publisher = PubSocket::bind(&endpoint).unwrap();
        let accept_handle = spawn_accept_loop(publisher.clone(), 1);

        thread::sleep(Duration::from_millis(50));
        let mut sub = SubSocket::connect(&endpoint).unwrap();
        sub.subscribe(b"weather").unwrap();

        // Let the harvester observe the subscription before publishing.
        thread::sleep(Duration::from_millis(100));

        publisher.send(b"weather T=25").unwrap();
        publisher.send(b"news X").unwrap();

        let mut buf = [0u8; 64];
        let n = sub.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"weather T=25");

        accept_handle.join().unwrap();
    }

    #[test]
    fn p11_multi_subscriber_match_all() {
        let port = portpicker::pick_unused_port().expect("no free port");
        let endpoint = format!("tcp://127.0.0.1:{port}");

        let publisher = PubSocket::bind(&endpoint).unwrap();
        let accept_handle = spawn_accept_loop(publisher.clone(), 3);

        thread::sleep(Duration::from_millis(50));
        let mut subs: Vec<SubSocket> = (0..3)
            .map(|_| {
                let mut sub = SubSocket::connect(&endpoint).unwrap();
                sub.subscribe(b"").unwrap();
                sub
            })
            .collect();

        thread::sleep(Duration::from_millis(100));

        publisher.send(b"m1").unwrap();
        publisher.send(b"m2").unwrap();

        for sub in &mut subs {
            let mut buf = [0u8; 16];
            let n1 = sub.recv(&mut buf).unwrap();
            assert_eq!(&buf[..n1], b"m1");
            let n2 = sub.recv(&mut buf).unwrap();
            assert_eq!(&buf[..n2], b"m2");
        }

        accept_handle.join().unwrap();
    }
}
