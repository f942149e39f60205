//! A single ZMTP connection: handshake state machine (§4.4) plus the
//! blocking frame I/O and non-blocking subscription harvesting (§4.6) built
//! on top of it.

use std::io::{BufWriter, ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, trace, warn};
use zmtp_core::error::{Error, Result};
use zmtp_core::socket_type::SocketType;
use zmtp_core::subscription::SubscriptionSet;

use crate::command::{self, Command};
use crate::config::Config;
use crate::frame::{self, Frame, FrameDecoder};
use crate::greeting::Greeting;
use crate::mechanism::SecurityMechanism;

const PROTOCOL_VERSION: (u8, u8) = (3, 1);

/// One live ZMTP connection, past the handshake and ready for the socket
/// layer to drive (§4.4, §4.5).
///
/// Reads go through `stream` directly (the handshake and `recv_frame` both
/// need precise, unbuffered `read`/`read_exact` control over how many bytes
/// come off the wire); writes go through a `BufWriter` sized by `config`,
/// split off the same socket via `try_clone` and flushed after every frame
/// or command so buffering never delays delivery, only batches syscalls.
pub struct Connection {
    id: u64,
    context_id: u64,
    stream: TcpStream,
    writer: BufWriter<TcpStream>,
    peer_socket_type: SocketType,
    subscriptions: SubscriptionSet,
    decoder: FrameDecoder,
    config: Config,
}

impl Connection {
    /// Run the handshake as the connection's initiator (the socket that
    /// called `connect`), then wrap the stream in a `Connection` (§4.4).
    pub fn handshake_as_initiator(
        id: u64,
        stream: TcpStream,
        local_type: SocketType,
        config: Config,
        context_id: u64,
    ) -> Result<Self> {
        Self::handshake(id, stream, local_type, false, config, context_id)
    }

    /// Run the handshake as the connection's acceptor (the socket that
    /// called `bind`/`accept`), then wrap the stream in a `Connection` (§4.4).
    pub fn handshake_as_acceptor(
        id: u64,
        stream: TcpStream,
        local_type: SocketType,
        config: Config,
        context_id: u64,
    ) -> Result<Self> {
        Self::handshake(id, stream, local_type, true, config, context_id)
    }

    fn handshake(
        id: u64,
        mut stream: TcpStream,
        local_type: SocketType,
        as_server: bool,
        config: Config,
        context_id: u64,
    ) -> Result<Self> {
        debug!(connection = id, context = context_id, socket_type = %local_type, as_server, "starting handshake");

        let writer_side = stream.try_clone()?;
        let mut writer = BufWriter::with_capacity(config.write_buf_size, writer_side);

        let our_greeting = Greeting::encode(PROTOCOL_VERSION, SecurityMechanism::Null, as_server);
        writer.write_all(&our_greeting)?;
        writer.flush()?;

        let mut peer_greeting_buf = [0u8; 64];
        let filled = read_greeting_tolerant(&mut stream, &mut peer_greeting_buf)?;
        let peer_greeting = Greeting::decode(&peer_greeting_buf[..filled])?;
        peer_greeting.mechanism.require_null()?;
        trace!(connection = id, ?peer_greeting.version, "received peer greeting");

        let ready_body = command::build_ready(local_type);
        let ready_frame = frame::encode_command(&ready_body);
        writer.write_all(&ready_frame)?;
        writer.flush()?;

        let peer_ready = frame::parse(&mut stream)?;
        if !peer_ready.is_command() {
            return Err(Error::BadCommand("expected READY, got data frame".into()));
        }
        let parsed = command::parse(&peer_ready.payload)?;
        if parsed.is(b"ERROR") {
            let message = parsed
                .get(b"message")
                .map(|m| String::from_utf8_lossy(m).into_owned())
                .unwrap_or_default();
            return Err(Error::BadCommand(format!("peer rejected handshake: {message}")));
        }
        let peer_socket_type = command::ready_socket_type(&parsed)?;

        debug!(
            connection = id,
            local = %local_type,
            peer = %peer_socket_type,
            "handshake complete"
        );

        Ok(Self {
            id,
            context_id,
            stream,
            writer,
            peer_socket_type,
            subscriptions: SubscriptionSet::new(),
            decoder: FrameDecoder::new(),
            config,
        })
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The [`Context`](crate::context::Context) this connection was opened
    /// under, for log correlation across a process's sockets.
    #[must_use]
    pub fn context_id(&self) -> u64 {
        self.context_id
    }

    #[must_use]
    pub fn peer_socket_type(&self) -> SocketType {
        self.peer_socket_type
    }

    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionSet {
        &self.subscriptions
    }

    /// Send a data frame (§4.1, §4.5).
    pub fn send_frame(&mut self, payload: &[u8], more: bool) -> Result<()> {
        let encoded = frame::encode_message(payload, more);
        self.writer.write_all(&encoded)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Send a raw command frame (used for PING/PONG keepalive, §10.5).
    pub fn write_command(&mut self, body: &[u8]) -> Result<()> {
        let encoded = frame::encode_command(body);
        self.writer.write_all(&encoded)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Receive one frame, blocking until it arrives (§4.1).
    pub fn recv_frame(&mut self) -> Result<Frame> {
        frame::parse(&mut self.stream)
    }

    /// Receive a full multipart message: one or more frames while `more` is
    /// set (§4.5). Returns the parts in order.
    pub fn recv_message(&mut self) -> Result<Vec<Bytes>> {
        let mut parts = Vec::new();
        loop {
            let frame = self.recv_frame()?;
            let more = frame.more();
            parts.push(frame.payload);
            if !more {
                return Ok(parts);
            }
        }
    }

    /// Send a full multipart message, setting `more` on every part but the
    /// last (§4.5).
    pub fn send_message(&mut self, parts: &[Bytes]) -> Result<()> {
        match parts.split_last() {
            None => Ok(()),
            Some((last, rest)) => {
                for part in rest {
                    self.send_frame(part, true)?;
                }
                self.send_frame(last, false)
            }
        }
    }

    /// Read frames until one arrives with `MORE` clear, concatenating every
    /// non-empty payload into `buf` in arrival order (empty delimiter
    /// frames are skipped) — the REQ/REP `recv` semantics (§4.5, P6).
    ///
    /// Fails with `buffer_too_small` as soon as the concatenated length
    /// would exceed `buf.len()`, without losing frame-boundary sync on the
    /// stream (the rest of the oversized message is still read off the
    /// wire so the connection isn't left mid-frame).
    pub fn recv_concatenated(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut written = 0usize;
        let mut needed = 0usize;

        loop {
            let frame = self.recv_frame()?;
            let more = frame.more();
            if !frame.payload.is_empty() {
                needed += frame.payload.len();
                if needed <= buf.len() {
                    buf[written..needed].copy_from_slice(&frame.payload);
                    written = needed;
                }
            }
            if !more {
                break;
            }
        }

        if needed > buf.len() {
            return Err(Error::BufferTooSmall {
                needed,
                available: buf.len(),
            });
        }
        Ok(written)
    }

    /// Switch this connection's socket to non-blocking mode, required
    /// before the PUB-side harvester can poll it without stalling (§4.6).
    ///
    /// `stream` and `writer`'s inner handle are clones of the same socket
    /// (`try_clone`), so the non-blocking flag — a property of the
    /// underlying socket, not the handle — applies to both once set here.
    pub fn set_nonblocking(&mut self, nonblocking: bool) -> Result<()> {
        self.stream.set_nonblocking(nonblocking).map_err(Error::Io)
    }

    /// Drain whatever SUBSCRIBE/CANCEL traffic is currently available on
    /// this connection without blocking, folding it into the connection's
    /// `SubscriptionSet` (§4.6).
    ///
    /// Spends at most `config.harvest_grace_period` reading before
    /// returning, so one connection that keeps dribbling bytes can't
    /// starve the rest of a PUB socket's fan-out loop. Returns `Ok(false)`
    /// if the connection has died and should be dropped by the caller.
    pub fn harvest_subscriptions(&mut self) -> Result<bool> {
        let deadline = Instant::now() + self.config.harvest_grace_period;
        let mut buf = vec![0u8; self.config.read_buf_size];

        loop {
            match self.stream.read(&mut buf) {
                Ok(0) => {
                    debug!(connection = self.id, "peer closed during harvest");
                    return Ok(false);
                }
                Ok(n) => {
                    self.decoder.feed(&buf[..n]);
                    self.drain_decoded()?;
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(true),
                Err(e) => {
                    warn!(connection = self.id, error = %e, "harvest read failed");
                    return Err(Error::Io(e));
                }
            }

            if Instant::now() >= deadline {
                return Ok(true);
            }
        }
    }

    fn drain_decoded(&mut self) -> Result<()> {
        while let Some(frame) = self.decoder.poll()? {
            if frame.is_command() {
                self.apply_command_frame(&frame)?;
            } else {
                self.apply_subscription_message(&frame);
            }
        }
        Ok(())
    }

    fn apply_command_frame(&mut self, frame: &Frame) -> Result<()> {
        let parsed: Command<'_> = command::parse(&frame.payload)?;
        match parsed.name {
            b"SUBSCRIBE" => {
                let topic = parsed.get(b"topic").unwrap_or(&[]);
                self.subscriptions.add(Bytes::copy_from_slice(topic));
            }
            b"CANCEL" => {
                let topic = parsed.get(b"topic").unwrap_or(&[]);
                self.subscriptions.remove(topic);
            }
            b"PING" => {
                let context = parsed.get(b"context").unwrap_or(&[]);
                self.answer_ping(context)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Reply to a peer's `PING` by echoing its context back in a `PONG`
    /// (§10.5). This crate never originates a `PING`-driven heartbeat
    /// schedule itself — that's keepalive policy, out of scope per §1 —
    /// but a connection that receives one must not leave it unanswered.
    pub fn answer_ping(&mut self, context: &[u8]) -> Result<()> {
        let pong = command::build_pong(context);
        self.write_command(&pong)
    }

    /// A SUB socket encodes subscribe/unsubscribe as a one-byte prefix
    /// (`0x01`/`0x00`) on an ordinary message frame rather than as a named
    /// COMMAND (§4.6) — this is the wire form the harvester actually sees
    /// in practice, with [`Self::apply_command_frame`]'s `SUBSCRIBE`/
    /// `CANCEL` handling kept for peers that send the command form instead.
    fn apply_subscription_message(&mut self, frame: &Frame) {
        let Some((&marker, topic)) = frame.payload.split_first() else {
            return;
        };
        match marker {
            0x01 => self.subscriptions.add(Bytes::copy_from_slice(topic)),
            0x00 => self.subscriptions.remove(topic),
            _ => {}
        }
    }
}

fn read_greeting_tolerant(stream: &mut TcpStream, buf: &mut [u8; 64]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    if filled < 10 {
        return Err(Error::StreamEnded);
    }
    Ok(filled)
}
