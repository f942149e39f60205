//! Error Types
//!
//! Error taxonomy shared by the ZMTP wire codecs and the socket layer.

use std::io;
use thiserror::Error;

/// Result type alias used throughout the zmtp crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for zmtp-core / zmtp operations.
#[derive(Error, Debug)]
pub enum Error {
    /// `bind`/`connect` given a malformed endpoint string.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// An operation was attempted on a socket type that doesn't support it
    /// (e.g. `subscribe` on a non-SUB socket).
    #[error("invalid socket type for this operation: {0}")]
    InvalidSocketType(String),

    /// A server-side operation (`accept`) was attempted before `bind`.
    #[error("socket is not bound")]
    NotBound,

    /// A client-side operation (`send`/`recv`) was attempted before
    /// `connect`, or after the connection died.
    #[error("socket is not connected")]
    NotConnected,

    /// An illegal flag byte, or a short read in the middle of a frame.
    #[error("malformed frame: {0}")]
    BadFrame(String),

    /// An unknown command name, or a malformed command payload.
    #[error("malformed command: {0}")]
    BadCommand(String),

    /// The peer advertised a security mechanism other than NULL.
    #[error("unsupported security mechanism: {0}")]
    MechanismUnsupported(String),

    /// The peer closed the stream (EOF) where more data was expected.
    #[error("stream ended")]
    StreamEnded,

    /// A non-blocking operation has no data available right now.
    ///
    /// This never escapes the subscription harvester (§7 propagation
    /// policy) — it's public because the frame decoder's `decode` entry
    /// point is shared between blocking and non-blocking callers.
    #[error("would block")]
    WouldBlock,

    /// The caller's `recv` buffer is smaller than the concatenated payload.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// An operation that is not legal for this socket's pattern
    /// (e.g. `send` on a SUB socket).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Underlying OS-level transport failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    #[must_use]
    pub fn is_would_block(&self) -> bool {
        matches!(self, Error::WouldBlock) || matches!(self, Error::Io(e) if e.kind() == io::ErrorKind::WouldBlock)
    }

    #[must_use]
    pub fn is_connection_dead(&self) -> bool {
        matches!(self, Error::StreamEnded | Error::NotConnected) || matches!(self, Error::Io(_))
    }
}
