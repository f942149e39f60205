//! Socket type enumeration for ZeroMQ socket types.
//!
//! This module provides the `SocketType` enum which represents the different
//! types of ZeroMQ sockets according to the ZMTP 3.1 specification. Only
//! `Req`, `Rep`, `Pub`, and `Sub` carry data-plane behaviour in this crate;
//! the remaining variants exist so the `Socket-Type` READY property can be
//! built and parsed for any peer type.

use crate::error::Error;
use std::fmt;

/// ZeroMQ socket types.
///
/// Corresponds to the `ZMQ_TYPE` socket option (16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SocketType {
    /// PAIR socket for exclusive bidirectional communication
    Pair = 0,
    /// PUB socket for publishing messages to subscribers
    Pub = 1,
    /// SUB socket for subscribing to published messages
    Sub = 2,
    /// REQ socket for synchronous request-reply client
    Req = 3,
    /// REP socket for synchronous request-reply server
    Rep = 4,
    /// DEALER socket for asynchronous request-reply patterns
    Dealer = 5,
    /// ROUTER socket for routing messages by identity
    Router = 6,
    /// PULL socket for receiving messages from pushers
    Pull = 7,
    /// PUSH socket for sending messages to pullers
    Push = 8,
    /// XPUB socket for extended publisher with subscription awareness
    XPub = 9,
    /// XSUB socket for extended subscriber with dynamic subscriptions
    XSub = 10,
    /// STREAM socket for raw TCP connections (not implemented)
    Stream = 11,
}

impl SocketType {
    /// Uppercase ASCII name, as carried by the `Socket-Type` READY property.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pair => "PAIR",
            Self::Pub => "PUB",
            Self::Sub => "SUB",
            Self::Req => "REQ",
            Self::Rep => "REP",
            Self::Dealer => "DEALER",
            Self::Router => "ROUTER",
            Self::Pull => "PULL",
            Self::Push => "PUSH",
            Self::XPub => "XPUB",
            Self::XSub => "XSUB",
            Self::Stream => "STREAM",
        }
    }

    /// Parse a `Socket-Type` property value as sent on the wire.
    pub fn from_wire(value: &[u8]) -> Result<Self, Error> {
        match value {
            b"PAIR" => Ok(Self::Pair),
            b"PUB" => Ok(Self::Pub),
            b"SUB" => Ok(Self::Sub),
            b"REQ" => Ok(Self::Req),
            b"REP" => Ok(Self::Rep),
            b"DEALER" => Ok(Self::Dealer),
            b"ROUTER" => Ok(Self::Router),
            b"PULL" => Ok(Self::Pull),
            b"PUSH" => Ok(Self::Push),
            b"XPUB" => Ok(Self::XPub),
            b"XSUB" => Ok(Self::XSub),
            b"STREAM" => Ok(Self::Stream),
            other => Err(Error::BadCommand(format!(
                "unknown Socket-Type: {:?}",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    /// Check if this socket type is compatible with the given peer type.
    ///
    /// Only REQ/REP and PUB/SUB data-plane behaviour is implemented by this
    /// crate, but compatibility is defined for every ZMTP socket type so a
    /// caller can validate a handshake against a peer of any kind.
    #[must_use]
    pub fn is_compatible(&self, peer: SocketType) -> bool {
        matches!(
            (self, peer),
            (Self::Pair, Self::Pair)
                | (Self::Pub, Self::Sub)
                | (Self::Sub, Self::Pub)
                | (Self::Req, Self::Rep)
                | (Self::Rep, Self::Req)
                | (Self::Req, Self::Router)
                | (Self::Router, Self::Req)
                | (Self::Dealer, Self::Rep)
                | (Self::Rep, Self::Dealer)
                | (Self::Dealer, Self::Router)
                | (Self::Router, Self::Dealer)
                | (Self::Dealer, Self::Dealer)
                | (Self::Router, Self::Router)
                | (Self::Push, Self::Pull)
                | (Self::Pull, Self::Push)
                | (Self::XPub, Self::XSub)
                | (Self::XSub, Self::XPub)
        )
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_type_display() {
        assert_eq!(SocketType::Req.to_string(), "REQ");
        assert_eq!(SocketType::Pub.to_string(), "PUB");
    }

    #[test]
    fn wire_round_trip() {
        for st in [
            SocketType::Pair,
            SocketType::Pub,
            SocketType::Sub,
            SocketType::Req,
            SocketType::Rep,
            SocketType::Dealer,
            SocketType::Router,
            SocketType::Pull,
            SocketType::Push,
            SocketType::XPub,
            SocketType::XSub,
            SocketType::Stream,
        ] {
            assert_eq!(SocketType::from_wire(st.as_str().as_bytes()).unwrap(), st);
        }
    }

    #[test]
    fn unknown_wire_value_is_bad_command() {
        assert!(SocketType::from_wire(b"BOGUS").is_err());
    }

    #[test]
    fn test_socket_compatibility() {
        assert!(SocketType::Req.is_compatible(SocketType::Rep));
        assert!(SocketType::Rep.is_compatible(SocketType::Req));
        assert!(SocketType::Pub.is_compatible(SocketType::Sub));
        assert!(SocketType::XPub.is_compatible(SocketType::XSub));
        assert!(!SocketType::Req.is_compatible(SocketType::Dealer));
        assert!(!SocketType::Pub.is_compatible(SocketType::Pull));
    }
}
