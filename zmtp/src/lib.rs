//! zmtp
//!
//! A ZMTP 3.1 message-transport library over TCP with the NULL security
//! mechanism and four socket patterns: REQ, REP, PUB, SUB.
//!
//! Module layout follows the protocol's own layering (leaves first):
//! frame codec → greeting codec → command codec → connection/handshake →
//! socket patterns.

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod command;
pub mod config;
pub mod connection;
pub mod context;
pub mod frame;
pub mod greeting;
pub mod mechanism;
pub mod publisher;
pub mod rep;
pub mod req;
pub mod subscriber;

pub use zmtp_core::endpoint::{Endpoint, EndpointError};
pub use zmtp_core::error::{Error, Result};
pub use zmtp_core::socket_type::SocketType;
pub use zmtp_core::subscription::SubscriptionSet;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::context::Context;
    pub use crate::publisher::PubSocket;
    pub use crate::rep::{RepConnection, RepSocket};
    pub use crate::req::ReqSocket;
    pub use crate::subscriber::SubSocket;
    pub use crate::{Endpoint, Error, Result, SocketType};
}
