//! Endpoint abstraction for `tcp://host:port` addressing.
//!
//! This crate only speaks TCP (§1 scope); the endpoint grammar is
//! correspondingly narrow, but parsing is kept as its own module, the way
//! transport addressing is elsewhere in this lineage, so `bind` and
//! `connect` share one source of `invalid_endpoint` truth.

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

/// A parsed `tcp://host:port` endpoint.
///
/// `host` is kept as the original string (it may be `"*"`, an IPv4/IPv6
/// literal, or a resolvable name) rather than eagerly resolved, so `bind`
/// and `connect` can apply their different rules for `"*"` before handing
/// the result to `ToSocketAddrs`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Parse a `tcp://host:port` endpoint string.
    pub fn parse(s: &str) -> Result<Self, EndpointError> {
        s.parse()
    }

    /// Resolve this endpoint for use with `bind`.
    ///
    /// `"*"` is treated as `0.0.0.0` (§6); any other host is resolved
    /// through the system resolver.
    pub fn resolve_bind(&self) -> Result<SocketAddr, EndpointError> {
        if self.host == "*" {
            return Ok(SocketAddr::new(
                std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
                self.port,
            ));
        }
        self.resolve()
    }

    /// Resolve this endpoint for use with `connect`.
    ///
    /// `"*"` is only meaningful to `bind` (§6); `connect` rejects it.
    pub fn resolve_connect(&self) -> Result<SocketAddr, EndpointError> {
        if self.host == "*" {
            return Err(EndpointError::WildcardNotConnectable);
        }
        self.resolve()
    }

    fn resolve(&self) -> Result<SocketAddr, EndpointError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| EndpointError::Unresolvable(self.host.clone(), e.to_string()))?
            .next()
            .ok_or_else(|| EndpointError::Unresolvable(self.host.clone(), "no addresses".into()))
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("tcp://")
            .ok_or_else(|| EndpointError::InvalidScheme(s.to_string()))?;

        let (host, port_str) = if let Some(stripped) = rest.strip_prefix('[') {
            let close = stripped
                .find(']')
                .ok_or_else(|| EndpointError::MissingPort(s.to_string()))?;
            let host = &stripped[..close];
            let after = stripped[close + 1..]
                .strip_prefix(':')
                .ok_or_else(|| EndpointError::MissingPort(s.to_string()))?;
            (host, after)
        } else {
            let colon = rest
                .rfind(':')
                .ok_or_else(|| EndpointError::MissingPort(s.to_string()))?;
            let (host, port_str) = rest.split_at(colon);
            (host, &port_str[1..])
        };

        if host.is_empty() {
            return Err(EndpointError::EmptyHost(s.to_string()));
        }
        let port: u16 = port_str
            .parse()
            .map_err(|_| EndpointError::InvalidPort(port_str.to_string()))?;

        Ok(Endpoint {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "tcp://[{}]:{}", self.host, self.port)
        } else {
            write!(f, "tcp://{}:{}", self.host, self.port)
        }
    }
}

/// Errors that can occur when parsing or resolving an endpoint.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("invalid endpoint scheme: {0} (expected tcp://host:port)")]
    InvalidScheme(String),

    #[error("endpoint missing port: {0}")]
    MissingPort(String),

    #[error("endpoint has empty host: {0}")]
    EmptyHost(String),

    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("\"*\" is only a valid bind address, not a connect target")]
    WildcardNotConnectable,

    #[error("could not resolve host {0}: {1}")]
    Unresolvable(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ipv4_literal() {
        let ep = Endpoint::parse("tcp://127.0.0.1:5555").unwrap();
        assert_eq!(ep.to_string(), "tcp://127.0.0.1:5555");
        assert_eq!(
            ep.resolve_bind().unwrap(),
            "127.0.0.1:5555".parse().unwrap()
        );
    }

    #[test]
    fn parse_ipv6_literal() {
        let ep = Endpoint::parse("tcp://[::1]:5555").unwrap();
        assert_eq!(ep.resolve_bind().unwrap(), "[::1]:5555".parse().unwrap());
    }

    #[test]
    fn wildcard_binds_to_unspecified() {
        let ep = Endpoint::parse("tcp://*:5555").unwrap();
        assert_eq!(
            ep.resolve_bind().unwrap(),
            "0.0.0.0:5555".parse().unwrap()
        );
    }

    #[test]
    fn wildcard_rejected_for_connect() {
        let ep = Endpoint::parse("tcp://*:5555").unwrap();
        assert!(matches!(
            ep.resolve_connect(),
            Err(EndpointError::WildcardNotConnectable)
        ));
    }

    #[test]
    fn rejects_non_tcp_scheme() {
        assert!(matches!(
            Endpoint::parse("udp://localhost:5555"),
            Err(EndpointError::InvalidScheme(_))
        ));
    }

    #[test]
    fn rejects_missing_port() {
        assert!(matches!(
            Endpoint::parse("tcp://localhost"),
            Err(EndpointError::MissingPort(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_port() {
        assert!(Endpoint::parse("tcp://localhost:99999").is_err());
    }
}
