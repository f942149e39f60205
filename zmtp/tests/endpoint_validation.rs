//! Crate-level endpoint validation coverage (§8 P12): `connect`/`bind`
//! reject anything that isn't `tcp://host:port` before touching the network.

use zmtp::req::ReqSocket;
use zmtp::rep::RepSocket;
use zmtp::Error;

#[test]
fn p12_non_tcp_scheme_is_invalid_endpoint() {
    let err = ReqSocket::connect("udp://localhost:5555").unwrap_err();
    assert!(matches!(err, Error::InvalidEndpoint(_)));
}

#[test]
fn p12_missing_port_is_invalid_endpoint() {
    let err = ReqSocket::connect("tcp://localhost").unwrap_err();
    assert!(matches!(err, Error::InvalidEndpoint(_)));
}

#[test]
fn bind_rejects_non_tcp_scheme_too() {
    let err = RepSocket::bind("ipc:///tmp/sock").unwrap_err();
    assert!(matches!(err, Error::InvalidEndpoint(_)));
}

#[test]
fn connect_to_wildcard_host_is_rejected() {
    // "*" is only meaningful to `bind` (§6).
    let err = ReqSocket::connect("tcp://*:5555").unwrap_err();
    assert!(matches!(err, Error::InvalidEndpoint(_)));
}
