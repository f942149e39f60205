//! ZMTP command codec (§3, §4.3).
//!
//! Builds on the frame codec: a COMMAND frame's payload starts with
//! `name_len:u8 || name`. What follows depends on the command:
//!
//! - `READY`, `ERROR`, `SUBSCRIBE`, `CANCEL` carry a property list,
//!   `repeated(prop_name_len:u8 || prop_name || prop_value_len:u32-be || prop_value)`,
//!   with no property-count prefix (§9, open question (ii));
//! - `PING` carries a 2-byte big-endian ttl hint followed by raw,
//!   unframed context bytes; `PONG` carries only the raw context bytes.
//!   Neither is a property list, so [`parse`] routes them to their own
//!   tail parser instead of the generic one (a `PING`/`PONG` payload fed
//!   to the property-list parser misreads the ttl/context bytes as a
//!   bogus property-name length).

use bytes::{BufMut, Bytes, BytesMut};
use zmtp_core::error::Error;
use zmtp_core::socket_type::SocketType;

/// A single `name: value` metadata property.
#[derive(Debug, Clone)]
pub struct Property<'a> {
    pub name: &'a [u8],
    pub value: &'a [u8],
}

/// A parsed command: name plus borrowed properties.
///
/// `PING`/`PONG` have no property list on the wire (see the module docs);
/// [`parse`] represents their single context blob as a synthetic
/// `context` property so callers still go through [`Command::get`], and
/// `PING`'s ttl hint is carried separately in `ttl_ms`.
#[derive(Debug, Clone)]
pub struct Command<'a> {
    pub name: &'a [u8],
    pub properties: Vec<Property<'a>>,
    pub ttl_ms: Option<u16>,
}

impl<'a> Command<'a> {
    #[must_use]
    pub fn get(&self, name: &[u8]) -> Option<&'a [u8]> {
        self.properties.iter().find(|p| p.name == name).map(|p| p.value)
    }

    #[must_use]
    pub fn is(&self, name: &[u8]) -> bool {
        self.name == name
    }
}

/// Parse a command payload (the COMMAND frame's body, not its flags/length header).
pub fn parse(payload: &'_ [u8]) -> Result<Command<'_>, Error> {
    let name_len = *payload
        .get(0)
        .ok_or_else(|| Error::BadCommand("empty command payload".into()))? as usize;
    if payload.len() < 1 + name_len {
        return Err(Error::BadCommand("truncated command name".into()));
    }
    let name = &payload[1..1 + name_len];
    let tail = &payload[1 + name_len..];

    match name {
        b"PING" => parse_ping_tail(name, tail),
        b"PONG" => parse_pong_tail(name, tail),
        b"READY" | b"ERROR" | b"SUBSCRIBE" | b"CANCEL" => parse_properties_tail(name, tail),
        other => Err(Error::BadCommand(format!(
            "unknown command name {:?}",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// `PING`'s tail is `ttl:u16-be || context` — no property list (§10.5).
fn parse_ping_tail<'a>(name: &'a [u8], tail: &'a [u8]) -> Result<Command<'a>, Error> {
    if tail.len() < 2 {
        return Err(Error::BadCommand("truncated PING ttl".into()));
    }
    let ttl_ms = u16::from_be_bytes([tail[0], tail[1]]);
    let context = &tail[2..];
    Ok(Command {
        name,
        properties: vec![Property { name: b"context", value: context }],
        ttl_ms: Some(ttl_ms),
    })
}

/// `PONG`'s tail is the raw context with no length prefix and no ttl.
fn parse_pong_tail<'a>(name: &'a [u8], tail: &'a [u8]) -> Result<Command<'a>, Error> {
    Ok(Command {
        name,
        properties: vec![Property { name: b"context", value: tail }],
        ttl_ms: None,
    })
}

/// The generic `repeated(prop_name_len || prop_name || prop_value_len:u32-be || prop_value)`
/// tail shared by `READY`/`ERROR`/`SUBSCRIBE`/`CANCEL`.
fn parse_properties_tail<'a>(name: &'a [u8], tail: &'a [u8]) -> Result<Command<'a>, Error> {
    let mut i = 0usize;
    let mut properties = Vec::new();
    while i < tail.len() {
        let name_len = *tail
            .get(i)
            .ok_or_else(|| Error::BadCommand("truncated property".into()))? as usize;
        i += 1;
        if tail.len() < i + name_len {
            return Err(Error::BadCommand("truncated property name".into()));
        }
        let prop_name = &tail[i..i + name_len];
        i += name_len;

        if tail.len() < i + 4 {
            return Err(Error::BadCommand("truncated property value length".into()));
        }
        let value_len =
            u32::from_be_bytes([tail[i], tail[i + 1], tail[i + 2], tail[i + 3]]) as usize;
        i += 4;
        if tail.len() < i + value_len {
            return Err(Error::BadCommand("truncated property value".into()));
        }
        let value = &tail[i..i + value_len];
        i += value_len;

        properties.push(Property { name: prop_name, value });
    }

    Ok(Command { name, properties, ttl_ms: None })
}

fn build(name: &[u8], properties: &[(&[u8], &[u8])]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u8(name.len() as u8);
    buf.put_slice(name);
    for (pname, pvalue) in properties {
        buf.put_u8(pname.len() as u8);
        buf.put_slice(pname);
        buf.put_u32(pvalue.len() as u32);
        buf.put_slice(pvalue);
    }
    buf.freeze()
}

/// Build a `READY` command body carrying exactly one `Socket-Type` property (§4.3).
#[must_use]
pub fn build_ready(socket_type: SocketType) -> Bytes {
    build(b"READY", &[(b"Socket-Type", socket_type.as_str().as_bytes())])
}

/// Extract the peer's `Socket-Type` from a parsed `READY` command.
pub fn ready_socket_type(cmd: &Command<'_>) -> Result<SocketType, Error> {
    if !cmd.is(b"READY") {
        return Err(Error::BadCommand("expected READY command".into()));
    }
    let value = cmd
        .get(b"Socket-Type")
        .ok_or_else(|| Error::BadCommand("READY missing Socket-Type".into()))?;
    SocketType::from_wire(value)
}

/// Build an `ERROR` command body naming why a handshake is being rejected.
#[must_use]
pub fn build_error(reason: &str) -> Bytes {
    build(b"ERROR", &[(b"message", reason.as_bytes())])
}

/// Build a `PING` command body: `ttl:u16-be || context`, no property list.
#[must_use]
pub fn build_ping(timeout_ms: u16, context: &[u8]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u8(4);
    buf.put_slice(b"PING");
    buf.put_u16(timeout_ms);
    buf.put_slice(context);
    buf.freeze()
}

/// Build the `PONG` reply to a `PING`: the raw context, echoed verbatim.
#[must_use]
pub fn build_pong(context: &[u8]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u8(4);
    buf.put_slice(b"PONG");
    buf.put_slice(context);
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_round_trip_has_no_count_prefix() {
        let body = build_ready(SocketType::Req);
        // name_len(1) + "READY"(5) + prop_name_len(1) + "Socket-Type"(11) + value_len(4) + "REQ"(3)
        assert_eq!(body.len(), 1 + 5 + 1 + 11 + 4 + 3);
        let cmd = parse(&body).unwrap();
        assert_eq!(ready_socket_type(&cmd).unwrap(), SocketType::Req);
    }

    #[test]
    fn p8_unknown_properties_are_ignored() {
        let mut buf = BytesMut::from(&build_ready(SocketType::Sub)[..]);
        buf.put_u8(7);
        buf.put_slice(b"Unknown");
        buf.put_u32(2);
        buf.put_slice(b"hi");
        let cmd = parse(&buf).unwrap();
        assert_eq!(ready_socket_type(&cmd).unwrap(), SocketType::Sub);
    }

    #[test]
    fn unknown_command_name_is_bad_command() {
        let mut buf = BytesMut::new();
        buf.put_u8(7);
        buf.put_slice(b"UNKNOWN");
        assert!(parse(&buf).is_err());
    }

    #[test]
    fn error_and_ping_pong_encode_and_parse() {
        let err = build_error("mechanism unsupported: PLAIN");
        let parsed = parse(&err).unwrap();
        assert!(parsed.is(b"ERROR"));
        assert_eq!(parsed.get(b"message").unwrap(), b"mechanism unsupported: PLAIN");

        let ping = build_ping(5000, b"ctx");
        let parsed_ping = parse(&ping).unwrap();
        assert!(parsed_ping.is(b"PING"));
        assert_eq!(parsed_ping.ttl_ms, Some(5000));
        assert_eq!(parsed_ping.get(b"context").unwrap(), b"ctx");

        let pong = build_pong(b"ctx");
        let parsed_pong = parse(&pong).unwrap();
        assert!(parsed_pong.is(b"PONG"));
        assert_eq!(parsed_pong.ttl_ms, None);
        assert_eq!(parsed_pong.get(b"context").unwrap(), b"ctx");
    }

    #[test]
    fn ping_with_empty_context_and_truncated_ttl() {
        let ping = build_ping(0, b"");
        let parsed = parse(&ping).unwrap();
        assert_eq!(parsed.ttl_ms, Some(0));
        assert_eq!(parsed.get(b"context").unwrap(), b"");

        // name_len(1) + "PING"(4), no ttl bytes at all.
        let mut buf = BytesMut::new();
        buf.put_u8(4);
        buf.put_slice(b"PING");
        assert!(matches!(parse(&buf), Err(Error::BadCommand(_))));
    }

    #[test]
    fn subscribe_cancel_commands_are_recognized() {
        let sub = build(b"SUBSCRIBE", &[(b"topic", b"weather")]);
        assert!(parse(&sub).unwrap().is(b"SUBSCRIBE"));
        let cancel = build(b"CANCEL", &[(b"topic", b"weather")]);
        assert!(parse(&cancel).unwrap().is(b"CANCEL"));
    }
}
