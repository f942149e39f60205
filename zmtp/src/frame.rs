//! ZMTP frame codec (§4.1).
//!
//! A frame is `(flags: u8, length: u8|u64-be, payload)`. This module gives
//! two ways to get one off the wire:
//!
//! - [`parse`] reads byte-exactly from any blocking [`Read`] — used by the
//!   handshake and by REQ/REP/SUB, which own a blocking stream.
//! - [`FrameDecoder`] is a stateful, non-blocking decoder fed raw bytes as
//!   they arrive — used by the PUB-side subscription harvester (§4.6),
//!   which must never block on its Connection's stream.
//!
//! Both share the same flag-byte legality rule: §3 defines the full set of
//! legal flag bytes as a closed set, and this codec checks membership in
//! that set by exact equality rather than masking the three defined bits,
//! matching the source (§9, open question (i)).

use bytes::{Buf, Bytes, BytesMut};
use std::io::{self, Read};
use zmtp_core::error::Error;

const FLAG_MORE: u8 = 0x01;
const FLAG_LONG: u8 = 0x02;
const FLAG_COMMAND: u8 = 0x04;

/// The only flag-byte values this implementation will parse or emit (§3).
const LEGAL_FLAGS: [u8; 6] = [0x00, 0x01, 0x02, 0x03, 0x04, 0x06];

/// A decoded ZMTP frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub flags: u8,
    pub payload: Bytes,
}

impl Frame {
    #[must_use]
    pub const fn more(&self) -> bool {
        (self.flags & FLAG_MORE) != 0
    }

    #[must_use]
    pub const fn is_command(&self) -> bool {
        (self.flags & FLAG_COMMAND) != 0
    }
}

fn is_long(flags: u8) -> bool {
    (flags & FLAG_LONG) != 0
}

/// `encode_message(payload, more)` (§4.1).
#[must_use]
pub fn encode_message(payload: &[u8], more: bool) -> Bytes {
    let mut flags = 0u8;
    if more {
        flags |= FLAG_MORE;
    }
    if payload.len() > 255 {
        flags |= FLAG_LONG;
    }
    encode(flags, payload)
}

/// `encode_command(payload)` (§4.1).
#[must_use]
pub fn encode_command(payload: &[u8]) -> Bytes {
    let mut flags = FLAG_COMMAND;
    if payload.len() > 255 {
        flags |= FLAG_LONG;
    }
    encode(flags, payload)
}

fn encode(flags: u8, payload: &[u8]) -> Bytes {
    let long = is_long(flags);
    let mut out = BytesMut::with_capacity(if long { 9 } else { 2 } + payload.len());
    out.extend_from_slice(&[flags]);
    if long {
        out.extend_from_slice(&(payload.len() as u64).to_be_bytes());
    } else {
        out.extend_from_slice(&[payload.len() as u8]);
    }
    out.extend_from_slice(payload);
    out.freeze()
}

/// Read exactly one frame from a blocking reader (§4.1).
///
/// On a short read this returns [`Error::StreamEnded`]; on a flag byte
/// outside the legal set (§3) this returns [`Error::BadFrame`].
pub fn parse<R: Read>(reader: &mut R) -> Result<Frame, Error> {
    let mut flag_buf = [0u8; 1];
    read_exact_or_ended(reader, &mut flag_buf)?;
    let flags = flag_buf[0];

    if !LEGAL_FLAGS.contains(&flags) {
        return Err(Error::BadFrame(format!("illegal flag byte 0x{flags:02x}")));
    }

    let len = if is_long(flags) {
        let mut len_buf = [0u8; 8];
        read_exact_or_ended(reader, &mut len_buf)?;
        u64::from_be_bytes(len_buf) as usize
    } else {
        let mut len_buf = [0u8; 1];
        read_exact_or_ended(reader, &mut len_buf)?;
        len_buf[0] as usize
    };

    let mut payload = vec![0u8; len];
    read_exact_or_ended(reader, &mut payload)?;

    Ok(Frame {
        flags,
        payload: Bytes::from(payload),
    })
}

fn read_exact_or_ended<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), Error> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(Error::StreamEnded),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Stateful, non-blocking frame decoder for the subscription harvester (§4.6).
///
/// Bytes are pushed in with [`FrameDecoder::feed`] as they become available
/// from a non-blocking read; [`FrameDecoder::poll`] yields as many complete
/// frames as are buffered and leaves a partial frame staged for the next
/// `feed`/`poll` round.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    staging: BytesMut,
}

impl FrameDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            staging: BytesMut::new(),
        }
    }

    /// Append freshly-read bytes to the internal buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.staging.extend_from_slice(bytes);
    }

    /// Try to decode one frame from whatever has been `feed`-ed so far.
    ///
    /// Returns `Ok(None)` ("need more data") rather than blocking or
    /// erroring on a short buffer — the harvester's `would_block` contract
    /// (§4.6) is implemented by the caller treating `Ok(None)` plus an
    /// empty non-blocking read as harvest-complete.
    pub fn poll(&mut self) -> Result<Option<Frame>, Error> {
        if self.staging.is_empty() {
            return Ok(None);
        }
        let flags = self.staging[0];
        if !LEGAL_FLAGS.contains(&flags) {
            return Err(Error::BadFrame(format!("illegal flag byte 0x{flags:02x}")));
        }

        let header_len = if is_long(flags) { 9 } else { 2 };
        if self.staging.len() < header_len {
            return Ok(None);
        }

        let body_len = if is_long(flags) {
            let mut len_bytes = &self.staging[1..9];
            len_bytes.get_u64() as usize
        } else {
            self.staging[1] as usize
        };

        let total_len = header_len + body_len;
        if self.staging.len() < total_len {
            return Ok(None);
        }

        let mut frame_bytes = self.staging.split_to(total_len);
        frame_bytes.advance(header_len);
        Ok(Some(Frame {
            flags,
            payload: frame_bytes.freeze(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn round_trip(payload: &[u8], more: bool) {
        let encoded = encode_message(payload, more);
        let mut cursor = Cursor::new(encoded.to_vec());
        let frame = parse(&mut cursor).unwrap();
        assert_eq!(frame.payload.as_ref(), payload);
        assert_eq!(frame.more(), more);
        assert!(!frame.is_command());
    }

    #[test]
    fn p1_frame_round_trip() {
        for len in [0usize, 1, 255, 256, 65535, 65536] {
            let payload = vec![0xAB; len];
            round_trip(&payload, false);
            round_trip(&payload, true);
        }
    }

    #[test]
    fn p2_flag_byte_correctness() {
        let short = vec![0u8; 255];
        let long = vec![0u8; 256];
        assert_eq!(encode_message(&short, false)[0], 0x00);
        assert_eq!(encode_message(&long, false)[0], 0x02);
        assert_eq!(encode_message(&short, true)[0], 0x01);
        assert_eq!(encode_message(&long, true)[0], 0x03);
        assert_eq!(encode_command(&short)[0], 0x04);
        assert_eq!(encode_command(&long)[0], 0x06);
    }

    #[test]
    fn command_frame_round_trip() {
        let encoded = encode_command(b"hello");
        let mut cursor = Cursor::new(encoded.to_vec());
        let frame = parse(&mut cursor).unwrap();
        assert!(frame.is_command());
        assert_eq!(frame.payload.as_ref(), b"hello");
    }

    #[test]
    fn short_read_is_stream_ended() {
        let mut cursor = Cursor::new(vec![0x00, 0x05, b'h', b'i']); // claims 5 bytes, has 2
        assert!(matches!(parse(&mut cursor), Err(Error::StreamEnded)));
    }

    #[test]
    fn illegal_flag_byte_is_bad_frame() {
        let mut cursor = Cursor::new(vec![0xFF, 0x00]);
        assert!(matches!(parse(&mut cursor), Err(Error::BadFrame(_))));
    }

    #[test]
    fn decoder_handles_fragmentation_across_feeds() {
        let encoded = encode_message(b"weather", false);
        let mut decoder = FrameDecoder::new();
        decoder.feed(&encoded[..1]);
        assert!(decoder.poll().unwrap().is_none());
        decoder.feed(&encoded[1..]);
        let frame = decoder.poll().unwrap().unwrap();
        assert_eq!(frame.payload.as_ref(), b"weather");
    }

    #[test]
    fn decoder_yields_multiple_buffered_frames() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(&encode_message(b"one", false));
        decoder.feed(&encode_message(b"two", false));
        assert_eq!(decoder.poll().unwrap().unwrap().payload.as_ref(), b"one");
        assert_eq!(decoder.poll().unwrap().unwrap().payload.as_ref(), b"two");
        assert!(decoder.poll().unwrap().is_none());
    }
}
