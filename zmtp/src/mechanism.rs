//! Security mechanism negotiation (§3).
//!
//! Only NULL is implemented. The mechanism field must still be parsed for
//! any peer, tolerantly: case-insensitive and zero-padding-tolerant, with
//! an all-zero field treated as NULL.

use zmtp_core::error::Error;

/// The closed set of security mechanisms named by ZMTP 3.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMechanism {
    Null,
    Plain,
    Curve,
}

impl SecurityMechanism {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Plain => "PLAIN",
            Self::Curve => "CURVE",
        }
    }

    /// Parse a 20-byte (or shorter) zero-padded ASCII mechanism field.
    ///
    /// Matching is case-insensitive; trailing NUL padding is trimmed first.
    /// An empty (all-zero) field is treated as NULL (§4.2).
    pub fn parse(field: &[u8]) -> Result<Self, Error> {
        let trimmed = field
            .iter()
            .position(|&b| b == 0)
            .map_or(field, |i| &field[..i]);

        if trimmed.is_empty() {
            return Ok(Self::Null);
        }

        if trimmed.eq_ignore_ascii_case(b"NULL") {
            Ok(Self::Null)
        } else if trimmed.eq_ignore_ascii_case(b"PLAIN") {
            Ok(Self::Plain)
        } else if trimmed.eq_ignore_ascii_case(b"CURVE") {
            Ok(Self::Curve)
        } else {
            Err(Error::MechanismUnsupported(
                String::from_utf8_lossy(trimmed).into_owned(),
            ))
        }
    }

    /// Handshake-time acceptance check (§7): only NULL is supported.
    pub fn require_null(&self) -> Result<(), Error> {
        match self {
            Self::Null => Ok(()),
            other => Err(Error::MechanismUnsupported(other.as_str().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_field_is_null() {
        assert_eq!(SecurityMechanism::parse(&[0u8; 20]).unwrap(), SecurityMechanism::Null);
    }

    #[test]
    fn case_insensitive_and_padding_tolerant() {
        let mut field = [0u8; 20];
        field[..4].copy_from_slice(b"null");
        assert_eq!(SecurityMechanism::parse(&field).unwrap(), SecurityMechanism::Null);
    }

    #[test]
    fn p8_plain_mechanism_rejected() {
        let mut field = [0u8; 20];
        field[..5].copy_from_slice(b"PLAIN");
        let mech = SecurityMechanism::parse(&field).unwrap();
        assert_eq!(mech, SecurityMechanism::Plain);
        assert!(mech.require_null().is_err());
    }

    #[test]
    fn unknown_mechanism_is_unsupported() {
        let mut field = [0u8; 20];
        field[..6].copy_from_slice(b"BOGUS\0");
        assert!(SecurityMechanism::parse(&field[..5]).is_err());
    }
}
