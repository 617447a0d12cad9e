//! Canonical object framing
//!
//! ```text
//! <kind> SP <decimal payload length> NUL <payload>
//! ```
//!
//! The frame is both the digest input and the bytes that get compressed, so
//! the kind and declared length are bound into an object's identity.

use super::{Hash, ObjectKind};
use crate::CorruptKind;

const SEPARATOR: u8 = 0;

/// A decoded frame borrowing its payload from the frame buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame<'a> {
    pub kind: ObjectKind,
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn new(kind: ObjectKind, payload: &'a [u8]) -> Self {
        Frame { kind, payload }
    }

    /// The `"<kind> <len>"` header, without the separator
    pub fn header(&self) -> String {
        format!("{} {}", self.kind, self.payload.len())
    }

    /// Serialize to the canonical byte layout
    pub fn encode(&self) -> Vec<u8> {
        let header = self.header();
        let mut out = Vec::with_capacity(header.len() + 1 + self.payload.len());
        out.extend_from_slice(header.as_bytes());
        out.push(SEPARATOR);
        out.extend_from_slice(self.payload);
        out
    }

    /// Fingerprint of the encoded frame, without materializing it
    pub fn hash(&self) -> Hash {
        Hash::digest_many(&[self.header().as_bytes(), &[SEPARATOR], self.payload])
    }

    /// Parse a frame, checking the header against the payload
    pub fn decode(bytes: &'a [u8]) -> std::result::Result<Self, CorruptKind> {
        let nul = bytes
            .iter()
            .position(|&b| b == SEPARATOR)
            .ok_or(CorruptKind::MissingSeparator)?;
        let (header, rest) = bytes.split_at(nul);
        let payload = &rest[1..];

        let bad_header = || CorruptKind::BadHeader(String::from_utf8_lossy(header).into_owned());

        let space = header.iter().position(|&b| b == b' ').ok_or_else(bad_header)?;
        let kind = ObjectKind::from_bytes(&header[..space]).ok_or_else(bad_header)?;

        let len_digits = &header[space + 1..];
        let non_canonical = len_digits.len() > 1 && len_digits[0] == b'0';
        if len_digits.is_empty() || non_canonical || !len_digits.iter().all(u8::is_ascii_digit) {
            return Err(bad_header());
        }
        let declared: usize = std::str::from_utf8(len_digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(bad_header)?;

        if declared != payload.len() {
            return Err(CorruptKind::LengthMismatch {
                declared,
                actual: payload.len(),
            });
        }

        Ok(Frame { kind, payload })
    }
}
