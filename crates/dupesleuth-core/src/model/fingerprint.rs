/// SHA-256 content fingerprint.
///
/// Stored as the raw 32-byte digest so comparisons and ordering are plain
/// byte comparisons. Ordering is lexicographic on the bytes, which is the same
/// as ordering the digests as 256-bit big-endian integers.
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of a fingerprint in bytes.
pub const FINGERPRINT_LEN: usize = 32;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Lowercase hex rendering, 64 characters.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }

    /// First 12 hex characters, enough to tell groups apart on screen.
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(12);
        hex
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

/// Error returned when parsing a fingerprint from hex text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFingerprintError {
    #[error("expected 64 hex characters, got {0}")]
    Length(usize),
    #[error("invalid hex character {0:?}")]
    InvalidChar(char),
}

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != FINGERPRINT_LEN * 2 {
            return Err(ParseFingerprintError::Length(s.len()));
        }

        let mut bytes = [0u8; FINGERPRINT_LEN];
        let mut chars = s.chars();
        for byte in bytes.iter_mut() {
            let hi = hex_value(chars.next())?;
            let lo = hex_value(chars.next())?;
            *byte = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }
}

fn hex_value(c: Option<char>) -> Result<u8, ParseFingerprintError> {
    let c = c.ok_or(ParseFingerprintError::Length(0))?;
    c.to_digit(16)
        .map(|d| d as u8)
        .ok_or(ParseFingerprintError::InvalidChar(c))
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
