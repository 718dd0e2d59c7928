use crate::error::SluiceError;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

/// A checksummed-hex payout address (`0x` + 40 hex digits).
///
/// Parsing normalizes to the mixed-case checksum form, so two spellings of
/// the same address compare equal and collide as map keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Validate and normalize an address supplied by an untrusted source.
    ///
    /// All-lowercase and all-uppercase spellings are accepted and
    /// re-checksummed; mixed-case input must carry a valid checksum.
    pub fn parse(input: &str) -> Result<Self, SluiceError> {
        let trimmed = input.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .ok_or_else(|| SluiceError::InvalidAddress(trimmed.to_string()))?;

        if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SluiceError::InvalidAddress(trimmed.to_string()));
        }

        let lower = hex_part.to_ascii_lowercase();
        let checksummed = checksum(&lower);

        let uniform = hex_part == lower || hex_part == hex_part.to_ascii_uppercase();
        if !uniform && hex_part != &checksummed[2..] {
            return Err(SluiceError::InvalidAddress(trimmed.to_string()));
        }

        Ok(Self(checksummed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn checksum(lower_hex: &str) -> String {
    let hash = Keccak256::digest(lower_hex.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower_hex.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}
