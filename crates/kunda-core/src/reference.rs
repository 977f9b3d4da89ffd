//! # Transfer References
//!
//! Human-readable transfer references quoted on bank transfers and shown
//! on receipts. Format: `KP` + base-36 millisecond timestamp + 6 random
//! base-36 characters, all upper-case (e.g. `KPM5X2J9QA7F3K1Z`).
//!
//! Generation here is purely local. Uniqueness against already-issued
//! references is the caller's concern.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Prefix carried by every reference.
pub const REFERENCE_PREFIX: &str = "KP";

/// Number of random characters appended after the timestamp.
pub const RANDOM_SUFFIX_LEN: usize = 6;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A transfer reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransferReference(String);

impl TransferReference {
    /// Generate a reference from a timestamp and a random source.
    pub fn generate<R: Rng + ?Sized>(at: DateTime<Utc>, rng: &mut R) -> Self {
        let millis = u64::try_from(at.timestamp_millis()).unwrap_or(0);
        let mut s = String::with_capacity(REFERENCE_PREFIX.len() + 9 + RANDOM_SUFFIX_LEN);
        s.push_str(REFERENCE_PREFIX);
        s.push_str(&to_base36(millis));
        for _ in 0..RANDOM_SUFFIX_LEN {
            s.push(char::from(BASE36[rng.gen_range(0..BASE36.len())]));
        }
        Self(s)
    }

    /// Validate an existing reference string.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let body = s
            .strip_prefix(REFERENCE_PREFIX)
            .ok_or_else(|| ValidationError::InvalidIdentifier(format!("reference {s:?}")))?;
        if body.len() <= RANDOM_SUFFIX_LEN
            || !body
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
        {
            return Err(ValidationError::InvalidIdentifier(format!("reference {s:?}")));
        }
        Ok(Self(s.to_string()))
    }

    /// The reference text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransferReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TransferReference {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TransferReference> for String {
    fn from(r: TransferReference) -> Self {
        r.0
    }
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::with_capacity(13);
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
