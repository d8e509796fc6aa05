//! Registry value types.

use crate::phone::PhoneKey;
use chrono::{DateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of digits in a generated code.
pub const CODE_LENGTH: usize = 6;

const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

/// A freshly generated verification code.
///
/// The digits are only reachable through [`OtpCode::as_str`]; `Debug` output
/// is redacted so codes do not end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Generate a uniformly random six-digit code. The leading digit is
    /// never zero.
    pub fn generate() -> Self {
        let value = rand::thread_rng().gen_range(CODE_MIN..=CODE_MAX);
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

/// One outstanding verification challenge.
#[derive(Debug, Clone)]
pub struct OtpEntry {
    /// Registry key this entry is stored under
    pub phone_key: PhoneKey,

    /// SHA-256 hex digest of the code
    pub code_hash: String,

    /// When the code was generated
    pub issued_at: DateTime<Utc>,

    /// The code is rejected at or after this instant
    pub expires_at: DateTime<Utc>,

    /// Wrong guesses left before the entry is discarded
    pub attempts_remaining: u32,
}

impl OtpEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Check a submitted code against the stored digest.
    pub fn matches(&self, submitted: &str) -> bool {
        let submitted = hash_code(submitted.trim());
        constant_time_eq(submitted.as_bytes(), self.code_hash.as_bytes())
    }
}

/// A generated code that has not been stored yet.
///
/// Produced by [`OtpRegistry::prepare_at`](crate::OtpRegistry::prepare_at) and
/// stored by [`OtpRegistry::commit`](crate::OtpRegistry::commit), which lets
/// the caller deliver the code first and only keep it once delivery succeeded.
#[derive(Debug, Clone)]
pub struct PendingOtp {
    pub(crate) entry: OtpEntry,
    pub(crate) code: OtpCode,
}

impl PendingOtp {
    pub fn phone_key(&self) -> &PhoneKey {
        &self.entry.phone_key
    }

    pub fn code(&self) -> &OtpCode {
        &self.code
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.entry.expires_at
    }
}

/// Hash a code using SHA-256.
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
