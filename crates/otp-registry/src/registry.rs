//! In-memory OTP registry with TTL expiration.

use crate::error::OtpError;
use crate::phone::PhoneKey;
use crate::types::{hash_code, OtpCode, OtpEntry, PendingOtp};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Outcome of checking a code while the write lock is held.
enum Check {
    Accepted,
    Expired,
    Mismatch(u32),
}

/// Pending verification codes indexed by phone key.
///
/// Cloning is cheap and every clone shares the same map. All mutations go
/// through one write lock, and no method holds it across an `.await` on
/// anything other than the lock itself.
#[derive(Clone)]
pub struct OtpRegistry {
    entries: Arc<RwLock<HashMap<PhoneKey, OtpEntry>>>,
    ttl: Duration,
    max_attempts: u32,
}

impl OtpRegistry {
    /// Create an empty registry.
    ///
    /// `max_attempts` is the number of wrong codes tolerated per issuance;
    /// zero is treated as one.
    pub fn new(ttl: Duration, max_attempts: u32) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Generate a code for `phone_key` without storing it.
    pub fn prepare_at(&self, phone_key: &PhoneKey, now: DateTime<Utc>) -> PendingOtp {
        let code = OtpCode::generate();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        PendingOtp {
            entry: OtpEntry {
                phone_key: phone_key.clone(),
                code_hash: hash_code(code.as_str()),
                issued_at: now,
                expires_at,
                attempts_remaining: self.max_attempts,
            },
            code,
        }
    }

    pub fn prepare(&self, phone_key: &PhoneKey) -> PendingOtp {
        self.prepare_at(phone_key, Utc::now())
    }

    /// Store a prepared code, replacing any code pending for the same number.
    ///
    /// A code prepared before the one already stored is dropped, so the
    /// latest issuance wins no matter which delivery finished first.
    /// Returns whether the code was stored.
    #[instrument(skip(self, pending), fields(phone_number = %pending.phone_key()))]
    pub async fn commit(&self, pending: PendingOtp) -> bool {
        let PendingOtp { entry, .. } = pending;
        let mut entries = self.entries.write().await;

        match entries.get(&entry.phone_key) {
            Some(current) if current.issued_at > entry.issued_at => {
                debug!(
                    stored_issued_at = %current.issued_at,
                    "Newer code already pending, discarding older one"
                );
                false
            }
            Some(_) => {
                debug!("Replaced previously pending code");
                entries.insert(entry.phone_key.clone(), entry);
                true
            }
            None => {
                entries.insert(entry.phone_key.clone(), entry);
                true
            }
        }
    }

    /// Generate and store a code in one step.
    pub async fn issue_at(&self, phone_key: &PhoneKey, now: DateTime<Utc>) -> OtpCode {
        let pending = self.prepare_at(phone_key, now);
        let code = pending.code.clone();
        self.commit(pending).await;
        code
    }

    pub async fn issue(&self, phone_key: &PhoneKey) -> OtpCode {
        self.issue_at(phone_key, Utc::now()).await
    }

    /// Check a submitted code.
    ///
    /// A correct code consumes the entry. An expired entry is removed and
    /// reported as [`OtpError::Expired`]. A wrong code costs one attempt;
    /// the entry is removed once none remain.
    #[instrument(skip(self, phone_key, submitted, now), fields(phone_number = %phone_key))]
    pub async fn verify_at(
        &self,
        phone_key: &PhoneKey,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<(), OtpError> {
        let mut entries = self.entries.write().await;

        let check = match entries.get_mut(phone_key) {
            None => return Err(OtpError::NotFound(phone_key.to_string())),
            Some(entry) if entry.is_expired(now) => Check::Expired,
            Some(entry) if entry.matches(submitted) => Check::Accepted,
            Some(entry) => {
                entry.attempts_remaining = entry.attempts_remaining.saturating_sub(1);
                Check::Mismatch(entry.attempts_remaining)
            }
        };

        match check {
            Check::Accepted => {
                entries.remove(phone_key);
                info!("Verification code accepted");
                Ok(())
            }
            Check::Expired => {
                entries.remove(phone_key);
                debug!("Verification code expired");
                Err(OtpError::Expired)
            }
            Check::Mismatch(attempts_remaining) => {
                if attempts_remaining == 0 {
                    entries.remove(phone_key);
                    info!("Attempts exhausted, discarding code");
                } else {
                    debug!(attempts_remaining, "Verification code mismatch");
                }
                Err(OtpError::Mismatch { attempts_remaining })
            }
        }
    }

    pub async fn verify(&self, phone_key: &PhoneKey, submitted: &str) -> Result<(), OtpError> {
        self.verify_at(phone_key, submitted, Utc::now()).await
    }

    /// Remove every entry that has expired by `now`, returning how many were
    /// removed.
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();

        entries.retain(|_, entry| !entry.is_expired(now));

        before - entries.len()
    }

    /// Number of stored entries, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn contains(&self, phone_key: &PhoneKey) -> bool {
        self.entries.read().await.contains_key(phone_key)
    }

    /// Expiry of the code pending for `phone_key`, if any.
    pub async fn expires_at(&self, phone_key: &PhoneKey) -> Option<DateTime<Utc>> {
        self.entries
            .read()
            .await
            .get(phone_key)
            .map(|entry| entry.expires_at)
    }
}
