//! Contact-unlock persistence.
//!
//! Gates display of contact details behind a consent form. The token is
//! a deliberately weak, reversible checksum (salt ships with the
//! client) — a UX gate, not access control. Do not "upgrade" it: stored
//! tokens must keep verifying against this exact hash across reloads.

use std::sync::Arc;

use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::storage::Storage;

const UNLOCK_STORAGE_KEY: &str = "portfolio_contact_unlock";
const UNLOCK_EXPIRY_DAYS: i64 = 30;
const SECRET_SALT: &str = "portfolio_2024_secure_unlock";

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Persisted unlock state. `token` must equal
/// `simple_hash("name:email:timestamp:salt")`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockRecord {
    pub name: String,
    pub email: String,
    pub timestamp: i64,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockExpiryInfo {
    pub is_expired: bool,
    pub days_remaining: i64,
}

/// 32-bit rolling hash over UTF-16 code units, `h = (h << 5) - h + c`
/// with wrapping arithmetic, absolute value rendered in base-36.
/// Matches the checksum tokens were originally minted with.
pub fn simple_hash(input: &str) -> String {
    let mut hash: i32 = 0;
    for unit in input.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32);
    }
    to_base36(hash.unsigned_abs())
}

fn to_base36(mut n: u32) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let digits = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    while n > 0 {
        out.push(digits[(n % 36) as usize] as char);
        n /= 36;
    }
    out.iter().rev().collect()
}

fn unlock_token(name: &str, email: &str, timestamp: i64) -> String {
    simple_hash(&format!("{}:{}:{}:{}", name, email, timestamp, SECRET_SALT))
}

/// Expiry instant for a stored timestamp, or `None` when the addition
/// would overflow (only possible for a tampered record).
fn expiry_of(timestamp: i64) -> Option<i64> {
    timestamp.checked_add(UNLOCK_EXPIRY_DAYS * MS_PER_DAY)
}

/// Reads and writes the unlock record. Storage failures are swallowed:
/// the gate fails closed and the user unlocks again.
pub struct UnlockStore {
    storage: Arc<dyn Storage>,
}

impl UnlockStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        UnlockStore { storage }
    }

    fn read_record(&self) -> Option<UnlockRecord> {
        let raw = match self.storage.get_item(UNLOCK_STORAGE_KEY) {
            Ok(v) => v?,
            Err(e) => {
                warn!("Error reading unlock record: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Corrupt unlock record: {}", e);
                None
            }
        }
    }

    /// Whether contact information should currently be shown.
    /// Deletes the record when it has expired; a token that no longer
    /// matches the stored fields counts as locked.
    pub fn is_contact_unlocked(&self) -> bool {
        let record = match self.read_record() {
            Some(r) => r,
            None => return false,
        };

        // A timestamp whose expiry overflows i64 can only come from a
        // tampered record; treat it like any other invalid record.
        let expiry = match expiry_of(record.timestamp) {
            Some(t) => t,
            None => {
                self.clear_contact_unlock();
                return false;
            }
        };
        if Utc::now().timestamp_millis() > expiry {
            self.clear_contact_unlock();
            return false;
        }

        record.token == unlock_token(&record.name, &record.email, record.timestamp)
    }

    /// Stamp the current time, compute the token, and persist —
    /// unconditionally overwriting any prior record.
    pub fn set_contact_unlocked(&self, name: &str, email: &str) {
        let timestamp = Utc::now().timestamp_millis();
        let record = UnlockRecord {
            name: name.to_string(),
            email: email.to_string(),
            timestamp,
            token: unlock_token(name, email, timestamp),
        };
        let raw = match serde_json::to_string(&record) {
            Ok(r) => r,
            Err(e) => {
                warn!("Error encoding unlock record: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set_item(UNLOCK_STORAGE_KEY, &raw) {
            warn!("Error storing unlock state: {}", e);
        }
    }

    /// Delete the record. Idempotent.
    pub fn clear_contact_unlock(&self) {
        if let Err(e) = self.storage.remove_item(UNLOCK_STORAGE_KEY) {
            warn!("Error clearing unlock state: {}", e);
        }
    }

    /// Expiry info for the stored record, if any. Pure read: unlike
    /// [`is_contact_unlocked`](Self::is_contact_unlocked), an expired
    /// record is reported, not deleted.
    pub fn get_unlock_expiry_info(&self) -> Option<UnlockExpiryInfo> {
        let record = self.read_record()?;
        let now = Utc::now().timestamp_millis();
        let expiry = expiry_of(record.timestamp)?;
        let remaining_ms = expiry.saturating_sub(now);
        let days_remaining = if remaining_ms <= 0 {
            0
        } else {
            (remaining_ms + MS_PER_DAY - 1) / MS_PER_DAY
        };
        Some(UnlockExpiryInfo {
            is_expired: now > expiry,
            days_remaining,
        })
    }
}
