//! The license key registry: generation, validation, and deletion.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{msg, AppError, OrNotFound, Result};
use crate::models::{Key, KeyWithSoftware, Software};
use crate::store::{KeyStore, SoftwareStore};

/// Character set for key codes.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Maximum keys per generation request.
const MAX_BATCH_SIZE: i64 = 100;

/// Draw attempts per code before giving up. With a 36^16 code space,
/// hitting this cap means the RNG is broken, not that the space is full.
const MAX_CODE_ATTEMPTS: usize = 32;

/// Whole-batch retries when a concurrent request wins the race on a code
/// between our uniqueness probe and the insert.
const MAX_BATCH_ATTEMPTS: usize = 3;

/// Generate a random key code: four groups of four characters from
/// `[A-Z0-9]`, e.g. `8F3K-Q2ZX-09AB-MT7C`.
pub fn generate_code() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    let mut group = || -> String {
        (0..4)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    };

    format!("{}-{}-{}-{}", group(), group(), group(), group())
}

/// Outcome of validating a key code.
#[derive(Debug, Clone)]
pub enum Validation {
    /// No key with this code exists.
    NotFound,
    /// The key exists but its validity window has passed. Expiry never
    /// mutates the key; `first_used_at` stays whatever it was.
    Expired { valid_until: DateTime<Utc> },
    /// The key is valid. `first_use` is true exactly once per key.
    Valid {
        first_use: bool,
        first_used_at: DateTime<Utc>,
        valid_until: Option<DateTime<Utc>>,
        /// None when the key was orphaned by an interrupted cascade delete.
        software: Option<Software>,
    },
}

/// Generates, validates, and deletes license keys against injected stores.
#[derive(Clone)]
pub struct KeyRegistry {
    keys: Arc<dyn KeyStore>,
    software: Arc<dyn SoftwareStore>,
}

impl KeyRegistry {
    pub fn new(keys: Arc<dyn KeyStore>, software: Arc<dyn SoftwareStore>) -> Self {
        Self { keys, software }
    }

    /// Generate `count` keys for a software entry, persisted as one batch.
    ///
    /// `validity_days` of None or 0 produces non-expiring keys. Codes are
    /// unique across the whole registry: each draw is checked against the
    /// store and the in-flight batch, and the store's uniqueness constraint
    /// at write time settles races with concurrent batches.
    pub fn generate(
        &self,
        software_id: &str,
        count: i64,
        validity_days: Option<i64>,
    ) -> Result<Vec<Key>> {
        if count < 1 || count > MAX_BATCH_SIZE {
            return Err(AppError::BadRequest(format!(
                "Count must be between 1 and {}",
                MAX_BATCH_SIZE
            )));
        }
        if let Some(days) = validity_days {
            if days < 0 {
                return Err(AppError::BadRequest(
                    "validityDays must be non-negative".into(),
                ));
            }
        }

        self.software
            .get(software_id)?
            .or_not_found(msg::SOFTWARE_NOT_FOUND)?;

        let now = Utc::now();
        let valid_until = match validity_days.filter(|days| *days > 0) {
            Some(days) => Some(
                Duration::try_days(days)
                    .and_then(|window| now.checked_add_signed(window))
                    .ok_or_else(|| AppError::BadRequest("validityDays is too large".into()))?,
            ),
            None => None,
        };

        for attempt in 0.. {
            let mut batch: Vec<Key> = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let code = self.draw_unique_code(&batch)?;
                batch.push(Key {
                    id: Uuid::new_v4().to_string(),
                    code,
                    software_id: software_id.to_string(),
                    created_at: now,
                    valid_until,
                    first_used_at: None,
                });
            }

            match self.keys.insert_batch(&batch) {
                Ok(()) => return Ok(batch),
                // A concurrent batch committed one of our codes first;
                // redraw the whole batch against the updated store.
                Err(AppError::Conflict(_)) if attempt + 1 < MAX_BATCH_ATTEMPTS => {
                    tracing::warn!("Key code race lost, regenerating batch");
                    continue;
                }
                Err(AppError::Conflict(_)) => {
                    return Err(AppError::Internal(
                        "Failed to persist a collision-free key batch".into(),
                    ));
                }
                Err(e) => return Err(e),
            }
        }
        unreachable!("bounded by MAX_BATCH_ATTEMPTS");
    }

    fn draw_unique_code(&self, batch: &[Key]) -> Result<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code();
            if batch.iter().any(|k| k.code == code) {
                continue;
            }
            if self.keys.code_exists(&code)? {
                continue;
            }
            return Ok(code);
        }
        Err(AppError::Internal(
            "Exhausted key code generation attempts".into(),
        ))
    }

    /// Validate a key code.
    ///
    /// The first successful validation stamps `first_used_at`; every later
    /// one reports the same timestamp. Keys stay valid for repeated checks
    /// until expiry; expiry checks never mutate the key.
    pub fn validate(&self, code: &str) -> Result<Validation> {
        let code = code.trim();
        let Some(key) = self.keys.get_by_code(code)? else {
            return Ok(Validation::NotFound);
        };

        let now = Utc::now();
        if key.is_expired(now) {
            return Ok(Validation::Expired {
                valid_until: key.valid_until.expect("expired key has valid_until"),
            });
        }

        let software = self.software.get(&key.software_id)?;

        if let Some(first_used_at) = key.first_used_at {
            return Ok(Validation::Valid {
                first_use: false,
                first_used_at,
                valid_until: key.valid_until,
                software,
            });
        }

        // Activation: stamp first_used_at exactly once. If a concurrent
        // validation beat us to it, report the stored timestamp instead.
        if self.keys.mark_first_used(&key.id, now)? {
            Ok(Validation::Valid {
                first_use: true,
                first_used_at: now,
                valid_until: key.valid_until,
                software,
            })
        } else {
            let key = self
                .keys
                .get_by_code(code)?
                .or_not_found(msg::KEY_NOT_FOUND)?;
            Ok(Validation::Valid {
                first_use: false,
                first_used_at: key
                    .first_used_at
                    .ok_or_else(|| AppError::Internal("Activation race left no timestamp".into()))?,
                valid_until: key.valid_until,
                software,
            })
        }
    }

    /// List all keys, newest first, joined with their software entries.
    pub fn list(&self) -> Result<Vec<KeyWithSoftware>> {
        let keys = self.keys.list()?;
        let software = self.software.list()?;

        Ok(keys
            .into_iter()
            .map(|key| {
                let entry = software.iter().find(|s| s.id == key.software_id).cloned();
                let used = key.is_used();
                KeyWithSoftware {
                    key,
                    software: entry,
                    used,
                }
            })
            .collect())
    }

    /// Delete a single key by id.
    pub fn delete(&self, key_id: &str) -> Result<()> {
        if !self.keys.delete(key_id)? {
            return Err(AppError::NotFound(msg::KEY_NOT_FOUND.into()));
        }
        Ok(())
    }

    /// Remove every key belonging to a software entry. Called by the
    /// catalog's delete path; not exposed as its own route.
    pub fn cascade_delete_for_software(&self, software_id: &str) -> Result<usize> {
        self.keys.delete_for_software(software_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_format() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 19);
            let groups: Vec<&str> = code.split('-').collect();
            assert_eq!(groups.len(), 4);
            for group in groups {
                assert_eq!(group.len(), 4);
                assert!(group
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
            }
        }
    }
}
