//! Storage traits and the SQLite implementation.
//!
//! The catalog and registry talk to these traits rather than a concrete
//! database handle, so the persistence medium can be swapped without
//! touching business logic. The contract is record shape, not storage
//! format.

mod schema;
mod sqlite;

pub use schema::init_db;
pub use sqlite::{create_pool, DbPool, SqliteStore};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{AdminUser, Key, Software};

pub trait SoftwareStore: Send + Sync {
    fn insert(&self, software: &Software) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<Software>>;
    fn get_by_name(&self, name: &str) -> Result<Option<Software>>;
    fn list(&self) -> Result<Vec<Software>>;
    /// Returns false if no record with the software's id exists.
    fn update(&self, software: &Software) -> Result<bool>;
    /// Returns false if no record with the id exists.
    fn delete(&self, id: &str) -> Result<bool>;
}

pub trait KeyStore: Send + Sync {
    /// Persist a batch of freshly generated keys in a single transaction.
    ///
    /// Fails with `Conflict` if any code collides with an already-stored
    /// one; the store's uniqueness check at write time is authoritative,
    /// even against batches written concurrently by other requests.
    fn insert_batch(&self, keys: &[Key]) -> Result<()>;
    fn code_exists(&self, code: &str) -> Result<bool>;
    fn get_by_code(&self, code: &str) -> Result<Option<Key>>;
    fn list(&self) -> Result<Vec<Key>>;
    /// Stamp `first_used_at` if and only if it is currently unset.
    ///
    /// Returns false when the key was already activated (or does not
    /// exist); the stored timestamp is never overwritten.
    fn mark_first_used(&self, id: &str, at: DateTime<Utc>) -> Result<bool>;
    fn delete(&self, id: &str) -> Result<bool>;
    /// Remove every key referencing the software id; returns the count.
    fn delete_for_software(&self, software_id: &str) -> Result<usize>;
}

pub trait UserStore: Send + Sync {
    /// Fetch the singleton admin record, if provisioned.
    fn get(&self) -> Result<Option<AdminUser>>;
    /// Insert or replace the singleton admin record.
    fn save(&self, user: &AdminUser) -> Result<()>;
}
