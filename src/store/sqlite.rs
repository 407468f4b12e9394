//! SQLite-backed implementation of the storage traits.

use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row, ToSql};

use crate::error::{AppError, Result};
use crate::models::{AdminUser, FileType, Key, Software};
use crate::store::{init_db, KeyStore, SoftwareStore, UserStore};

pub type DbPool = Pool<SqliteConnectionManager>;

pub fn create_pool(database_path: &str) -> std::result::Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}

const SOFTWARE_COLS: &str = "id, name, file_type, download_urls, created_at, updated_at";

const KEY_COLS: &str = "id, code, software_id, created_at, valid_until, first_used_at";

/// Trait for constructing a type from a database row.
trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

impl FromRow for Software {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let file_type: String = row.get(2)?;
        let file_type = FileType::from_str(&file_type).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(
                2,
                "file_type".to_string(),
                rusqlite::types::Type::Text,
            )
        })?;
        let urls: String = row.get(3)?;
        Ok(Software {
            id: row.get(0)?,
            name: row.get(1)?,
            file_type,
            download_urls: serde_json::from_str(&urls).unwrap_or_default(),
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl FromRow for Key {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Key {
            id: row.get(0)?,
            code: row.get(1)?,
            software_id: row.get(2)?,
            created_at: row.get(3)?,
            valid_until: row.get(4)?,
            first_used_at: row.get(5)?,
        })
    }
}

impl FromRow for AdminUser {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(AdminUser {
            username: row.get(0)?,
            password_hash: row.get(1)?,
            updated_at: row.get(2)?,
        })
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// All three storage traits backed by one pooled SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and initialize the schema.
    pub fn open(path: &str) -> Result<Self> {
        let pool = create_pool(path)?;
        {
            let conn = pool.get()?;
            init_db(&conn)?;
        }
        Ok(Self { pool })
    }

    /// An in-memory store for tests. The pool is pinned to a single
    /// connection so every caller sees the same database.
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(AppError::Pool)?;
        {
            let conn = pool.get()?;
            init_db(&conn)?;
        }
        Ok(Self { pool })
    }

    fn query_one<T: FromRow>(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Option<T>> {
        let conn = self.pool.get()?;
        conn.query_row(sql, params, T::from_row)
            .optional()
            .map_err(Into::into)
    }

    fn query_all<T: FromRow>(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<T>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, T::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl SoftwareStore for SqliteStore {
    fn insert(&self, software: &Software) -> Result<()> {
        let conn = self.pool.get()?;
        let urls = serde_json::to_string(&software.download_urls)?;
        conn.execute(
            "INSERT INTO software (id, name, file_type, download_urls, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &software.id,
                &software.name,
                software.file_type.as_str(),
                &urls,
                software.created_at,
                software.updated_at,
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(crate::error::msg::DUPLICATE_SOFTWARE_NAME.into())
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Software>> {
        self.query_one(
            &format!("SELECT {} FROM software WHERE id = ?1", SOFTWARE_COLS),
            &[&id],
        )
    }

    fn get_by_name(&self, name: &str) -> Result<Option<Software>> {
        self.query_one(
            &format!("SELECT {} FROM software WHERE name = ?1", SOFTWARE_COLS),
            &[&name],
        )
    }

    fn list(&self) -> Result<Vec<Software>> {
        self.query_all(
            &format!(
                "SELECT {} FROM software ORDER BY created_at DESC",
                SOFTWARE_COLS
            ),
            &[],
        )
    }

    fn update(&self, software: &Software) -> Result<bool> {
        let conn = self.pool.get()?;
        let urls = serde_json::to_string(&software.download_urls)?;
        let affected = conn
            .execute(
                "UPDATE software
                 SET name = ?1, file_type = ?2, download_urls = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    &software.name,
                    software.file_type.as_str(),
                    &urls,
                    software.updated_at,
                    &software.id,
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(crate::error::msg::DUPLICATE_SOFTWARE_NAME.into())
                } else {
                    AppError::from(e)
                }
            })?;
        Ok(affected > 0)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let affected = conn.execute("DELETE FROM software WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

impl KeyStore for SqliteStore {
    fn insert_batch(&self, keys: &[Key]) -> Result<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        for key in keys {
            tx.execute(
                "INSERT INTO keys (id, code, software_id, created_at, valid_until, first_used_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    &key.id,
                    &key.code,
                    &key.software_id,
                    key.created_at,
                    key.valid_until,
                    key.first_used_at,
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Duplicate key code".into())
                } else {
                    AppError::from(e)
                }
            })?;
        }
        tx.commit()?;
        Ok(())
    }

    fn code_exists(&self, code: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM keys WHERE code = ?1",
            params![code],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn get_by_code(&self, code: &str) -> Result<Option<Key>> {
        self.query_one(
            &format!("SELECT {} FROM keys WHERE code = ?1", KEY_COLS),
            &[&code],
        )
    }

    fn list(&self) -> Result<Vec<Key>> {
        self.query_all(
            &format!("SELECT {} FROM keys ORDER BY created_at DESC", KEY_COLS),
            &[],
        )
    }

    fn mark_first_used(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        let conn = self.pool.get()?;
        let affected = conn.execute(
            "UPDATE keys SET first_used_at = ?1 WHERE id = ?2 AND first_used_at IS NULL",
            params![at, id],
        )?;
        Ok(affected > 0)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let affected = conn.execute("DELETE FROM keys WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    fn delete_for_software(&self, software_id: &str) -> Result<usize> {
        let conn = self.pool.get()?;
        let affected = conn.execute(
            "DELETE FROM keys WHERE software_id = ?1",
            params![software_id],
        )?;
        Ok(affected)
    }
}

impl UserStore for SqliteStore {
    fn get(&self) -> Result<Option<AdminUser>> {
        self.query_one(
            "SELECT username, password_hash, updated_at FROM admin_user WHERE id = 1",
            &[],
        )
    }

    fn save(&self, user: &AdminUser) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO admin_user (id, username, password_hash, updated_at)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                 username = excluded.username,
                 password_hash = excluded.password_hash,
                 updated_at = excluded.updated_at",
            params![&user.username, &user.password_hash, user.updated_at],
        )?;
        Ok(())
    }
}
