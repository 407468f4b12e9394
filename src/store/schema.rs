use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Software catalog entries. Names are unique; the catalog checks
        -- explicitly for a friendly Conflict, the index is the backstop.
        CREATE TABLE IF NOT EXISTS software (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            file_type TEXT NOT NULL CHECK (file_type IN ('single', 'multiple')),
            download_urls TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT
        );

        -- License keys. The UNIQUE index on code is the authoritative
        -- uniqueness check at write time; concurrent batches that draw the
        -- same code fail here and get regenerated.
        -- No foreign key on software_id: a crash between a software delete
        -- and its key sweep may orphan keys, which simply join to NULL.
        CREATE TABLE IF NOT EXISTS keys (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            software_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            valid_until TEXT,
            first_used_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_keys_software ON keys(software_id);

        -- Singleton admin identity.
        CREATE TABLE IF NOT EXISTS admin_user (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            username TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
}
