//! SQLite schema
//!
//! Profiles own their links and per-day traffic buckets. Username
//! uniqueness and counter atomicity are enforced here, by the database,
//! rather than by callers.

use rusqlite::{Connection, OptionalExtension, Result};

/// Bumped whenever a table changes shape
pub const SCHEMA_VERSION: i32 = 1;

/// Create every table and index that is missing, then record the version
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Profiles (analytics counters are columns so they can be bumped in place)
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            username TEXT UNIQUE,
            theme TEXT NOT NULL DEFAULT 'light',
            is_active INTEGER NOT NULL DEFAULT 1,
            profile_image TEXT,
            views INTEGER NOT NULL DEFAULT 0,
            clicks INTEGER NOT NULL DEFAULT 0,
            last_viewed_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Links (ordered children of a profile)
        CREATE TABLE IF NOT EXISTS links (
            id TEXT PRIMARY KEY,
            profile_id TEXT NOT NULL,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            platform TEXT NOT NULL DEFAULT 'custom',
            icon TEXT,
            position INTEGER NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            clicks INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
        );

        -- Per-day traffic buckets
        CREATE TABLE IF NOT EXISTS traffic (
            profile_id TEXT NOT NULL,
            day TEXT NOT NULL,
            views INTEGER NOT NULL DEFAULT 0,
            clicks INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (profile_id, day),
            FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
        );

        -- Local authentication
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            display_name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            disabled INTEGER NOT NULL DEFAULT 0,
            failed_attempts INTEGER NOT NULL DEFAULT 0,
            last_failed_at INTEGER,
            created_at INTEGER NOT NULL
        );

        -- The signed-in user (at most one row)
        CREATE TABLE IF NOT EXISTS auth_session (
            slot INTEGER PRIMARY KEY CHECK (slot = 0),
            user_id TEXT NOT NULL,
            signed_in_at INTEGER NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );

        -- Password reset requests
        CREATE TABLE IF NOT EXISTS password_resets (
            token TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            requested_at INTEGER NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_profiles_user_id ON profiles(user_id);
        CREATE INDEX IF NOT EXISTS idx_profiles_created_at ON profiles(created_at);
        CREATE INDEX IF NOT EXISTS idx_links_profile_position ON links(profile_id, position);
        CREATE INDEX IF NOT EXISTS idx_traffic_day ON traffic(day);
        "#,
    )?;

    conn.execute(
        "INSERT INTO schema_info (key, value) VALUES ('version', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Version recorded in `schema_info`, if the table and row exist
pub fn schema_version(conn: &Connection) -> Result<Option<i32>> {
    let has_table = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_info'")?
        .exists([])?;
    if !has_table {
        return Ok(None);
    }

    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM schema_info WHERE key = 'version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(stored.and_then(|v| v.parse().ok()))
}

/// True for a fresh database or one written by an older schema
pub fn needs_init(conn: &Connection) -> bool {
    !matches!(schema_version(conn), Ok(Some(v)) if v >= SCHEMA_VERSION)
}
