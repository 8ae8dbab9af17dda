//! SQLite access layer
//!
//! Row-level reads and writes for profiles, links and traffic. Validation
//! and orchestration live in [`crate::store::Store`]; this module only
//! knows how records map to tables.
//!
//! ## Tables
//!
//! - `profiles` - Profile records with their view/click counters
//! - `links` - Links, keyed by id, ordered by `position` within a profile
//! - `traffic` - Per-day view/click buckets

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::analytics;
use crate::editor;
use crate::error::{Error, Result};
use crate::models::{Link, Metric, Platform, Profile, Theme, TrafficDay};
use crate::storage::schema::{init_schema, needs_init};

const PROFILE_COLUMNS: &str = "id, user_id, title, description, username, theme, is_active, \
     profile_image, views, clicks, last_viewed_at, created_at, updated_at";

const LINK_COLUMNS: &str =
    "id, profile_id, title, url, platform, icon, position, is_active, clicks, \
     created_at, updated_at";

/// Open a connection with foreign keys on and the schema in place
pub fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    prepare(conn)
}

/// In-memory variant of [`open_connection`] (for testing)
pub fn open_memory_connection() -> Result<Connection> {
    prepare(Connection::open_in_memory()?)
}

fn prepare(conn: Connection) -> Result<Connection> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    if needs_init(&conn) {
        init_schema(&conn)?;
    }
    Ok(conn)
}

/// True when `err` is a UNIQUE violation on `column` (e.g. `profiles.username`)
pub fn is_unique_violation(err: &rusqlite::Error, column: &str) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg)) => {
            e.code == ErrorCode::ConstraintViolation && msg.contains(column)
        }
        _ => false,
    }
}

/// Profile, link and traffic tables
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database file
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: open_connection(path)?,
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: open_memory_connection()?,
        })
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ==================== Profiles ====================

    /// Insert a new profile together with its links
    pub fn insert_profile(&mut self, profile: &Profile) -> rusqlite::Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO profiles (id, user_id, title, description, username, theme,
                                  is_active, profile_image, views, clicks, last_viewed_at,
                                  created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, 0, NULL, ?, ?)
            "#,
            params![
                profile.id.to_string(),
                profile.user_id,
                profile.title,
                profile.description,
                profile.username,
                profile.theme.as_str(),
                profile.is_active,
                profile.profile_image,
                profile.created_at.timestamp_millis(),
                profile.updated_at.timestamp_millis(),
            ],
        )?;
        for link in &profile.social_links {
            upsert_link(&tx, link)?;
        }
        tx.commit()
    }

    /// Write the editable profile fields (not links, not counters)
    ///
    /// Returns false if the profile does not exist.
    pub fn update_profile_fields(&mut self, profile: &Profile) -> rusqlite::Result<bool> {
        let changed = self.conn.execute(
            r#"
            UPDATE profiles
            SET title = ?, description = ?, username = ?, theme = ?, is_active = ?,
                profile_image = ?, updated_at = ?
            WHERE id = ?
            "#,
            params![
                profile.title,
                profile.description,
                profile.username,
                profile.theme.as_str(),
                profile.is_active,
                profile.profile_image,
                profile.updated_at.timestamp_millis(),
                profile.id.to_string(),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Delete a profile; links and traffic cascade
    pub fn delete_profile(&mut self, id: Uuid) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM profiles WHERE id = ?", params![id.to_string()])?;
        Ok(deleted > 0)
    }

    /// Load a profile with links and traffic since `since`
    pub fn load_profile(&self, id: Uuid, since: NaiveDate) -> Result<Option<Profile>> {
        let sql = format!("SELECT {} FROM profiles WHERE id = ?", PROFILE_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id.to_string()], ProfileRow::from_row)
            .optional()?;

        match row {
            Some(row) => Ok(Some(self.hydrate_profile(row, since)?)),
            None => Ok(None),
        }
    }

    pub fn profile_exists(&self, id: Uuid) -> Result<bool> {
        Ok(self
            .conn
            .prepare("SELECT 1 FROM profiles WHERE id = ?")?
            .exists(params![id.to_string()])?)
    }

    /// Look up a profile id by its (already normalized) username
    pub fn profile_id_by_username(&self, username: &str) -> Result<Option<Uuid>> {
        let id: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM profiles WHERE username = ?",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        id.map(|s| parse_uuid(&s)).transpose()
    }

    /// Profile ids owned by a user, oldest first
    pub fn profile_ids_for_user(&self, user_id: &str) -> Result<Vec<Uuid>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM profiles WHERE user_id = ? ORDER BY created_at, id")?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        ids.iter().map(|s| parse_uuid(s)).collect()
    }

    /// Whether a username is held by a profile other than `except`
    pub fn username_taken(&self, username: &str, except: Option<Uuid>) -> Result<bool> {
        let except = except.map(|id| id.to_string()).unwrap_or_default();
        let taken = self
            .conn
            .prepare("SELECT 1 FROM profiles WHERE username = ? AND id != ?")?
            .exists(params![username, except])?;
        Ok(taken)
    }

    // ==================== Links ====================

    /// Persist a profile's full link list in one transaction
    ///
    /// Links are upserted by id and rows no longer in the list are removed.
    /// Click counters are left as stored. Returns false if the profile
    /// does not exist.
    pub fn save_links(&mut self, profile: &Profile) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let id = profile.id.to_string();

        let touched = tx.execute(
            "UPDATE profiles SET updated_at = ? WHERE id = ?",
            params![profile.updated_at.timestamp_millis(), id],
        )?;
        if touched == 0 {
            return Ok(false);
        }

        let keep: Vec<String> = profile
            .social_links
            .iter()
            .map(|l| l.id.to_string())
            .collect();
        let existing: Vec<String> = {
            let mut stmt = tx.prepare("SELECT id FROM links WHERE profile_id = ?")?;
            let rows = stmt
                .query_map(params![id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            rows
        };
        for stale in existing.iter().filter(|e| !keep.contains(e)) {
            tx.execute("DELETE FROM links WHERE id = ?", params![stale])?;
        }

        for link in &profile.social_links {
            upsert_link(&tx, link)?;
        }

        tx.commit()?;
        debug!(
            profile = %profile.id,
            links = profile.social_links.len(),
            "saved link list"
        );
        Ok(true)
    }

    // ==================== Analytics ====================

    /// Atomically bump a profile counter and today's traffic bucket
    ///
    /// Buckets older than `window_start` are pruned. Returns false if the
    /// profile does not exist.
    pub fn increment(
        &mut self,
        profile_id: Uuid,
        metric: Metric,
        at: DateTime<Utc>,
        window_start: NaiveDate,
    ) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let found = bump_profile(&tx, profile_id, metric, at, window_start)?;
        if found {
            tx.commit()?;
        }
        Ok(found)
    }

    /// Atomically count a click on one link and on its profile
    ///
    /// Returns the link's destination, or `None` if the link is not part
    /// of the profile.
    pub fn increment_link_click(
        &mut self,
        profile_id: Uuid,
        link_id: Uuid,
        at: DateTime<Utc>,
        window_start: NaiveDate,
    ) -> Result<Option<String>> {
        let tx = self.conn.transaction()?;

        let url: Option<String> = tx
            .query_row(
                "SELECT url FROM links WHERE id = ? AND profile_id = ?",
                params![link_id.to_string(), profile_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(url) = url else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE links SET clicks = clicks + 1 WHERE id = ?",
            params![link_id.to_string()],
        )?;
        bump_profile(&tx, profile_id, Metric::Clicks, at, window_start)?;

        tx.commit()?;
        Ok(Some(url))
    }

    // ==================== Stats ====================

    /// Count all profiles
    pub fn profile_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?)
    }

    /// Count all links
    pub fn link_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?)
    }

    // ==================== Private helpers ====================

    fn hydrate_profile(&self, row: ProfileRow, since: NaiveDate) -> Result<Profile> {
        let id = parse_uuid(&row.id)?;
        let mut links = self.get_links_for_profile(&row.id)?;
        editor::normalize(&mut links);
        let traffic = self.get_traffic_for_profile(&row.id, since)?;

        let analytics = analytics::assemble(
            row.views.max(0) as u64,
            row.clicks.max(0) as u64,
            row.last_viewed_at.map(from_millis),
            traffic,
            &links,
        );

        Ok(Profile {
            id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            theme: row.theme.parse().unwrap_or_else(|_| {
                warn!(profile = %id, theme = %row.theme, "unknown theme, using light");
                Theme::Light
            }),
            username: row.username,
            is_active: row.is_active,
            profile_image: row.profile_image,
            social_links: links,
            analytics,
            created_at: from_millis(row.created_at),
            updated_at: from_millis(row.updated_at),
        })
    }

    fn get_links_for_profile(&self, profile_id: &str) -> Result<Vec<Link>> {
        let sql = format!(
            "SELECT {} FROM links WHERE profile_id = ? ORDER BY position, created_at",
            LINK_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![profile_id], LinkRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(LinkRow::into_link).collect()
    }

    fn get_traffic_for_profile(
        &self,
        profile_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<TrafficDay>> {
        let mut stmt = self.conn.prepare(
            "SELECT day, views, clicks FROM traffic WHERE profile_id = ? AND day >= ? ORDER BY day",
        )?;
        let rows = stmt
            .query_map(params![profile_id, since.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(day, views, clicks)| match day.parse::<NaiveDate>() {
                Ok(date) => Some(TrafficDay {
                    date,
                    views: views.max(0) as u64,
                    clicks: clicks.max(0) as u64,
                }),
                Err(_) => {
                    warn!(profile = profile_id, day = %day, "skipping malformed traffic bucket");
                    None
                }
            })
            .collect())
    }
}

// ==================== Internal structs ====================

struct ProfileRow {
    id: String,
    user_id: String,
    title: String,
    description: String,
    username: Option<String>,
    theme: String,
    is_active: bool,
    profile_image: Option<String>,
    views: i64,
    clicks: i64,
    last_viewed_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl ProfileRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            username: row.get(4)?,
            theme: row.get(5)?,
            is_active: row.get(6)?,
            profile_image: row.get(7)?,
            views: row.get(8)?,
            clicks: row.get(9)?,
            last_viewed_at: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }
}

struct LinkRow {
    id: String,
    profile_id: String,
    title: String,
    url: String,
    platform: String,
    icon: Option<String>,
    position: i64,
    is_active: bool,
    clicks: i64,
    created_at: i64,
    updated_at: i64,
}

impl LinkRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            profile_id: row.get(1)?,
            title: row.get(2)?,
            url: row.get(3)?,
            platform: row.get(4)?,
            icon: row.get(5)?,
            position: row.get(6)?,
            is_active: row.get(7)?,
            clicks: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_link(self) -> Result<Link> {
        let id = parse_uuid(&self.id)?;
        let platform = self.platform.parse().unwrap_or_else(|_| {
            warn!(link = %id, platform = %self.platform, "unknown platform, using custom");
            Platform::Custom
        });
        Ok(Link {
            id,
            profile_id: parse_uuid(&self.profile_id)?,
            title: self.title,
            url: self.url,
            platform,
            icon: self.icon,
            order: self.position.max(0) as u32,
            is_active: self.is_active,
            clicks: self.clicks.max(0) as u64,
            created_at: from_millis(self.created_at),
            updated_at: from_millis(self.updated_at),
        })
    }
}

// ==================== Transaction helpers ====================

/// Insert a link or update its editable fields, leaving `clicks` alone
fn upsert_link(tx: &Transaction, link: &Link) -> rusqlite::Result<()> {
    tx.execute(
        r#"
        INSERT INTO links (id, profile_id, title, url, platform, icon, position, is_active,
                           clicks, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            url = excluded.url,
            platform = excluded.platform,
            icon = excluded.icon,
            position = excluded.position,
            is_active = excluded.is_active,
            updated_at = excluded.updated_at
        "#,
        params![
            link.id.to_string(),
            link.profile_id.to_string(),
            link.title,
            link.url,
            link.platform.as_str(),
            link.icon,
            link.order,
            link.is_active,
            link.clicks as i64,
            link.created_at.timestamp_millis(),
            link.updated_at.timestamp_millis(),
        ],
    )?;
    Ok(())
}

fn bump_profile(
    tx: &Transaction,
    profile_id: Uuid,
    metric: Metric,
    at: DateTime<Utc>,
    window_start: NaiveDate,
) -> rusqlite::Result<bool> {
    let id = profile_id.to_string();
    let updated = match metric {
        Metric::Views => tx.execute(
            "UPDATE profiles SET views = views + 1, last_viewed_at = ? WHERE id = ?",
            params![at.timestamp_millis(), id],
        )?,
        Metric::Clicks => tx.execute(
            "UPDATE profiles SET clicks = clicks + 1 WHERE id = ?",
            params![id],
        )?,
    };
    if updated == 0 {
        return Ok(false);
    }

    let (views, clicks) = match metric {
        Metric::Views => (1, 0),
        Metric::Clicks => (0, 1),
    };
    tx.execute(
        r#"
        INSERT INTO traffic (profile_id, day, views, clicks) VALUES (?, ?, ?, ?)
        ON CONFLICT(profile_id, day) DO UPDATE SET
            views = views + excluded.views,
            clicks = clicks + excluded.clicks
        "#,
        params![id, analytics::day_of(at).to_string(), views, clicks],
    )?;
    tx.execute(
        "DELETE FROM traffic WHERE profile_id = ? AND day < ?",
        params![id, window_start.to_string()],
    )?;
    Ok(true)
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        Error::Database(rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(e),
        ))
    })
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}
