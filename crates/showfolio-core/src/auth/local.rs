//! SQLite-backed authentication provider
//!
//! Accounts, the signed-in session and password reset requests are kept
//! in the `users`, `auth_session` and `password_resets` tables. Passwords
//! are stored as Argon2 PHC strings.
//!
//! Reset requests are not emailed: the token is returned to the caller
//! and written to the log.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{AuthError, AuthProvider, Identity, MIN_PASSWORD_LENGTH};
use crate::config::Config;
use crate::error::Result;
use crate::models::now;
use crate::storage::{is_unique_violation, open_connection, open_memory_connection};

/// How long an email stays throttled after too many failures
const THROTTLE_WINDOW_MINUTES: i64 = 15;

/// How long a reset token stays valid
const RESET_TOKEN_TTL_MINUTES: i64 = 60;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Local account store
pub struct LocalAuth {
    conn: Connection,
    max_failed_logins: u32,
    hasher: Argon2<'static>,
    /// Identity publisher
    state: watch::Sender<Option<Identity>>,
    /// Kept so the channel never closes while the provider lives
    state_rx: watch::Receiver<Option<Identity>>,
}

impl LocalAuth {
    /// Open the account tables in the configured database
    ///
    /// A session persisted by an earlier run is restored.
    pub fn open(config: &Config) -> Result<Self> {
        let conn = open_connection(&config.sqlite_path())?;
        Self::with_connection(conn, config.max_failed_logins)
    }

    /// Open an in-memory account store (for testing)
    pub fn open_in_memory(max_failed_logins: u32) -> Result<Self> {
        Self::with_connection(open_memory_connection()?, max_failed_logins)
    }

    fn with_connection(conn: Connection, max_failed_logins: u32) -> Result<Self> {
        let restored = load_session(&conn)?;
        if let Some(identity) = &restored {
            debug!(user = %identity.id, "restored session");
        }
        let (state, state_rx) = watch::channel(restored);

        Ok(Self {
            conn,
            max_failed_logins: max_failed_logins.max(1),
            hasher: Argon2::default(),
            state,
            state_rx,
        })
    }

    /// Cheap hashing parameters so tests stay fast
    #[cfg(test)]
    pub(crate) fn with_test_hasher(mut self) -> Self {
        let params = argon2::Params::new(1024, 1, 1, None).expect("valid test params");
        self.hasher = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
        self
    }

    /// Create a reset token for an account and return it
    pub fn request_password_reset(
        &mut self,
        email: &str,
    ) -> std::result::Result<String, AuthError> {
        let email = normalize_email(email)?;
        let user = self.find_user(&email)?.ok_or(AuthError::UserNotFound)?;

        let token = Uuid::new_v4().simple().to_string();
        self.conn.execute(
            "INSERT INTO password_resets (token, user_id, requested_at) VALUES (?, ?, ?)",
            params![token, user.id, now().timestamp_millis()],
        )?;
        info!(email = %email, token = %token, "password reset requested");
        Ok(token)
    }

    /// Set a new password using a reset token
    ///
    /// Clears any sign-in throttling on the account and spends every
    /// outstanding token for it.
    pub fn complete_password_reset(
        &mut self,
        token: &str,
        new_password: &str,
    ) -> std::result::Result<(), AuthError> {
        check_password_strength(new_password)?;

        let request: Option<(String, i64)> = self
            .conn
            .query_row(
                "SELECT user_id, requested_at FROM password_resets WHERE token = ?",
                params![token.trim()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((user_id, requested_at)) = request else {
            return Err(AuthError::InvalidResetToken);
        };
        if now() - from_millis(requested_at) > Duration::minutes(RESET_TOKEN_TTL_MINUTES) {
            self.conn
                .execute("DELETE FROM password_resets WHERE token = ?", params![token.trim()])?;
            return Err(AuthError::InvalidResetToken);
        }

        let hash = self.hash_password(new_password)?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE users SET password_hash = ?, failed_attempts = 0, last_failed_at = NULL \
             WHERE id = ?",
            params![hash, user_id],
        )?;
        tx.execute("DELETE FROM password_resets WHERE user_id = ?", params![user_id])?;
        tx.commit()?;

        info!(user = %user_id, "password reset completed");
        Ok(())
    }

    /// Enable or disable an account
    ///
    /// Disabling the signed-in account also signs it out.
    pub fn set_disabled(
        &mut self,
        email: &str,
        disabled: bool,
    ) -> std::result::Result<(), AuthError> {
        let email = normalize_email(email)?;
        let changed = self.conn.execute(
            "UPDATE users SET disabled = ? WHERE email = ?",
            params![disabled, email],
        )?;
        if changed == 0 {
            return Err(AuthError::UserNotFound);
        }
        info!(email = %email, disabled, "account state changed");

        if disabled && self.current().is_some_and(|i| i.email == email) {
            self.sign_out()?;
        }
        Ok(())
    }

    fn find_user(&self, email: &str) -> std::result::Result<Option<UserRow>, AuthError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, email, display_name, password_hash, disabled, failed_attempts, \
                 last_failed_at, created_at FROM users WHERE email = ?",
                params![email],
                UserRow::from_row,
            )
            .optional()?)
    }

    fn is_throttled(&self, user: &UserRow, at: DateTime<Utc>) -> bool {
        user.failed_attempts >= self.max_failed_logins
            && user.last_failed_at.is_some_and(|ms| {
                at - from_millis(ms) < Duration::minutes(THROTTLE_WINDOW_MINUTES)
            })
    }

    fn start_session(&mut self, identity: &Identity) -> std::result::Result<(), AuthError> {
        self.conn.execute(
            r#"
            INSERT INTO auth_session (slot, user_id, signed_in_at) VALUES (0, ?, ?)
            ON CONFLICT(slot) DO UPDATE SET
                user_id = excluded.user_id,
                signed_in_at = excluded.signed_in_at
            "#,
            params![identity.id, now().timestamp_millis()],
        )?;
        self.state.send_replace(Some(identity.clone()));
        Ok(())
    }

    fn hash_password(&self, password: &str) -> std::result::Result<String, AuthError> {
        let salt_bytes: [u8; 16] = rand::thread_rng().gen();
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| AuthError::Generic(format!("Failed to encode salt: {}", e)))?;
        let hash = self
            .hasher
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Generic(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_password(
        &self,
        password: &str,
        stored: &str,
    ) -> std::result::Result<bool, AuthError> {
        let parsed = PasswordHash::new(stored)
            .map_err(|e| AuthError::Generic(format!("Stored password hash is invalid: {}", e)))?;
        Ok(self
            .hasher
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

impl AuthProvider for LocalAuth {
    fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> std::result::Result<Identity, AuthError> {
        let email = normalize_email(email)?;
        check_password_strength(password)?;

        let display_name = match display_name.trim() {
            "" => email.split('@').next().unwrap_or_default().to_string(),
            name => name.to_string(),
        };
        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            email,
            display_name,
            created_at: now(),
        };
        let hash = self.hash_password(password)?;

        match self.conn.execute(
            "INSERT INTO users (id, email, display_name, password_hash, created_at) \
             VALUES (?, ?, ?, ?, ?)",
            params![
                identity.id,
                identity.email,
                identity.display_name,
                hash,
                identity.created_at.timestamp_millis(),
            ],
        ) {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e, "users.email") => return Err(AuthError::EmailInUse),
            Err(e) => return Err(e.into()),
        }
        info!(user = %identity.id, "account created");

        self.start_session(&identity)?;
        Ok(identity)
    }

    fn sign_in(&mut self, email: &str, password: &str) -> std::result::Result<Identity, AuthError> {
        let email = normalize_email(email)?;
        let user = self.find_user(&email)?.ok_or(AuthError::UserNotFound)?;

        if user.disabled {
            return Err(AuthError::DisabledAccount);
        }
        let at = now();
        if self.is_throttled(&user, at) {
            warn!(email = %email, "sign-in throttled");
            return Err(AuthError::TooManyRequests);
        }

        if !self.verify_password(password, &user.password_hash)? {
            self.conn.execute(
                "UPDATE users SET failed_attempts = failed_attempts + 1, last_failed_at = ? \
                 WHERE id = ?",
                params![at.timestamp_millis(), user.id],
            )?;
            warn!(
                email = %email,
                attempts = user.failed_attempts + 1,
                "failed sign-in"
            );
            return Err(AuthError::WrongPassword);
        }

        if user.failed_attempts > 0 {
            self.conn.execute(
                "UPDATE users SET failed_attempts = 0, last_failed_at = NULL WHERE id = ?",
                params![user.id],
            )?;
        }

        let identity = user.into_identity();
        self.start_session(&identity)?;
        info!(user = %identity.id, "signed in");
        Ok(identity)
    }

    fn sign_out(&mut self) -> std::result::Result<(), AuthError> {
        self.conn.execute("DELETE FROM auth_session", [])?;
        if let Some(identity) = self.state.send_replace(None) {
            info!(user = %identity.id, "signed out");
        }
        Ok(())
    }

    fn send_password_reset(&mut self, email: &str) -> std::result::Result<(), AuthError> {
        self.request_password_reset(email).map(|_| ())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.state_rx.clone()
    }

    fn current(&self) -> Option<Identity> {
        self.state_rx.borrow().clone()
    }
}

struct UserRow {
    id: String,
    email: String,
    display_name: String,
    password_hash: String,
    disabled: bool,
    failed_attempts: u32,
    last_failed_at: Option<i64>,
    created_at: i64,
}

impl UserRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            display_name: row.get(2)?,
            password_hash: row.get(3)?,
            disabled: row.get(4)?,
            failed_attempts: row.get(5)?,
            last_failed_at: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn into_identity(self) -> Identity {
        Identity {
            id: self.id,
            email: self.email,
            display_name: self.display_name,
            created_at: from_millis(self.created_at),
        }
    }
}

fn load_session(conn: &Connection) -> rusqlite::Result<Option<Identity>> {
    conn.query_row(
        r#"
        SELECT u.id, u.email, u.display_name, u.created_at
        FROM auth_session s JOIN users u ON u.id = s.user_id
        WHERE s.slot = 0 AND u.disabled = 0
        "#,
        [],
        |row| {
            Ok(Identity {
                id: row.get(0)?,
                email: row.get(1)?,
                display_name: row.get(2)?,
                created_at: from_millis(row.get(3)?),
            })
        },
    )
    .optional()
}

fn normalize_email(raw: &str) -> std::result::Result<String, AuthError> {
    let email = raw.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(AuthError::InvalidEmail);
    }
    Ok(email)
}

fn check_password_strength(password: &str) -> std::result::Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}
