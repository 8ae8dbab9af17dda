//! Authentication
//!
//! [`AuthProvider`] is the seam between ShowFolio and whatever signs users
//! in. Identity changes are published on a `watch` channel so a
//! [`crate::session::Session`] can follow them without polling.
//!
//! [`LocalAuth`] is the bundled provider: accounts live in the same SQLite
//! database as profiles.

pub mod local;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

pub use local::LocalAuth;

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id; profiles reference it as their owner
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Failures reported by an authentication provider
///
/// The display text of each variant is what the user sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("This email is already registered. Please use a different email or sign in.")]
    EmailInUse,

    #[error("Password should be at least 6 characters long.")]
    WeakPassword,

    #[error("No account found with this email. Please sign up first.")]
    UserNotFound,

    #[error("Incorrect password. Please try again.")]
    WrongPassword,

    #[error("Too many failed attempts. Please try again later.")]
    TooManyRequests,

    #[error("This account has been disabled. Please contact support.")]
    DisabledAccount,

    #[error("This reset link is invalid or has expired.")]
    InvalidResetToken,

    #[error("Please sign in first.")]
    NotSignedIn,

    /// Anything else; the detail is for logs only
    #[error("An error occurred. Please try again.")]
    Generic(String),
}

impl AuthError {
    /// Underlying detail for logging
    pub fn detail(&self) -> Option<&str> {
        match self {
            AuthError::Generic(detail) => Some(detail),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for AuthError {
    fn from(err: rusqlite::Error) -> Self {
        AuthError::Generic(err.to_string())
    }
}

/// Operations every authentication backend provides
pub trait AuthProvider {
    /// Create an account and sign it in
    fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Identity, AuthError>;

    /// Sign in with email and password
    fn sign_in(&mut self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Sign the current user out
    fn sign_out(&mut self) -> Result<(), AuthError>;

    /// Start a password reset for an account
    fn send_password_reset(&mut self, email: &str) -> Result<(), AuthError>;

    /// Follow identity changes; dropping the receiver unsubscribes
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;

    /// The identity signed in right now
    fn current(&self) -> Option<Identity>;
}
