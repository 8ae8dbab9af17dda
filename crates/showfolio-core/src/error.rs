//! Error handling
//!
//! Provides the typed error taxonomy surfaced by the core: validation
//! failures (bad or missing input), missing records, and provider
//! failures (authentication or storage).

use std::io;

use thiserror::Error;

use crate::auth::AuthError;

/// Errors that can occur in ShowFolio operations
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing input on a named field
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    /// Referenced record is absent
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Authentication provider rejected the call
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Coarse classification used by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Provider,
}

impl Error {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } => ErrorKind::Validation,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Auth(_) | Error::Database(_) | Error::Io(_) => ErrorKind::Provider,
        }
    }

    /// The field a validation error refers to
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Error::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Message safe to show an end user
    ///
    /// Storage failures are reduced to a generic sentence; the full error
    /// is meant for logs.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { message, .. } => message.clone(),
            Error::NotFound { entity, .. } => format!("{} not found", entity),
            Error::Auth(e) => e.to_string(),
            Error::Database(_) | Error::Io(_) => {
                "Something went wrong while saving your changes. Please try again.".to_string()
            }
        }
    }
}

/// Result type for ShowFolio operations
pub type Result<T> = std::result::Result<T, Error>;
