//! ShowFolio Core Library
//!
//! This crate provides the core functionality for ShowFolio, a
//! link-in-bio profile builder: public profiles with an ordered list of
//! social links and basic view/click analytics.
//!
//! # Architecture
//!
//! - **SQLite**: Single source of truth for profiles, links, traffic and
//!   local accounts
//!
//! Counters are bumped with single SQL statements and usernames are held
//! unique by an index, so concurrent writers cannot lose updates.
//!
//! # Quick Start
//!
//! ```text
//! let mut auth = LocalAuth::open(&config)?;
//! let user = auth.sign_in("ben@example.com", "hunter22")?;
//!
//! let mut store = Store::open_with_config(config)?;
//! let draft = ProfileDraft::new("Ben").with_username("benwright");
//! let mut profile = store.create_profile(&user.id, draft)?;
//! let github = LinkDraft::new("GitHub", "https://github.com/ben", Platform::Github);
//! store.add_link(&mut profile, github)?;
//! ```
//!
//! # Modules
//!
//! - `store`: Profile storage interface (main entry point)
//! - `models`: Profiles, links and the analytics record
//! - `editor`: Ordered link list operations
//! - `username`: Username validation and normalization
//! - `analytics`: Derived analytics figures
//! - `auth`: Authentication provider seam and the local provider
//! - `session`: Currently signed-in identity
//! - `storage`: SQLite schema and row mapping
//! - `config`: Application configuration
//! - `error`: Error taxonomy

pub mod analytics;
pub mod auth;
pub mod config;
pub mod editor;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;
pub mod store;
pub mod username;

pub use auth::{AuthError, AuthProvider, Identity, LocalAuth};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use models::{
    Analytics, Link, LinkDraft, LinkPatch, Metric, Platform, Profile, ProfileDraft, ProfilePatch,
    Theme,
};
pub use session::Session;
pub use store::{Store, StoreStats};
pub use username::Availability;
