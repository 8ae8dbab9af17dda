//! Storage layer
//!
//! SQLite is the single source of truth for profiles, links, traffic
//! buckets and local accounts.
//!
//! ## Layout
//!
//! - **schema**: table definitions and version tracking
//! - **database**: row mapping and atomic counter updates

pub mod database;
pub mod schema;

pub use database::{is_unique_violation, open_connection, open_memory_connection, Database};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
