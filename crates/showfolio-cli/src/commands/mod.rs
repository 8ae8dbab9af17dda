//! Command handlers

pub mod analytics;
pub mod auth;
pub mod config;
pub mod link;
pub mod profile;
pub mod status;
pub mod visit;
