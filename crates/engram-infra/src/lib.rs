//! Infrastructure layer for Engram.
//!
//! Contains implementations of the store traits defined in `engram-core`:
//! SQLite-backed snapshot store and activity log, plus the configuration
//! loader.

pub mod config;
pub mod sqlite;
