//! Shared domain types for Engram.
//!
//! This crate contains the core domain types used across the Engram durable
//! workflow engine: workflow and step entities, activity log entries, engine
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod activity;
pub mod config;
pub mod error;
pub mod workflow;
