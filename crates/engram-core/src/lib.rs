//! Durable workflow execution for Engram.
//!
//! This crate defines the "ports" (store and execution unit traits) and the
//! engine built on top of them: the workflow lifecycle manager, the
//! sequential and batched-parallel execution engine, and the snapshot-loss
//! recovery subsystem. It depends only on `engram-types` -- never on
//! `engram-infra` or any database/IO crate. In-memory store implementations
//! are provided for embedded and test use.

pub mod store;
pub mod unit;
pub mod workflow;
