//! Shared domain types for Cadence.
//!
//! This crate contains the core domain types used across the Cadence job
//! runner: job definitions, run records, secrets, configuration, and their
//! associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod job;
pub mod run;
pub mod secret;
