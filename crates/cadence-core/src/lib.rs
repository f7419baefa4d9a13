//! Business logic and repository trait definitions for Cadence.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements. It depends only on `cadence-types` -- never on
//! `cadence-infra` or any database/IO crate.

pub mod dispatch;
pub mod job;
pub mod repository;
pub mod runner;
pub mod schedule;
pub mod service;
pub mod trigger;
