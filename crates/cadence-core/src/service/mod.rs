//! Core services built on the repository ports.

pub mod hash;
pub mod secret;
