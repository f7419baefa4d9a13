//! Job definition parsing, validation, and discovery.

pub mod definition;
pub mod registry;

pub use definition::{parse_job_yaml, serialize_job_yaml, validate_definition};
pub use registry::JobRegistry;
