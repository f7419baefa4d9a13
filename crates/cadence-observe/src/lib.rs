//! Observability setup for Cadence: tracing subscriber initialization with
//! optional OpenTelemetry export.

pub mod tracing_setup;
