//! Data layer for GitHub Pulse.
//!
//! Maps raw tracker payloads to records, caches them on disk, aggregates
//! them into monthly buckets and runs the top-level report pipeline.

pub mod aggregator;
pub mod analysis;
pub mod reader;

pub use pulse_core as core;
