//! Core types for GitHub Pulse.
//!
//! Holds the issue / pull-request record model, monthly buckets, the
//! streaming [`stats::StatAccumulator`], month and cycle-time helpers,
//! configuration and the shared error type.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod stats;
pub mod time_utils;

pub use error::{PulseError, Result};
