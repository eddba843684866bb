//! Runtime layer for GitHub Pulse.
//!
//! Talks to the GitHub API and decides whether a run uses fresh or cached
//! listings.

pub mod data_manager;
pub mod github;

pub use pulse_core as core;
pub use pulse_data as data;
