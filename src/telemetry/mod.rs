//! # Telemetry Module
//!
//! Ingest statistics for the periodic status log.
//!
//! This module handles:
//! - Counting decoded frames and failures by kind
//! - Tracking when the relay last delivered a new frame
//! - Rendering each stats window as a JSON line

pub mod stats;

pub use stats::IngestStats;
