//! # ISS Weather Link Library
//!
//! Receive Davis ISS weather frames from a serial radio relay.
//!
//! This library provides the core functionality for decoding the 8-byte ISS
//! frames, folding them into current weather conditions and keeping the
//! serial link healthy.

pub mod config;
pub mod error;
pub mod ingest;
pub mod iss;
pub mod link;
pub mod serial;
pub mod telemetry;
pub mod weather;
