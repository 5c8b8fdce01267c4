//! # Link Module
//!
//! Serial link health tracking.
//!
//! This module handles:
//! - Classifying decode and transport failures
//! - Counting consecutive link-class failures
//! - Requesting flush/reopen with a cooldown between attempts
//! - Reporting persistent link failure

pub mod monitor;

pub use monitor::{
    FailureKind, LinkHealth, LinkHealthConfig, LinkHealthMonitor, LinkStatus, RecoveryAction,
};
