//! # ISS Protocol Module
//!
//! Implementation of the Davis ISS 8-byte telemetry frame as relayed over serial.
//!
//! This module handles:
//! - CRC-16/CCITT integrity check (trust boundary)
//! - Station id filtering
//! - Wind speed/direction decoding (present in every frame)
//! - Tag dispatch to the type-specific payload decoders
//! - Frame encoding for replay and simulation

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod crc;
