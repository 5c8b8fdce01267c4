//! Ingest counters reported once per stats window.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::iss::decoder::DecodeError;
use crate::iss::protocol::RawPacket;
use crate::link::FailureKind;

/// Per-window ingest statistics
///
/// Counters cover the current window and are cleared by [`IngestStats::reset_window`].
/// `last_new_data` survives resets: a relay that keeps repeating the same
/// frame is the usual sign of a stuck receiver.
#[derive(Debug, Clone, Serialize)]
pub struct IngestStats {
    pub window_started: DateTime<Utc>,
    pub decoded: u64,
    pub checksum_failures: u64,
    pub wrong_station: u64,
    pub invalid_field: u64,
    pub unknown_tag: u64,
    pub timeouts: u64,
    pub io_errors: u64,
    pub recoveries: u64,

    /// Last time a decoded frame differed from the one before it
    pub last_new_data: Option<DateTime<Utc>>,

    #[serde(skip)]
    last_packet: Option<RawPacket>,
}

impl IngestStats {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            window_started: now,
            decoded: 0,
            checksum_failures: 0,
            wrong_station: 0,
            invalid_field: 0,
            unknown_tag: 0,
            timeouts: 0,
            io_errors: 0,
            recoveries: 0,
            last_new_data: None,
            last_packet: None,
        }
    }

    pub fn record_decoded(&mut self, packet: &RawPacket, now: DateTime<Utc>) {
        self.decoded += 1;
        if self.last_packet.as_ref() != Some(packet) {
            self.last_new_data = Some(now);
            self.last_packet = Some(*packet);
        }
    }

    pub fn record_decode_error(&mut self, error: &DecodeError) {
        match error {
            DecodeError::ChecksumMismatch { .. } => self.checksum_failures += 1,
            DecodeError::WrongStation { .. } => self.wrong_station += 1,
            DecodeError::InvalidField { .. } => self.invalid_field += 1,
            DecodeError::UnknownTag { .. } => self.unknown_tag += 1,
        }
    }

    /// Count a failure reported by the byte source
    pub fn record_transport_failure(&mut self, kind: FailureKind) {
        match kind {
            FailureKind::Timeout => self.timeouts += 1,
            FailureKind::Io => self.io_errors += 1,
            FailureKind::Checksum => self.checksum_failures += 1,
            FailureKind::Rejected => self.invalid_field += 1,
        }
    }

    pub fn record_recovery(&mut self) {
        self.recoveries += 1;
    }

    /// All rejected frames in the window
    pub fn decode_failures(&self) -> u64 {
        self.checksum_failures + self.wrong_station + self.invalid_field + self.unknown_tag
    }

    /// Minutes since a new frame arrived, `None` if none ever did
    pub fn minutes_since_new_data(&self, now: DateTime<Utc>) -> Option<f64> {
        self.last_new_data
            .map(|at| (now - at).num_milliseconds() as f64 / 60_000.0)
    }

    /// One-line JSON summary of the window
    pub fn summary_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Start a new window
    pub fn reset_window(&mut self, now: DateTime<Utc>) {
        *self = Self {
            last_new_data: self.last_new_data,
            last_packet: self.last_packet,
            ..Self::new(now)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iss::decoder::Field;
    use chrono::Duration;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn test_new_data_only_on_change() {
        let mut stats = IngestStats::new(at(0));
        let a = RawPacket::new([1, 2, 3, 4, 5, 6, 7, 8]);
        let b = RawPacket::new([8, 7, 6, 5, 4, 3, 2, 1]);

        stats.record_decoded(&a, at(10));
        stats.record_decoded(&a, at(20));
        assert_eq!(stats.last_new_data, Some(at(10)));

        stats.record_decoded(&b, at(30));
        assert_eq!(stats.last_new_data, Some(at(30)));
        assert_eq!(stats.decoded, 3);
    }

    #[test]
    fn test_decode_errors_by_kind() {
        let mut stats = IngestStats::new(at(0));
        let packet = RawPacket::default();

        stats.record_decode_error(&DecodeError::ChecksumMismatch { residue: 1, packet });
        stats.record_decode_error(&DecodeError::WrongStation { expected: 1, got: 2, packet });
        stats.record_decode_error(&DecodeError::InvalidField { field: Field::Humidity, value: 0.0, packet });
        stats.record_decode_error(&DecodeError::UnknownTag { tag: 3, packet });

        assert_eq!(stats.checksum_failures, 1);
        assert_eq!(stats.wrong_station, 1);
        assert_eq!(stats.invalid_field, 1);
        assert_eq!(stats.unknown_tag, 1);
        assert_eq!(stats.decode_failures(), 4);
    }

    #[test]
    fn test_reset_keeps_last_new_data() {
        let mut stats = IngestStats::new(at(0));
        stats.record_decoded(&RawPacket::default(), at(5));
        stats.record_transport_failure(FailureKind::Timeout);
        stats.record_recovery();

        stats.reset_window(at(3600));
        assert_eq!(stats.decoded, 0);
        assert_eq!(stats.timeouts, 0);
        assert_eq!(stats.recoveries, 0);
        assert_eq!(stats.window_started, at(3600));
        assert_eq!(stats.last_new_data, Some(at(5)));

        // Same frame after the reset is still not new
        stats.record_decoded(&RawPacket::default(), at(3700));
        assert_eq!(stats.last_new_data, Some(at(5)));
    }

    #[test]
    fn test_minutes_since_new_data() {
        let mut stats = IngestStats::new(at(0));
        assert_eq!(stats.minutes_since_new_data(at(0)), None);

        stats.record_decoded(&RawPacket::default(), at(0));
        let minutes = stats.minutes_since_new_data(at(0) + Duration::seconds(90)).unwrap();
        assert!((minutes - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_summary_json() {
        let mut stats = IngestStats::new(at(0));
        stats.record_transport_failure(FailureKind::Io);

        let json: serde_json::Value = serde_json::from_str(&stats.summary_json().unwrap()).unwrap();
        assert_eq!(json["io_errors"], 1);
        assert!(json.get("last_packet").is_none());
    }
}
