//! # Ingest Pipeline
//!
//! Routes each raw frame through the codec and fans the result out to the
//! aggregator, the link monitor and the ingest statistics.
//!
//! The pipeline never touches the serial port. It returns a
//! [`RecoveryAction`] and leaves performing it to the caller.

use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::Config;
use crate::iss::decoder::{decode_packet, DecodeError};
use crate::iss::protocol::RawPacket;
use crate::link::{FailureKind, LinkHealthConfig, LinkHealthMonitor, LinkStatus, RecoveryAction};
use crate::telemetry::IngestStats;
use crate::weather::{ApplyOutcome, WeatherAggregator};

/// Result of feeding one frame
#[derive(Debug, Clone, PartialEq)]
pub struct PacketResult {
    /// What the aggregator did, or why the frame was rejected
    pub decoded: std::result::Result<ApplyOutcome, DecodeError>,

    /// Set when the link should be flushed and reopened
    pub recovery: Option<RecoveryAction>,
}

/// Codec, aggregator, monitor and stats for one transmitter
#[derive(Debug, Clone)]
pub struct IngestPipeline {
    station_id: u8,
    aggregator: WeatherAggregator,
    monitor: LinkHealthMonitor,
    stats: IngestStats,
}

impl IngestPipeline {
    #[must_use]
    pub fn new(station_id: u8, wind_direction_samples: usize, health: LinkHealthConfig) -> Self {
        Self {
            station_id,
            aggregator: WeatherAggregator::new(wind_direction_samples),
            monitor: LinkHealthMonitor::new(health),
            stats: IngestStats::new(Utc::now()),
        }
    }

    /// Build a pipeline from the `[station]` and `[link]` sections
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.station.id,
            config.station.wind_direction_samples,
            config.link.health_config(),
        )
    }

    pub fn station_id(&self) -> u8 {
        self.station_id
    }

    pub fn aggregator(&self) -> &WeatherAggregator {
        &self.aggregator
    }

    /// Mutable access for daily resets, pressure input and rain-rate decay
    pub fn aggregator_mut(&mut self) -> &mut WeatherAggregator {
        &mut self.aggregator
    }

    pub fn monitor(&self) -> &LinkHealthMonitor {
        &self.monitor
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    pub fn link_status(&self) -> LinkStatus {
        self.monitor.status()
    }

    /// Decode one frame and apply it
    pub fn handle_packet(&mut self, packet: &RawPacket) -> PacketResult {
        self.handle_packet_at(packet, Instant::now(), Utc::now())
    }

    /// Same as [`Self::handle_packet`] with explicit monotonic and wall clock readings
    pub fn handle_packet_at(&mut self, packet: &RawPacket, now: Instant, wall: DateTime<Utc>) -> PacketResult {
        match decode_packet(packet, self.station_id) {
            Ok(reading) => {
                self.monitor.record_success();
                self.stats.record_decoded(packet, wall);
                let outcome = self.aggregator.apply_at(&reading, now);
                debug!("Applied {} from {}", outcome.tag, packet);
                PacketResult {
                    decoded: Ok(outcome),
                    recovery: None,
                }
            }
            Err(e) => {
                log_rejection(&e);
                self.stats.record_decode_error(&e);
                let recovery = self.record_failure(FailureKind::from(&e), now);
                PacketResult {
                    decoded: Err(e),
                    recovery,
                }
            }
        }
    }

    /// Record a read timeout or I/O error from the byte source
    pub fn handle_transport_failure(&mut self, kind: FailureKind) -> Option<RecoveryAction> {
        self.handle_transport_failure_at(kind, Instant::now())
    }

    pub fn handle_transport_failure_at(&mut self, kind: FailureKind, now: Instant) -> Option<RecoveryAction> {
        self.stats.record_transport_failure(kind);
        self.record_failure(kind, now)
    }

    fn record_failure(&mut self, kind: FailureKind, now: Instant) -> Option<RecoveryAction> {
        let action = self.monitor.record_failure_at(kind, now);
        if action.is_some() {
            self.stats.record_recovery();
        }
        action
    }

    /// Render the current stats window as JSON and start a new one
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn take_stats_summary(&mut self, wall: DateTime<Utc>) -> serde_json::Result<String> {
        let summary = self.stats.summary_json()?;
        self.stats.reset_window(wall);
        Ok(summary)
    }
}

fn log_rejection(error: &DecodeError) {
    match error {
        DecodeError::InvalidField { .. } => warn!("{}", error),
        _ => debug!("{}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iss::encoder::FrameBuilder;
    use crate::iss::protocol::Payload;
    use crate::weather::RainUpdate;
    use std::time::Duration;

    fn pipeline() -> IngestPipeline {
        IngestPipeline::new(1, 20, LinkHealthConfig::default())
    }

    fn corrupt(packet: RawPacket) -> RawPacket {
        let mut bytes = *packet.as_bytes();
        bytes[7] ^= 0xFF;
        RawPacket::new(bytes)
    }

    #[test]
    fn test_valid_packet_applied() {
        let mut pipeline = pipeline();
        let packet = FrameBuilder::new(1).wind(4, 64).payload(Payload::Temperature(61.5)).build();

        let result = pipeline.handle_packet(&packet);
        assert!(result.decoded.is_ok());
        assert_eq!(result.recovery, None);
        assert_eq!(pipeline.aggregator().state().outside_temp(), Some(61.5));
        assert_eq!(pipeline.stats().decoded, 1);
        assert_eq!(pipeline.link_status(), LinkStatus::Healthy);
    }

    #[test]
    fn test_corrupted_packet_leaves_state_untouched() {
        let mut pipeline = pipeline();
        let packet = FrameBuilder::new(1).payload(Payload::Humidity(55.0)).build();

        let result = pipeline.handle_packet(&corrupt(packet));
        assert!(matches!(result.decoded, Err(DecodeError::ChecksumMismatch { .. })));
        assert_eq!(pipeline.aggregator().state().humidity(), None);
        assert_eq!(pipeline.stats().checksum_failures, 1);
        assert_eq!(pipeline.monitor().health().consecutive_failures, 1);
    }

    #[test]
    fn test_wrong_station_resets_streak() {
        let mut pipeline = pipeline();
        let good = FrameBuilder::new(1).payload(Payload::WindGust(3.0)).build();
        pipeline.handle_packet(&corrupt(good));
        pipeline.handle_packet(&corrupt(good));

        let other = FrameBuilder::new(2).payload(Payload::WindGust(3.0)).build();
        let result = pipeline.handle_packet(&other);
        assert!(matches!(result.decoded, Err(DecodeError::WrongStation { got: 2, .. })));
        assert_eq!(pipeline.monitor().health().consecutive_failures, 0);
        assert_eq!(pipeline.stats().wrong_station, 1);
    }

    #[test]
    fn test_twelfth_checksum_failure_requests_recovery() {
        let mut pipeline = pipeline();
        let bad = corrupt(FrameBuilder::new(1).payload(Payload::RainCounter(1)).build());
        let now = Instant::now();
        let wall = Utc::now();

        for _ in 0..11 {
            assert_eq!(pipeline.handle_packet_at(&bad, now, wall).recovery, None);
        }
        let result = pipeline.handle_packet_at(&bad, now, wall);
        assert_eq!(result.recovery, Some(RecoveryAction::FlushAndReopenLink));
        assert_eq!(pipeline.stats().recoveries, 1);
    }

    #[test]
    fn test_timeouts_count_toward_recovery() {
        let mut pipeline = pipeline();
        let now = Instant::now();

        for _ in 0..11 {
            assert_eq!(pipeline.handle_transport_failure_at(FailureKind::Timeout, now), None);
        }
        assert_eq!(
            pipeline.handle_transport_failure_at(FailureKind::Io, now),
            Some(RecoveryAction::FlushAndReopenLink)
        );
        assert_eq!(pipeline.stats().timeouts, 11);
        assert_eq!(pipeline.stats().io_errors, 1);
    }

    #[test]
    fn test_rain_counter_through_pipeline() {
        let mut pipeline = pipeline();
        let first = FrameBuilder::new(1).payload(Payload::RainCounter(120)).build();
        let second = FrameBuilder::new(1).payload(Payload::RainCounter(2)).build();

        let result = pipeline.handle_packet(&first);
        assert_eq!(result.decoded.unwrap().rain, Some(RainUpdate::Baseline { counter: 120 }));

        let result = pipeline.handle_packet(&second);
        assert_eq!(result.decoded.unwrap().rain, Some(RainUpdate::Accumulated { tips: 10 }));
        assert!((pipeline.aggregator().state().rain_today() - 0.10).abs() < 1e-6);
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.station.id = 4;
        config.link.failure_threshold = 2;
        config.link.recovery_cooldown_s = 5;

        let pipeline = IngestPipeline::from_config(&config);
        assert_eq!(pipeline.station_id(), 4);
        assert_eq!(pipeline.monitor().config().failure_threshold, 2);
        assert_eq!(pipeline.monitor().config().recovery_cooldown, Duration::from_secs(5));
    }

    #[test]
    fn test_take_stats_summary_resets_window() {
        let mut pipeline = pipeline();
        let packet = FrameBuilder::new(1).payload(Payload::UvIndex(2.0)).build();
        pipeline.handle_packet(&packet);

        let summary: serde_json::Value =
            serde_json::from_str(&pipeline.take_stats_summary(Utc::now()).unwrap()).unwrap();
        assert_eq!(summary["decoded"], 1);
        assert_eq!(pipeline.stats().decoded, 0);
        assert!(pipeline.stats().last_new_data.is_some());
    }
}
