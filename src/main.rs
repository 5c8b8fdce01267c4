//! # ISS Weather Link
//!
//! Receive Davis ISS weather frames from a serial radio relay.
//!
//! This application reads 8-byte frames from the relay, decodes them and
//! keeps a running view of current weather conditions.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use iss_weather_link::config::{Config, LoggingConfig};
use iss_weather_link::error::WeatherLinkError;
use iss_weather_link::ingest::IngestPipeline;
use iss_weather_link::link::{FailureKind, LinkStatus, RecoveryAction};
use iss_weather_link::serial::IssSerial;

/// Config file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix for daily log files
const LOG_FILE_PREFIX: &str = "iss-weather-link.log";

/// Main entry point for ISS Weather Link
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first CLI argument or `config/default.toml`)
///    - Set up logging with tracing subscriber
///    - Open the relay serial port
///
/// 2. **Main Loop**
///    - Read one frame at a time with the configured timeout
///    - Feed frames and transport failures to the ingest pipeline
///    - Flush and reopen the port when the link monitor asks for it
///    - Reset the daily rain total when the local date changes
///    - Log ingest stats every `stats_interval_s`
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if:
/// - The configuration file exists but is invalid
/// - Serial port cannot be opened
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let _log_guard = init_logging(&config.logging);

    info!("ISS Weather Link v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Using configuration from {} (station {})", config_path, config.station.id);

    let mut serial = IssSerial::open(&config.serial.port, config.serial.baud_rate, config.serial.read_timeout())?;
    let mut pipeline = IngestPipeline::from_config(&config);

    let stats_period = config.telemetry.stats_interval();
    let mut stats_interval = interval_at(Instant::now() + stats_period, stats_period);
    let mut today = Local::now().date_naive();

    info!("Reading ISS frames from {}", serial.device_path());
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            result = serial.read_packet() => {
                let recovery = match result {
                    Ok(packet) => pipeline.handle_packet(&packet).recovery,
                    Err(WeatherLinkError::ReadTimeout(timeout)) => {
                        debug!("No frame within {:?}", timeout);
                        pipeline.handle_transport_failure(FailureKind::Timeout)
                    }
                    Err(WeatherLinkError::ShortRead(n)) => {
                        error!("Relay closed the byte stream ({} bytes of a frame pending)", n);
                        break;
                    }
                    Err(e) => {
                        warn!("Read failed: {}", e);
                        let action = pipeline.handle_transport_failure(FailureKind::Io);
                        tokio::time::sleep(config.link.flush_delay()).await;
                        action
                    }
                };

                if let Some(RecoveryAction::FlushAndReopenLink) = recovery {
                    if let Err(e) = serial.flush_and_reopen(config.link.flush_delay()).await {
                        error!("Link recovery failed: {}", e);
                    }
                    if pipeline.link_status() == LinkStatus::Down {
                        error!(
                            "ISS link down after {} recoveries without a valid frame",
                            pipeline.monitor().health().recoveries_without_success
                        );
                    }
                }

                pipeline.aggregator_mut().decay_rain_rate(std::time::Instant::now());

                if roll_date(&mut today, Local::now().date_naive()) {
                    info!("New day {}, resetting daily rain total", today);
                    pipeline.aggregator_mut().reset_daily();
                }
            }

            _ = stats_interval.tick() => log_stats(&mut pipeline),

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    log_stats(&mut pipeline);
    Ok(())
}

/// Set up the tracing subscriber, writing to daily files when `log_dir` is set
///
/// The returned guard must be held for the life of the program so buffered
/// lines are flushed on exit.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    if config.log_dir.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

fn log_stats(pipeline: &mut IngestPipeline) {
    let status = pipeline.link_status();
    match serde_json::to_string(&pipeline.aggregator().snapshot()) {
        Ok(json) => info!("Conditions: {}", json),
        Err(e) => warn!("Failed to serialize conditions: {}", e),
    }
    match pipeline.take_stats_summary(Utc::now()) {
        Ok(json) => info!("Ingest stats ({:?}): {}", status, json),
        Err(e) => warn!("Failed to serialize ingest stats: {}", e),
    }
}

/// Advance `today` to `now`, returning true if the date changed
fn roll_date(today: &mut NaiveDate, now: NaiveDate) -> bool {
    if *today == now {
        return false;
    }
    *today = now;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }

    #[test]
    fn test_roll_date_same_day() {
        let mut today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(!roll_date(&mut today, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
    }

    #[test]
    fn test_roll_date_next_day() {
        let mut today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let tomorrow = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();

        assert!(roll_date(&mut today, tomorrow));
        assert_eq!(today, tomorrow);
        assert!(!roll_date(&mut today, tomorrow));
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let config = Config::load(DEFAULT_CONFIG_PATH).unwrap();
        assert_eq!(config.serial.baud_rate, 4800);
    }
}
