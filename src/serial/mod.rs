//! # Serial Communication Module
//!
//! Handles the serial relay that forwards ISS frames.
//!
//! This module handles:
//! - Opening the relay port (4800 baud, 8N1)
//! - Buffered reads of fixed 8-byte frames with a bounded timeout
//! - Flushing and reopening the port when the link monitor asks for it
//!
//! Frames carry no sync byte. A misaligned stream shows up as a run of
//! checksum failures, which the link monitor turns into a flush that
//! realigns on the next frame boundary.

pub mod port_trait;

use bytes::{Buf, BytesMut};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Result, WeatherLinkError};
use crate::iss::protocol::{RawPacket, ISS_PACKET_SIZE};
use port_trait::{SerialPortIO, TokioSerialPort};

/// Davis relay baud rate
pub const ISS_BAUD_RATE: u32 = 4800;

/// Default device paths to try (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/serial0", // Raspberry Pi primary UART alias
    "/dev/ttyUSB0", // USB-to-RS485 adapters
];

/// Size of one driver read
const READ_CHUNK_SIZE: usize = 64;

/// Serial source of raw ISS frames
pub struct IssSerial {
    port: Box<dyn SerialPortIO>,
    device_path: String,
    buffer: BytesMut,
    read_timeout: Duration,
}

impl std::fmt::Debug for IssSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssSerial")
            .field("device_path", &self.device_path)
            .field("buffered", &self.buffer.len())
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

impl IssSerial {
    /// Open the relay port at `path`
    ///
    /// # Errors
    ///
    /// Returns `WeatherLinkError::Serial` if the device cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use iss_weather_link::serial::{IssSerial, ISS_BAUD_RATE};
    ///
    /// fn main() -> anyhow::Result<()> {
    ///     let serial = IssSerial::open("/dev/serial0", ISS_BAUD_RATE, Duration::from_secs(3))?;
    ///     Ok(())
    /// }
    /// ```
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        let port = open_port(path, baud_rate)?;
        info!("Opened ISS relay at {} ({} baud)", path, baud_rate);
        Ok(Self::from_port(
            Box::new(TokioSerialPort::new(port, path, baud_rate)),
            path,
            read_timeout,
        ))
    }

    /// Open the first device in `paths` that succeeds
    ///
    /// # Errors
    ///
    /// Returns `WeatherLinkError::SerialPortNotFound` listing every path tried
    pub fn open_with_paths(paths: &[&str], baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open(path, baud_rate, read_timeout) {
                Ok(serial) => return Ok(serial),
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(WeatherLinkError::SerialPortNotFound(paths.join(", ")))
    }

    /// Wrap an already-open port
    pub fn from_port(port: Box<dyn SerialPortIO>, device_path: &str, read_timeout: Duration) -> Self {
        Self {
            port,
            device_path: device_path.to_string(),
            buffer: BytesMut::with_capacity(READ_CHUNK_SIZE),
            read_timeout,
        }
    }

    /// Read the next 8-byte frame
    ///
    /// # Errors
    ///
    /// - `ReadTimeout` if no complete frame arrives in time (partial bytes are discarded)
    /// - `ShortRead` if the byte source closes mid-frame
    /// - `Serial` on driver errors
    pub async fn read_packet(&mut self) -> Result<RawPacket> {
        let timeout = self.read_timeout;
        match tokio::time::timeout(timeout, self.fill_frame()).await {
            Ok(result) => result,
            Err(_) => {
                if !self.buffer.is_empty() {
                    debug!("Discarding {} partial bytes after timeout", self.buffer.len());
                    self.buffer.clear();
                }
                Err(WeatherLinkError::ReadTimeout(timeout))
            }
        }
    }

    async fn fill_frame(&mut self) -> Result<RawPacket> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        while self.buffer.len() < ISS_PACKET_SIZE {
            let n = self
                .port
                .read(&mut chunk)
                .await
                .map_err(|e| WeatherLinkError::Serial(format!("Failed to read from {}: {}", self.device_path, e)))?;

            if n == 0 {
                return Err(WeatherLinkError::ShortRead(self.buffer.len()));
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }

        let mut frame = [0u8; ISS_PACKET_SIZE];
        self.buffer.copy_to_slice(&mut frame);
        Ok(RawPacket::new(frame))
    }

    /// Drop buffered input, reopen the port, then wait `settle` before reading again
    ///
    /// # Errors
    ///
    /// Returns `WeatherLinkError::Serial` if the port cannot be reopened
    pub async fn flush_and_reopen(&mut self, settle: Duration) -> Result<()> {
        let discarded = self.buffer.len();
        self.buffer.clear();

        if let Err(e) = self.port.clear_input() {
            warn!("Failed to clear input buffer on {}: {}", self.device_path, e);
        }

        self.port
            .reopen()
            .map_err(|e| WeatherLinkError::Serial(format!("Failed to reopen {}: {}", self.device_path, e)))?;

        tokio::time::sleep(settle).await;
        info!("Flushed and reopened {} ({} buffered bytes discarded)", self.device_path, discarded);
        Ok(())
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

/// Open a specific serial port with relay settings
fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
    use tokio_serial::SerialPortBuilderExt;

    let port = tokio_serial::new(path, baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| WeatherLinkError::Serial(format!("Failed to open {}: {}", path, e)))?;

    Ok(port)
}
