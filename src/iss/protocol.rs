//! # ISS Protocol Constants and Types
//!
//! Core definitions for the 8-byte Davis ISS telemetry frame.
//!
//! ```text
//! Byte 0: [tag:4][battery-low:1][station-1:3]
//! Byte 1: wind speed (mph)
//! Byte 2: wind direction (raw × 1.40625 + 0.3 degrees)
//! Byte 3-4: tag-specific payload
//! Byte 5: unused
//! Byte 6-7: CRC-16/CCITT trailer (big-endian)
//! ```

use std::fmt;

/// ISS frame length in bytes
pub const ISS_PACKET_SIZE: usize = 8;

/// Wind direction scale factor (degrees per raw count)
pub const WIND_DIRECTION_SCALE: f32 = 1.40625;

/// Wind direction offset in degrees
pub const WIND_DIRECTION_OFFSET: f32 = 0.3;

/// Highest wind speed the anemometer is rated for (mph)
pub const WIND_SPEED_MAX_MPH: f32 = 200.0;

/// Physical rain counter wraps to 0 after this value
pub const RAIN_COUNTER_MAX: u8 = 127;

/// Rain collected per bucket tip (inches)
pub const RAIN_PER_TIP_INCHES: f32 = 0.01;

/// Temperature counts per °F (tenths of a degree, left-aligned by 4 bits)
pub const TEMPERATURE_SCALE: f32 = 160.0;

/// Valid outside temperature range in °F
pub const TEMPERATURE_MIN_F: f32 = -100.0;
pub const TEMPERATURE_MAX_F: f32 = 200.0;

/// Humidity counts per percent
pub const HUMIDITY_SCALE: f32 = 10.0;

/// Capacitor voltage counts per volt
pub const CAP_VOLTS_SCALE: f32 = 100.0;

/// W/m² per solar radiation count
pub const SOLAR_SCALE: f32 = 1.757936;

/// UV counts per index point
pub const UV_SCALE: f32 = 50.0;

/// Offset subtracted from 10-bit solar and UV readings
pub const TEN_BIT_SENSOR_OFFSET: f32 = 4.0;

/// Heavy-rain interval resolution (1/16 second)
pub const RAIN_HEAVY_DIVISOR: f32 = 16.0;

/// Bit in byte 4 selecting heavy-rain resolution
pub const RAIN_HEAVY_MASK: u8 = 0x40;

/// Reported tip interval when no tip happened in the current window (15 minutes)
pub const RAIN_SECONDS_NO_TIP: f32 = 900.0;

/// Byte 3 marker meaning "no sensor" for solar/UV, "no recent tip" for rain seconds
pub const PAYLOAD_NO_DATA: u8 = 0xFF;

/// Battery-low flag in byte 0
pub const BATTERY_LOW_MASK: u8 = 0x08;

/// Station id bits in byte 0 (id - 1)
pub const STATION_ID_MASK: u8 = 0x07;

/// Reading type carried in the high nibble of byte 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingTag {
    CapVoltage,
    UvIndex,
    RainSeconds,
    SolarRadiation,
    OutsideTemp,
    WindGust,
    Humidity,
    RainCount,
}

impl ReadingTag {
    /// Map a header nibble to its tag; unhandled nibbles return `None`
    pub fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0x2 => Some(ReadingTag::CapVoltage),
            0x4 => Some(ReadingTag::UvIndex),
            0x5 => Some(ReadingTag::RainSeconds),
            0x6 => Some(ReadingTag::SolarRadiation),
            0x8 => Some(ReadingTag::OutsideTemp),
            0x9 => Some(ReadingTag::WindGust),
            0xA => Some(ReadingTag::Humidity),
            0xE => Some(ReadingTag::RainCount),
            _ => None,
        }
    }

    /// Header nibble for this tag
    pub fn nibble(self) -> u8 {
        match self {
            ReadingTag::CapVoltage => 0x2,
            ReadingTag::UvIndex => 0x4,
            ReadingTag::RainSeconds => 0x5,
            ReadingTag::SolarRadiation => 0x6,
            ReadingTag::OutsideTemp => 0x8,
            ReadingTag::WindGust => 0x9,
            ReadingTag::Humidity => 0xA,
            ReadingTag::RainCount => 0xE,
        }
    }
}

impl fmt::Display for ReadingTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReadingTag::CapVoltage => "capacitor voltage",
            ReadingTag::UvIndex => "UV index",
            ReadingTag::RainSeconds => "rain seconds",
            ReadingTag::SolarRadiation => "solar radiation",
            ReadingTag::OutsideTemp => "outside temperature",
            ReadingTag::WindGust => "wind gust",
            ReadingTag::Humidity => "humidity",
            ReadingTag::RainCount => "rain counter",
        };
        f.write_str(name)
    }
}

/// One raw frame exactly as read from the relay
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawPacket([u8; ISS_PACKET_SIZE]);

impl RawPacket {
    pub fn new(bytes: [u8; ISS_PACKET_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ISS_PACKET_SIZE] {
        &self.0
    }

    /// High nibble of byte 0
    pub fn tag_nibble(&self) -> u8 {
        self.0[0] >> 4
    }

    /// Transmitter id (1-8)
    pub fn station_id(&self) -> u8 {
        (self.0[0] & STATION_ID_MASK) + 1
    }

    pub fn battery_low(&self) -> bool {
        self.0[0] & BATTERY_LOW_MASK != 0
    }
}

impl From<[u8; ISS_PACKET_SIZE]> for RawPacket {
    fn from(bytes: [u8; ISS_PACKET_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for RawPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for RawPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawPacket[{}]", self)
    }
}

/// Type-specific part of a decoded frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload {
    /// Bucket tip counter (0-127, wraps)
    RainCounter(u8),

    /// Seconds since the last bucket tip
    RainIntervalSeconds(f32),

    /// Outside temperature in °F
    Temperature(f32),

    /// Wind gust in mph
    WindGust(f32),

    /// Relative humidity (0-100%)
    Humidity(f32),

    /// Transmitter supercapacitor voltage
    CapacitorVolts(f32),

    /// Solar radiation in W/m²
    SolarRadiation(f32),

    /// UV index
    UvIndex(f32),
}

impl Payload {
    pub fn tag(&self) -> ReadingTag {
        match self {
            Payload::RainCounter(_) => ReadingTag::RainCount,
            Payload::RainIntervalSeconds(_) => ReadingTag::RainSeconds,
            Payload::Temperature(_) => ReadingTag::OutsideTemp,
            Payload::WindGust(_) => ReadingTag::WindGust,
            Payload::Humidity(_) => ReadingTag::Humidity,
            Payload::CapacitorVolts(_) => ReadingTag::CapVoltage,
            Payload::SolarRadiation(_) => ReadingTag::SolarRadiation,
            Payload::UvIndex(_) => ReadingTag::UvIndex,
        }
    }
}

/// A validated, decoded ISS frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Transmitter id (1-8)
    pub station_id: u8,

    /// Transmitter reports a low battery
    pub battery_low: bool,

    /// Wind speed in mph (present in every frame)
    pub wind_speed_mph: f32,

    /// Wind direction in degrees, 0-360 (present in every frame)
    pub wind_direction_deg: f32,

    /// Tag-specific reading
    pub payload: Payload,
}
