//! # ISS Packet Decoder
//!
//! Validates one 8-byte frame and decodes it into a [`Reading`].
//!
//! Checks run in a fixed order and the first failure wins:
//! checksum, station id, wind speed, wind direction, tag, payload.
//! A rejected frame is never partially interpreted.

use std::fmt;
use thiserror::Error;

use super::crc::{crc16_ccitt, CRC16_VALID_RESIDUE};
use super::protocol::*;

/// Frame field that failed range validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    WindSpeed,
    WindDirection,
    WindGust,
    CapacitorVolts,
    UvIndex,
    RainSeconds,
    SolarRadiation,
    Temperature,
    Humidity,
    RainCounter,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::WindSpeed => "wind speed",
            Field::WindDirection => "wind direction",
            Field::WindGust => "wind gust",
            Field::CapacitorVolts => "capacitor volts",
            Field::UvIndex => "UV index",
            Field::RainSeconds => "rain seconds",
            Field::SolarRadiation => "solar radiation",
            Field::Temperature => "temperature",
            Field::Humidity => "humidity",
            Field::RainCounter => "rain counter",
        };
        f.write_str(name)
    }
}

/// Why a frame was rejected
///
/// Every variant carries the offending frame for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DecodeError {
    /// CRC residue over the whole frame was not zero
    #[error("checksum mismatch (residue 0x{residue:04X}) in packet [{packet}]")]
    ChecksumMismatch { residue: u16, packet: RawPacket },

    /// Frame came from a transmitter this aggregator does not track
    #[error("wrong station: expected {expected}, got {got} in packet [{packet}]")]
    WrongStation { expected: u8, got: u8, packet: RawPacket },

    /// A field decoded to a value outside its valid range
    #[error("invalid {field}: {value} in packet [{packet}]")]
    InvalidField { field: Field, value: f32, packet: RawPacket },

    /// Header nibble does not name a reading this decoder handles
    #[error("unhandled data type 0x{tag:X} in packet [{packet}]")]
    UnknownTag { tag: u8, packet: RawPacket },
}

impl DecodeError {
    /// The frame that was rejected
    pub fn packet(&self) -> &RawPacket {
        match self {
            DecodeError::ChecksumMismatch { packet, .. }
            | DecodeError::WrongStation { packet, .. }
            | DecodeError::InvalidField { packet, .. }
            | DecodeError::UnknownTag { packet, .. } => packet,
        }
    }

    /// True for corruption on the wire, false for well-formed but rejected frames
    pub fn is_checksum(&self) -> bool {
        matches!(self, DecodeError::ChecksumMismatch { .. })
    }
}

/// Decode a complete ISS frame
///
/// # Arguments
///
/// * `packet` - Raw 8-byte frame
/// * `station_id` - Transmitter id this aggregator tracks (1-8)
///
/// # Returns
///
/// * `Result<Reading, DecodeError>` - Decoded reading, or the first check that failed
///
/// # Examples
///
/// ```
/// use iss_weather_link::iss::decoder::decode_packet;
/// use iss_weather_link::iss::encoder::FrameBuilder;
/// use iss_weather_link::iss::protocol::Payload;
///
/// let packet = FrameBuilder::new(1).wind(4, 0).payload(Payload::RainCounter(12)).build();
/// let reading = decode_packet(&packet, 1).unwrap();
/// assert_eq!(reading.payload, Payload::RainCounter(12));
/// ```
pub fn decode_packet(packet: &RawPacket, station_id: u8) -> Result<Reading, DecodeError> {
    let bytes = packet.as_bytes();

    let residue = crc16_ccitt(bytes);
    if residue != CRC16_VALID_RESIDUE {
        return Err(DecodeError::ChecksumMismatch { residue, packet: *packet });
    }

    let got = packet.station_id();
    if got != station_id {
        return Err(DecodeError::WrongStation { expected: station_id, got, packet: *packet });
    }

    let wind_speed_mph = decode_wind_speed(bytes[1]);
    if wind_speed_mph > WIND_SPEED_MAX_MPH {
        return Err(invalid(Field::WindSpeed, wind_speed_mph, packet));
    }

    let wind_direction_deg = decode_wind_direction(bytes[2]);
    if !(0.0..=360.0).contains(&wind_direction_deg) {
        return Err(invalid(Field::WindDirection, wind_direction_deg, packet));
    }

    let tag = packet.tag_nibble();
    let tag = ReadingTag::from_nibble(tag).ok_or(DecodeError::UnknownTag { tag, packet: *packet })?;

    let payload = decode_payload(tag, bytes[3], bytes[4])
        .map_err(|(field, value)| invalid(field, value, packet))?;

    Ok(Reading {
        station_id: got,
        battery_low: packet.battery_low(),
        wind_speed_mph,
        wind_direction_deg,
        payload,
    })
}

fn invalid(field: Field, value: f32, packet: &RawPacket) -> DecodeError {
    DecodeError::InvalidField { field, value, packet: *packet }
}

/// Wind speed in mph from byte 1
pub fn decode_wind_speed(raw: u8) -> f32 {
    raw as f32
}

/// Wind direction in degrees from byte 2
pub fn decode_wind_direction(raw: u8) -> f32 {
    raw as f32 * WIND_DIRECTION_SCALE + WIND_DIRECTION_OFFSET
}

/// Interpret bytes 3-4 for the given tag
///
/// Out-of-range values come back as the field and the offending value.
fn decode_payload(tag: ReadingTag, b3: u8, b4: u8) -> std::result::Result<Payload, (Field, f32)> {
    match tag {
        ReadingTag::CapVoltage => {
            let raw = ((b3 as u16) << 2) | ((b4 as u16) >> 6);
            Ok(Payload::CapacitorVolts(raw as f32 / CAP_VOLTS_SCALE))
        }
        ReadingTag::UvIndex => {
            let raw = ten_bit_sensor(b3, b4).ok_or((Field::UvIndex, b3 as f32))?;
            let index = raw / UV_SCALE;
            if index < 0.0 {
                return Err((Field::UvIndex, index));
            }
            Ok(Payload::UvIndex(index))
        }
        ReadingTag::RainSeconds => decode_rain_seconds(b3, b4).map(Payload::RainIntervalSeconds),
        ReadingTag::SolarRadiation => {
            let raw = ten_bit_sensor(b3, b4).ok_or((Field::SolarRadiation, b3 as f32))?;
            let watts = raw * SOLAR_SCALE;
            if watts < 0.0 {
                return Err((Field::SolarRadiation, watts));
            }
            Ok(Payload::SolarRadiation(watts))
        }
        ReadingTag::OutsideTemp => {
            let deg_f = i16::from_be_bytes([b3, b4]) as f32 / TEMPERATURE_SCALE;
            if !(TEMPERATURE_MIN_F..=TEMPERATURE_MAX_F).contains(&deg_f) {
                return Err((Field::Temperature, deg_f));
            }
            Ok(Payload::Temperature(deg_f))
        }
        ReadingTag::WindGust => {
            let mph = b3 as f32;
            if mph > WIND_SPEED_MAX_MPH {
                return Err((Field::WindGust, mph));
            }
            Ok(Payload::WindGust(mph))
        }
        ReadingTag::Humidity => {
            let raw = (((b4 >> 4) as u16) << 8) | b3 as u16;
            let percent = raw as f32 / HUMIDITY_SCALE;
            if percent <= 0.0 || percent > 100.0 {
                return Err((Field::Humidity, percent));
            }
            Ok(Payload::Humidity(percent))
        }
        ReadingTag::RainCount => {
            if b3 > RAIN_COUNTER_MAX {
                return Err((Field::RainCounter, b3 as f32));
            }
            Ok(Payload::RainCounter(b3))
        }
    }
}

/// 10-bit solar/UV reading with the sensor offset removed; `None` when no sensor is fitted
fn ten_bit_sensor(b3: u8, b4: u8) -> Option<f32> {
    if b3 == PAYLOAD_NO_DATA {
        return None;
    }
    let raw10 = u16::from_be_bytes([b3, b4]) >> 6;
    Some(raw10 as f32 - TEN_BIT_SENSOR_OFFSET)
}

fn decode_rain_seconds(b3: u8, b4: u8) -> std::result::Result<f32, (Field, f32)> {
    if b3 == PAYLOAD_NO_DATA {
        return Ok(RAIN_SECONDS_NO_TIP);
    }

    let raw = ((((b4 & 0x30) as u16) << 4) | b3 as u16) as f32;
    let seconds = if b4 & RAIN_HEAVY_MASK != 0 {
        raw / RAIN_HEAVY_DIVISOR
    } else {
        raw
    };

    if seconds <= 0.0 {
        return Err((Field::RainSeconds, seconds));
    }
    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iss::encoder::FrameBuilder;

    const STATION: u8 = 1;

    fn frame(tag: u8, b3: u8, b4: u8) -> RawPacket {
        FrameBuilder::new(STATION).wind(5, 64).raw_payload(tag, b3, b4).build()
    }

    #[test]
    fn test_decode_corrupted_trailer() {
        let mut bytes = *frame(0xE, 50, 0).as_bytes();
        bytes[7] ^= 0xFF;
        let packet = RawPacket::new(bytes);

        let err = decode_packet(&packet, STATION).unwrap_err();
        assert!(err.is_checksum());
        assert_eq!(err.packet(), &packet);
    }

    #[test]
    fn test_checksum_checked_before_station() {
        let mut bytes = *FrameBuilder::new(4).payload(Payload::RainCounter(1)).build().as_bytes();
        bytes[3] ^= 0x01;

        let err = decode_packet(&RawPacket::new(bytes), STATION).unwrap_err();
        assert!(matches!(err, DecodeError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_decode_wrong_station() {
        let packet = FrameBuilder::new(3).payload(Payload::RainCounter(1)).build();
        let err = decode_packet(&packet, STATION).unwrap_err();
        assert!(matches!(err, DecodeError::WrongStation { expected: 1, got: 3, .. }));
    }

    #[test]
    fn test_decode_wind_fields() {
        let packet = FrameBuilder::new(STATION).wind(12, 64).payload(Payload::RainCounter(0)).build();
        let reading = decode_packet(&packet, STATION).unwrap();

        assert_eq!(reading.wind_speed_mph, 12.0);
        assert!((reading.wind_direction_deg - 90.3).abs() < 0.001);
        assert!(!reading.battery_low);
        assert_eq!(reading.station_id, STATION);
    }

    #[test]
    fn test_decode_wind_speed_out_of_range_aborts() {
        let packet = FrameBuilder::new(STATION).wind(201, 0).payload(Payload::RainCounter(0)).build();
        let err = decode_packet(&packet, STATION).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: Field::WindSpeed, .. }));
    }

    #[test]
    fn test_wind_direction_extremes_are_valid() {
        assert!((decode_wind_direction(0) - 0.3).abs() < 0.001);
        assert!((decode_wind_direction(255) - 358.89375).abs() < 0.001);
    }

    #[test]
    fn test_decode_unknown_tag() {
        for tag in [0x0, 0x1, 0x3, 0x7, 0xF] {
            let err = decode_packet(&frame(tag, 0, 0), STATION).unwrap_err();
            assert!(matches!(err, DecodeError::UnknownTag { tag: t, .. } if t == tag));
        }
    }

    #[test]
    fn test_decode_rain_counter() {
        let reading = decode_packet(&frame(0xE, 127, 0), STATION).unwrap();
        assert_eq!(reading.payload, Payload::RainCounter(127));

        let err = decode_packet(&frame(0xE, 128, 0), STATION).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: Field::RainCounter, .. }));
    }

    #[test]
    fn test_decode_temperature() {
        // 0x2D50 = 11600 → 72.5°F
        let reading = decode_packet(&frame(0x8, 0x2D, 0x50), STATION).unwrap();
        assert_eq!(reading.payload, Payload::Temperature(72.5));

        // -1600 → -10°F
        let [b3, b4] = (-1600i16).to_be_bytes();
        let reading = decode_packet(&frame(0x8, b3, b4), STATION).unwrap();
        assert_eq!(reading.payload, Payload::Temperature(-10.0));
    }

    #[test]
    fn test_decode_temperature_out_of_range() {
        // 0x7FFF / 160 ≈ 204.8°F
        let err = decode_packet(&frame(0x8, 0x7F, 0xFF), STATION).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: Field::Temperature, .. }));
    }

    #[test]
    fn test_decode_humidity() {
        let reading = decode_packet(&frame(0xA, 0x8D, 0x20), STATION).unwrap();
        match reading.payload {
            Payload::Humidity(h) => assert!((h - 65.3).abs() < 0.001),
            other => panic!("Expected humidity, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_humidity_zero_rejected() {
        let err = decode_packet(&frame(0xA, 0, 0), STATION).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: Field::Humidity, .. }));

        // 0x3E9 = 1001 → 100.1%
        let err = decode_packet(&frame(0xA, 0xE9, 0x30), STATION).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: Field::Humidity, .. }));
    }

    #[test]
    fn test_decode_wind_gust() {
        let reading = decode_packet(&frame(0x9, 23, 0x40), STATION).unwrap();
        assert_eq!(reading.payload, Payload::WindGust(23.0));
    }

    #[test]
    fn test_decode_cap_volts() {
        // raw 0x1F4 = 500 → 5.00V: byte3 = 500 >> 2 = 125, byte4 bits 6-7 = 0
        let reading = decode_packet(&frame(0x2, 125, 0x00), STATION).unwrap();
        assert_eq!(reading.payload, Payload::CapacitorVolts(5.0));
    }

    #[test]
    fn test_decode_rain_seconds_light() {
        // byte4 bits 4-5 = 0b01 → 256 + 44 = 300 seconds
        let reading = decode_packet(&frame(0x5, 44, 0x10), STATION).unwrap();
        assert_eq!(reading.payload, Payload::RainIntervalSeconds(300.0));
    }

    #[test]
    fn test_decode_rain_seconds_heavy() {
        // heavy bit set: 160 / 16 = 10 seconds
        let reading = decode_packet(&frame(0x5, 160, 0x40), STATION).unwrap();
        assert_eq!(reading.payload, Payload::RainIntervalSeconds(10.0));
    }

    #[test]
    fn test_decode_rain_seconds_no_tip() {
        let reading = decode_packet(&frame(0x5, 0xFF, 0x71), STATION).unwrap();
        assert_eq!(reading.payload, Payload::RainIntervalSeconds(RAIN_SECONDS_NO_TIP));
    }

    #[test]
    fn test_decode_rain_seconds_zero_rejected() {
        let err = decode_packet(&frame(0x5, 0, 0), STATION).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: Field::RainSeconds, .. }));
    }

    #[test]
    fn test_decode_solar_and_uv() {
        // raw10 = 104 → (104 - 4) × 1.757936 = 175.79 W/m²
        let [b3, b4] = (104u16 << 6).to_be_bytes();
        let reading = decode_packet(&frame(0x6, b3, b4), STATION).unwrap();
        match reading.payload {
            Payload::SolarRadiation(w) => assert!((w - 175.7936).abs() < 0.01),
            other => panic!("Expected solar radiation, got {:?}", other),
        }

        // raw10 = 154 → (154 - 4) / 50 = 3.0
        let [b3, b4] = (154u16 << 6).to_be_bytes();
        let reading = decode_packet(&frame(0x4, b3, b4), STATION).unwrap();
        assert_eq!(reading.payload, Payload::UvIndex(3.0));
    }

    #[test]
    fn test_decode_solar_uv_missing_sensor() {
        for tag in [0x4, 0x6] {
            let err = decode_packet(&frame(tag, 0xFF, 0xC0), STATION).unwrap_err();
            assert!(matches!(err, DecodeError::InvalidField { .. }));
        }
    }

    #[test]
    fn test_decode_uv_below_offset_rejected() {
        let [b3, b4] = (2u16 << 6).to_be_bytes();
        let err = decode_packet(&frame(0x4, b3, b4), STATION).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: Field::UvIndex, .. }));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let packet = frame(0x8, 0x2D, 0x50);
        assert_eq!(decode_packet(&packet, STATION), decode_packet(&packet, STATION));
    }

    #[test]
    fn test_error_message_contains_packet_hex() {
        let err = decode_packet(&frame(0x3, 0, 0), STATION).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("0x3"));
        assert!(message.contains(&err.packet().to_string()));
    }
}
