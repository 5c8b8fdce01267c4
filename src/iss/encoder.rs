//! # ISS Frame Encoder
//!
//! Builds complete 8-byte frames with a valid CRC trailer. The relay never
//! sends frames upstream; this exists to replay and simulate ISS traffic.

use super::crc::crc16_ccitt;
use super::protocol::*;

/// Builder for a complete ISS frame
///
/// # Examples
///
/// ```
/// use iss_weather_link::iss::encoder::FrameBuilder;
/// use iss_weather_link::iss::protocol::Payload;
///
/// let packet = FrameBuilder::new(1).wind(5, 64).payload(Payload::RainCounter(50)).build();
/// assert_eq!(packet.as_bytes()[0] >> 4, 0xE);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FrameBuilder {
    station_id: u8,
    battery_low: bool,
    wind_speed: u8,
    wind_direction_raw: u8,
    tag_nibble: u8,
    data: [u8; 2],
}

impl FrameBuilder {
    /// Start a frame for the given transmitter id (1-8)
    pub fn new(station_id: u8) -> Self {
        Self {
            station_id,
            battery_low: false,
            wind_speed: 0,
            wind_direction_raw: 0,
            tag_nibble: ReadingTag::CapVoltage.nibble(),
            data: [0, 0],
        }
    }

    /// Wind speed in mph and raw direction byte
    pub fn wind(mut self, speed_mph: u8, direction_raw: u8) -> Self {
        self.wind_speed = speed_mph;
        self.wind_direction_raw = direction_raw;
        self
    }

    pub fn battery_low(mut self, low: bool) -> Self {
        self.battery_low = low;
        self
    }

    /// Raw tag nibble and payload bytes 3-4, for frames the decoder should reject
    pub fn raw_payload(mut self, tag_nibble: u8, byte3: u8, byte4: u8) -> Self {
        self.tag_nibble = tag_nibble & 0x0F;
        self.data = [byte3, byte4];
        self
    }

    /// Encode a typed payload into bytes 3-4
    pub fn payload(self, payload: Payload) -> Self {
        let [b3, b4] = encode_payload(&payload);
        self.raw_payload(payload.tag().nibble(), b3, b4)
    }

    /// Assemble the frame and append the CRC trailer
    pub fn build(&self) -> RawPacket {
        let mut header = (self.tag_nibble << 4) | (self.station_id.wrapping_sub(1) & STATION_ID_MASK);
        if self.battery_low {
            header |= BATTERY_LOW_MASK;
        }

        let mut bytes = [
            header,
            self.wind_speed,
            self.wind_direction_raw,
            self.data[0],
            self.data[1],
            PAYLOAD_NO_DATA,
            0,
            0,
        ];

        let crc = crc16_ccitt(&bytes[..6]);
        bytes[6..].copy_from_slice(&crc.to_be_bytes());

        RawPacket::new(bytes)
    }
}

/// Encode a payload value into bytes 3-4 (inverse of the decoder)
pub fn encode_payload(payload: &Payload) -> [u8; 2] {
    match *payload {
        Payload::RainCounter(count) => [count, 0],
        Payload::RainIntervalSeconds(seconds) => {
            let raw = (seconds.round() as u16).min(0x3FF);
            [(raw & 0xFF) as u8, (((raw >> 8) & 0x03) << 4) as u8]
        }
        Payload::Temperature(deg_f) => ((deg_f * TEMPERATURE_SCALE).round() as i16).to_be_bytes(),
        Payload::WindGust(mph) => [mph.round() as u8, 0],
        Payload::Humidity(percent) => {
            let raw = (percent * HUMIDITY_SCALE).round() as u16;
            [(raw & 0xFF) as u8, (((raw >> 8) & 0x0F) << 4) as u8]
        }
        Payload::CapacitorVolts(volts) => {
            let raw = ((volts * CAP_VOLTS_SCALE).round() as u16).min(0x3FF);
            [(raw >> 2) as u8, ((raw & 0x03) << 6) as u8]
        }
        Payload::SolarRadiation(watts) => {
            ten_bit_word((watts / SOLAR_SCALE + TEN_BIT_SENSOR_OFFSET).round() as u16)
        }
        Payload::UvIndex(index) => {
            ten_bit_word((index * UV_SCALE + TEN_BIT_SENSOR_OFFSET).round() as u16)
        }
    }
}

/// Place a 10-bit value in the top bits of bytes 3-4
fn ten_bit_word(raw10: u16) -> [u8; 2] {
    ((raw10.min(0x3FF)) << 6).to_be_bytes()
}
