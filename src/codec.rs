//! Ccs811 register encoding and decoding
//!
//! Pure conversions between the packed register formats and typed values, no I/O.
//!
//! Copyright 2019 Ryan Kurte

use crate::device::{ALG_RESULT_LEN, TEMPERATURE_OFFSET};

/// Number of fractional steps in a 9-bit ENV_DATA fraction (1/512)
const FRAC_SCALE: f32 = 512.0;

/// Combine two bytes into a big endian 16-bit word
pub fn to_word(high: u8, low: u8) -> u16 {
    (high as u16) << 8 | (low as u16)
}

/// Mask a value to its lower 9 bits
pub fn mask9(x: u16) -> u16 {
    x & ((1 << 9) - 1)
}

/// Decoded STATUS register
/// Each field holds a single bit (0 or 1), reserved bits are dropped
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct Status {
    /// Valid application firmware loaded (bit 4)
    pub app_valid: u8,
    /// Firmware is in application mode rather than boot mode (bit 7)
    pub fw_mode: u8,
    /// A new data sample is ready in ALG_RESULT_DATA (bit 3)
    pub data_ready: u8,
    /// An error occurred, see ERROR_ID (bit 0)
    pub error: u8,
}

/// Decode a STATUS byte
pub fn decode_status(v: u8) -> Status {
    Status {
        app_valid: (v >> 4) & 0x01,
        fw_mode: (v >> 7) & 0x01,
        data_ready: (v >> 3) & 0x01,
        error: v & 0x01,
    }
}

/// Decoded RAW_DATA word
///
/// Note the voltage is masked to 9 bits, bit 9 of the source word is not carried
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct RawData {
    /// Sensor current in uA (0 - 63)
    pub current: u8,
    /// Raw ADC reading of the sensor voltage (0 - 511)
    pub voltage: u16,
}

impl RawData {
    /// Reassemble the RAW_DATA word
    pub fn to_word(&self) -> u16 {
        (self.current as u16) << 10 | self.voltage
    }
}

/// Decode a RAW_DATA word from its high and low bytes
pub fn decode_raw_data(high: u8, low: u8) -> RawData {
    let raw = to_word(high, low);

    RawData {
        current: (raw >> 10) as u8,
        voltage: mask9(raw),
    }
}

/// Decoded ALG_RESULT_DATA block
/// Results are only meaningful once `status.data_ready` is set
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct AlgorithmResults {
    /// Equivalent CO2 in parts-per-million (PPM)
    /// Range: 400 - 8192
    pub eco2: u16,
    /// Total volatile organic compounds in parts-per-billion (PPB)
    /// Range: 0 - 1187
    pub tvoc: u16,
    /// Copy of the STATUS register
    pub status: Status,
    /// Copy of the ERROR_ID register
    pub error: u8,
    /// Copy of the RAW_DATA register
    pub raw_data: RawData,
}

/// A multi-byte decode was handed fewer bytes than its format requires
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct InsufficientData {
    pub expected: usize,
    pub actual: usize,
}

/// Decode an ALG_RESULT_DATA block
/// Trailing bytes beyond the 8 byte block are ignored
pub fn decode_algorithm_results(data: &[u8]) -> Result<AlgorithmResults, InsufficientData> {
    if data.len() < ALG_RESULT_LEN {
        return Err(InsufficientData {
            expected: ALG_RESULT_LEN,
            actual: data.len(),
        });
    }

    Ok(AlgorithmResults {
        eco2: to_word(data[0], data[1]),
        tvoc: to_word(data[2], data[3]),
        status: decode_status(data[4]),
        error: data[5],
        raw_data: decode_raw_data(data[6], data[7]),
    })
}

/// Encode humidity and temperature into an ENV_DATA word (big endian)
///
/// Integer parts occupy the upper 7 bits of each half-word, fractions (in 1/512ths) the lower 9.
/// Fractions of 512 or above are masked to 9 bits rather than rejected.
/// `temperature` must already include the 25 degree offset.
pub fn encode_environmental_compensation(
    humidity: u8,
    humidity_frac: u16,
    temperature: u8,
    temperature_frac: u16,
) -> [u8; 4] {
    let humidity_word = (humidity as u16) << 9 | mask9(humidity_frac);
    let temperature_word = (temperature as u16) << 9 | mask9(temperature_frac);

    let env = (humidity_word as u32) << 16 | (temperature_word as u32);

    env.to_be_bytes()
}

/// Environmental compensation data for the ENV_DATA register
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct EnvironmentalCompensation {
    /// Relative humidity, integer percent
    pub humidity: u8,
    /// Relative humidity fraction in 1/512 percent (masked to 9 bits)
    pub humidity_frac: u16,
    /// Temperature in degrees above -25 C (ie. celsius + 25)
    pub temperature: u8,
    /// Temperature fraction in 1/512 degrees (masked to 9 bits)
    pub temperature_frac: u16,
}

impl EnvironmentalCompensation {
    /// Build compensation data from relative humidity (%) and temperature (C)
    ///
    /// The temperature offset is applied here, values below the
    /// representable range (0 % and -25 C) clamp to zero
    pub fn from_celsius(humidity_percent: f32, temperature_celsius: f32) -> Self {
        let (humidity, humidity_frac) = split_fixed(humidity_percent);
        let (temperature, temperature_frac) =
            split_fixed(temperature_celsius + TEMPERATURE_OFFSET as f32);

        EnvironmentalCompensation {
            humidity,
            humidity_frac,
            temperature,
            temperature_frac,
        }
    }

    /// Relative humidity (%) represented by this compensation data
    pub fn humidity_percent(&self) -> f32 {
        self.humidity as f32 + mask9(self.humidity_frac) as f32 / FRAC_SCALE
    }

    /// Temperature (C) represented by this compensation data
    pub fn temperature_celsius(&self) -> f32 {
        self.temperature as f32 + mask9(self.temperature_frac) as f32 / FRAC_SCALE
            - TEMPERATURE_OFFSET as f32
    }

    /// Encode to the 4 byte ENV_DATA payload
    pub fn encode(&self) -> [u8; 4] {
        encode_environmental_compensation(
            self.humidity,
            self.humidity_frac,
            self.temperature,
            self.temperature_frac,
        )
    }
}

/// Split a value into an integer part (7 bits) and a 1/512 fraction
fn split_fixed(v: f32) -> (u8, u16) {
    // Largest value representable in 7.9 fixed point
    let max = 127.0 + (FRAC_SCALE - 1.0) / FRAC_SCALE;

    let v = if v > 0.0 { v } else { 0.0 };
    let v = if v < max { v } else { max };

    let int = v as u8;
    let frac = ((v - int as f32) * FRAC_SCALE) as u16;

    (int, mask9(frac))
}

/// Decoded ERROR_ID register
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct ErrorId(pub u8);

impl ErrorId {
    /// Write to an invalid register address
    pub fn write_reg_invalid(self) -> bool {
        self.0 & 0x01 != 0
    }

    /// Read from an invalid register address
    pub fn read_reg_invalid(self) -> bool {
        self.0 & 0x02 != 0
    }

    /// Unsupported mode written to MEAS_MODE
    pub fn measmode_invalid(self) -> bool {
        self.0 & 0x04 != 0
    }

    /// Sensor resistance measurement at or above its maximum range
    pub fn max_resistance(self) -> bool {
        self.0 & 0x08 != 0
    }

    /// Heater current out of range
    pub fn heater_fault(self) -> bool {
        self.0 & 0x10 != 0
    }

    /// Heater voltage not applied correctly
    pub fn heater_supply(self) -> bool {
        self.0 & 0x20 != 0
    }
}

/// Firmware version from FW_BOOT_VERSION or FW_APP_VERSION
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub trivial: u8,
}

/// Decode a 2 byte firmware version register
pub fn decode_firmware_version(data: [u8; 2]) -> FirmwareVersion {
    FirmwareVersion {
        major: data[0] >> 4,
        minor: data[0] & 0x0F,
        trivial: data[1],
    }
}
