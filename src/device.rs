//! Ccs811 device definitions
//!
//! Copyright 2019 Ryan Kurte

/// Ccs811 default I2C address (ADDR pin low)
pub const DEFAULT_ADDRESS: u8 = 0x5A;

/// Ccs811 alternate I2C address (ADDR pin high)
pub const ALTERNATE_ADDRESS: u8 = 0x5B;

/// Value reported by the HW_ID register on a genuine Ccs811
pub const HW_ID_CODE: u8 = 0x81;

/// Byte sequence that must be written to SW_RESET in a single transaction
/// to return the device to boot mode
pub const SW_RESET_SEQUENCE: [u8; 4] = [0x11, 0xE5, 0x72, 0x8A];

/// Temperature offset (degrees celsius) applied to the integer part of ENV_DATA temperature
pub const TEMPERATURE_OFFSET: i16 = 25;

/// Length of the ALG_RESULT_DATA block
pub const ALG_RESULT_LEN: usize = 8;

/// Largest payload written to any register (ENV_DATA and SW_RESET)
pub const MAX_PAYLOAD: usize = 4;

/// Ccs811 register (mailbox) addresses
/// All registers are a single byte unless noted, multi-byte registers are big endian
#[derive(PartialEq, Clone, Copy, Debug)]
#[repr(u8)]
pub enum Register {
    /// Status flags, 1 byte, readable in boot and application mode
    Status = 0x00,

    /// Measurement mode and interrupt configuration, 1 byte
    MeasMode = 0x01,

    /// Algorithm results, 8 bytes:
    /// eCO2 (2), TVOC (2), STATUS (1), ERROR_ID (1), RAW_DATA (2)
    AlgResultData = 0x02,

    /// Raw ADC data, 2 bytes (current and voltage)
    RawData = 0x03,

    /// Environmental compensation, 4 bytes, write only
    EnvData = 0x05,

    /// Encoded algorithm baseline, 2 bytes
    Baseline = 0x11,

    /// Hardware ID, always 0x81
    HwId = 0x20,

    /// Hardware version, 0x1X
    HwVersion = 0x21,

    /// Boot firmware version, 2 bytes
    FwBootVersion = 0x23,

    /// Application firmware version, 2 bytes
    FwAppVersion = 0x24,

    /// Error source when STATUS reports an error
    ErrorId = 0xE0,

    /// Start the application firmware (boot -> application mode)
    /// No associated data
    AppStart = 0xF4,

    /// Software reset, takes the 4 byte SW_RESET_SEQUENCE
    SwReset = 0xFF,
}

/// Measurement drive mode, stored in MEAS_MODE bits 6:4
#[derive(PartialEq, Clone, Copy, Debug)]
#[repr(u8)]
pub enum DriveMode {
    /// Idle, measurements disabled
    Idle = 0b000,
    /// Constant power mode, a measurement every second
    Constant1s = 0b001,
    /// Pulse heating mode, a measurement every 10 seconds
    Pulse10s = 0b010,
    /// Low power pulse heating mode, a measurement every 60 seconds
    LowPower60s = 0b011,
    /// Constant power mode, raw data only every 250 ms
    Raw250ms = 0b100,
}

const DRIVE_MODE_SHIFT: u8 = 4;
const DRIVE_MODE_MASK: u8 = 0b0111_0000;

impl DriveMode {
    /// MEAS_MODE register value selecting this mode with interrupts disabled
    pub fn meas_mode(self) -> u8 {
        (self as u8) << DRIVE_MODE_SHIFT
    }

    /// Extract the drive mode from a MEAS_MODE register value
    /// Interrupt configuration bits are ignored
    pub fn from_meas_mode(v: u8) -> Option<Self> {
        match (v & DRIVE_MODE_MASK) >> DRIVE_MODE_SHIFT {
            0b000 => Some(DriveMode::Idle),
            0b001 => Some(DriveMode::Constant1s),
            0b010 => Some(DriveMode::Pulse10s),
            0b011 => Some(DriveMode::LowPower60s),
            0b100 => Some(DriveMode::Raw250ms),
            _ => None,
        }
    }
}
