//! Ccs811 digital gas sensor driver
//!
//! Reads equivalent CO2 (eCO2) and total volatile organic compounds (TVOC) from a Ccs811
//! over I2C (or any transport implementing `base::Base`).
//!
//! The device powers up in boot mode, `Ccs811::init` moves it to application mode and
//! starts measuring:
//!
//! ```text
//!  APP_START ─► HW_ID == 0x81? ─ No ─► Error::UnexpectedDevice
//!                    │
//!                   Yes
//!                    ▼
//!          STATUS.error set? ─ Yes ─► Error::DeviceError
//!                    │
//!                   No
//!                    ▼
//!       MEAS_MODE = Constant1s
//!                    ▼
//!          STATUS.error set? ─ Yes ─► InitState::Faulted
//!                    │
//!                   No ─► InitState::Ready
//! ```
//!
//! Copyright 2019 Ryan Kurte

#![cfg_attr(not(test), no_std)]

use core::fmt::Debug;
use core::marker::PhantomData;

extern crate embedded_hal;
use embedded_hal::blocking::i2c;

#[macro_use]
extern crate log;

pub mod base;
pub mod codec;
pub mod device;

use crate::base::{Base, I2c};
pub use crate::codec::{
    AlgorithmResults, EnvironmentalCompensation, ErrorId, FirmwareVersion, RawData, Status,
};
pub use crate::device::{DriveMode, Register, ALTERNATE_ADDRESS, DEFAULT_ADDRESS};
use crate::codec::*;
use crate::device::*;

/// Ccs811 error object
#[derive(Debug, PartialEq)]
pub enum Error<ConnErr> {
    /// Underlying transport error, passed through unmodified
    Conn(ConnErr),
    /// HW_ID did not match the Ccs811 identifier (0x81)
    UnexpectedDevice(u8),
    /// Device reported an error in STATUS during initialisation
    DeviceError(u8),
    /// Fewer bytes were available than a register format requires
    InsufficientData { expected: usize, actual: usize },
    /// MEAS_MODE held an unknown drive mode
    InvalidMode(u8),
}

impl<ConnErr> From<ConnErr> for Error<ConnErr> {
    fn from(conn_err: ConnErr) -> Self {
        Error::Conn(conn_err)
    }
}

/// Outcome of a completed initialisation sequence
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum InitState {
    /// Device is in application mode and measuring
    Ready,
    /// Device reported an error after the measurement mode was set
    /// (contains the STATUS error bit)
    Faulted(u8),
}

/// Ccs811 sensor object
/// This is generic over a register transport and associated error type
pub struct Ccs811<Conn, Err> {
    conn: Conn,
    _err: PhantomData<Err>,
}

impl<Conn, Err> Ccs811<I2c<Conn>, Err>
where
    Conn: i2c::Write<Error = Err> + i2c::WriteRead<Error = Err>,
    Err: Debug,
{
    /// Create a new Ccs811 sensor instance on an I2C connection
    /// No communication occurs until `init` (or another operation) is called
    pub fn new(conn: Conn, address: u8) -> Self {
        Ccs811::with_base(I2c::new(conn, address))
    }
}

impl<Conn, Err> Ccs811<Conn, Err>
where
    Conn: Base<Err>,
    Err: Debug,
{
    /// Create a new Ccs811 sensor instance over an arbitrary register transport
    /// Pass `&mut base` to borrow rather than own the transport
    pub fn with_base(conn: Conn) -> Self {
        Ccs811 {
            conn,
            _err: PhantomData,
        }
    }

    /// Release the underlying transport
    pub fn free(self) -> Conn {
        self.conn
    }

    /// Initialise the device
    ///
    /// Starts the application firmware, checks the hardware ID and status, then
    /// selects constant power mode with a measurement every second.
    /// Each step is a single register transaction, the first failure ends the sequence.
    pub fn init(&mut self) -> Result<InitState, Error<Err>> {
        debug!("Starting application firmware");
        self.start_app()?;

        let id = self.hardware_id()?;
        if id != HW_ID_CODE {
            debug!("Unexpected hardware ID: 0x{:02x}", id);
            return Err(Error::UnexpectedDevice(id));
        }

        let status = self.read_status()?;
        if status.error != 0 {
            debug!("Device error after app start: {:?}", status);
            return Err(Error::DeviceError(status.error));
        }

        debug!("Setting drive mode: {:?}", DriveMode::Constant1s);
        self.set_drive_mode(DriveMode::Constant1s)?;

        let status = self.read_status()?;
        match status.error {
            0 => Ok(InitState::Ready),
            e => Ok(InitState::Faulted(e)),
        }
    }

    /// Start the application firmware (boot -> application mode)
    /// This is called by `init`, and exposed for manual sequencing
    pub fn start_app(&mut self) -> Result<(), Error<Err>> {
        self.conn.write_register(Register::AppStart, &[])
    }

    /// Read the device status
    pub fn read_status(&mut self) -> Result<Status, Error<Err>> {
        let v = self.read_u8(Register::Status)?;
        Ok(decode_status(v))
    }

    /// Read the latest algorithm results
    /// Values are only meaningful once `Status::data_ready` is set, this is not checked here
    pub fn read_algorithm_results(&mut self) -> Result<AlgorithmResults, Error<Err>> {
        let mut buff = [0u8; ALG_RESULT_LEN];

        self.conn.read_register(Register::AlgResultData, &mut buff)?;

        decode_algorithm_results(&buff).map_err(|e| Error::InsufficientData {
            expected: e.expected,
            actual: e.actual,
        })
    }

    /// Read the raw sensor current and voltage
    pub fn read_raw_data(&mut self) -> Result<RawData, Error<Err>> {
        let mut buff = [0u8; 2];

        self.conn.read_register(Register::RawData, &mut buff)?;

        Ok(decode_raw_data(buff[0], buff[1]))
    }

    /// Write environmental compensation data
    ///
    /// `temperature` is degrees above -25 C (ie. the 25 degree offset must already be applied).
    /// Fractions are in 1/512ths and are masked to 9 bits.
    pub fn write_environmental_data(
        &mut self,
        humidity: u8,
        humidity_frac: u16,
        temperature: u8,
        temperature_frac: u16,
    ) -> Result<(), Error<Err>> {
        let data =
            encode_environmental_compensation(humidity, humidity_frac, temperature, temperature_frac);

        self.conn.write_register(Register::EnvData, &data)
    }

    /// Write environmental compensation data
    pub fn set_environment(&mut self, env: &EnvironmentalCompensation) -> Result<(), Error<Err>> {
        self.conn.write_register(Register::EnvData, &env.encode())
    }

    /// Configure the measurement drive mode (interrupts disabled)
    pub fn set_drive_mode(&mut self, mode: DriveMode) -> Result<(), Error<Err>> {
        self.conn.write_register(Register::MeasMode, &[mode.meas_mode()])
    }

    /// Fetch the current measurement drive mode
    pub fn drive_mode(&mut self) -> Result<DriveMode, Error<Err>> {
        let v = self.read_u8(Register::MeasMode)?;

        DriveMode::from_meas_mode(v).ok_or(Error::InvalidMode(v))
    }

    /// Read the hardware ID (0x81 for a Ccs811)
    pub fn hardware_id(&mut self) -> Result<u8, Error<Err>> {
        self.read_u8(Register::HwId)
    }

    /// Read the hardware version (0x1X)
    pub fn hardware_version(&mut self) -> Result<u8, Error<Err>> {
        self.read_u8(Register::HwVersion)
    }

    pub fn firmware_boot_version(&mut self) -> Result<FirmwareVersion, Error<Err>> {
        self.read_version(Register::FwBootVersion)
    }

    pub fn firmware_app_version(&mut self) -> Result<FirmwareVersion, Error<Err>> {
        self.read_version(Register::FwAppVersion)
    }

    /// Read the source of a reported error
    pub fn read_error_id(&mut self) -> Result<ErrorId, Error<Err>> {
        let v = self.read_u8(Register::ErrorId)?;
        Ok(ErrorId(v))
    }

    /// Fetch the encoded algorithm baseline
    /// This can be stored and later restored with `set_baseline`
    pub fn baseline(&mut self) -> Result<[u8; 2], Error<Err>> {
        let mut buff = [0u8; 2];

        self.conn.read_register(Register::Baseline, &mut buff)?;

        Ok(buff)
    }

    /// Restore a previously fetched algorithm baseline
    pub fn set_baseline(&mut self, baseline: [u8; 2]) -> Result<(), Error<Err>> {
        self.conn.write_register(Register::Baseline, &baseline)
    }

    /// Soft reset the underlying device, returning it to boot mode
    /// `init` must be called again before measurements resume
    pub fn software_reset(&mut self) -> Result<(), Error<Err>> {
        self.conn.write_register(Register::SwReset, &SW_RESET_SEQUENCE)
    }

    fn read_version(&mut self, register: Register) -> Result<FirmwareVersion, Error<Err>> {
        let mut buff = [0u8; 2];

        self.conn.read_register(register, &mut buff)?;

        Ok(decode_firmware_version(buff))
    }

    fn read_u8(&mut self, register: Register) -> Result<u8, Error<Err>> {
        let mut buff = [0u8; 1];

        self.conn.read_register(register, &mut buff)?;

        Ok(buff[0])
    }
}

#[cfg(test)]
mod test {
    use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    use super::*;

    #[test]
    fn test_init() {
        // Set up expectations
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0xF4]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x20], vec![0x81]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x00], vec![0x00]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x01, 0x10]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x00], vec![0x00]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        // Create sensor object
        let mut sensor = Ccs811::new(i2c.clone(), DEFAULT_ADDRESS);

        // Initialise
        let state = sensor.init().unwrap();
        assert_eq!(state, InitState::Ready);

        // Finalize expectations
        i2c.done();
    }

    #[test]
    fn test_init_unexpected_device() {
        // No further register access after the ID check fails
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0xF4]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x20], vec![0x7F]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Ccs811::new(i2c.clone(), DEFAULT_ADDRESS);

        match sensor.init() {
            Err(Error::UnexpectedDevice(0x7F)) => (),
            r => panic!("unexpected init result: {:?}", r),
        }

        i2c.done();
    }

    #[test]
    fn test_init_device_error() {
        // Mode register is not written when status reports an error
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0xF4]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x20], vec![0x81]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x00], vec![0x01]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Ccs811::new(i2c.clone(), DEFAULT_ADDRESS);

        match sensor.init() {
            Err(Error::DeviceError(1)) => (),
            r => panic!("unexpected init result: {:?}", r),
        }

        i2c.done();
    }

    #[test]
    fn test_init_faulted() {
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0xF4]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x20], vec![0x81]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x00], vec![0x90]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x01, 0x10]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x00], vec![0x91]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Ccs811::new(i2c.clone(), DEFAULT_ADDRESS);

        let state = sensor.init().unwrap();
        assert_eq!(state, InitState::Faulted(1));

        i2c.done();
    }

    #[test]
    fn test_start_app() {
        let expectations = [I2cTransaction::write(ALTERNATE_ADDRESS, vec![0xF4])];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Ccs811::new(i2c.clone(), ALTERNATE_ADDRESS);

        sensor.start_app().unwrap();

        i2c.done();
    }

    #[test]
    fn test_read_status() {
        let expectations = [I2cTransaction::write_read(
            DEFAULT_ADDRESS,
            vec![0x00],
            vec![0x98],
        )];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Ccs811::new(i2c.clone(), DEFAULT_ADDRESS);

        let status = sensor.read_status().unwrap();
        assert_eq!(
            status,
            Status {
                app_valid: 1,
                fw_mode: 1,
                data_ready: 1,
                error: 0
            }
        );

        i2c.done();
    }

    #[test]
    fn test_read_algorithm_results() {
        let expectations = [I2cTransaction::write_read(
            DEFAULT_ADDRESS,
            vec![0x02],
            vec![
                0x01, 0xA9, // eCO2: 425 ppm
                0x00, 0x04, // TVOC: 4 ppb
                0x98, // Status: app mode, app valid, data ready
                0x00, // Error ID
                0x24, 0x8A, // Raw: 9 uA, 0x08A
            ],
        )];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Ccs811::new(i2c.clone(), DEFAULT_ADDRESS);

        let r = sensor.read_algorithm_results().unwrap();
        assert_eq!(r.eco2, 425);
        assert_eq!(r.tvoc, 4);
        assert_eq!(r.status.data_ready, 1);
        assert_eq!(r.error, 0);
        assert_eq!(r.raw_data.current, 9);
        assert_eq!(r.raw_data.voltage, 0x08A);

        i2c.done();
    }

    #[test]
    fn test_read_raw_data() {
        let expectations = [I2cTransaction::write_read(
            DEFAULT_ADDRESS,
            vec![0x03],
            vec![0x24, 0x8A],
        )];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Ccs811::new(i2c.clone(), DEFAULT_ADDRESS);

        let r = sensor.read_raw_data().unwrap();
        assert_eq!(
            r,
            RawData {
                current: 9,
                voltage: 0x08A
            }
        );

        i2c.done();
    }

    #[test]
    fn test_write_environmental_data() {
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x05, 0x61, 0x00, 0x64, 0x00]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x05, 0x61, 0x00, 0x64, 0x00]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Ccs811::new(i2c.clone(), DEFAULT_ADDRESS);

        // 48.5 % RH, 25 C
        sensor.write_environmental_data(48, 256, 50, 0).unwrap();

        let env = EnvironmentalCompensation::from_celsius(48.5, 25.0);
        sensor.set_environment(&env).unwrap();

        i2c.done();
    }

    #[test]
    fn test_drive_mode() {
        let expectations = [
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x01, 0x30]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x01], vec![0x30]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x01], vec![0x70]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Ccs811::new(i2c.clone(), DEFAULT_ADDRESS);

        sensor.set_drive_mode(DriveMode::LowPower60s).unwrap();
        assert_eq!(sensor.drive_mode().unwrap(), DriveMode::LowPower60s);

        match sensor.drive_mode() {
            Err(Error::InvalidMode(0x70)) => (),
            r => panic!("unexpected drive mode: {:?}", r),
        }

        i2c.done();
    }

    #[test]
    fn test_device_info() {
        let expectations = [
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x20], vec![0x81]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x21], vec![0x12]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x23], vec![0x10, 0x00]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x24], vec![0x20, 0x07]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0xE0], vec![0x10]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Ccs811::new(i2c.clone(), DEFAULT_ADDRESS);

        assert_eq!(sensor.hardware_id().unwrap(), HW_ID_CODE);
        assert_eq!(sensor.hardware_version().unwrap(), 0x12);

        let boot = sensor.firmware_boot_version().unwrap();
        assert_eq!((boot.major, boot.minor, boot.trivial), (1, 0, 0));

        let app = sensor.firmware_app_version().unwrap();
        assert_eq!((app.major, app.minor, app.trivial), (2, 0, 7));

        let e = sensor.read_error_id().unwrap();
        assert!(e.heater_fault());
        assert!(!e.heater_supply());

        i2c.done();
    }

    #[test]
    fn test_baseline() {
        let expectations = [
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x11], vec![0x84, 0xB3]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x11, 0x84, 0xB3]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Ccs811::new(i2c.clone(), DEFAULT_ADDRESS);

        let b = sensor.baseline().unwrap();
        assert_eq!(b, [0x84, 0xB3]);
        sensor.set_baseline(b).unwrap();

        i2c.done();
    }

    #[test]
    fn test_software_reset() {
        let expectations = [I2cTransaction::write(
            DEFAULT_ADDRESS,
            vec![0xFF, 0x11, 0xE5, 0x72, 0x8A],
        )];
        let mut i2c = I2cMock::new(&expectations);

        let mut sensor = Ccs811::new(i2c.clone(), DEFAULT_ADDRESS);

        sensor.software_reset().unwrap();

        i2c.done();
    }

    /// Transport that fails every transaction and records how many were attempted
    struct FailingBase {
        attempts: usize,
    }

    impl Base<i32> for FailingBase {
        fn read_register(&mut self, _register: Register, _data: &mut [u8]) -> Result<(), Error<i32>> {
            self.attempts += 1;
            Err(Error::Conn(-5))
        }

        fn write_register(&mut self, _register: Register, _data: &[u8]) -> Result<(), Error<i32>> {
            self.attempts += 1;
            Err(Error::Conn(-6))
        }
    }

    #[test]
    fn test_transport_errors() {
        let mut base = FailingBase { attempts: 0 };

        {
            // Borrow the transport rather than consume it
            let mut sensor: Ccs811<_, i32> = Ccs811::with_base(&mut base);

            // Init stops at the first failed transaction
            assert_eq!(sensor.init(), Err(Error::Conn(-6)));
            assert_eq!(sensor.read_status(), Err(Error::Conn(-5)));
            assert_eq!(sensor.read_algorithm_results(), Err(Error::Conn(-5)));
            assert_eq!(sensor.write_environmental_data(50, 0, 45, 0), Err(Error::Conn(-6)));
        }

        assert_eq!(base.attempts, 4);
    }
}
