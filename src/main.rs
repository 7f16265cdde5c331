//! Ccs811 command-line utility
//!
//! Copyright 2019 Ryan Kurte

extern crate linux_embedded_hal;
use linux_embedded_hal::I2cdev;

extern crate structopt;
use structopt::StructOpt;

extern crate humantime;
use humantime::Duration as HumanDuration;

#[macro_use]
extern crate log;
extern crate simplelog;
use simplelog::{LevelFilter, TermLogger};

extern crate sensor_ccs811;
use sensor_ccs811::{Ccs811, EnvironmentalCompensation, InitState, DEFAULT_ADDRESS};

#[derive(StructOpt)]
#[structopt(name = "ccs811-util")]
/// A Command Line Interface (CLI) for interacting with a local Ccs811 gas sensor over I2C
pub struct Options {
    #[structopt(subcommand)]
    command: Command,

    /// Specify the i2c interface to use to connect to the ccs811 device
    #[structopt(short = "d", long = "i2c", default_value = "/dev/i2c-1", env = "CCS811_I2C")]
    i2c: String,

    /// Specify the i2c address of the ccs811 device (0x5a or 0x5b)
    #[structopt(short = "a", long = "address", default_value = "0x5a", env = "CCS811_ADDRESS",
        parse(try_from_str = "parse_address"))]
    address: u8,

    /// Time to wait after initialisation before reading measurements
    #[structopt(long = "settle", default_value = "1s")]
    settle: HumanDuration,

    /// Enable verbose logging
    #[structopt(long = "log-level", default_value = "info")]
    level: LevelFilter,
}

#[derive(StructOpt)]
pub enum Command {
    /// Read hardware and firmware identifiers
    #[structopt(name = "info")]
    Info,

    /// Read the device status flags
    #[structopt(name = "status")]
    Status,

    /// Initialise the device and read one set of algorithm results
    #[structopt(name = "read")]
    Read,

    /// Write environmental compensation data
    #[structopt(name = "env")]
    Env {
        /// Relative humidity (%)
        #[structopt(long = "humidity")]
        humidity: f32,

        /// Temperature (C)
        #[structopt(long = "temperature")]
        temperature: f32,
    },

    /// Soft reset the device, returning it to boot mode
    #[structopt(name = "reset")]
    Reset,
}

fn parse_address(s: &str) -> Result<u8, std::num::ParseIntError> {
    match s.trim_start_matches("0x") {
        v if v.len() != s.len() => u8::from_str_radix(v, 16),
        _ => s.parse(),
    }
}

fn main() {
    // Load options
    let opts = Options::from_args();

    // Setup logging
    TermLogger::init(opts.level, simplelog::Config::default()).unwrap();

    debug!("Connecting to I2C device");
    let i2c = match I2cdev::new(&opts.i2c) {
        Ok(v) => v,
        Err(e) => {
            error!("Error opening I2C device '{}': {:?}", &opts.i2c, e);
            std::process::exit(-1);
        }
    };

    if opts.address != DEFAULT_ADDRESS {
        debug!("Using address 0x{:02x}", opts.address);
    }
    let mut sensor = Ccs811::new(i2c, opts.address);

    match opts.command {
        Command::Info => {
            let id = sensor.hardware_id();
            let version = sensor.hardware_version();
            let boot = sensor.firmware_boot_version();
            let app = sensor.firmware_app_version();

            match (id, version, boot, app) {
                (Ok(id), Ok(version), Ok(boot), Ok(app)) => {
                    info!("HW ID: 0x{:02x}, HW version: 0x{:02x}", id, version);
                    info!("Boot FW: {}.{}.{}", boot.major, boot.minor, boot.trivial);
                    info!("App FW: {}.{}.{}", app.major, app.minor, app.trivial);
                }
                _ => {
                    error!("Error reading device information");
                    std::process::exit(-2);
                }
            }
        }
        Command::Status => match sensor.read_status() {
            Ok(s) => {
                info!(
                    "App valid: {}, App mode: {}, Data ready: {}, Error: {}",
                    s.app_valid, s.fw_mode, s.data_ready, s.error
                );

                if s.error != 0 {
                    match sensor.read_error_id() {
                        Ok(e) => warn!("Error ID: {:?}", e),
                        Err(e) => warn!("Error reading error ID: {:?}", e),
                    }
                }
            }
            Err(e) => {
                error!("Error reading status: {:?}", e);
                std::process::exit(-2);
            }
        },
        Command::Read => {
            debug!("Initialising CCS811");
            match sensor.init() {
                Ok(InitState::Ready) => (),
                Ok(InitState::Faulted(e)) => {
                    error!("Device faulted after initialisation: {}", e);
                    std::process::exit(-3);
                }
                Err(e) => {
                    error!("Error initialising CCS811: {:?}", e);
                    std::process::exit(-3);
                }
            }

            debug!("Waiting for sensor to settle");
            std::thread::sleep(*opts.settle);

            match sensor.read_algorithm_results() {
                Ok(r) if r.status.data_ready == 0 => {
                    warn!("Sensor data not yet ready, try a longer --settle period");
                }
                Ok(r) => {
                    info!("eCO2: {} ppm, TVOC: {} ppb", r.eco2, r.tvoc);
                    debug!("Raw: {} uA, {} (ADC)", r.raw_data.current, r.raw_data.voltage);
                }
                Err(e) => {
                    error!("Error reading sensor data: {:?}", e);
                    std::process::exit(-4);
                }
            }
        }
        Command::Env {
            humidity,
            temperature,
        } => {
            let env = EnvironmentalCompensation::from_celsius(humidity, temperature);
            debug!("Writing environmental data: {:?}", env);

            if let Err(e) = sensor.set_environment(&env) {
                error!("Error writing environmental data: {:?}", e);
                std::process::exit(-5);
            }
        }
        Command::Reset => {
            if let Err(e) = sensor.software_reset() {
                error!("Error resetting device: {:?}", e);
                std::process::exit(-6);
            }
        }
    }
}
