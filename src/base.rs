//! Base communication implementation for interacting with Ccs811 device
//!
//! Copyright 2019 Ryan Kurte

use core::fmt::Debug;

use embedded_hal::blocking::i2c;

use crate::device::*;
use crate::Error;

/// Base API for reading and writing device registers
/// This is implemented for I2C connections via `I2c`, but may be implemented directly
/// to drive the device over an alternate transport (or a test harness)
pub trait Base<Err> {
    /// Read `data.len()` bytes from a register
    fn read_register(&mut self, register: Register, data: &mut [u8]) -> Result<(), Error<Err>>;
    /// Write data to a register, an empty slice issues the bare register command
    fn write_register(&mut self, register: Register, data: &[u8]) -> Result<(), Error<Err>>;
}

/// Allow a driver to borrow rather than own its transport
impl<B, Err> Base<Err> for &mut B
where
    B: Base<Err>,
{
    fn read_register(&mut self, register: Register, data: &mut [u8]) -> Result<(), Error<Err>> {
        (**self).read_register(register, data)
    }

    fn write_register(&mut self, register: Register, data: &[u8]) -> Result<(), Error<Err>> {
        (**self).write_register(register, data)
    }
}

/// I2C connection to a Ccs811 at a given address
pub struct I2c<Conn> {
    conn: Conn,
    address: u8,
}

impl<Conn> I2c<Conn> {
    /// Bind an I2C connector to a device address
    pub fn new(conn: Conn, address: u8) -> Self {
        I2c { conn, address }
    }

    /// Device address in use
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Release the underlying I2C connector
    pub fn free(self) -> Conn {
        self.conn
    }
}

/// Base implementation for I2C devices
impl<Conn, Err> Base<Err> for I2c<Conn>
where
    Conn: i2c::Write<Error = Err> + i2c::WriteRead<Error = Err>,
    Err: Debug,
{
    fn read_register(&mut self, register: Register, data: &mut [u8]) -> Result<(), Error<Err>> {
        let reg = [register as u8];

        // Register address write and data read in one repeated-start transaction
        self.conn
            .write_read(self.address, &reg, data)
            .map_err(|e| Error::Conn(e))?;

        trace!("Read register: {:?} data: {:02x?}", register, data);

        Ok(())
    }

    fn write_register(&mut self, register: Register, data: &[u8]) -> Result<(), Error<Err>> {
        assert!(data.len() <= MAX_PAYLOAD, "register payload too long");

        let mut buff = [0u8; 1 + MAX_PAYLOAD];
        buff[0] = register as u8;
        buff[1..1 + data.len()].copy_from_slice(data);

        trace!("Writing register: {:?} data: {:02x?}", register, data);

        self.conn
            .write(self.address, &buff[..1 + data.len()])
            .map_err(|e| Error::Conn(e))
    }
}
