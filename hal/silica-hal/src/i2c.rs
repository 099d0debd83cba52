//! I2C master abstractions
//!
//! Traits and configuration for polled I2C master sequencing: start, data,
//! optional repeated start, stop. Addresses are 7-bit.

use crate::status::Status;

/// I2C bus master
///
/// Implementations poll the controller's pending/ready status before each
/// byte and check the reported bus state; a wedged bus hangs the caller.
/// A NACKed address or data byte terminates the transaction with
/// [`Status::Error`] after issuing a stop.
pub trait I2cMaster {
    /// Address the device, write every byte, then issue a stop.
    fn write(&mut self, address: u8, data: &[u8]) -> Status;

    /// Address the device for read, fill the buffer, NACK the final byte
    /// and issue a stop.
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Status;

    /// Write then read with a repeated start between the halves.
    ///
    /// The usual register-pointer idiom: write the register address, then
    /// read the register contents without releasing the bus.
    fn write_read(&mut self, address: u8, data: &[u8], buf: &mut [u8]) -> Status;
}

/// I2C bus configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Bus clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            frequency: 100_000, // standard mode
        }
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };

    /// Fast mode plus (1 MHz)
    pub const FAST_PLUS: Self = Self {
        frequency: 1_000_000,
    };
}
