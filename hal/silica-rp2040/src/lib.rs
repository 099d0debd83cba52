//! Raspberry Pi RP2040 register catalog and polling peripheral drivers
//!
//! Register-level support for the RP2040: subsystem resets, single-cycle
//! GPIO through the SIO block, the PL011 UARTs, PL022 SPI controllers,
//! DesignWare I2C controllers and the microsecond timebase, all driven by
//! busy-wait polling with no timeouts.
//!
//! Bring-up order matters: release the subsystem from reset
//! ([`resets::Resets`]), route the pins ([`gpio`]), then configure the
//! peripheral.

#![no_std]

pub mod gpio;
pub mod i2c;
pub mod resets;
pub mod spi;
pub mod timer;
pub mod uart;

// Re-export shared traits for convenience
pub use silica_hal::{I2cMaster, InputPin, OutputPin, SpiBus, Status, UartRx, UartTx};

/// GPIO pins in bank 0.
pub const GPIO_COUNT: u8 = 30;
