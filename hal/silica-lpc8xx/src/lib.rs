//! NXP LPC8xx register catalog and polling peripheral drivers
//!
//! Register-level support for the LPC8xx family: strongly-typed views over
//! the memory-mapped peripheral blocks, bit-constant tables per register,
//! and thin polled drivers implementing the `silica-hal` traits.
//!
//! A part feature selects the target microcontroller and gates the
//! per-part differences (pin count, IOCON layout, peripheral instances):
//!
//! | feature  | part                         |
//! |----------|------------------------------|
//! | `lpc810` | LPC810 (DIP8, 1 port)        |
//! | `lpc812` | LPC812 (TSSOP, 1 port)       |
//! | `lpc824` | LPC824 (1 port)              |
//! | `lpc845` | LPC845 (2 ports)             |
//!
//! Every bus driver here is a straight-line busy-wait loop with no timeout:
//! a stuck peripheral hangs the caller. That is the contract at this
//! abstraction level, not an oversight.

#![no_std]

#[cfg(not(any(
    feature = "lpc810",
    feature = "lpc812",
    feature = "lpc824",
    feature = "lpc845"
)))]
compile_error!(
    "select a target part: enable exactly one of the `lpc810`, `lpc812`, `lpc824`, `lpc845` features"
);

pub mod crc;
pub mod gpio;
pub mod i2c;
pub mod iocon;
pub mod mrt;
pub mod pmu;
pub mod sct;
pub mod spi;
pub mod swm;
pub mod syscon;
pub mod usart;
pub mod wkt;
pub mod wwdt;

// Re-export shared traits for convenience
pub use silica_hal::{I2cMaster, InputPin, OutputPin, SpiBus, Status, UartRx, UartTx};

/// Number of GPIO ports on the selected part.
#[cfg(feature = "lpc845")]
pub const GPIO_PORTS: usize = 2;
#[cfg(not(feature = "lpc845"))]
pub const GPIO_PORTS: usize = 1;

/// Highest pin number on the selected part's port 0.
#[cfg(feature = "lpc810")]
pub const MAX_PIN: u8 = 5;
#[cfg(feature = "lpc812")]
pub const MAX_PIN: u8 = 17;
#[cfg(any(feature = "lpc824", feature = "lpc845"))]
pub const MAX_PIN: u8 = 28;
