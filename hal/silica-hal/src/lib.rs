//! Silica Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits and shared result
//! codes implemented by the chip-specific register HALs (LPC8xx, RP2040,
//! STM32F0). It lets drivers and the board test harness run unchanged on
//! any supported part.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Drivers / test harness (silica-drivers,     │
//! │  silica-testlink, application code)          │
//! └──────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌──────────────────────────────────────────────┐
//! │  silica-hal (this crate - traits + Status)   │
//! └──────────────────────────────────────────────┘
//!                      │
//!        ┌─────────────┼─────────────┐
//!        ▼             ▼             ▼
//! ┌────────────┐ ┌────────────┐ ┌────────────┐
//! │  silica-   │ │  silica-   │ │  silica-   │
//! │  lpc8xx    │ │  rp2040    │ │  stm32f0   │
//! └────────────┘ └────────────┘ └────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication
//! - [`i2c::I2cMaster`] - I2C master operations
//! - [`spi::SpiBus`] - SPI transfers
//!
//! All fallible operations report through the closed [`status::Status`]
//! result-code set; nothing panics and nothing logs.

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;
pub mod spi;
pub mod status;
pub mod uart;

// Re-export key items at crate root for convenience
pub use gpio::{InputPin, IoPin, OutputPin};
pub use i2c::I2cMaster;
pub use spi::SpiBus;
pub use status::Status;
pub use uart::{UartRx, UartTx};
