//! ST STM32F0 register catalog and polling peripheral drivers
//!
//! Register-level support for the STM32F0 series: RCC clock tree, GPIO
//! ports, the v2 USART and I2C controllers, SPI and the general-purpose
//! timers, driven by busy-wait polling with no timeouts.
//!
//! A part feature selects the target microcontroller:
//!
//! | feature     | part            |
//! |-------------|-----------------|
//! | `stm32f030` | STM32F030x      |
//! | `stm32f042` | STM32F042x      |
//! | `stm32f051` | STM32F051x      |
//!
//! Bring-up order: enable the peripheral's RCC clock ([`rcc::Rcc`]),
//! route the pins ([`gpio`]), then configure the peripheral.

#![no_std]

#[cfg(not(any(feature = "stm32f030", feature = "stm32f042", feature = "stm32f051")))]
compile_error!(
    "select a target part: enable exactly one of the `stm32f030`, `stm32f042`, `stm32f051` features"
);

pub mod gpio;
pub mod i2c;
pub mod rcc;
pub mod spi;
pub mod tim;
pub mod usart;

// Re-export shared traits for convenience
pub use silica_hal::{I2cMaster, InputPin, OutputPin, SpiBus, Status, UartRx, UartTx};
