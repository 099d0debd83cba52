//! GPIO - bank 0 pins through SIO, IO_BANK0 and PADS_BANK0
//!
//! Three blocks cooperate: IO_BANK0 selects the function a pin carries,
//! PADS_BANK0 sets its electrical behavior, and the single-cycle SIO block
//! drives and samples pins owned by software.

use silica_cortex_m::mmio::{block_at, Reg32};
use silica_hal::gpio::{InputPin, OutputPin};

/// SIO block base.
pub const SIO_BASE: usize = 0xD000_0000;
/// IO_BANK0 block base.
pub const IO_BANK0_BASE: usize = 0x4001_4000;
/// PADS_BANK0 block base.
pub const PADS_BANK0_BASE: usize = 0x4001_C000;

/// SIO register block (GPIO part; the inter-core FIFOs and spinlocks that
/// follow are out of scope)
#[repr(C)]
pub struct SioBlock {
    /// Core number
    pub cpuid: Reg32,
    /// Pin input values
    pub gpio_in: Reg32,
    /// QSPI pin input values
    pub gpio_hi_in: Reg32,
    _reserved0: [u8; 0x04],
    /// Output values
    pub gpio_out: Reg32,
    /// Atomic output set
    pub gpio_out_set: Reg32,
    /// Atomic output clear
    pub gpio_out_clr: Reg32,
    /// Atomic output toggle
    pub gpio_out_xor: Reg32,
    /// Output enables
    pub gpio_oe: Reg32,
    /// Atomic output-enable set
    pub gpio_oe_set: Reg32,
    /// Atomic output-enable clear
    pub gpio_oe_clr: Reg32,
    /// Atomic output-enable toggle
    pub gpio_oe_xor: Reg32,
}

/// Per-pin IO_BANK0 registers
#[repr(C)]
pub struct IoPinRegs {
    /// Pad/peripheral state observation
    pub status: Reg32,
    /// Function select and overrides
    pub ctrl: Reg32,
}

/// IO_BANK0 register block
#[repr(C)]
pub struct IoBank0Block {
    pub pin: [IoPinRegs; 30],
}

/// PADS_BANK0 register block
#[repr(C)]
pub struct PadsBank0Block {
    /// Pad voltage select
    pub voltage_select: Reg32,
    /// Per-pin pad control
    pub pad: [Reg32; 30],
}

/// Pin function (IO_BANK0 CTRL FUNCSEL values)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Function {
    Spi = 1,
    Uart = 2,
    I2c = 3,
    Pwm = 4,
    /// Software control through SIO
    Sio = 5,
    Pio0 = 6,
    Pio1 = 7,
    /// Disconnected
    Null = 0x1F,
}

/// Pad control bit assignments
pub mod pad {
    /// Fast slew rate
    pub const SLEWFAST: u32 = 1 << 0;
    /// Schmitt trigger input
    pub const SCHMITT: u32 = 1 << 1;
    /// Pull-down enable
    pub const PDE: u32 = 1 << 2;
    /// Pull-up enable
    pub const PUE: u32 = 1 << 3;
    /// Input enable
    pub const IE: u32 = 1 << 6;
    /// Output disable, overrides everything
    pub const OD: u32 = 1 << 7;
}

/// Pull resistor selection for a pad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    None,
    Up,
    Down,
}

/// The bank 0 GPIO controller.
#[derive(Clone, Copy)]
pub struct Gpio {
    sio: &'static SioBlock,
    io: &'static IoBank0Block,
    pads: &'static PadsBank0Block,
}

impl Gpio {
    /// Views over the three fixed blocks.
    pub fn new() -> Self {
        // Fixed, word-aligned bases; the view checks cannot fail.
        Self {
            sio: unsafe { block_at::<SioBlock>(SIO_BASE) }.unwrap(),
            io: unsafe { block_at::<IoBank0Block>(IO_BANK0_BASE) }.unwrap(),
            pads: unsafe { block_at::<PadsBank0Block>(PADS_BANK0_BASE) }.unwrap(),
        }
    }

    /// Route `pin` to a peripheral function, with its input buffer on and
    /// output stage enabled.
    pub fn set_function(self, pin: u8, function: Function) {
        self.pads.pad[pin as usize].modify(|v| (v | pad::IE) & !pad::OD);
        self.io.pin[pin as usize].ctrl.write(function as u32);
    }

    /// Select the pad's pull resistor.
    pub fn set_pull(self, pin: u8, pull: Pull) {
        self.pads.pad[pin as usize].modify(|v| {
            let v = v & !(pad::PUE | pad::PDE);
            match pull {
                Pull::None => v,
                Pull::Up => v | pad::PUE,
                Pull::Down => v | pad::PDE,
            }
        });
    }

    /// Claim `pin` for software output.
    pub fn output(self, pin: u8) -> Output {
        self.set_function(pin, Function::Sio);
        self.sio.gpio_oe_set.write(1 << pin);
        Output { sio: self.sio, pin }
    }

    /// Claim `pin` for software input.
    pub fn input(self, pin: u8, pull: Pull) -> Input {
        self.set_function(pin, Function::Sio);
        self.set_pull(pin, pull);
        self.sio.gpio_oe_clr.write(1 << pin);
        Input { sio: self.sio, pin }
    }
}

impl Default for Gpio {
    fn default() -> Self {
        Self::new()
    }
}

/// A pin driven through the SIO output registers.
pub struct Output {
    sio: &'static SioBlock,
    pin: u8,
}

impl OutputPin for Output {
    fn set_high(&mut self) {
        self.sio.gpio_out_set.write(1 << self.pin);
    }

    fn set_low(&mut self) {
        self.sio.gpio_out_clr.write(1 << self.pin);
    }

    fn toggle(&mut self) {
        self.sio.gpio_out_xor.write(1 << self.pin);
    }

    fn is_set_high(&self) -> bool {
        self.sio.gpio_out.read() & (1 << self.pin) != 0
    }
}

impl embedded_hal::digital::ErrorType for Output {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for Output {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        OutputPin::set_low(self);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        OutputPin::set_high(self);
        Ok(())
    }
}

impl embedded_hal::digital::StatefulOutputPin for Output {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(OutputPin::is_set_high(self))
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(OutputPin::is_set_low(self))
    }
}

/// A pin sampled through the SIO input register.
pub struct Input {
    sio: &'static SioBlock,
    pin: u8,
}

impl InputPin for Input {
    fn is_high(&self) -> bool {
        self.sio.gpio_in.read() & (1 << self.pin) != 0
    }
}

impl embedded_hal::digital::ErrorType for Input {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::InputPin for Input {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(InputPin::is_high(self))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(InputPin::is_low(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::boxed::Box;

    fn fake() -> Gpio {
        Gpio {
            sio: Box::leak(Box::new(unsafe { core::mem::zeroed() })),
            io: Box::leak(Box::new(unsafe { core::mem::zeroed() })),
            pads: Box::leak(Box::new(unsafe { core::mem::zeroed() })),
        }
    }

    #[test]
    fn test_output_claims_funcsel_and_oe() {
        let gpio = fake();
        let _out = gpio.output(7);

        assert_eq!(gpio.io.pin[7].ctrl.read(), Function::Sio as u32);
        assert_eq!(gpio.sio.gpio_oe_set.read(), 1 << 7);
        let pad_value = gpio.pads.pad[7].read();
        assert!(pad_value & pad::IE != 0);
        assert!(pad_value & pad::OD == 0);
    }

    #[test]
    fn test_input_pull_selection() {
        let gpio = fake();
        let _inp = gpio.input(12, Pull::Up);
        let pad_value = gpio.pads.pad[12].read();
        assert!(pad_value & pad::PUE != 0);
        assert!(pad_value & pad::PDE == 0);

        gpio.set_pull(12, Pull::Down);
        let pad_value = gpio.pads.pad[12].read();
        assert!(pad_value & pad::PUE == 0);
        assert!(pad_value & pad::PDE != 0);
    }

    #[test]
    fn test_input_samples_gpio_in() {
        let gpio = fake();
        let inp = gpio.input(3, Pull::None);
        assert!(inp.is_low());
        gpio.sio.gpio_in.write(1 << 3);
        assert!(inp.is_high());
    }
}
