//! IOCON - pin configuration
//!
//! Pull resistors, hysteresis, inversion and open-drain per pin. The
//! registers are not laid out in pin order; [`pin_slot`] holds the
//! pin-number-to-register scramble for the selected part.

use silica_cortex_m::mmio::{block_at, Reg32};

/// IOCON register block base.
pub const BASE: usize = 0x4004_4000;

/// IOCON register block: one configuration word per pin, scrambled order.
#[repr(C)]
pub struct IoconBlock {
    pub pio: [Reg32; 56],
}

/// Register slot for a pin number, or `None` where the pin does not exist
/// on the selected part.
#[cfg(any(feature = "lpc810", feature = "lpc812"))]
pub fn pin_slot(pin: u8) -> Option<usize> {
    // UM10601 table: PIO0_17 sits at offset 0, PIO0_0 near the end.
    const SLOTS: [usize; 19] = [
        0x44 / 4, // PIO0_0
        0x2C / 4, // PIO0_1
        0x18 / 4, // PIO0_2
        0x14 / 4, // PIO0_3
        0x10 / 4, // PIO0_4
        0x0C / 4, // PIO0_5
        0x40 / 4, // PIO0_6
        0x3C / 4, // PIO0_7
        0x38 / 4, // PIO0_8
        0x34 / 4, // PIO0_9
        0x20 / 4, // PIO0_10
        0x1C / 4, // PIO0_11
        0x08 / 4, // PIO0_12
        0x04 / 4, // PIO0_13
        0x48 / 4, // PIO0_14
        0x28 / 4, // PIO0_15
        0x24 / 4, // PIO0_16
        0x00 / 4, // PIO0_17
        0x4C / 4, // PIO0_18 (LPC812 only)
    ];
    SLOTS.get(pin as usize).copied()
}

/// Register slot for a pin number on the larger parts, which carry the
/// LPC81x scramble forward and append the added pins in order.
#[cfg(any(feature = "lpc824", feature = "lpc845"))]
pub fn pin_slot(pin: u8) -> Option<usize> {
    const SLOTS: [usize; 29] = [
        0x44 / 4, // PIO0_0
        0x2C / 4, // PIO0_1
        0x18 / 4, // PIO0_2
        0x14 / 4, // PIO0_3
        0x10 / 4, // PIO0_4
        0x0C / 4, // PIO0_5
        0x40 / 4, // PIO0_6
        0x3C / 4, // PIO0_7
        0x38 / 4, // PIO0_8
        0x34 / 4, // PIO0_9
        0x20 / 4, // PIO0_10
        0x1C / 4, // PIO0_11
        0x08 / 4, // PIO0_12
        0x04 / 4, // PIO0_13
        0x48 / 4, // PIO0_14
        0x28 / 4, // PIO0_15
        0x24 / 4, // PIO0_16
        0x00 / 4, // PIO0_17
        0x4C / 4, // PIO0_18
        0x50 / 4, // PIO0_19
        0x54 / 4, // PIO0_20
        0x58 / 4, // PIO0_21
        0x5C / 4, // PIO0_22
        0x60 / 4, // PIO0_23
        0x64 / 4, // PIO0_24
        0x68 / 4, // PIO0_25
        0x6C / 4, // PIO0_26
        0x70 / 4, // PIO0_27
        0x74 / 4, // PIO0_28
    ];
    SLOTS.get(pin as usize).copied()
}

/// Pull resistor selection (MODE field)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PullMode {
    /// No resistor
    Inactive = 0,
    PullDown = 1,
    PullUp = 2,
    /// Keeps the last driven level
    Repeater = 3,
}

/// Per-register bit assignments
pub mod cfg {
    /// Pull mode field position
    pub const MODE_SHIFT: u32 = 3;
    pub const MODE_MASK: u32 = 0x3 << MODE_SHIFT;
    /// Input hysteresis
    pub const HYS: u32 = 1 << 5;
    /// Input inversion
    pub const INV: u32 = 1 << 6;
    /// Open-drain output
    pub const OD: u32 = 1 << 10;
}

/// The pin configuration controller.
pub struct Iocon {
    regs: &'static IoconBlock,
}

impl Iocon {
    /// View over the IOCON block at its fixed base.
    pub fn new() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<IoconBlock>(BASE) }.unwrap();
        Self { regs }
    }

    /// Select the pin's pull resistor. Silently ignores nonexistent pins,
    /// like the hardware ignores writes to reserved space.
    pub fn set_pull(&mut self, pin: u8, mode: PullMode) {
        if let Some(slot) = pin_slot(pin) {
            self.regs.pio[slot]
                .modify(|v| (v & !cfg::MODE_MASK) | ((mode as u32) << cfg::MODE_SHIFT));
        }
    }

    /// Enable or disable input hysteresis.
    pub fn set_hysteresis(&mut self, pin: u8, enable: bool) {
        self.flag(pin, cfg::HYS, enable);
    }

    /// Invert the input sense.
    pub fn set_inverted(&mut self, pin: u8, enable: bool) {
        self.flag(pin, cfg::INV, enable);
    }

    /// Switch the output stage to open-drain.
    pub fn set_open_drain(&mut self, pin: u8, enable: bool) {
        self.flag(pin, cfg::OD, enable);
    }

    fn flag(&mut self, pin: u8, mask: u32, enable: bool) {
        if let Some(slot) = pin_slot(pin) {
            if enable {
                self.regs.pio[slot].set_bits(mask);
            } else {
                self.regs.pio[slot].clear_bits(mask);
            }
        }
    }
}

impl Default for Iocon {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::boxed::Box;

    fn fake() -> Iocon {
        let block: &'static IoconBlock = Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        Iocon { regs: block }
    }

    #[test]
    fn test_pull_mode_lands_in_scrambled_slot() {
        let mut iocon = fake();
        iocon.set_pull(17, PullMode::PullUp);
        // PIO0_17 is the first register in the block
        assert_eq!(iocon.regs.pio[0].read(), (PullMode::PullUp as u32) << 3);
    }

    #[test]
    fn test_flags_compose() {
        let mut iocon = fake();
        iocon.set_pull(5, PullMode::Repeater);
        iocon.set_open_drain(5, true);
        iocon.set_hysteresis(5, true);

        let slot = pin_slot(5).unwrap();
        let v = iocon.regs.pio[slot].read();
        assert_eq!(v & cfg::MODE_MASK, 3 << 3);
        assert!(v & cfg::OD != 0);
        assert!(v & cfg::HYS != 0);

        iocon.set_open_drain(5, false);
        assert!(iocon.regs.pio[slot].read() & cfg::OD == 0);
    }

    #[test]
    fn test_nonexistent_pin_is_ignored() {
        let mut iocon = fake();
        iocon.set_pull(55, PullMode::PullUp);
        // No slot written
        for reg in &iocon.regs.pio {
            assert_eq!(reg.read(), 0);
        }
    }
}
