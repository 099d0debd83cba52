//! SWM - switch matrix
//!
//! Routes movable peripheral functions to arbitrary pins through the
//! PINASSIGN byte lanes, and gates the fixed-pin analog/system functions
//! through PINENABLE0. A function is parked by assigning lane value 0xFF.

use silica_cortex_m::mmio::{block_at, Reg32};

/// SWM register block base.
pub const BASE: usize = 0x4000_C000;

/// Lane value that detaches a movable function from every pin.
pub const UNASSIGNED: u8 = 0xFF;

/// SWM register block
#[repr(C)]
pub struct SwmBlock {
    /// Movable function assignment, four byte lanes per word
    pub pinassign: [Reg32; 15],
    _reserved0: [u8; 0x184],
    /// Fixed function enables, active low
    pub pinenable0: Reg32,
}

/// Movable functions, encoded as (PINASSIGN index, byte lane).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Movable {
    U0Txd,
    U0Rxd,
    U0Rts,
    U0Cts,
    U0Sclk,
    U1Txd,
    U1Rxd,
    U1Rts,
    U1Cts,
    U1Sclk,
    U2Txd,
    U2Rxd,
    Spi0Sck,
    Spi0Mosi,
    Spi0Miso,
    Spi0Ssel,
    Spi1Sck,
    Spi1Mosi,
    Spi1Miso,
    Spi1Ssel,
    CtinA,
    CtinB,
    CtoutA,
    CtoutB,
    I2cSda,
    I2cScl,
    AcmpO,
    Clkout,
    GpioIntBmat,
}

impl Movable {
    /// (PINASSIGN register index, byte lane within it)
    fn lane(self) -> (usize, u32) {
        use Movable::*;
        match self {
            U0Txd => (0, 0),
            U0Rxd => (0, 1),
            U0Rts => (0, 2),
            U0Cts => (0, 3),
            U0Sclk => (1, 0),
            U1Txd => (1, 1),
            U1Rxd => (1, 2),
            U1Rts => (1, 3),
            U1Cts => (2, 0),
            U1Sclk => (2, 1),
            U2Txd => (2, 2),
            U2Rxd => (2, 3),
            Spi0Sck => (3, 0),
            Spi0Mosi => (3, 1),
            Spi0Miso => (3, 2),
            Spi0Ssel => (3, 3),
            Spi1Sck => (4, 0),
            Spi1Mosi => (4, 1),
            Spi1Miso => (4, 2),
            Spi1Ssel => (4, 3),
            CtinA => (5, 0),
            CtinB => (5, 1),
            CtoutA => (5, 2),
            CtoutB => (5, 3),
            I2cSda => (6, 0),
            I2cScl => (6, 1),
            AcmpO => (6, 2),
            Clkout => (6, 3),
            GpioIntBmat => (7, 0),
        }
    }
}

/// Fixed functions (PINENABLE0 bit positions), enabled by *clearing* the bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Fixed {
    AcmpI1 = 0,
    AcmpI2 = 1,
    Swclk = 2,
    Swdio = 3,
    Xtalin = 4,
    Xtalout = 5,
    Reset = 6,
    Clkin = 7,
    VddCmp = 8,
}

/// The switch matrix.
pub struct Swm {
    regs: &'static SwmBlock,
}

impl Swm {
    /// View over the SWM block at its fixed base.
    pub fn new() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<SwmBlock>(BASE) }.unwrap();
        Self { regs }
    }

    /// Route a movable function to the given pin.
    pub fn assign(&mut self, function: Movable, pin: u8) {
        self.write_lane(function, pin);
    }

    /// Detach a movable function from whatever pin it was on.
    pub fn unassign(&mut self, function: Movable) {
        self.write_lane(function, UNASSIGNED);
    }

    /// Pin the movable function currently routes to, if any.
    pub fn assignment(&self, function: Movable) -> Option<u8> {
        let (index, lane) = function.lane();
        let value = (self.regs.pinassign[index].read() >> (lane * 8)) as u8;
        (value != UNASSIGNED).then_some(value)
    }

    fn write_lane(&mut self, function: Movable, value: u8) {
        let (index, lane) = function.lane();
        let shift = lane * 8;
        self.regs.pinassign[index]
            .modify(|v| (v & !(0xFF << shift)) | ((value as u32) << shift));
    }

    /// Hand the fixed function its pin (clears the active-low enable bit).
    pub fn enable_fixed(&mut self, function: Fixed) {
        self.regs.pinenable0.clear_bits(1 << function as u8);
    }

    /// Return the fixed function's pin to GPIO/movable use.
    pub fn disable_fixed(&mut self, function: Fixed) {
        self.regs.pinenable0.set_bits(1 << function as u8);
    }

    /// True if the fixed function currently owns its pin.
    pub fn is_fixed_enabled(&self, function: Fixed) -> bool {
        self.regs.pinenable0.read() & (1 << function as u8) == 0
    }
}

impl Default for Swm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::boxed::Box;

    fn fake() -> Swm {
        let block: &'static SwmBlock = Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        // Reset state: every lane unassigned, every fixed function enable high
        for reg in &block.pinassign {
            reg.write(0xFFFF_FFFF);
        }
        block.pinenable0.write(0x1FF);
        Swm { regs: block }
    }

    #[test]
    fn test_assign_targets_single_lane() {
        let mut swm = fake();
        swm.assign(Movable::U0Rxd, 0);
        swm.assign(Movable::U0Txd, 4);

        assert_eq!(swm.assignment(Movable::U0Txd), Some(4));
        assert_eq!(swm.assignment(Movable::U0Rxd), Some(0));
        // Untouched lanes in the same word stay parked
        assert_eq!(swm.assignment(Movable::U0Rts), None);
        assert_eq!(swm.regs.pinassign[0].read(), 0xFFFF_0004);
    }

    #[test]
    fn test_unassign_parks_lane() {
        let mut swm = fake();
        swm.assign(Movable::Spi0Sck, 12);
        swm.unassign(Movable::Spi0Sck);
        assert_eq!(swm.assignment(Movable::Spi0Sck), None);
    }

    #[test]
    fn test_fixed_enable_is_active_low() {
        let mut swm = fake();
        assert!(!swm.is_fixed_enabled(Fixed::AcmpI1));
        swm.enable_fixed(Fixed::AcmpI1);
        assert!(swm.is_fixed_enabled(Fixed::AcmpI1));
        // SWD stays untouched
        assert!(!swm.is_fixed_enabled(Fixed::Swclk));
    }
}
