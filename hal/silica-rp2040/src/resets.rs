//! RESETS - subsystem reset controller
//!
//! Every peripheral outside the always-on domain powers up held in reset.
//! Clear its bit and poll RESET_DONE before touching its registers.

use silica_cortex_m::mmio::{block_at, Reg32};

/// RESETS register block base.
pub const BASE: usize = 0x4000_C000;

/// RESETS register block
#[repr(C)]
pub struct ResetsBlock {
    /// Reset control, bit set = held in reset
    pub reset: Reg32,
    /// Watchdog reset select
    pub wdsel: Reg32,
    /// Reset done, bit set = subsystem out of reset and ready
    pub reset_done: Reg32,
}

/// Subsystem bit positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Subsystem {
    Adc = 0,
    BusCtrl = 1,
    Dma = 2,
    I2c0 = 3,
    I2c1 = 4,
    IoBank0 = 5,
    IoQspi = 6,
    Jtag = 7,
    PadsBank0 = 8,
    PadsQspi = 9,
    Pio0 = 10,
    Pio1 = 11,
    PllSys = 12,
    PllUsb = 13,
    Pwm = 14,
    Rtc = 15,
    Spi0 = 16,
    Spi1 = 17,
    Syscfg = 18,
    Sysinfo = 19,
    Tbman = 20,
    Timer = 21,
    Uart0 = 22,
    Uart1 = 23,
    UsbCtrl = 24,
}

/// The reset controller.
pub struct Resets {
    regs: &'static ResetsBlock,
}

impl Resets {
    /// View over the RESETS block at its fixed base.
    pub fn new() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<ResetsBlock>(BASE) }.unwrap();
        Self { regs }
    }

    /// Hold a subsystem in reset.
    pub fn assert(&mut self, subsystem: Subsystem) {
        self.regs.reset.set_bits(1 << subsystem as u8);
    }

    /// Release a subsystem and spin until it reports ready.
    pub fn release(&mut self, subsystem: Subsystem) {
        let mask = 1 << subsystem as u8;
        self.regs.reset.clear_bits(mask);
        while self.regs.reset_done.read() & mask == 0 {}
    }

    /// Pulse a subsystem through reset.
    pub fn cycle(&mut self, subsystem: Subsystem) {
        self.assert(subsystem);
        self.release(subsystem);
    }

    /// True once the subsystem is out of reset.
    pub fn is_ready(&self, subsystem: Subsystem) -> bool {
        self.regs.reset_done.read() & (1 << subsystem as u8) != 0
    }
}

impl Default for Resets {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::boxed::Box;

    fn fake() -> Resets {
        let block: &'static ResetsBlock = Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        // Everything already reports done so release() does not spin
        block.reset_done.write(0xFFFF_FFFF);
        block.reset.write(0x01FF_FFFF);
        Resets { regs: block }
    }

    #[test]
    fn test_release_clears_only_target() {
        let mut resets = fake();
        resets.release(Subsystem::Uart0);
        assert_eq!(resets.regs.reset.read(), 0x01FF_FFFF & !(1 << 22));
        assert!(resets.is_ready(Subsystem::Uart0));
    }
}
