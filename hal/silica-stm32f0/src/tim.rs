//! TIM - general-purpose timer
//!
//! Driven as a simple up-counter: prescaler, auto-reload, update flag.
//! Enough for periodic polling and busy-wait delays; capture/compare is
//! mapped but undriven.

use silica_cortex_m::mmio::{block_at, Reg32};

/// Instance bases (general-purpose timers present across the series).
pub const TIM3_BASE: usize = 0x4000_0400;
pub const TIM14_BASE: usize = 0x4000_2000;

/// TIM register block
#[repr(C)]
pub struct TimBlock {
    /// Control 1: enable, one-pulse, update control
    pub cr1: Reg32,
    /// Control 2
    pub cr2: Reg32,
    /// Slave mode control
    pub smcr: Reg32,
    /// Interrupt enable
    pub dier: Reg32,
    /// Status (update flag; write 0 to clear)
    pub sr: Reg32,
    /// Event generation
    pub egr: Reg32,
    /// Capture/compare mode 1
    pub ccmr1: Reg32,
    /// Capture/compare mode 2
    pub ccmr2: Reg32,
    /// Capture/compare enable
    pub ccer: Reg32,
    /// Counter
    pub cnt: Reg32,
    /// Prescaler, divides by PSC + 1
    pub psc: Reg32,
    /// Auto-reload
    pub arr: Reg32,
    _reserved0: [u8; 0x04],
    /// Capture/compare values
    pub ccr: [Reg32; 4],
    _reserved1: [u8; 0x04],
    /// DMA control
    pub dcr: Reg32,
    /// DMA address
    pub dmar: Reg32,
}

/// CR1 bit assignments
pub mod cr1 {
    /// Counter enable
    pub const CEN: u32 = 1 << 0;
    /// Stop at the next update event
    pub const OPM: u32 = 1 << 3;
}

/// SR bit assignments
pub mod sr {
    /// Update (overflow) flag
    pub const UIF: u32 = 1 << 0;
}

/// EGR bit assignments
pub mod egr {
    /// Force an update event, reloading PSC and ARR
    pub const UG: u32 = 1 << 0;
}

/// One general-purpose timer instance.
pub struct Tim {
    regs: &'static TimBlock,
}

impl Tim {
    /// TIM3 at its fixed base.
    pub fn tim3() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<TimBlock>(TIM3_BASE) }.unwrap();
        Self { regs }
    }

    /// TIM14 at its fixed base.
    pub fn tim14() -> Self {
        let regs = unsafe { block_at::<TimBlock>(TIM14_BASE) }.unwrap();
        Self { regs }
    }

    /// View over a TIM block at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must map a live general-purpose timer block.
    pub unsafe fn at(addr: usize) -> Option<Self> {
        block_at::<TimBlock>(addr).map(|regs| Self { regs })
    }

    /// Program the prescaler and period, forcing a reload so both take
    /// effect immediately. The counter is left stopped.
    pub fn configure(&mut self, prescaler: u16, period: u16) {
        self.regs.cr1.write(0);
        self.regs.psc.write(prescaler as u32);
        self.regs.arr.write(period as u32);
        self.regs.egr.write(egr::UG);
        self.regs.sr.write(0); // the forced update also set UIF
    }

    /// Run free, wrapping at the period.
    pub fn start(&mut self) {
        self.regs.cr1.write(cr1::CEN);
    }

    /// Run once to the period, then stop.
    pub fn start_one_pulse(&mut self) {
        self.regs.cr1.write(cr1::OPM | cr1::CEN);
    }

    /// Stop counting.
    pub fn stop(&mut self) {
        self.regs.cr1.clear_bits(cr1::CEN);
    }

    /// Current counter value.
    pub fn count(&self) -> u32 {
        self.regs.cnt.read()
    }

    /// True once the counter has wrapped; latches until cleared.
    pub fn has_update(&self) -> bool {
        self.regs.sr.is_set(sr::UIF)
    }

    /// Acknowledge the update flag.
    pub fn clear_update(&mut self) {
        self.regs.sr.write(0);
    }

    /// Busy-wait one full period.
    pub fn delay_period(&mut self) {
        self.clear_update();
        self.start_one_pulse();
        while !self.has_update() {}
        self.clear_update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::boxed::Box;

    fn fake() -> Tim {
        let block: &'static TimBlock = Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        Tim { regs: block }
    }

    #[test]
    fn test_configure_forces_reload() {
        let mut tim = fake();
        tim.configure(47, 999);
        assert_eq!(tim.regs.psc.read(), 47);
        assert_eq!(tim.regs.arr.read(), 999);
        assert_eq!(tim.regs.egr.read(), egr::UG);
        assert!(!tim.has_update());
    }

    #[test]
    fn test_one_pulse_mode_bits() {
        let mut tim = fake();
        tim.start_one_pulse();
        assert_eq!(tim.regs.cr1.read(), cr1::OPM | cr1::CEN);
        tim.stop();
        assert_eq!(tim.regs.cr1.read(), cr1::OPM);
    }

    #[test]
    fn test_block_offsets() {
        assert_eq!(core::mem::offset_of!(TimBlock, cnt), 0x24);
        assert_eq!(core::mem::offset_of!(TimBlock, psc), 0x28);
        assert_eq!(core::mem::offset_of!(TimBlock, arr), 0x2C);
        assert_eq!(core::mem::offset_of!(TimBlock, ccr), 0x34);
        assert_eq!(core::mem::offset_of!(TimBlock, dcr), 0x48);
    }
}
