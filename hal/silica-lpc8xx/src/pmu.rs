//! PMU - power management unit
//!
//! Selects which low-power state the next WFI enters, keeps four words
//! alive through deep power-down, and records which sleep states the part
//! has been through.

use silica_cortex_m::mmio::{block_at, Reg32};
use silica_cortex_m::scb::Scb;

/// PMU register block base.
pub const BASE: usize = 0x4002_0000;

/// PMU register block
#[repr(C)]
pub struct PmuBlock {
    /// Power mode select and sleep flags
    pub pcon: Reg32,
    /// Retention registers, preserved through deep power-down
    pub gpreg: [Reg32; 4],
    /// Deep power-down wake-up pin control
    pub dpdctrl: Reg32,
}

/// PCON bit assignments
pub mod pcon {
    /// Power mode field
    pub const PM_MASK: u32 = 0x7;
    /// Block deep power-down entry regardless of PM
    pub const NODPD: u32 = 1 << 3;
    /// Part has been in sleep or deep sleep (write 1 to clear)
    pub const SLEEPFLAG: u32 = 1 << 8;
    /// Part woke from deep power-down (write 1 to clear)
    pub const DPDFLAG: u32 = 1 << 11;
}

/// Low-power state entered by the next WFI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerMode {
    /// Regular sleep, core clock gated
    Sleep = 0,
    /// Deep sleep, peripherals stopped per PDSLEEPCFG
    DeepSleep = 1,
    /// Power-down, flash off
    PowerDown = 2,
    /// Deep power-down, everything off except the retention registers
    DeepPowerDown = 3,
}

/// The power management unit.
pub struct Pmu {
    regs: &'static PmuBlock,
}

impl Pmu {
    /// View over the PMU block at its fixed base.
    pub fn new() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<PmuBlock>(BASE) }.unwrap();
        Self { regs }
    }

    /// Select the state for the next WFI.
    pub fn set_power_mode(&mut self, mode: PowerMode) {
        self.regs
            .pcon
            .modify(|v| (v & !pcon::PM_MASK) | mode as u32);
    }

    /// Enter regular sleep now.
    pub fn sleep(&mut self) {
        self.set_power_mode(PowerMode::Sleep);
        silica_cortex_m::wait_for_interrupt();
    }

    /// Enter the given low-power state now. Anything past [`PowerMode::Sleep`]
    /// additionally needs the core's SLEEPDEEP bit, so the SCB rides along.
    pub fn enter(&mut self, mode: PowerMode, scb: &mut Scb) {
        self.set_power_mode(mode);
        scb.set_sleepdeep(mode != PowerMode::Sleep);
        silica_cortex_m::wait_for_interrupt();
    }

    /// Stash a word in a retention register.
    pub fn retain(&mut self, index: usize, value: u32) {
        self.regs.gpreg[index].write(value);
    }

    /// Read a retention register back.
    pub fn retained(&self, index: usize) -> u32 {
        self.regs.gpreg[index].read()
    }

    /// True if the part has slept since the flag was last cleared.
    pub fn slept(&self) -> bool {
        self.regs.pcon.is_set(pcon::SLEEPFLAG)
    }

    /// True if the part woke from deep power-down.
    pub fn woke_from_deep_power_down(&self) -> bool {
        self.regs.pcon.is_set(pcon::DPDFLAG)
    }

    /// Clear the sleep history flags.
    pub fn clear_flags(&mut self) {
        self.regs.pcon.set_bits(pcon::SLEEPFLAG | pcon::DPDFLAG);
    }
}

impl Default for Pmu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::boxed::Box;

    fn fake() -> Pmu {
        let block: &'static PmuBlock = Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        Pmu { regs: block }
    }

    #[test]
    fn test_power_mode_preserves_flags() {
        let mut pmu = fake();
        pmu.regs.pcon.write(pcon::NODPD);
        pmu.set_power_mode(PowerMode::PowerDown);
        assert_eq!(pmu.regs.pcon.read(), pcon::NODPD | 2);

        pmu.set_power_mode(PowerMode::Sleep);
        assert_eq!(pmu.regs.pcon.read(), pcon::NODPD);
    }

    #[test]
    fn test_retention_round_trip() {
        let mut pmu = fake();
        pmu.retain(3, 0xCAFE_F00D);
        assert_eq!(pmu.retained(3), 0xCAFE_F00D);
        assert_eq!(pmu.retained(0), 0);
    }
}
