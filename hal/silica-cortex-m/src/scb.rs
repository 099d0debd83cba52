//! System Control Block
//!
//! Identity, reset request and sleep-mode control. Fault status registers
//! are omitted; the supported parts are Cortex-M0/M0+ where they do not
//! exist.

use crate::mmio::{block_at, Reg32};

/// SCB register block base (architecturally fixed).
pub const BASE: usize = 0xE000_ED00;

/// SCB register block
#[repr(C)]
pub struct ScbBlock {
    /// CPU identity
    pub cpuid: Reg32,
    /// Interrupt control and state
    pub icsr: Reg32,
    /// Vector table offset
    pub vtor: Reg32,
    /// Application interrupt and reset control
    pub aircr: Reg32,
    /// System control (sleep modes)
    pub scr: Reg32,
    /// Configuration and control
    pub ccr: Reg32,
}

/// AIRCR bit assignments
pub mod aircr {
    /// Write key; any AIRCR write without it is ignored
    pub const VECTKEY: u32 = 0x05FA << 16;
    /// Request a system reset
    pub const SYSRESETREQ: u32 = 1 << 2;
}

/// SCR bit assignments
pub mod scr {
    /// Enter sleep on exception return
    pub const SLEEPONEXIT: u32 = 1 << 1;
    /// Select the deep sleep state for the next WFI
    pub const SLEEPDEEP: u32 = 1 << 2;
}

/// The System Control Block.
pub struct Scb {
    regs: &'static ScbBlock,
}

impl Scb {
    /// View over the fixed SCB block.
    pub fn new() -> Self {
        // The architecture pins this block; the address check cannot fail.
        let regs = unsafe { block_at::<ScbBlock>(BASE) }.unwrap();
        Self { regs }
    }

    /// Implementer/part/revision word.
    pub fn cpuid(&self) -> u32 {
        self.regs.cpuid.read()
    }

    /// Request a system reset and spin until it takes effect.
    pub fn system_reset(&mut self) -> ! {
        self.regs.aircr.write(aircr::VECTKEY | aircr::SYSRESETREQ);
        loop {
            crate::nop();
        }
    }

    /// Select deep sleep for subsequent WFI instructions.
    pub fn set_sleepdeep(&mut self, deep: bool) {
        if deep {
            self.regs.scr.set_bits(scr::SLEEPDEEP);
        } else {
            self.regs.scr.clear_bits(scr::SLEEPDEEP);
        }
    }

    /// Re-enter sleep automatically when the last exception returns.
    pub fn set_sleep_on_exit(&mut self, enable: bool) {
        if enable {
            self.regs.scr.set_bits(scr::SLEEPONEXIT);
        } else {
            self.regs.scr.clear_bits(scr::SLEEPONEXIT);
        }
    }
}

impl Default for Scb {
    fn default() -> Self {
        Self::new()
    }
}
