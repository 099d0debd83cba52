//! SysTick - the 24-bit core tick timer
//!
//! Polled use only: start with a reload value, then watch the COUNTFLAG to
//! count wraps. No interrupt is enabled here.

use crate::mmio::{block_at, Reg32};

/// SysTick register block base (architecturally fixed).
pub const BASE: usize = 0xE000_E010;

/// Maximum reload value (24-bit counter).
pub const MAX_RELOAD: u32 = 0x00FF_FFFF;

/// SysTick register block
#[repr(C)]
pub struct SysTickBlock {
    /// Control and status
    pub csr: Reg32,
    /// Reload value
    pub rvr: Reg32,
    /// Current value
    pub cvr: Reg32,
    /// Calibration
    pub calib: Reg32,
}

/// CSR bit assignments
pub mod csr {
    /// Counter enable
    pub const ENABLE: u32 = 1 << 0;
    /// Exception request enable
    pub const TICKINT: u32 = 1 << 1;
    /// Clock source: core clock when set, vendor reference when clear
    pub const CLKSOURCE: u32 = 1 << 2;
    /// Counter wrapped since last CSR read (clears on read)
    pub const COUNTFLAG: u32 = 1 << 16;
}

/// The core tick timer.
pub struct SysTick {
    regs: &'static SysTickBlock,
}

impl SysTick {
    /// View over the fixed SysTick block.
    pub fn new() -> Self {
        // The architecture pins this block; the address check cannot fail.
        let regs = unsafe { block_at::<SysTickBlock>(BASE) }.unwrap();
        Self { regs }
    }

    /// Start free-running from `reload` on the core clock.
    ///
    /// `reload` is truncated to the 24-bit counter width.
    pub fn start(&mut self, reload: u32) {
        self.regs.csr.write(0);
        self.regs.rvr.write(reload & MAX_RELOAD);
        self.regs.cvr.write(0); // any write clears current + COUNTFLAG
        self.regs.csr.write(csr::CLKSOURCE | csr::ENABLE);
    }

    /// Stop the counter.
    pub fn stop(&mut self) {
        self.regs.csr.clear_bits(csr::ENABLE);
    }

    /// Current counter value.
    pub fn value(&self) -> u32 {
        self.regs.cvr.read()
    }

    /// True once per wrap; reading consumes the flag.
    pub fn has_wrapped(&self) -> bool {
        self.regs.csr.read() & csr::COUNTFLAG != 0
    }

    /// Busy-wait for `wraps` full reload periods.
    pub fn delay_wraps(&self, wraps: u32) {
        let mut remaining = wraps;
        while remaining > 0 {
            if self.has_wrapped() {
                remaining -= 1;
            }
        }
    }
}

impl Default for SysTick {
    fn default() -> Self {
        Self::new()
    }
}
