//! WWDT - windowed watchdog timer
//!
//! Classic feed-or-die watchdog on the watchdog oscillator, with an
//! optional valid-feed window and an early-warning compare point. Once
//! started it cannot be stopped except by reset.

use silica_cortex_m::mmio::{block_at, Reg32};

/// WWDT register block base.
pub const BASE: usize = 0x4000_0000;

/// Maximum timeout value (24-bit counter).
pub const MAX_COUNT: u32 = 0x00FF_FFFF;

/// WWDT register block
#[repr(C)]
pub struct WwdtBlock {
    /// Mode and status
    pub mod_: Reg32,
    /// Timeout value reloaded on feed
    pub tc: Reg32,
    /// Feed sequence register
    pub feed: Reg32,
    /// Current countdown value
    pub tv: Reg32,
    _reserved0: [u8; 0x04],
    /// Early warning compare value
    pub warnint: Reg32,
    /// Feeds above this value are invalid
    pub window: Reg32,
}

/// MOD bit assignments
pub mod mod_ {
    /// Watchdog running (set once, cleared only by reset)
    pub const WDEN: u32 = 1 << 0;
    /// Timeout resets the chip instead of just flagging
    pub const WDRESET: u32 = 1 << 1;
    /// Timeout happened (write 0 to clear after a flag-only timeout)
    pub const WDTOF: u32 = 1 << 2;
    /// Warning compare hit (write 1 to clear)
    pub const WDINT: u32 = 1 << 3;
    /// Feeds allowed only in the window
    pub const WDPROTECT: u32 = 1 << 4;
}

/// The windowed watchdog.
pub struct Wwdt {
    regs: &'static WwdtBlock,
}

impl Wwdt {
    /// View over the WWDT block at its fixed base.
    pub fn new() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<WwdtBlock>(BASE) }.unwrap();
        Self { regs }
    }

    /// Set the timeout and whether expiry resets the chip. Must happen
    /// before [`Wwdt::start`]; the enable bit is sticky.
    pub fn configure(&mut self, timeout_ticks: u32, reset_on_timeout: bool) {
        self.regs.tc.write(timeout_ticks & MAX_COUNT);
        let mut value = 0;
        if reset_on_timeout {
            value |= mod_::WDRESET;
        }
        self.regs.mod_.write(value);
    }

    /// Arm the watchdog. The first feed starts the countdown.
    pub fn start(&mut self) {
        self.regs.mod_.set_bits(mod_::WDEN);
        self.feed();
    }

    /// Reload the countdown with the 0xAA 0x55 sequence.
    ///
    /// The two stores must not have another watchdog register access
    /// between them.
    pub fn feed(&mut self) {
        self.regs.feed.write(0xAA);
        self.regs.feed.write(0x55);
    }

    /// Restrict valid feeds to counter values at or below `window`.
    pub fn set_window(&mut self, window: u32) {
        self.regs.window.write(window & MAX_COUNT);
        self.regs.mod_.set_bits(mod_::WDPROTECT);
    }

    /// Flag an early warning when the counter passes `compare`.
    pub fn set_warning(&mut self, compare: u32) {
        self.regs.warnint.write(compare & 0x3FF);
    }

    /// Current countdown value.
    pub fn value(&self) -> u32 {
        self.regs.tv.read()
    }

    /// True if the last reset came from a watchdog timeout.
    pub fn timed_out(&self) -> bool {
        self.regs.mod_.is_set(mod_::WDTOF)
    }

    /// Clear the timeout flag.
    pub fn clear_timeout(&mut self) {
        self.regs.mod_.clear_bits(mod_::WDTOF);
    }
}

impl Default for Wwdt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::boxed::Box;

    fn fake() -> Wwdt {
        let block: &'static WwdtBlock = Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        Wwdt { regs: block }
    }

    #[test]
    fn test_configure_then_start() {
        let mut wwdt = fake();
        wwdt.configure(0x4000, true);
        assert_eq!(wwdt.regs.tc.read(), 0x4000);
        assert_eq!(wwdt.regs.mod_.read(), mod_::WDRESET);

        wwdt.start();
        assert!(wwdt.regs.mod_.is_set(mod_::WDEN | mod_::WDRESET));
        // Feed sequence completed with the magic tail byte
        assert_eq!(wwdt.regs.feed.read(), 0x55);
    }

    #[test]
    fn test_window_sets_protect() {
        let mut wwdt = fake();
        wwdt.set_window(0x1000);
        assert_eq!(wwdt.regs.window.read(), 0x1000);
        assert!(wwdt.regs.mod_.is_set(mod_::WDPROTECT));
    }
}
