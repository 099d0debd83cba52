//! Nested Vectored Interrupt Controller
//!
//! Enable, pend and priority control for external interrupts. The HAL never
//! installs handlers; applications that do use these to route their lines.

use crate::mmio::{block_at, Reg32};

/// NVIC register block base (architecturally fixed).
pub const BASE: usize = 0xE000_E100;

/// NVIC register block
///
/// Eight words per bank covers the architectural maximum of 240 external
/// interrupts; Cortex-M0 parts implement only the first word of each bank.
#[repr(C)]
pub struct NvicBlock {
    /// Set-enable
    pub iser: [Reg32; 8],
    _reserved0: [Reg32; 24],
    /// Clear-enable
    pub icer: [Reg32; 8],
    _reserved1: [Reg32; 24],
    /// Set-pending
    pub ispr: [Reg32; 8],
    _reserved2: [Reg32; 24],
    /// Clear-pending
    pub icpr: [Reg32; 8],
    _reserved3: [Reg32; 56],
    /// Priority, byte-packed four per word
    pub ipr: [Reg32; 60],
}

/// The interrupt controller.
pub struct Nvic {
    regs: &'static NvicBlock,
}

impl Nvic {
    /// View over the fixed NVIC block.
    pub fn new() -> Self {
        // The architecture pins this block; the address check cannot fail.
        let regs = unsafe { block_at::<NvicBlock>(BASE) }.unwrap();
        Self { regs }
    }

    fn bank(irq: u16) -> (usize, u32) {
        ((irq / 32) as usize, 1 << (irq % 32))
    }

    /// Enable the interrupt line.
    pub fn enable(&mut self, irq: u16) {
        let (bank, bit) = Self::bank(irq);
        self.regs.iser[bank].write(bit); // write-1-to-set
    }

    /// Disable the interrupt line.
    pub fn disable(&mut self, irq: u16) {
        let (bank, bit) = Self::bank(irq);
        self.regs.icer[bank].write(bit);
    }

    /// True if the line is enabled.
    pub fn is_enabled(&self, irq: u16) -> bool {
        let (bank, bit) = Self::bank(irq);
        self.regs.iser[bank].read() & bit != 0
    }

    /// Force the line pending.
    pub fn pend(&mut self, irq: u16) {
        let (bank, bit) = Self::bank(irq);
        self.regs.ispr[bank].write(bit);
    }

    /// Retract a pending line.
    pub fn unpend(&mut self, irq: u16) {
        let (bank, bit) = Self::bank(irq);
        self.regs.icpr[bank].write(bit);
    }

    /// True if the line is pending.
    pub fn is_pending(&self, irq: u16) -> bool {
        let (bank, bit) = Self::bank(irq);
        self.regs.ispr[bank].read() & bit != 0
    }

    /// Set the line's priority byte.
    ///
    /// Priorities live four to a word; only word access is portable across
    /// the M0 parts, so this is a read-modify-write of the containing word.
    pub fn set_priority(&mut self, irq: u16, priority: u8) {
        let word = (irq / 4) as usize;
        let shift = (irq % 4) * 8;
        self.regs.ipr[word].modify(|v| {
            (v & !(0xFF << shift)) | ((priority as u32) << shift)
        });
    }

    /// Read the line's priority byte.
    pub fn priority(&self, irq: u16) -> u8 {
        let word = (irq / 4) as usize;
        let shift = (irq % 4) * 8;
        (self.regs.ipr[word].read() >> shift) as u8
    }
}

impl Default for Nvic {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_split() {
        assert_eq!(Nvic::bank(0), (0, 1));
        assert_eq!(Nvic::bank(31), (0, 1 << 31));
        assert_eq!(Nvic::bank(32), (1, 1));
        assert_eq!(Nvic::bank(45), (1, 1 << 13));
    }
}
