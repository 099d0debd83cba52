//! MRT - multi-rate timer
//!
//! Four independent 24-bit countdown channels on the system clock, each in
//! repeat or one-shot mode. Used polled: start a channel, watch its
//! interrupt flag, clear it.

use silica_cortex_m::mmio::{block_at, Reg32};

/// MRT register block base.
pub const BASE: usize = 0x4000_4000;

/// Countdown channels.
pub const CHANNELS: usize = 4;

/// Maximum interval (24-bit counter).
pub const MAX_INTERVAL: u32 = 0x00FF_FFFF;

/// Per-channel registers
#[repr(C)]
pub struct MrtChannel {
    /// Interval to count down from; bit 31 forces an immediate reload
    pub intval: Reg32,
    /// Current countdown value
    pub timer: Reg32,
    /// Mode and interrupt enable
    pub ctrl: Reg32,
    /// Flag and run state (flag is write 1 to clear)
    pub stat: Reg32,
}

/// MRT register block
#[repr(C)]
pub struct MrtBlock {
    /// Channels 0-3
    pub channel: [MrtChannel; CHANNELS],
    _reserved0: [u8; 0xB4],
    /// Lowest idle channel
    pub idle_ch: Reg32,
    /// Pending flags of all channels
    pub irq_flag: Reg32,
}

/// INTVAL bit assignments
pub mod intval {
    /// Load the interval immediately instead of at the next zero crossing
    pub const LOAD: u32 = 1 << 31;
}

/// CTRL bit assignments
pub mod ctrl {
    pub const INTEN: u32 = 1 << 0;
    /// Mode field: 0 repeat, 1 one-shot
    pub const MODE_SHIFT: u32 = 1;
    pub const MODE_REPEAT: u32 = 0 << MODE_SHIFT;
    pub const MODE_ONE_SHOT: u32 = 1 << MODE_SHIFT;
}

/// STAT bit assignments
pub mod stat {
    /// Channel fired (write 1 to clear)
    pub const INTFLAG: u32 = 1 << 0;
    /// Channel counting
    pub const RUN: u32 = 1 << 1;
}

/// The multi-rate timer.
pub struct Mrt {
    regs: &'static MrtBlock,
}

impl Mrt {
    /// View over the MRT block at its fixed base.
    pub fn new() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<MrtBlock>(BASE) }.unwrap();
        Self { regs }
    }

    /// Count down `ticks` repeatedly on `channel`.
    pub fn start_repeating(&mut self, channel: usize, ticks: u32) {
        self.regs.channel[channel].ctrl.write(ctrl::MODE_REPEAT);
        self.regs.channel[channel]
            .intval
            .write((ticks & MAX_INTERVAL) | intval::LOAD);
    }

    /// Count down `ticks` once on `channel`.
    pub fn start_one_shot(&mut self, channel: usize, ticks: u32) {
        self.regs.channel[channel].ctrl.write(ctrl::MODE_ONE_SHOT);
        self.regs.channel[channel]
            .intval
            .write((ticks & MAX_INTERVAL) | intval::LOAD);
    }

    /// Stop `channel` by loading a zero interval.
    pub fn stop(&mut self, channel: usize) {
        self.regs.channel[channel].intval.write(intval::LOAD);
    }

    /// True while `channel` is counting.
    pub fn is_running(&self, channel: usize) -> bool {
        self.regs.channel[channel].stat.is_set(stat::RUN)
    }

    /// True once `channel` has fired; the flag stays until cleared.
    pub fn has_fired(&self, channel: usize) -> bool {
        self.regs.channel[channel].stat.is_set(stat::INTFLAG)
    }

    /// Acknowledge `channel`'s flag.
    pub fn clear_flag(&mut self, channel: usize) {
        self.regs.channel[channel].stat.write(stat::INTFLAG);
    }

    /// Current countdown value of `channel`.
    pub fn value(&self, channel: usize) -> u32 {
        self.regs.channel[channel].timer.read()
    }

    /// Lowest-numbered idle channel.
    pub fn idle_channel(&self) -> usize {
        ((self.regs.idle_ch.read() >> 4) & 0xF) as usize
    }

    /// Busy-wait for `ticks` system clocks using `channel` in one-shot mode.
    pub fn delay_ticks(&mut self, channel: usize, ticks: u32) {
        self.start_one_shot(channel, ticks);
        while !self.has_fired(channel) {}
        self.clear_flag(channel);
    }
}

impl Default for Mrt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::boxed::Box;

    fn fake() -> Mrt {
        let block: &'static MrtBlock = Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        Mrt { regs: block }
    }

    #[test]
    fn test_one_shot_loads_immediately() {
        let mut mrt = fake();
        mrt.start_one_shot(2, 48_000);

        assert_eq!(
            mrt.regs.channel[2].intval.read(),
            48_000 | intval::LOAD
        );
        assert_eq!(mrt.regs.channel[2].ctrl.read(), ctrl::MODE_ONE_SHOT);
        // Other channels untouched
        assert_eq!(mrt.regs.channel[0].intval.read(), 0);
    }

    #[test]
    fn test_interval_truncates_to_24_bits() {
        let mut mrt = fake();
        mrt.start_repeating(0, 0x1234_5678);
        assert_eq!(
            mrt.regs.channel[0].intval.read(),
            0x0034_5678 | intval::LOAD
        );
    }

    #[test]
    fn test_flag_clear_is_w1c_write() {
        let mut mrt = fake();
        mrt.regs.channel[1].stat.write(stat::INTFLAG | stat::RUN);
        assert!(mrt.has_fired(1));
        mrt.clear_flag(1);
        assert_eq!(mrt.regs.channel[1].stat.read(), stat::INTFLAG);
    }

    #[test]
    fn test_block_offsets() {
        assert_eq!(core::mem::offset_of!(MrtBlock, idle_ch), 0xF4);
        assert_eq!(core::mem::offset_of!(MrtBlock, irq_flag), 0xF8);
    }
}
