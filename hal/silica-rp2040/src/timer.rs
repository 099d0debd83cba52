//! TIMER - microsecond timebase
//!
//! A single free-running 64-bit counter at 1 MHz. Reads go through the
//! raw registers with a high-low-high dance so the two halves are
//! consistent without using the latching side effect.

use silica_cortex_m::mmio::{block_at, Reg32};

/// TIMER register block base.
pub const BASE: usize = 0x4005_4000;

/// TIMER register block
#[repr(C)]
pub struct TimerBlock {
    /// Write high half (with TIMELW, sets the time)
    pub timehw: Reg32,
    /// Write low half
    pub timelw: Reg32,
    /// Latched read, high half
    pub timehr: Reg32,
    /// Latching read, low half
    pub timelr: Reg32,
    /// Alarms, fire on low-word match
    pub alarm: [Reg32; 4],
    /// Armed alarms, write 1 to disarm
    pub armed: Reg32,
    /// Raw read, high half
    pub timerawh: Reg32,
    /// Raw read, low half
    pub timerawl: Reg32,
    /// Debug pause control
    pub dbgpause: Reg32,
    /// Pause control
    pub pause: Reg32,
}

/// The microsecond timebase.
pub struct Timer {
    regs: &'static TimerBlock,
}

impl Timer {
    /// View over the TIMER block at its fixed base.
    pub fn new() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<TimerBlock>(BASE) }.unwrap();
        Self { regs }
    }

    /// Microseconds since reset, 64-bit.
    ///
    /// Rereads the high half until it is stable across the low-half read.
    pub fn now_us(&self) -> u64 {
        loop {
            let hi = self.regs.timerawh.read();
            let lo = self.regs.timerawl.read();
            if self.regs.timerawh.read() == hi {
                return ((hi as u64) << 32) | lo as u64;
            }
        }
    }

    /// Low 32 bits only; wraps every ~71.6 minutes.
    pub fn now_us_32(&self) -> u32 {
        self.regs.timerawl.read()
    }

    /// Busy-wait for at least `us` microseconds.
    pub fn delay_us(&self, us: u64) {
        let deadline = self.now_us().wrapping_add(us);
        while self.now_us() < deadline {}
    }

    /// Arm an alarm to fire when the low word reaches `target`.
    pub fn arm_alarm(&mut self, index: usize, target: u32) {
        self.regs.alarm[index].write(target);
    }

    /// Disarm an alarm.
    pub fn disarm_alarm(&mut self, index: usize) {
        self.regs.armed.write(1 << index);
    }

    /// True while the alarm is armed.
    pub fn is_alarm_armed(&self, index: usize) -> bool {
        self.regs.armed.read() & (1 << index) != 0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::boxed::Box;

    fn fake() -> Timer {
        let block: &'static TimerBlock = Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        Timer { regs: block }
    }

    #[test]
    fn test_now_combines_halves() {
        let timer = fake();
        timer.regs.timerawh.write(0x0000_0002);
        timer.regs.timerawl.write(0x8000_0000);
        assert_eq!(timer.now_us(), 0x2_8000_0000);
    }

    #[test]
    fn test_alarm_arming() {
        let mut timer = fake();
        timer.arm_alarm(1, 123_456);
        assert_eq!(timer.regs.alarm[1].read(), 123_456);

        timer.regs.armed.write(0b0010);
        assert!(timer.is_alarm_armed(1));
        assert!(!timer.is_alarm_armed(0));
    }

    #[test]
    fn test_block_offsets() {
        assert_eq!(core::mem::offset_of!(TimerBlock, alarm), 0x10);
        assert_eq!(core::mem::offset_of!(TimerBlock, armed), 0x20);
        assert_eq!(core::mem::offset_of!(TimerBlock, timerawh), 0x24);
        assert_eq!(core::mem::offset_of!(TimerBlock, timerawl), 0x28);
    }
}
