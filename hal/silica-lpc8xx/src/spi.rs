//! SPI - serial peripheral interface master
//!
//! Two identical instances. Frames are 1 to 16 bits wide; each frame is
//! pushed through TXDATCTL so the chip-select lane, frame length and
//! end-of-transfer marker ride along with the data. The final frame of
//! every transfer carries EOT, deasserting the select line in hardware.

use silica_cortex_m::mmio::{block_at, Reg32};
use silica_hal::spi::{Phase, Polarity, SpiBus, SpiConfig};
use silica_hal::Status;

/// Instance bases.
pub const SPI0_BASE: usize = 0x4005_8000;
pub const SPI1_BASE: usize = 0x4005_C000;

/// SPI register block
#[repr(C)]
pub struct SpiBlock {
    /// Configuration
    pub cfg: Reg32,
    /// Pre- and post-transfer delays
    pub dly: Reg32,
    /// Status
    pub stat: Reg32,
    /// Interrupt enable set
    pub intenset: Reg32,
    /// Interrupt enable clear
    pub intenclr: Reg32,
    /// Receive data
    pub rxdat: Reg32,
    /// Transmit data with per-frame control bits
    pub txdatctl: Reg32,
    /// Transmit data reusing the previous control bits
    pub txdat: Reg32,
    /// Control bits alone
    pub txctl: Reg32,
    /// Clock divider, divides by DIV + 1
    pub div: Reg32,
    /// Interrupt status
    pub intstat: Reg32,
}

/// CFG bit assignments
pub mod cfg {
    pub const ENABLE: u32 = 1 << 0;
    pub const MASTER: u32 = 1 << 2;
    pub const LSBF: u32 = 1 << 3;
    pub const CPHA: u32 = 1 << 4;
    pub const CPOL: u32 = 1 << 5;
}

/// STAT bit assignments
pub mod stat {
    /// Receive data available
    pub const RXRDY: u32 = 1 << 0;
    /// Transmit register free
    pub const TXRDY: u32 = 1 << 1;
    /// Receiver overrun (write 1 to clear)
    pub const RXOV: u32 = 1 << 2;
    /// Transmitter underrun (write 1 to clear)
    pub const TXUR: u32 = 1 << 3;
    /// Master idle
    pub const MSTIDLE: u32 = 1 << 8;
}

/// TXDATCTL bit assignments (data occupies bits 0..16)
pub mod txdatctl {
    /// Select lanes, bits 16..20, active low
    pub const SSEL_SHIFT: u32 = 16;
    pub const SSEL_MASK: u32 = 0xF << SSEL_SHIFT;
    /// End of transfer: deassert the select after this frame
    pub const EOT: u32 = 1 << 20;
    /// End of frame: insert the frame delay after this frame
    pub const EOF: u32 = 1 << 21;
    /// Do not buffer receive data for this frame
    pub const RXIGNORE: u32 = 1 << 22;
    /// Frame length minus one, bits 24..28
    pub const LEN_SHIFT: u32 = 24;
}

/// One SPI master instance.
pub struct Spi {
    regs: &'static SpiBlock,
    /// Per-frame control bits (select lane + length), set by `configure`
    ctl: u32,
    /// Bytes consumed from the data slices per frame
    frame_bytes: usize,
}

impl Spi {
    /// SPI0 at its fixed base.
    pub fn spi0() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<SpiBlock>(SPI0_BASE) }.unwrap();
        Self::over(regs)
    }

    /// SPI1 at its fixed base.
    pub fn spi1() -> Self {
        let regs = unsafe { block_at::<SpiBlock>(SPI1_BASE) }.unwrap();
        Self::over(regs)
    }

    /// View over an SPI block at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must map a live SPI register block.
    pub unsafe fn at(addr: usize) -> Option<Self> {
        block_at::<SpiBlock>(addr).map(Self::over)
    }

    fn over(regs: &'static SpiBlock) -> Self {
        Self {
            regs,
            ctl: Self::frame_ctl(&SpiConfig::default()),
            frame_bytes: 1,
        }
    }

    fn frame_ctl(config: &SpiConfig) -> u32 {
        // All four select lanes idle high except the configured one.
        let ssel = (0xF & !(1u32 << config.chip_select.index())) << txdatctl::SSEL_SHIFT;
        let len = (config.word_bits as u32 - 1) << txdatctl::LEN_SHIFT;
        ssel | len
    }

    /// Program mode, clock and framing, then enable as master.
    ///
    /// `pclk` is the system clock feeding the instance; the divider math
    /// is caller-trusted (`frequency` non-zero, at most `pclk`).
    pub fn configure(&mut self, config: &SpiConfig, pclk: u32) {
        let mut value = cfg::MASTER;
        if config.polarity == Polarity::IdleHigh {
            value |= cfg::CPOL;
        }
        if config.phase == Phase::CaptureOnSecondTransition {
            value |= cfg::CPHA;
        }

        self.regs.cfg.write(value);
        self.regs.div.write(pclk / config.frequency - 1);
        self.regs.dly.write(0);
        self.regs.cfg.write(value | cfg::ENABLE);

        self.ctl = Self::frame_ctl(config);
        self.frame_bytes = if config.word_bits > 8 { 2 } else { 1 };
    }

    /// Disable the instance.
    pub fn disable(&mut self) {
        self.regs.cfg.clear_bits(cfg::ENABLE);
    }

    fn push_frame(&mut self, frame: u16, last: bool, rx_ignore: bool) {
        let mut value = self.ctl | frame as u32;
        if last {
            value |= txdatctl::EOT;
        }
        if rx_ignore {
            value |= txdatctl::RXIGNORE;
        }
        while !self.regs.stat.is_set(stat::TXRDY) {}
        self.regs.txdatctl.write(value);
    }

    fn pop_frame(&mut self) -> u16 {
        while !self.regs.stat.is_set(stat::RXRDY) {}
        self.regs.rxdat.read() as u16
    }

    fn frames(&self, bytes: usize) -> usize {
        bytes / self.frame_bytes
    }

    fn load(&self, data: &[u8], index: usize) -> u16 {
        let at = index * self.frame_bytes;
        if self.frame_bytes == 2 {
            u16::from_le_bytes([data[at], data[at + 1]])
        } else {
            data[at] as u16
        }
    }

    fn store(&self, data: &mut [u8], index: usize, frame: u16) {
        let at = index * self.frame_bytes;
        if self.frame_bytes == 2 {
            data[at..at + 2].copy_from_slice(&frame.to_le_bytes());
        } else {
            data[at] = frame as u8;
        }
    }
}

impl SpiBus for Spi {
    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Status {
        let count = self.frames(write.len().min(read.len()));
        for i in 0..count {
            let frame = self.load(write, i);
            self.push_frame(frame, i + 1 == count, false);
            let frame = self.pop_frame();
            self.store(read, i, frame);
        }
        Status::NoError
    }

    fn write(&mut self, data: &[u8]) -> Status {
        let count = self.frames(data.len());
        for i in 0..count {
            let frame = self.load(data, i);
            self.push_frame(frame, i + 1 == count, true);
        }
        Status::NoError
    }

    fn read(&mut self, buf: &mut [u8]) -> Status {
        let count = self.frames(buf.len());
        for i in 0..count {
            self.push_frame(0, i + 1 == count, false);
            let frame = self.pop_frame();
            self.store(buf, i, frame);
        }
        Status::NoError
    }

    fn transfer_in_place(&mut self, data: &mut [u8]) -> Status {
        let count = self.frames(data.len());
        for i in 0..count {
            let frame = self.load(data, i);
            self.push_frame(frame, i + 1 == count, false);
            let frame = self.pop_frame();
            self.store(data, i, frame);
        }
        Status::NoError
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silica_hal::spi::ChipSelect;

    extern crate std;
    use std::boxed::Box;

    fn fake() -> Spi {
        let block: &'static SpiBlock = Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        block.stat.write(stat::TXRDY | stat::RXRDY);
        Spi::over(block)
    }

    #[test]
    fn test_configure_mode3_divider() {
        let mut spi = fake();
        let config = SpiConfig {
            frequency: 1_000_000,
            polarity: Polarity::IdleHigh,
            phase: Phase::CaptureOnSecondTransition,
            ..SpiConfig::default()
        };
        spi.configure(&config, 12_000_000);

        let value = spi.regs.cfg.read();
        assert!(value & cfg::ENABLE != 0);
        assert!(value & cfg::MASTER != 0);
        assert!(value & cfg::CPOL != 0);
        assert!(value & cfg::CPHA != 0);
        assert_eq!(spi.regs.div.read(), 11);
    }

    #[test]
    fn test_final_frame_carries_eot() {
        let mut spi = fake();
        spi.configure(&SpiConfig::default(), 12_000_000);

        spi.write(&[0xA1, 0xB2]);
        let last = spi.regs.txdatctl.read();
        assert_eq!(last & 0xFF, 0xB2);
        assert!(last & txdatctl::EOT != 0);
        assert!(last & txdatctl::RXIGNORE != 0);
        // 8-bit frames, chip select 0 asserted (lane 0 low, lanes 1-3 high)
        assert_eq!(last & txdatctl::SSEL_MASK, 0xE << txdatctl::SSEL_SHIFT);
        assert_eq!(last >> txdatctl::LEN_SHIFT, 7);
    }

    #[test]
    fn test_wide_frames_pack_two_bytes() {
        let mut spi = fake();
        let config = SpiConfig {
            word_bits: 12,
            chip_select: ChipSelect::Cs2,
            ..SpiConfig::default()
        };
        spi.configure(&config, 12_000_000);
        spi.regs.rxdat.write(0x0123);

        let mut read = [0u8; 2];
        spi.transfer(&mut read, &[0x34, 0x0A]); // frame 0x0A34
        let sent = spi.regs.txdatctl.read();
        assert_eq!(sent & 0xFFFF, 0x0A34);
        assert_eq!(sent & txdatctl::SSEL_MASK, 0xB << txdatctl::SSEL_SHIFT);
        assert_eq!(read, [0x23, 0x01]);
    }
}
