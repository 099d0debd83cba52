//! SPI - master driver
//!
//! Two instances. Frame width is 4 to 16 bits through the CR2 DS field;
//! frames of 8 bits or less must touch the data register with byte-wide
//! access so the FIFO advances one frame at a time. Clock comes from the
//! power-of-two BR prescaler. The driver polls SR with no timeout.

use silica_cortex_m::mmio::{block_at, Reg32, Reg8};
use silica_hal::spi::{Phase, Polarity, SpiBus, SpiConfig};
use silica_hal::Status;

/// Instance bases.
pub const SPI1_BASE: usize = 0x4001_3000;
pub const SPI2_BASE: usize = 0x4000_3800;

/// SPI register block
#[repr(C)]
pub struct SpiBlock {
    /// Control 1: mode, clock, enable
    pub cr1: Reg32,
    /// Control 2: frame width, FIFO thresholds
    pub cr2: Reg32,
    /// Status
    pub sr: Reg32,
    /// Data (FIFO window; access width selects frame granularity)
    pub dr: Reg32,
    /// CRC polynomial
    pub crcpr: Reg32,
    /// Receive CRC
    pub rxcrcr: Reg32,
    /// Transmit CRC
    pub txcrcr: Reg32,
    /// I2S configuration
    pub i2scfgr: Reg32,
    /// I2S prescaler
    pub i2spr: Reg32,
}

/// CR1 bit assignments
pub mod cr1 {
    pub const CPHA: u32 = 1 << 0;
    pub const CPOL: u32 = 1 << 1;
    pub const MSTR: u32 = 1 << 2;
    /// Baud prescaler field, divides by 2^(BR + 1)
    pub const BR_SHIFT: u32 = 3;
    pub const BR_MASK: u32 = 0x7 << BR_SHIFT;
    pub const SPE: u32 = 1 << 6;
    /// Internal slave select (with SSM, keeps NSS released)
    pub const SSI: u32 = 1 << 8;
    /// Software slave management
    pub const SSM: u32 = 1 << 9;
}

/// CR2 bit assignments
pub mod cr2 {
    /// Drive NSS from the peripheral while enabled
    pub const SSOE: u32 = 1 << 2;
    /// Frame width field: value = bits - 1
    pub const DS_SHIFT: u32 = 8;
    pub const DS_MASK: u32 = 0xF << DS_SHIFT;
    /// RXNE fires per byte instead of per halfword
    pub const FRXTH: u32 = 1 << 12;
}

/// SR bit assignments
pub mod sr {
    /// Receive FIFO not empty
    pub const RXNE: u32 = 1 << 0;
    /// Transmit FIFO has room
    pub const TXE: u32 = 1 << 1;
    /// Busy shifting
    pub const BSY: u32 = 1 << 7;
}

/// One SPI master instance.
pub struct Spi {
    regs: &'static SpiBlock,
    frame_bytes: usize,
}

impl Spi {
    /// SPI1 at its fixed base.
    pub fn spi1() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<SpiBlock>(SPI1_BASE) }.unwrap();
        Self {
            regs,
            frame_bytes: 1,
        }
    }

    /// SPI2 at its fixed base.
    pub fn spi2() -> Self {
        let regs = unsafe { block_at::<SpiBlock>(SPI2_BASE) }.unwrap();
        Self {
            regs,
            frame_bytes: 1,
        }
    }

    /// View over an SPI block at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must map a live SPI register block.
    pub unsafe fn at(addr: usize) -> Option<Self> {
        block_at::<SpiBlock>(addr).map(|regs| Self {
            regs,
            frame_bytes: 1,
        })
    }

    /// Program mode, clock and frame width, then enable as master with
    /// hardware NSS output.
    ///
    /// `pclk` is the bus clock; the prescaler picks the largest power-of-two
    /// divisor not exceeding the requested frequency (caller-trusted
    /// non-zero).
    pub fn configure(&mut self, config: &SpiConfig, pclk: u32) {
        // Smallest BR with pclk / 2^(br+1) <= frequency.
        let mut br = 0;
        while br < 7 && (pclk >> (br + 1)) > config.frequency {
            br += 1;
        }

        let mut value = cr1::MSTR | (br << cr1::BR_SHIFT);
        if config.polarity == Polarity::IdleHigh {
            value |= cr1::CPOL;
        }
        if config.phase == Phase::CaptureOnSecondTransition {
            value |= cr1::CPHA;
        }
        self.regs.cr1.write(value);

        let ds = ((config.word_bits as u32 - 1) & 0xF) << cr2::DS_SHIFT;
        let mut cr2_value = ds | cr2::SSOE;
        if config.word_bits <= 8 {
            cr2_value |= cr2::FRXTH;
        }
        self.regs.cr2.write(cr2_value);

        self.regs.cr1.write(value | cr1::SPE);
        self.frame_bytes = if config.word_bits > 8 { 2 } else { 1 };
    }

    /// Disable the instance.
    pub fn disable(&mut self) {
        self.regs.cr1.clear_bits(cr1::SPE);
    }

    fn push_frame(&mut self, frame: u16) {
        while !self.regs.sr.is_set(sr::TXE) {}
        if self.frame_bytes == 2 {
            self.regs.dr.write(frame as u32);
        } else {
            // Byte-wide store so the FIFO takes exactly one 8-bit frame
            let lane = &self.regs.dr as *const Reg32 as *const Reg8;
            unsafe { (*lane).write(frame as u8) };
        }
    }

    fn pop_frame(&mut self) -> u16 {
        while !self.regs.sr.is_set(sr::RXNE) {}
        if self.frame_bytes == 2 {
            self.regs.dr.read() as u16
        } else {
            let lane = &self.regs.dr as *const Reg32 as *const Reg8;
            unsafe { (*lane).read() as u16 }
        }
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
            self.push_frame(frame);
            let frame = self.pop_frame();
            self.store(read, i, frame);
        }
        Status::NoError
    }

    fn write(&mut self, data: &[u8]) -> Status {
        let count = self.frames(data.len());
        for i in 0..count {
            let frame = self.load(data, i);
            self.push_frame(frame);
            let _ = self.pop_frame(); // keep the receive FIFO drained
        }
        Status::NoError
    }

    fn read(&mut self, buf: &mut [u8]) -> Status {
        let count = self.frames(buf.len());
        for i in 0..count {
            self.push_frame(0);
            let frame = self.pop_frame();
            self.store(buf, i, frame);
        }
        Status::NoError
    }

    fn transfer_in_place(&mut self, data: &mut [u8]) -> Status {
        let count = self.frames(data.len());
        for i in 0..count {
            let frame = self.load(data, i);
            self.push_frame(frame);
            let frame = self.pop_frame();
            self.store(data, i, frame);
        }
        Status::NoError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::boxed::Box;

    fn fake() -> Spi {
        let block: &'static SpiBlock = Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        block.sr.write(sr::TXE | sr::RXNE);
        Spi {
            regs: block,
            frame_bytes: 1,
        }
    }

    #[test]
    fn test_prescaler_picks_power_of_two() {
        let mut spi = fake();
        let config = SpiConfig {
            frequency: 1_000_000,
            ..SpiConfig::default()
        };
        spi.configure(&config, 48_000_000);
        // 48 MHz / 64 = 750 kHz is the first step at or below 1 MHz
        assert_eq!(
            (spi.regs.cr1.read() & cr1::BR_MASK) >> cr1::BR_SHIFT,
            5
        );
    }

    #[test]
    fn test_8bit_frames_set_frxth() {
        let mut spi = fake();
        spi.configure(&SpiConfig::default(), 48_000_000);
        let cr2_value = spi.regs.cr2.read();
        assert!(cr2_value & cr2::FRXTH != 0);
        assert_eq!((cr2_value & cr2::DS_MASK) >> cr2::DS_SHIFT, 7);
        assert!(cr2_value & cr2::SSOE != 0);
    }

    #[test]
    fn test_16bit_frames_use_word_access() {
        let mut spi = fake();
        let config = SpiConfig {
            word_bits: 16,
            ..SpiConfig::default()
        };
        spi.configure(&config, 48_000_000);
        assert!(spi.regs.cr2.read() & cr2::FRXTH == 0);

        let mut read = [0u8; 2];
        spi.transfer(&mut read, &[0xCD, 0xAB]);
        assert_eq!(read, [0xCD, 0xAB]); // fake echoes the pushed frame
    }
}
