//! SPI - ARM PL022
//!
//! Two instances. Frames are 4 to 16 bits (DSS field). The controller has
//! a single hardware select line, so the chip-select field of the shared
//! config is ignored here; drive additional selects as plain GPIO.
//! Transfers poll the status register with no timeout.

use silica_cortex_m::mmio::{block_at, Reg32};
use silica_hal::spi::{Phase, Polarity, SpiBus, SpiConfig};
use silica_hal::Status;

/// Instance bases.
pub const SPI0_BASE: usize = 0x4003_C000;
pub const SPI1_BASE: usize = 0x4004_0000;

/// SPI register block
#[repr(C)]
pub struct SpiBlock {
    /// Control 0: frame format, clock phase/polarity, clock rate
    pub sspcr0: Reg32,
    /// Control 1: enable, master/slave
    pub sspcr1: Reg32,
    /// Data (FIFO window)
    pub sspdr: Reg32,
    /// Status
    pub sspsr: Reg32,
    /// Clock prescale, even values 2..=254
    pub sspcpsr: Reg32,
    /// Interrupt mask
    pub sspimsc: Reg32,
    /// Raw interrupt status
    pub sspris: Reg32,
    /// Masked interrupt status
    pub sspmis: Reg32,
    /// Interrupt clear
    pub sspicr: Reg32,
    /// DMA control
    pub sspdmacr: Reg32,
}

/// SSPCR0 bit assignments
pub mod cr0 {
    /// Data size select: frame bits minus one
    pub const DSS_MASK: u32 = 0xF;
    /// Clock polarity
    pub const SPO: u32 = 1 << 6;
    /// Clock phase
    pub const SPH: u32 = 1 << 7;
    /// Serial clock rate field
    pub const SCR_SHIFT: u32 = 8;
}

/// SSPCR1 bit assignments
pub mod cr1 {
    /// Loopback mode
    pub const LBM: u32 = 1 << 0;
    /// Port enable
    pub const SSE: u32 = 1 << 1;
    /// Slave mode
    pub const MS: u32 = 1 << 2;
}

/// SSPSR bit assignments
pub mod sr {
    /// Transmit FIFO empty
    pub const TFE: u32 = 1 << 0;
    /// Transmit FIFO not full
    pub const TNF: u32 = 1 << 1;
    /// Receive FIFO not empty
    pub const RNE: u32 = 1 << 2;
    /// Receive FIFO full
    pub const RFF: u32 = 1 << 3;
    /// Busy shifting a frame
    pub const BSY: u32 = 1 << 4;
}

/// One PL022 master instance.
pub struct Spi {
    regs: &'static SpiBlock,
    frame_bytes: usize,
}

impl Spi {
    /// SPI0 at its fixed base.
    pub fn spi0() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<SpiBlock>(SPI0_BASE) }.unwrap();
        Self {
            regs,
            frame_bytes: 1,
        }
    }

    /// SPI1 at its fixed base.
    pub fn spi1() -> Self {
        let regs = unsafe { block_at::<SpiBlock>(SPI1_BASE) }.unwrap();
        Self {
            regs,
            frame_bytes: 1,
        }
    }

    /// View over an SPI block at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must map a live PL022 register block.
    pub unsafe fn at(addr: usize) -> Option<Self> {
        block_at::<SpiBlock>(addr).map(|regs| Self {
            regs,
            frame_bytes: 1,
        })
    }

    /// Program frame format and clock, then enable as master.
    ///
    /// `clk` is the peripheral clock; the divider math is caller-trusted
    /// (`frequency` non-zero, at most `clk / 2`).
    pub fn configure(&mut self, config: &SpiConfig, clk: u32) {
        self.regs.sspcr1.write(0); // disable while reprogramming

        // Fixed prescale of 2, remainder into the 8-bit SCR field.
        let scr = (clk / (2 * config.frequency)).saturating_sub(1).min(255);
        self.regs.sspcpsr.write(2);

        let mut value = ((config.word_bits as u32 - 1) & cr0::DSS_MASK)
            | (scr << cr0::SCR_SHIFT);
        if config.polarity == Polarity::IdleHigh {
            value |= cr0::SPO;
        }
        if config.phase == Phase::CaptureOnSecondTransition {
            value |= cr0::SPH;
        }
        self.regs.sspcr0.write(value);

        self.regs.sspcr1.write(cr1::SSE);
        self.frame_bytes = if config.word_bits > 8 { 2 } else { 1 };
    }

    /// Disable the instance.
    pub fn disable(&mut self) {
        self.regs.sspcr1.clear_bits(cr1::SSE);
    }

    fn push_frame(&mut self, frame: u16) {
        while !self.regs.sspsr.is_set(sr::TNF) {}
        self.regs.sspdr.write(frame as u32);
    }

    fn pop_frame(&mut self) -> u16 {
        while !self.regs.sspsr.is_set(sr::RNE) {}
        self.regs.sspdr.read() as u16
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
        block.sspsr.write(sr::TNF | sr::RNE | sr::TFE);
        Spi {
            regs: block,
            frame_bytes: 1,
        }
    }

    #[test]
    fn test_configure_16bit_mode1() {
        let mut spi = fake();
        let config = SpiConfig {
            frequency: 1_000_000,
            phase: Phase::CaptureOnSecondTransition,
            word_bits: 16,
            ..SpiConfig::default()
        };
        spi.configure(&config, 125_000_000);

        let cr0_value = spi.regs.sspcr0.read();
        assert_eq!(cr0_value & cr0::DSS_MASK, 15);
        assert!(cr0_value & cr0::SPH != 0);
        assert!(cr0_value & cr0::SPO == 0);
        // 125 MHz / (2 * 1 MHz) - 1
        assert_eq!(cr0_value >> cr0::SCR_SHIFT, 61);
        assert_eq!(spi.regs.sspcpsr.read(), 2);
        assert_eq!(spi.regs.sspcr1.read(), cr1::SSE);
    }

    #[test]
    fn test_transfer_echoes_fifo() {
        let mut spi = fake();
        spi.configure(&SpiConfig::default(), 125_000_000);

        let mut read = [0u8; 2];
        spi.transfer(&mut read, &[0x11, 0x22]);
        // The single-cell fake echoes each pushed frame straight back
        assert_eq!(read, [0x11, 0x22]);
    }
}
