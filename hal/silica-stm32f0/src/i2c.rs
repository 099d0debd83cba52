//! I2C - v2 controller
//!
//! Two instances in master mode. A transfer is described up front in CR2
//! (address, direction, byte count, autoend) and the driver then feeds or
//! drains the data registers, polling ISR with no timeout. A NACK aborts
//! with [`Status::Error`]. Transfers are limited to the 255 bytes NBYTES
//! can express; longer transfers are caller error, like every unchecked
//! argument at this level.

use silica_cortex_m::mmio::{block_at, Reg32};
use silica_hal::i2c::{I2cConfig, I2cMaster};
use silica_hal::Status;

/// Instance bases.
pub const I2C1_BASE: usize = 0x4000_5400;
pub const I2C2_BASE: usize = 0x4000_5800;

/// I2C register block
#[repr(C)]
pub struct I2cBlock {
    /// Control 1: enable, filters
    pub cr1: Reg32,
    /// Control 2: transfer description
    pub cr2: Reg32,
    /// Own address 1
    pub oar1: Reg32,
    /// Own address 2
    pub oar2: Reg32,
    /// SCL timing (prescaler, setup, hold, high/low periods)
    pub timingr: Reg32,
    /// Timeouts (SMBus)
    pub timeoutr: Reg32,
    /// Status
    pub isr: Reg32,
    /// Status clear
    pub icr: Reg32,
    /// Packet error check (SMBus)
    pub pecr: Reg32,
    /// Receive data
    pub rxdr: Reg32,
    /// Transmit data
    pub txdr: Reg32,
}

/// CR1 bit assignments
pub mod cr1 {
    pub const PE: u32 = 1 << 0;
}

/// CR2 bit assignments
pub mod cr2 {
    /// 7-bit address goes in bits 1..8
    pub const SADD_SHIFT: u32 = 0;
    /// Read transfer when set
    pub const RD_WRN: u32 = 1 << 10;
    pub const START: u32 = 1 << 13;
    pub const STOP: u32 = 1 << 14;
    /// Byte count field
    pub const NBYTES_SHIFT: u32 = 16;
    /// Stop automatically after NBYTES
    pub const AUTOEND: u32 = 1 << 25;
}

/// ISR bit assignments
pub mod isr {
    /// Transmit register empty and transfer ongoing
    pub const TXIS: u32 = 1 << 1;
    /// Receive register not empty
    pub const RXNE: u32 = 1 << 2;
    /// NACK received
    pub const NACKF: u32 = 1 << 4;
    /// Stop detected
    pub const STOPF: u32 = 1 << 5;
    /// Transfer complete, waiting for stop or restart
    pub const TC: u32 = 1 << 6;
    /// Bus busy
    pub const BUSY: u32 = 1 << 15;
}

/// ICR bit assignments
pub mod icr {
    pub const NACKCF: u32 = 1 << 4;
    pub const STOPCF: u32 = 1 << 5;
}

/// SCL timing presets for the 8 MHz HSI kernel clock (reference manual
/// example values).
pub mod timing {
    /// 100 kHz standard mode
    pub const STANDARD_8MHZ: u32 = 0x1042_0F13;
    /// 400 kHz fast mode
    pub const FAST_8MHZ: u32 = 0x0031_0309;
    /// 1 MHz fast mode plus
    pub const FAST_PLUS_8MHZ: u32 = 0x0010_0306;
}

/// One I2C master instance.
pub struct I2c {
    regs: &'static I2cBlock,
}

impl I2c {
    /// I2C1 at its fixed base.
    pub fn i2c1() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<I2cBlock>(I2C1_BASE) }.unwrap();
        Self { regs }
    }

    /// I2C2 at its fixed base.
    pub fn i2c2() -> Self {
        let regs = unsafe { block_at::<I2cBlock>(I2C2_BASE) }.unwrap();
        Self { regs }
    }

    /// View over an I2C block at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must map a live I2C register block.
    pub unsafe fn at(addr: usize) -> Option<Self> {
        block_at::<I2cBlock>(addr).map(|regs| Self { regs })
    }

    /// Program SCL timing for the 8 MHz kernel clock and enable.
    pub fn configure(&mut self, config: &I2cConfig) {
        self.regs.cr1.write(0);
        let timing = if config.frequency > 400_000 {
            timing::FAST_PLUS_8MHZ
        } else if config.frequency > 100_000 {
            timing::FAST_8MHZ
        } else {
            timing::STANDARD_8MHZ
        };
        self.regs.timingr.write(timing);
        self.regs.cr1.write(cr1::PE);
    }

    /// Disable the instance.
    pub fn disable(&mut self) {
        self.regs.cr1.clear_bits(cr1::PE);
    }

    fn start_transfer(&mut self, address: u8, len: usize, read: bool, autoend: bool) {
        let mut value = ((address as u32) << 1)
            | ((len as u32 & 0xFF) << cr2::NBYTES_SHIFT)
            | cr2::START;
        if read {
            value |= cr2::RD_WRN;
        }
        if autoend {
            value |= cr2::AUTOEND;
        }
        self.regs.cr2.write(value);
    }

    /// Spin until one of `flags` is set; `Err` on NACK.
    fn wait_any(&mut self, flags: u32) -> Result<(), Status> {
        loop {
            let state = self.regs.isr.read();
            if state & isr::NACKF != 0 {
                self.regs.icr.write(icr::NACKCF | icr::STOPCF);
                return Err(Status::Error);
            }
            if state & flags != 0 {
                return Ok(());
            }
        }
    }

    fn finish(&mut self) -> Status {
        match self.wait_any(isr::STOPF) {
            Ok(()) => {
                self.regs.icr.write(icr::STOPCF);
                Status::NoError
            }
            Err(status) => status,
        }
    }
}

impl I2cMaster for I2c {
    fn write(&mut self, address: u8, data: &[u8]) -> Status {
        self.start_transfer(address, data.len(), false, true);
        for &byte in data {
            if let Err(status) = self.wait_any(isr::TXIS) {
                return status;
            }
            self.regs.txdr.write(byte as u32);
        }
        self.finish()
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Status {
        self.start_transfer(address, buf.len(), true, true);
        for slot in buf.iter_mut() {
            if let Err(status) = self.wait_any(isr::RXNE) {
                return status;
            }
            *slot = self.regs.rxdr.read() as u8;
        }
        self.finish()
    }

    fn write_read(&mut self, address: u8, data: &[u8], buf: &mut [u8]) -> Status {
        // Write half with software end: TC flags completion, the bus stays
        // claimed until the restarted read below.
        self.start_transfer(address, data.len(), false, false);
        for &byte in data {
            if let Err(status) = self.wait_any(isr::TXIS) {
                return status;
            }
            self.regs.txdr.write(byte as u32);
        }
        if let Err(status) = self.wait_any(isr::TC) {
            return status;
        }

        self.start_transfer(address, buf.len(), true, true);
        for slot in buf.iter_mut() {
            if let Err(status) = self.wait_any(isr::RXNE) {
                return status;
            }
            *slot = self.regs.rxdr.read() as u8;
        }
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::boxed::Box;

    fn fake(isr_value: u32) -> I2c {
        let block: &'static I2cBlock = Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        block.isr.write(isr_value);
        I2c { regs: block }
    }

    #[test]
    fn test_write_describes_transfer_in_cr2() {
        let mut i2c = fake(isr::TXIS | isr::TC | isr::STOPF);
        let status = i2c.write(0x3C, &[1, 2, 3]);

        assert_eq!(status, Status::NoError);
        let cr2_value = i2c.regs.cr2.read();
        assert_eq!(cr2_value & 0xFF, 0x3C << 1);
        assert_eq!((cr2_value >> cr2::NBYTES_SHIFT) & 0xFF, 3);
        assert!(cr2_value & cr2::AUTOEND != 0);
        assert!(cr2_value & cr2::RD_WRN == 0);
        assert_eq!(i2c.regs.txdr.read(), 3);
    }

    #[test]
    fn test_nack_clears_and_errors() {
        let mut i2c = fake(isr::NACKF);
        let status = i2c.write(0x3C, &[1]);
        assert_eq!(status, Status::Error);
        assert_eq!(i2c.regs.icr.read(), icr::NACKCF | icr::STOPCF);
    }

    #[test]
    fn test_read_sets_direction() {
        let mut i2c = fake(isr::RXNE | isr::STOPF);
        i2c.regs.rxdr.write(0x99);

        let mut buf = [0u8; 2];
        let status = i2c.read(0x3C, &mut buf);
        assert_eq!(status, Status::NoError);
        assert_eq!(buf, [0x99, 0x99]);
        assert!(i2c.regs.cr2.read() & cr2::RD_WRN != 0);
    }

    #[test]
    fn test_configure_picks_timing_preset() {
        let mut i2c = fake(0);
        i2c.configure(&I2cConfig::FAST);
        assert_eq!(i2c.regs.timingr.read(), timing::FAST_8MHZ);
        assert_eq!(i2c.regs.cr1.read(), cr1::PE);
    }
}
