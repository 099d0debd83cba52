//! I2C - DesignWare controller
//!
//! Two instances in master mode. Commands and data share the IC_DATA_CMD
//! window; the stop condition rides on the final command. Aborted
//! transfers (NACK, arbitration loss) latch into IC_TX_ABRT_SOURCE, which
//! the driver checks once per transfer and clears.

use silica_cortex_m::mmio::{block_at, Reg32};
use silica_hal::i2c::{I2cConfig, I2cMaster};
use silica_hal::Status;

/// Instance bases.
pub const I2C0_BASE: usize = 0x4004_4000;
pub const I2C1_BASE: usize = 0x4004_8000;

/// I2C register block
#[repr(C)]
pub struct I2cBlock {
    /// Control
    pub ic_con: Reg32,
    /// Target address
    pub ic_tar: Reg32,
    /// Own slave address
    pub ic_sar: Reg32,
    _reserved0: [u8; 0x04],
    /// Data and command window
    pub ic_data_cmd: Reg32,
    /// Standard-mode SCL high count
    pub ic_ss_scl_hcnt: Reg32,
    /// Standard-mode SCL low count
    pub ic_ss_scl_lcnt: Reg32,
    /// Fast-mode SCL high count
    pub ic_fs_scl_hcnt: Reg32,
    /// Fast-mode SCL low count
    pub ic_fs_scl_lcnt: Reg32,
    _reserved1: [u8; 0x08],
    /// Interrupt status
    pub ic_intr_stat: Reg32,
    /// Interrupt mask
    pub ic_intr_mask: Reg32,
    /// Raw interrupt status
    pub ic_raw_intr_stat: Reg32,
    /// Receive FIFO threshold
    pub ic_rx_tl: Reg32,
    /// Transmit FIFO threshold
    pub ic_tx_tl: Reg32,
    /// Combined interrupt clear
    pub ic_clr_intr: Reg32,
    /// Individual interrupt clears
    pub ic_clr_rx_under: Reg32,
    pub ic_clr_rx_over: Reg32,
    pub ic_clr_tx_over: Reg32,
    pub ic_clr_rd_req: Reg32,
    pub ic_clr_tx_abrt: Reg32,
    pub ic_clr_rx_done: Reg32,
    pub ic_clr_activity: Reg32,
    pub ic_clr_stop_det: Reg32,
    pub ic_clr_start_det: Reg32,
    pub ic_clr_gen_call: Reg32,
    /// Enable
    pub ic_enable: Reg32,
    /// Status
    pub ic_status: Reg32,
    /// Transmit FIFO level
    pub ic_txflr: Reg32,
    /// Receive FIFO level
    pub ic_rxflr: Reg32,
    /// SDA hold time
    pub ic_sda_hold: Reg32,
    /// Abort source
    pub ic_tx_abrt_source: Reg32,
}

/// IC_CON bit assignments
pub mod con {
    pub const MASTER_MODE: u32 = 1 << 0;
    /// Speed field: 1 standard, 2 fast
    pub const SPEED_SHIFT: u32 = 1;
    pub const IC_RESTART_EN: u32 = 1 << 5;
    pub const IC_SLAVE_DISABLE: u32 = 1 << 6;
}

/// IC_DATA_CMD bit assignments
pub mod data_cmd {
    /// Read command instead of a data write
    pub const CMD_READ: u32 = 1 << 8;
    /// Issue a stop after this command
    pub const STOP: u32 = 1 << 9;
    /// Issue a repeated start before this command
    pub const RESTART: u32 = 1 << 10;
}

/// IC_STATUS bit assignments
pub mod status {
    /// Transmit FIFO not full
    pub const TFNF: u32 = 1 << 1;
    /// Transmit FIFO empty
    pub const TFE: u32 = 1 << 2;
    /// Receive FIFO not empty
    pub const RFNE: u32 = 1 << 3;
}

/// One DesignWare master instance.
pub struct I2c {
    regs: &'static I2cBlock,
}

impl I2c {
    /// I2C0 at its fixed base.
    pub fn i2c0() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<I2cBlock>(I2C0_BASE) }.unwrap();
        Self { regs }
    }

    /// I2C1 at its fixed base.
    pub fn i2c1() -> Self {
        let regs = unsafe { block_at::<I2cBlock>(I2C1_BASE) }.unwrap();
        Self { regs }
    }

    /// View over an I2C block at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must map a live DesignWare I2C register block.
    pub unsafe fn at(addr: usize) -> Option<Self> {
        block_at::<I2cBlock>(addr).map(|regs| Self { regs })
    }

    /// Program master mode and SCL timing.
    ///
    /// `clk` is the peripheral clock; counts are caller-trusted
    /// (`frequency` non-zero).
    pub fn configure(&mut self, config: &I2cConfig, clk: u32) {
        self.regs.ic_enable.write(0);

        let speed = if config.frequency > 100_000 { 2 } else { 1 };
        self.regs.ic_con.write(
            con::MASTER_MODE
                | (speed << con::SPEED_SHIFT)
                | con::IC_RESTART_EN
                | con::IC_SLAVE_DISABLE,
        );

        // Split the bit period into 60% low, 40% high.
        let period = clk / config.frequency;
        let lcnt = period * 3 / 5;
        let hcnt = period - lcnt;
        if speed == 1 {
            self.regs.ic_ss_scl_hcnt.write(hcnt);
            self.regs.ic_ss_scl_lcnt.write(lcnt);
        } else {
            self.regs.ic_fs_scl_hcnt.write(hcnt);
            self.regs.ic_fs_scl_lcnt.write(lcnt);
        }
        self.regs.ic_rx_tl.write(0);
        self.regs.ic_tx_tl.write(0);
    }

    /// Point the master at a 7-bit target. Only legal while disabled.
    fn set_target(&mut self, address: u8) {
        self.regs.ic_enable.write(0);
        self.regs.ic_tar.write(address as u32 & 0x7F);
        self.regs.ic_enable.write(1);
    }

    /// Check and clear any latched abort. Reading the clear register
    /// acknowledges it.
    fn check_abort(&mut self) -> Status {
        if self.regs.ic_tx_abrt_source.read() != 0 {
            let _ = self.regs.ic_clr_tx_abrt.read();
            return Status::Error;
        }
        Status::NoError
    }

    fn push_cmd(&mut self, value: u32) {
        while !self.regs.ic_status.is_set(status::TFNF) {}
        self.regs.ic_data_cmd.write(value);
    }

    /// Spin until the transmit FIFO drains.
    fn wait_tx_empty(&mut self) {
        while !self.regs.ic_status.is_set(status::TFE) {}
    }
}

impl I2cMaster for I2c {
    fn write(&mut self, address: u8, data: &[u8]) -> Status {
        self.set_target(address);
        let last = data.len().saturating_sub(1);
        for (i, &byte) in data.iter().enumerate() {
            let mut value = byte as u32;
            if i == last {
                value |= data_cmd::STOP;
            }
            self.push_cmd(value);
        }
        self.wait_tx_empty();
        self.check_abort()
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Status {
        self.set_target(address);
        let last = buf.len().saturating_sub(1);
        for (i, slot) in buf.iter_mut().enumerate() {
            let mut value = data_cmd::CMD_READ;
            if i == last {
                value |= data_cmd::STOP;
            }
            self.push_cmd(value);
            while !self.regs.ic_status.is_set(status::RFNE) {}
            *slot = self.regs.ic_data_cmd.read() as u8;
        }
        self.check_abort()
    }

    fn write_read(&mut self, address: u8, data: &[u8], buf: &mut [u8]) -> Status {
        self.set_target(address);
        // Write half, no stop; the restart on the first read command takes
        // the bus back without releasing it.
        for &byte in data {
            self.push_cmd(byte as u32);
        }
        let last = buf.len().saturating_sub(1);
        for (i, slot) in buf.iter_mut().enumerate() {
            let mut value = data_cmd::CMD_READ;
            if i == 0 {
                value |= data_cmd::RESTART;
            }
            if i == last {
                value |= data_cmd::STOP;
            }
            self.push_cmd(value);
            while !self.regs.ic_status.is_set(status::RFNE) {}
            *slot = self.regs.ic_data_cmd.read() as u8;
        }
        self.check_abort()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::boxed::Box;

    fn fake() -> I2c {
        let block: &'static I2cBlock = Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        block.ic_status.write(status::TFNF | status::TFE | status::RFNE);
        I2c { regs: block }
    }

    #[test]
    fn test_write_marks_stop_on_last_byte() {
        let mut i2c = fake();
        let result = i2c.write(0x50, &[0xDE, 0xAD]);

        assert_eq!(result, Status::NoError);
        assert_eq!(i2c.regs.ic_tar.read(), 0x50);
        assert_eq!(i2c.regs.ic_data_cmd.read(), 0xAD | data_cmd::STOP);
        assert_eq!(i2c.regs.ic_enable.read(), 1);
    }

    #[test]
    fn test_abort_reports_error_and_clears() {
        let mut i2c = fake();
        i2c.regs.ic_tx_abrt_source.write(1 << 0); // address NACK

        let result = i2c.write(0x50, &[0x00]);
        assert_eq!(result, Status::Error);
    }

    #[test]
    fn test_configure_timing_split() {
        let mut i2c = fake();
        i2c.configure(&I2cConfig::FAST, 125_000_000);
        // 125 MHz / 400 kHz = 312 cycles: 187 low, 125 high
        assert_eq!(i2c.regs.ic_fs_scl_lcnt.read(), 187);
        assert_eq!(i2c.regs.ic_fs_scl_hcnt.read(), 125);
        let con_value = i2c.regs.ic_con.read();
        assert!(con_value & con::MASTER_MODE != 0);
        assert_eq!((con_value >> con::SPEED_SHIFT) & 0x3, 2);
    }

    #[test]
    fn test_block_offsets() {
        assert_eq!(core::mem::offset_of!(I2cBlock, ic_data_cmd), 0x10);
        assert_eq!(core::mem::offset_of!(I2cBlock, ic_raw_intr_stat), 0x34);
        assert_eq!(core::mem::offset_of!(I2cBlock, ic_enable), 0x6C);
        assert_eq!(core::mem::offset_of!(I2cBlock, ic_status), 0x70);
        assert_eq!(core::mem::offset_of!(I2cBlock, ic_tx_abrt_source), 0x80);
    }
}
