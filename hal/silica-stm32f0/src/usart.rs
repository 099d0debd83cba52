//! USART - v2 controller
//!
//! Two instances on the common parts. Word length spans 7, 8 or 9 bits
//! through the split M0/M1 field; baud is a straight 16x divider into BRR.
//! The driver polls ISR with no timeout.

use silica_cortex_m::mmio::{block_at, Reg32};
use silica_hal::uart::{DataBits, Parity, StopBits, UartConfig, UartRx, UartTx};
use silica_hal::Status;

/// Instance bases.
pub const USART1_BASE: usize = 0x4001_3800;
pub const USART2_BASE: usize = 0x4000_4400;

/// USART register block
#[repr(C)]
pub struct UsartBlock {
    /// Control 1: enable, directions, word length, parity
    pub cr1: Reg32,
    /// Control 2: stop bits
    pub cr2: Reg32,
    /// Control 3
    pub cr3: Reg32,
    /// Baud divider
    pub brr: Reg32,
    /// Guard time and prescaler
    pub gtpr: Reg32,
    /// Receiver timeout
    pub rtor: Reg32,
    /// Request
    pub rqr: Reg32,
    /// Status
    pub isr: Reg32,
    /// Status clear
    pub icr: Reg32,
    /// Receive data
    pub rdr: Reg32,
    /// Transmit data
    pub tdr: Reg32,
}

/// CR1 bit assignments
pub mod cr1 {
    pub const UE: u32 = 1 << 0;
    pub const RE: u32 = 1 << 2;
    pub const TE: u32 = 1 << 3;
    /// Odd parity when set
    pub const PS: u32 = 1 << 9;
    pub const PCE: u32 = 1 << 10;
    /// Word length, low bit (M0)
    pub const M0: u32 = 1 << 12;
    /// Word length, high bit (M1): M[1:0] = 10 selects 7 bits
    pub const M1: u32 = 1 << 28;
}

/// CR2 bit assignments
pub mod cr2 {
    /// Stop bits field: 0 = 1 stop, 2 = 2 stop
    pub const STOP_SHIFT: u32 = 12;
    pub const STOP_MASK: u32 = 0x3 << STOP_SHIFT;
}

/// ISR bit assignments
pub mod isr {
    /// Receive register not empty
    pub const RXNE: u32 = 1 << 5;
    /// Transmission complete
    pub const TC: u32 = 1 << 6;
    /// Transmit register empty
    pub const TXE: u32 = 1 << 7;
}

/// One USART instance.
pub struct Usart {
    regs: &'static UsartBlock,
}

impl Usart {
    /// USART1 at its fixed base.
    pub fn usart1() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<UsartBlock>(USART1_BASE) }.unwrap();
        Self { regs }
    }

    /// USART2 at its fixed base.
    pub fn usart2() -> Self {
        let regs = unsafe { block_at::<UsartBlock>(USART2_BASE) }.unwrap();
        Self { regs }
    }

    /// View over a USART block at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must map a live USART register block.
    pub unsafe fn at(addr: usize) -> Option<Self> {
        block_at::<UsartBlock>(addr).map(|regs| Self { regs })
    }

    /// Program framing and baud, then enable both directions.
    ///
    /// `clk` is the USART kernel clock; the divider math is caller-trusted
    /// (`baudrate` non-zero). With parity enabled the M field counts the
    /// parity bit, so the data length is bumped one step to keep the
    /// requested payload width.
    pub fn configure(&mut self, config: &UartConfig, clk: u32) {
        let mut value = cr1::TE | cr1::RE;

        let effective_bits = match (config.data_bits, config.parity) {
            (DataBits::Seven, Parity::None) => 7,
            (DataBits::Seven, _) | (DataBits::Eight, Parity::None) => 8,
            (DataBits::Eight, _) | (DataBits::Nine, Parity::None) => 9,
            // 9 data bits plus parity does not fit a frame
            (DataBits::Nine, _) => 9,
        };
        match effective_bits {
            7 => value |= cr1::M1,
            9 => value |= cr1::M0,
            _ => {}
        }

        match config.parity {
            Parity::None => {}
            Parity::Even => value |= cr1::PCE,
            Parity::Odd => value |= cr1::PCE | cr1::PS,
        }

        let stop = match config.stop_bits {
            StopBits::One => 0,
            StopBits::Two => 2,
        };
        self.regs.cr2.write(stop << cr2::STOP_SHIFT);
        self.regs.brr.write(clk / config.baudrate);
        self.regs.cr1.write(value);
        self.regs.cr1.write(value | cr1::UE);
    }

    /// Disable the instance.
    pub fn disable(&mut self) {
        self.regs.cr1.clear_bits(cr1::UE);
    }

    /// True if a received byte is waiting.
    pub fn rx_ready(&self) -> bool {
        self.regs.isr.is_set(isr::RXNE)
    }

    /// True if the transmit register can take a byte.
    pub fn tx_ready(&self) -> bool {
        self.regs.isr.is_set(isr::TXE)
    }

    /// Push one byte, spinning until the transmit register frees up.
    pub fn write_byte_blocking(&mut self, byte: u8) {
        while !self.tx_ready() {}
        self.regs.tdr.write(byte as u32);
    }

    /// Pull one byte, spinning until one arrives.
    pub fn read_byte_blocking(&mut self) -> u8 {
        while !self.rx_ready() {}
        self.regs.rdr.read() as u8
    }
}

impl UartTx for Usart {
    fn write_blocking(&mut self, data: &[u8]) -> Status {
        for &byte in data {
            self.write_byte_blocking(byte);
        }
        Status::NoError
    }

    fn flush(&mut self) -> Status {
        while !self.regs.isr.is_set(isr::TC) {}
        Status::NoError
    }
}

impl UartRx for Usart {
    fn read_blocking(&mut self, buf: &mut [u8]) -> Status {
        for slot in buf.iter_mut() {
            *slot = self.read_byte_blocking();
        }
        Status::NoError
    }
}

/// Errors surfaced through the `embedded-io` adapter; the polled paths
/// themselves cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    Other,
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::Other
    }
}

impl embedded_io::ErrorType for Usart {
    type Error = IoError;
}

impl embedded_io::Write for Usart {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        UartTx::write_blocking(self, buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        UartTx::flush(self);
        Ok(())
    }
}

impl embedded_io::Read for Usart {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        buf[0] = self.read_byte_blocking();
        let mut count = 1;
        while count < buf.len() && self.rx_ready() {
            buf[count] = self.regs.rdr.read() as u8;
            count += 1;
        }
        Ok(count)
    }
}
