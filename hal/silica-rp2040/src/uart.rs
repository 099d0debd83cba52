//! UART - ARM PL011
//!
//! Two instances. Baud comes from the 16.6 fixed-point divisor split
//! across UARTIBRD/UARTFBRD; framing from UARTLCR_H. The driver polls the
//! flag register with no timeout. The PL011 tops out at 8 data bits, so a
//! 9-bit request is clamped to 8.

use silica_cortex_m::mmio::{block_at, Reg32};
use silica_hal::uart::{DataBits, Parity, StopBits, UartConfig, UartRx, UartTx};
use silica_hal::Status;

/// Instance bases.
pub const UART0_BASE: usize = 0x4003_4000;
pub const UART1_BASE: usize = 0x4003_8000;

/// UART register block
#[repr(C)]
pub struct UartBlock {
    /// Data, with receive status in bits 8..12
    pub uartdr: Reg32,
    /// Receive status / error clear
    pub uartrsr: Reg32,
    _reserved0: [u8; 0x10],
    /// Flags
    pub uartfr: Reg32,
    _reserved1: [u8; 0x04],
    /// IrDA low-power divisor
    pub uartilpr: Reg32,
    /// Integer baud divisor
    pub uartibrd: Reg32,
    /// Fractional baud divisor, 6 bits
    pub uartfbrd: Reg32,
    /// Line control
    pub uartlcr_h: Reg32,
    /// Control
    pub uartcr: Reg32,
    /// FIFO interrupt levels
    pub uartifls: Reg32,
    /// Interrupt mask
    pub uartimsc: Reg32,
    /// Raw interrupt status
    pub uartris: Reg32,
    /// Masked interrupt status
    pub uartmis: Reg32,
    /// Interrupt clear
    pub uarticr: Reg32,
    /// DMA control
    pub uartdmacr: Reg32,
}

/// UARTFR bit assignments
pub mod fr {
    /// Transmitter busy with a frame
    pub const BUSY: u32 = 1 << 3;
    /// Receive FIFO empty
    pub const RXFE: u32 = 1 << 4;
    /// Transmit FIFO full
    pub const TXFF: u32 = 1 << 5;
    /// Receive FIFO full
    pub const RXFF: u32 = 1 << 6;
    /// Transmit FIFO empty
    pub const TXFE: u32 = 1 << 7;
}

/// UARTLCR_H bit assignments
pub mod lcr_h {
    /// Parity enable
    pub const PEN: u32 = 1 << 1;
    /// Even parity select
    pub const EPS: u32 = 1 << 2;
    /// Two stop bits
    pub const STP2: u32 = 1 << 3;
    /// FIFO enable
    pub const FEN: u32 = 1 << 4;
    /// Word length field: 0b00 = 5 bits .. 0b11 = 8 bits
    pub const WLEN_SHIFT: u32 = 5;
}

/// UARTCR bit assignments
pub mod cr {
    pub const UARTEN: u32 = 1 << 0;
    pub const TXE: u32 = 1 << 8;
    pub const RXE: u32 = 1 << 9;
}

/// One PL011 instance.
pub struct Uart {
    regs: &'static UartBlock,
}

impl Uart {
    /// UART0 at its fixed base.
    pub fn uart0() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<UartBlock>(UART0_BASE) }.unwrap();
        Self { regs }
    }

    /// UART1 at its fixed base.
    pub fn uart1() -> Self {
        let regs = unsafe { block_at::<UartBlock>(UART1_BASE) }.unwrap();
        Self { regs }
    }

    /// View over a UART block at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must map a live PL011 register block.
    pub unsafe fn at(addr: usize) -> Option<Self> {
        block_at::<UartBlock>(addr).map(|regs| Self { regs })
    }

    /// Program baud and framing, enable FIFOs, then enable both directions.
    ///
    /// `clk` is the peripheral clock feeding the baud generator; the
    /// divisor math is caller-trusted (`baudrate` non-zero).
    pub fn configure(&mut self, config: &UartConfig, clk: u32) {
        // 16.6 fixed point: divisor = clk / (16 * baud), fraction rounded
        // to the nearest 1/64.
        let divisor_fp = (8 * clk) / config.baudrate; // divisor * 128
        let mut ibrd = divisor_fp >> 7;
        let mut fbrd = ((divisor_fp & 0x7F) + 1) / 2;
        if ibrd == 0 {
            ibrd = 1;
            fbrd = 0;
        } else if ibrd >= 0xFFFF {
            ibrd = 0xFFFF;
            fbrd = 0;
        }
        self.regs.uartibrd.write(ibrd);
        self.regs.uartfbrd.write(fbrd);

        let wlen = match config.data_bits {
            DataBits::Seven => 0b10,
            DataBits::Eight | DataBits::Nine => 0b11,
        };
        let mut lcr = (wlen << lcr_h::WLEN_SHIFT) | lcr_h::FEN;
        match config.parity {
            Parity::None => {}
            Parity::Even => lcr |= lcr_h::PEN | lcr_h::EPS,
            Parity::Odd => lcr |= lcr_h::PEN,
        }
        if config.stop_bits == StopBits::Two {
            lcr |= lcr_h::STP2;
        }
        // Writing LCR_H latches the divisor registers.
        self.regs.uartlcr_h.write(lcr);

        self.regs.uartcr.write(cr::UARTEN | cr::TXE | cr::RXE);
    }

    /// Disable the instance.
    pub fn disable(&mut self) {
        self.regs.uartcr.clear_bits(cr::UARTEN);
    }

    /// True if a received byte is waiting.
    pub fn rx_ready(&self) -> bool {
        !self.regs.uartfr.is_set(fr::RXFE)
    }

    /// True if the transmit FIFO can take a byte.
    pub fn tx_ready(&self) -> bool {
        !self.regs.uartfr.is_set(fr::TXFF)
    }

    /// Push one byte, spinning while the FIFO is full.
    pub fn write_byte_blocking(&mut self, byte: u8) {
        while !self.tx_ready() {}
        self.regs.uartdr.write(byte as u32);
    }

    /// Pull one byte, spinning until one arrives.
    pub fn read_byte_blocking(&mut self) -> u8 {
        while !self.rx_ready() {}
        self.regs.uartdr.read() as u8
    }
}

impl UartTx for Uart {
    fn write_blocking(&mut self, data: &[u8]) -> Status {
        for &byte in data {
            self.write_byte_blocking(byte);
        }
        Status::NoError
    }

    fn flush(&mut self) -> Status {
        while self.regs.uartfr.is_set(fr::BUSY) {}
        Status::NoError
    }
}

impl UartRx for Uart {
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

impl embedded_io::ErrorType for Uart {
    type Error = IoError;
}

impl embedded_io::Write for Uart {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        UartTx::write_blocking(self, buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        UartTx::flush(self);
        Ok(())
    }
}

impl embedded_io::Read for Uart {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        buf[0] = self.read_byte_blocking();
        let mut count = 1;
        while count < buf.len() && self.rx_ready() {
            buf[count] = self.regs.uartdr.read() as u8;
            count += 1;
        }
        Ok(count)
    }
}
