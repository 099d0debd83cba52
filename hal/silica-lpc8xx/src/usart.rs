//! USART - universal synchronous/asynchronous receiver/transmitter
//!
//! Three identical instances. The driver is strictly polled: every byte
//! waits on TXRDY/RXRDY in a tight loop with no timeout. Baud comes from
//! the shared U_PCLK ([`crate::syscon::Syscon::setup_uart_clock`]) through
//! the 16x oversampled BRG divider.

use silica_cortex_m::mmio::{block_at, Reg32};
use silica_hal::uart::{DataBits, Parity, StopBits, UartConfig, UartRx, UartTx};
use silica_hal::Status;

/// Instance bases.
pub const USART0_BASE: usize = 0x4006_4000;
pub const USART1_BASE: usize = 0x4006_8000;
pub const USART2_BASE: usize = 0x4006_C000;

/// USART register block
#[repr(C)]
pub struct UsartBlock {
    /// Configuration; most fields writable only while disabled
    pub cfg: Reg32,
    /// Control
    pub ctl: Reg32,
    /// Status, write 1 to clear the clearable flags
    pub stat: Reg32,
    /// Interrupt enable set
    pub intenset: Reg32,
    /// Interrupt enable clear
    pub intenclr: Reg32,
    /// Receive data
    pub rxdat: Reg32,
    /// Receive data with status flags
    pub rxdatstat: Reg32,
    /// Transmit data
    pub txdat: Reg32,
    /// Baud rate generator, divides U_PCLK by (BRG + 1) * 16
    pub brg: Reg32,
    /// Interrupt status
    pub intstat: Reg32,
}

/// CFG bit assignments
pub mod cfg {
    pub const ENABLE: u32 = 1 << 0;
    /// Data length field: 0 = 7 bits, 1 = 8 bits, 2 = 9 bits
    pub const DATALEN_SHIFT: u32 = 2;
    pub const DATALEN_MASK: u32 = 0x3 << DATALEN_SHIFT;
    /// Parity field: 0 = none, 2 = even, 3 = odd
    pub const PARITY_SHIFT: u32 = 4;
    pub const PARITY_MASK: u32 = 0x3 << PARITY_SHIFT;
    /// Two stop bits when set
    pub const STOPLEN: u32 = 1 << 6;
}

/// STAT bit assignments
pub mod stat {
    /// Receive data available
    pub const RXRDY: u32 = 1 << 0;
    /// Receiver idle
    pub const RXIDLE: u32 = 1 << 1;
    /// Transmit register empty
    pub const TXRDY: u32 = 1 << 2;
    /// Transmitter fully idle, shift register drained
    pub const TXIDLE: u32 = 1 << 3;
    /// Framing error seen (write 1 to clear)
    pub const FRAMERRINT: u32 = 1 << 13;
    /// Parity error seen (write 1 to clear)
    pub const PARITYERRINT: u32 = 1 << 14;
}

/// One USART instance.
pub struct Usart {
    regs: &'static UsartBlock,
}

impl Usart {
    /// USART0 at its fixed base.
    pub fn usart0() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<UsartBlock>(USART0_BASE) }.unwrap();
        Self { regs }
    }

    /// USART1 at its fixed base.
    pub fn usart1() -> Self {
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

    /// Program framing and baud, then enable.
    ///
    /// `pclk` is the U_PCLK this instance sees. The divider math is
    /// caller-trusted: `config.baudrate` must be non-zero and no larger
    /// than `pclk / 16`.
    pub fn configure(&mut self, config: &UartConfig, pclk: u32) {
        let datalen = match config.data_bits {
            DataBits::Seven => 0,
            DataBits::Eight => 1,
            DataBits::Nine => 2,
        };
        let parity = match config.parity {
            Parity::None => 0,
            Parity::Even => 2,
            Parity::Odd => 3,
        };
        let mut value = (datalen << cfg::DATALEN_SHIFT) | (parity << cfg::PARITY_SHIFT);
        if config.stop_bits == StopBits::Two {
            value |= cfg::STOPLEN;
        }

        self.regs.cfg.write(value);
        self.regs.brg.write(pclk / (16 * config.baudrate) - 1);
        self.regs.cfg.write(value | cfg::ENABLE);
    }

    /// Disable the instance.
    pub fn disable(&mut self) {
        self.regs.cfg.clear_bits(cfg::ENABLE);
    }

    /// True if a received byte is waiting.
    pub fn rx_ready(&self) -> bool {
        self.regs.stat.is_set(stat::RXRDY)
    }

    /// True if the transmit register can take a byte.
    pub fn tx_ready(&self) -> bool {
        self.regs.stat.is_set(stat::TXRDY)
    }

    /// Push one byte, spinning until the transmit register frees up.
    pub fn write_byte_blocking(&mut self, byte: u8) {
        while !self.tx_ready() {}
        self.regs.txdat.write(byte as u32);
    }

    /// Pull one byte, spinning until one arrives.
    pub fn read_byte_blocking(&mut self) -> u8 {
        while !self.rx_ready() {}
        self.regs.rxdat.read() as u8
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
        while !self.regs.stat.is_set(stat::TXIDLE) {}
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

/// Errors surfaced through the `embedded-io` adapter.
///
/// The polled paths themselves cannot fail; this exists because the
/// adapter traits require an error type.
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
        // Block for the first byte, then drain whatever is already waiting.
        buf[0] = self.read_byte_blocking();
        let mut count = 1;
        while count < buf.len() && self.rx_ready() {
            buf[count] = self.regs.rxdat.read() as u8;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::boxed::Box;

    fn fake() -> Usart {
        let block: &'static UsartBlock = Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        Usart { regs: block }
    }

    #[test]
    fn test_configure_8n1() {
        let mut usart = fake();
        usart.configure(&UartConfig::new(115_200), 12_000_000);

        let cfg_value = usart.regs.cfg.read();
        assert!(cfg_value & cfg::ENABLE != 0);
        assert_eq!((cfg_value & cfg::DATALEN_MASK) >> cfg::DATALEN_SHIFT, 1);
        assert_eq!((cfg_value & cfg::PARITY_MASK) >> cfg::PARITY_SHIFT, 0);
        assert!(cfg_value & cfg::STOPLEN == 0);
        // 12 MHz / (16 * 115200) = 6.51 -> BRG 5 (truncating divider)
        assert_eq!(usart.regs.brg.read(), 5);
    }

    #[test]
    fn test_configure_7e2() {
        let mut usart = fake();
        let config = UartConfig {
            baudrate: 9600,
            data_bits: DataBits::Seven,
            parity: Parity::Even,
            stop_bits: StopBits::Two,
        };
        usart.configure(&config, 12_000_000);

        let cfg_value = usart.regs.cfg.read();
        assert_eq!((cfg_value & cfg::DATALEN_MASK) >> cfg::DATALEN_SHIFT, 0);
        assert_eq!((cfg_value & cfg::PARITY_MASK) >> cfg::PARITY_SHIFT, 2);
        assert!(cfg_value & cfg::STOPLEN != 0);
        assert_eq!(usart.regs.brg.read(), 77); // 12 MHz / (16 * 9600) - 1
    }

    #[test]
    fn test_write_spins_on_txrdy() {
        let mut usart = fake();
        usart.regs.stat.write(stat::TXRDY | stat::TXIDLE);

        let status = UartTx::write_blocking(&mut usart, b"ok");
        assert_eq!(status, Status::NoError);
        assert_eq!(usart.regs.txdat.read(), b'k' as u32);
        assert_eq!(UartTx::flush(&mut usart), Status::NoError);
    }

    #[test]
    fn test_read_drains_ready_bytes() {
        let mut usart = fake();
        usart.regs.stat.write(stat::RXRDY);
        usart.regs.rxdat.write(0x5A);

        let mut buf = [0u8; 2];
        let status = UartRx::read_blocking(&mut usart, &mut buf);
        assert_eq!(status, Status::NoError);
        assert_eq!(buf, [0x5A, 0x5A]);
    }
}
