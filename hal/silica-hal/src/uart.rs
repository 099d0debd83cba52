//! USART serial abstractions
//!
//! Traits for blocking, polled serial transfer plus the frame configuration
//! shared by every supported USART (7/8/9 data bits, none/even/odd parity,
//! 1/2 stop bits, baud from an integer or fractional divider).

use crate::status::Status;

/// USART transmitter
///
/// The chip crates implement this as a busy-wait loop on the transmit-ready
/// status bit. There is no timeout: an unclocked or disabled peripheral
/// hangs the caller.
pub trait UartTx {
    /// Write every byte, spinning on the ready bit between bytes.
    fn write_blocking(&mut self, data: &[u8]) -> Status;

    /// Spin until the transmitter is fully idle (shift register drained).
    fn flush(&mut self) -> Status;
}

/// USART receiver
pub trait UartRx {
    /// Fill the whole buffer, spinning on the receive-ready bit per byte.
    fn read_blocking(&mut self, buf: &mut [u8]) -> Status;

    /// Read a single byte.
    fn read_byte(&mut self) -> u8 {
        let mut buf = [0u8; 1];
        self.read_blocking(&mut buf);
        buf[0]
    }
}

/// Combined USART interface for peripherals exposing both directions.
pub trait Uart: UartTx + UartRx {}

// Blanket implementation
impl<T: UartTx + UartRx> Uart for T {}

/// USART frame and baud configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits per frame
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// 8N1 at the given baud rate, the overwhelmingly common case.
    pub fn new(baudrate: u32) -> Self {
        Self {
            baudrate,
            ..Self::default()
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
    Nine,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}
