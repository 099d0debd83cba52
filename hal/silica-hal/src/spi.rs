//! SPI bus abstractions
//!
//! Traits and configuration for polled SPI master transfers. Frames may be
//! 4 to 16 bits wide and the chip crates drive one of up to four hardware
//! chip selects, deasserting it on the final frame of a transfer.

use crate::status::Status;

/// SPI bus master
///
/// Every operation is a straight-line busy-wait loop: push a frame when the
/// transmitter is ready, pop when the receiver is ready, until the slice is
/// exhausted. No timeout, no cancellation.
pub trait SpiBus {
    /// Simultaneous write and read. Frames beyond 8 bits occupy two bytes
    /// (little-endian) in both slices; the slices must be the same length.
    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Status;

    /// Write, discarding whatever the peripheral clocks in.
    fn write(&mut self, data: &[u8]) -> Status;

    /// Read, clocking out idle (zero) frames.
    fn read(&mut self, buf: &mut [u8]) -> Status;

    /// Transfer using a single buffer for both directions.
    fn transfer_in_place(&mut self, data: &mut [u8]) -> Status;
}

/// Hardware chip-select line driven during a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipSelect {
    Cs0,
    Cs1,
    Cs2,
    Cs3,
}

impl ChipSelect {
    /// Index of this chip select in the peripheral's select field.
    pub fn index(self) -> u8 {
        match self {
            ChipSelect::Cs0 => 0,
            ChipSelect::Cs1 => 1,
            ChipSelect::Cs2 => 2,
            ChipSelect::Cs3 => 3,
        }
    }
}

/// SPI master configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    /// Serial clock frequency in Hz
    pub frequency: u32,
    /// Clock polarity
    pub polarity: Polarity,
    /// Clock phase
    pub phase: Phase,
    /// Bits per frame, 4..=16
    pub word_bits: u8,
    /// Hardware chip select asserted during transfers
    pub chip_select: ChipSelect,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            frequency: 1_000_000,
            polarity: Polarity::IdleLow,
            phase: Phase::CaptureOnFirstTransition,
            word_bits: 8,
            chip_select: ChipSelect::Cs0,
        }
    }
}

impl SpiConfig {
    /// Mode 0..3 shorthand over the polarity/phase pair.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        let (polarity, phase) = mode.into();
        self.polarity = polarity;
        self.phase = phase;
        self
    }
}

/// SPI clock polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Clock idles low (CPOL=0)
    IdleLow,
    /// Clock idles high (CPOL=1)
    IdleHigh,
}

/// SPI clock phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Data captured on the first clock transition (CPHA=0)
    CaptureOnFirstTransition,
    /// Data captured on the second clock transition (CPHA=1)
    CaptureOnSecondTransition,
}

/// SPI mode (combined polarity and phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Mode 0: CPOL=0, CPHA=0
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}

impl From<Mode> for (Polarity, Phase) {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Mode0 => (Polarity::IdleLow, Phase::CaptureOnFirstTransition),
            Mode::Mode1 => (Polarity::IdleLow, Phase::CaptureOnSecondTransition),
            Mode::Mode2 => (Polarity::IdleHigh, Phase::CaptureOnFirstTransition),
            Mode::Mode3 => (Polarity::IdleHigh, Phase::CaptureOnSecondTransition),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_decomposition() {
        let (pol, pha) = Mode::Mode0.into();
        assert_eq!(pol, Polarity::IdleLow);
        assert_eq!(pha, Phase::CaptureOnFirstTransition);

        let (pol, pha) = Mode::Mode3.into();
        assert_eq!(pol, Polarity::IdleHigh);
        assert_eq!(pha, Phase::CaptureOnSecondTransition);
    }

    #[test]
    fn test_with_mode() {
        let config = SpiConfig::default().with_mode(Mode::Mode2);
        assert_eq!(config.polarity, Polarity::IdleHigh);
        assert_eq!(config.phase, Phase::CaptureOnFirstTransition);
    }

    #[test]
    fn test_chip_select_index() {
        assert_eq!(ChipSelect::Cs0.index(), 0);
        assert_eq!(ChipSelect::Cs3.index(), 3);
    }
}
