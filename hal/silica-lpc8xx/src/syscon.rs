//! SYSCON - system configuration
//!
//! Clock gating, peripheral reset, main-clock and PLL control, power
//! configuration, and the USART fractional baud clock. Everything else in
//! this crate assumes the relevant SYSCON clock gate has been opened first.

use silica_cortex_m::mmio::{block_at, Reg32};

/// SYSCON register block base.
pub const BASE: usize = 0x4004_8000;

/// SYSCON register block
#[repr(C)]
pub struct SysconBlock {
    /// System memory remap
    pub sysmemremap: Reg32,
    /// Peripheral reset control, active low
    pub presetctrl: Reg32,
    /// System PLL control
    pub syspllctrl: Reg32,
    /// System PLL status
    pub syspllstat: Reg32,
    _reserved0: [u8; 0x10],
    /// System oscillator control
    pub sysoscctrl: Reg32,
    /// Watchdog oscillator control
    pub wdtoscctrl: Reg32,
    _reserved1: [u8; 0x08],
    /// System reset status
    pub sysrststat: Reg32,
    _reserved2: [u8; 0x0C],
    /// System PLL clock source select
    pub syspllclksel: Reg32,
    /// System PLL clock source update enable
    pub syspllclkuen: Reg32,
    _reserved3: [u8; 0x28],
    /// Main clock source select
    pub mainclksel: Reg32,
    /// Main clock source update enable
    pub mainclkuen: Reg32,
    /// System clock divider
    pub sysahbclkdiv: Reg32,
    _reserved4: [u8; 0x04],
    /// AHB clock gates
    pub sysahbclkctrl: Reg32,
    _reserved5: [u8; 0x10],
    /// USART clock divider
    pub uartclkdiv: Reg32,
    _reserved6: [u8; 0x48],
    /// CLKOUT source select
    pub clkoutsel: Reg32,
    /// CLKOUT source update enable
    pub clkoutuen: Reg32,
    /// CLKOUT divider
    pub clkoutdiv: Reg32,
    _reserved7: [u8; 0x04],
    /// USART fractional generator divider (must be 0xFF when used)
    pub uartfrgdiv: Reg32,
    /// USART fractional generator multiplier
    pub uartfrgmult: Reg32,
    _reserved8: [u8; 0x08],
    /// POR captured pin state
    pub pioporcap0: Reg32,
    _reserved9: [u8; 0x4C],
    /// Brown-out detector control
    pub bodctrl: Reg32,
    /// SysTick calibration
    pub systckcal: Reg32,
    _reserved10: [u8; 0x18],
    /// IRQ latency
    pub irqlatency: Reg32,
    /// NMI source select
    pub nmisrc: Reg32,
    /// Pin interrupt source select
    pub pintsel: [Reg32; 8],
    _reserved11: [u8; 0x98],
    /// Deep-sleep power configuration
    pub pdsleepcfg: Reg32,
    /// Wake-up power configuration
    pub pdawakecfg: Reg32,
    /// Run-mode power configuration, a set bit powers the block *down*
    pub pdruncfg: Reg32,
    _reserved12: [u8; 0x1BC],
    /// Part identification
    pub device_id: Reg32,
}

/// AHB clock gate positions (SYSAHBCLKCTRL)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ClockGate {
    Rom = 1,
    Ram = 2,
    FlashReg = 3,
    Flash = 4,
    I2c0 = 5,
    Gpio = 6,
    Swm = 7,
    Sct = 8,
    Wkt = 9,
    Mrt = 10,
    Spi0 = 11,
    Spi1 = 12,
    Crc = 13,
    Uart0 = 14,
    Uart1 = 15,
    Uart2 = 16,
    Wwdt = 17,
    Iocon = 18,
    Acmp = 19,
}

/// Peripheral reset lines (PRESETCTRL), active low
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ResetLine {
    Spi0 = 0,
    Spi1 = 1,
    UartFrg = 2,
    Uart0 = 3,
    Uart1 = 4,
    Uart2 = 5,
    I2c0 = 6,
    Mrt = 7,
    Sct = 8,
    Wkt = 9,
    Gpio = 10,
    Flash = 11,
    Acmp = 12,
}

/// Main clock sources (MAINCLKSEL)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MainClock {
    /// 12 MHz internal RC oscillator
    Irc = 0,
    /// PLL input (pre-divider)
    PllInput = 1,
    /// Watchdog oscillator
    WdtOsc = 2,
    /// PLL output
    PllOutput = 3,
}

/// Analog block power switches (PDRUNCFG), bit set = powered down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerDomain {
    IrcOut = 0,
    Irc = 1,
    Flash = 2,
    Bod = 3,
    SysOsc = 5,
    WdtOsc = 6,
    SysPll = 7,
    Acmp = 15,
}

/// SYSPLLSTAT bit assignments
pub mod syspllstat {
    /// PLL locked onto the requested frequency
    pub const LOCK: u32 = 1 << 0;
}

/// System configuration controller.
pub struct Syscon {
    regs: &'static SysconBlock,
}

impl Syscon {
    /// View over the SYSCON block at its fixed base.
    pub fn new() -> Self {
        // Fixed, word-aligned base; the view check cannot fail.
        let regs = unsafe { block_at::<SysconBlock>(BASE) }.unwrap();
        Self { regs }
    }

    /// View over a SYSCON block at `addr`, for parts mapping it elsewhere.
    ///
    /// # Safety
    ///
    /// `addr` must map a live SYSCON register block.
    pub unsafe fn at(addr: usize) -> Option<Self> {
        block_at::<SysconBlock>(addr).map(|regs| Self { regs })
    }

    /// Open a peripheral's AHB clock gate.
    pub fn enable_clock(&mut self, gate: ClockGate) {
        self.regs.sysahbclkctrl.set_bits(1 << gate as u8);
    }

    /// Close a peripheral's AHB clock gate.
    pub fn disable_clock(&mut self, gate: ClockGate) {
        self.regs.sysahbclkctrl.clear_bits(1 << gate as u8);
    }

    /// True if the peripheral's AHB clock gate is open.
    pub fn is_clock_enabled(&self, gate: ClockGate) -> bool {
        self.regs.sysahbclkctrl.is_set(1 << gate as u8)
    }

    /// Hold a peripheral in reset.
    pub fn assert_reset(&mut self, line: ResetLine) {
        self.regs.presetctrl.clear_bits(1 << line as u8);
    }

    /// Release a peripheral from reset.
    pub fn release_reset(&mut self, line: ResetLine) {
        self.regs.presetctrl.set_bits(1 << line as u8);
    }

    /// Pulse a peripheral's reset line.
    pub fn reset(&mut self, line: ResetLine) {
        self.assert_reset(line);
        self.release_reset(line);
    }

    /// Switch the main clock source.
    ///
    /// The select only takes effect after the update-enable register sees a
    /// 0-to-1 edge.
    pub fn set_main_clock(&mut self, source: MainClock) {
        self.regs.mainclksel.write(source as u32);
        self.regs.mainclkuen.write(0);
        self.regs.mainclkuen.write(1);
    }

    /// Set the AHB clock divider. 0 gates the system clock entirely.
    pub fn set_ahb_divider(&mut self, div: u8) {
        self.regs.sysahbclkdiv.write(div as u32);
    }

    /// Program the system PLL and spin until it locks.
    ///
    /// Output frequency is `input * (msel + 1)`; `psel` picks the post
    /// divider (2 * 2^psel) that keeps the CCO in range. Values are
    /// caller-trusted, as everywhere in this crate.
    pub fn configure_pll(&mut self, msel: u8, psel: u8) {
        self.power_up(PowerDomain::SysPll);
        self.regs
            .syspllctrl
            .write(((psel as u32 & 0x3) << 5) | (msel as u32 & 0x1F));
        while !self.regs.syspllstat.is_set(syspllstat::LOCK) {}
    }

    /// Power an analog block up.
    pub fn power_up(&mut self, domain: PowerDomain) {
        self.regs.pdruncfg.clear_bits(1 << domain as u8);
    }

    /// Power an analog block down.
    pub fn power_down(&mut self, domain: PowerDomain) {
        self.regs.pdruncfg.set_bits(1 << domain as u8);
    }

    /// Route the main clock to the USARTs through the fractional generator.
    ///
    /// The common U_PCLK recipe: `div` predivides the main clock, and the
    /// fractional generator then scales by `255 / (255 + mult)` with its
    /// divider pinned at 255 as the manual requires.
    pub fn setup_uart_clock(&mut self, div: u8, mult: u8) {
        self.regs.uartclkdiv.write(div as u32);
        self.regs.uartfrgdiv.write(0xFF);
        self.regs.uartfrgmult.write(mult as u32);
    }

    /// Raw part identification word.
    pub fn device_id(&self) -> u32 {
        self.regs.device_id.read()
    }
}

impl Default for Syscon {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::boxed::Box;

    fn fake() -> Syscon {
        let block: &'static SysconBlock = Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        Syscon { regs: block }
    }

    #[test]
    fn test_clock_gating() {
        let mut syscon = fake();
        syscon.enable_clock(ClockGate::Uart0);
        syscon.enable_clock(ClockGate::Gpio);
        assert!(syscon.is_clock_enabled(ClockGate::Uart0));
        assert!(syscon.is_clock_enabled(ClockGate::Gpio));

        syscon.disable_clock(ClockGate::Uart0);
        assert!(!syscon.is_clock_enabled(ClockGate::Uart0));
        assert!(syscon.is_clock_enabled(ClockGate::Gpio));
    }

    #[test]
    fn test_reset_release_leaves_line_high() {
        let mut syscon = fake();
        syscon.reset(ResetLine::Spi0);
        assert!(syscon.regs.presetctrl.is_set(1 << ResetLine::Spi0 as u8));
    }

    #[test]
    fn test_main_clock_uen_toggles() {
        let mut syscon = fake();
        syscon.set_main_clock(MainClock::PllOutput);
        assert_eq!(syscon.regs.mainclksel.read(), 3);
        assert_eq!(syscon.regs.mainclkuen.read(), 1);
    }

    #[test]
    fn test_uart_clock_pins_frg_divider() {
        let mut syscon = fake();
        syscon.setup_uart_clock(1, 22);
        assert_eq!(syscon.regs.uartclkdiv.read(), 1);
        assert_eq!(syscon.regs.uartfrgdiv.read(), 0xFF);
        assert_eq!(syscon.regs.uartfrgmult.read(), 22);
    }
}
