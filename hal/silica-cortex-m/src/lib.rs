//! Cortex-M core support for the Silica register HALs
//!
//! Everything the chip crates share regardless of vendor:
//!
//! - [`mmio`] - volatile register cells and validated block views
//! - [`scb`] - System Control Block (reset request, sleep control)
//! - [`nvic`] - interrupt enable/pend/priority control
//! - [`systick`] - the 24-bit core tick timer
//! - [`bits`] - byte-reverse and rotate helpers
//!
//! The register blocks here live at architecturally fixed addresses, so the
//! accessors take no base-address parameter.

#![no_std]

pub mod bits;
pub mod mmio;
pub mod nvic;
pub mod scb;
pub mod systick;

pub use mmio::{Reg16, Reg32, Reg8};

/// Stall until an interrupt (or debug event) wakes the core.
///
/// The LPC8xx PMU sleep modes take effect on the next WFI; see
/// `silica_lpc8xx::pmu`.
#[inline]
pub fn wait_for_interrupt() {
    cortex_m::asm::wfi();
}

/// Single-cycle no-op, for register write settle loops.
#[inline]
pub fn nop() {
    cortex_m::asm::nop();
}
