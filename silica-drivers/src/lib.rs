//! Chip-independent drivers for the Silica register HALs
//!
//! Everything here works purely through the `silica-hal` traits and result
//! codes, so it runs unchanged on any supported part (and on the host,
//! which is how it is tested).

#![no_std]

pub mod claimable;

pub use claimable::{ClaimableUart, LinkState};
