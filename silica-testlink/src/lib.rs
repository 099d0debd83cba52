//! Two-board test-synchronization harness
//!
//! Keeps two independently clocked boards stepping through a shared,
//! ordered list of on-target test cases in lockstep, over two cross-wired
//! GPIO lines per board (one driven, one sensed). One board runs the
//! request half of the rendezvous, the other the wait half.
//!
//! ```text
//!   board A (requester)            board B (waiter)
//!   drive  ────────────────────▶   sense
//!   sense  ◀────────────────────   drive
//! ```
//!
//! Everything is polled; apart from the explicit timeout variant, a
//! missing peer hangs the caller by design.

#![no_std]

pub mod runner;
pub mod sync;

pub use runner::{LockstepRunner, TestCase, TestReport};
pub use sync::{SyncRequester, SyncWaiter};
