//! Four-phase GPIO rendezvous
//!
//! One full rendezvous walks both lines through every level pair:
//!
//! | requester drive | waiter drive | meaning                     |
//! |-----------------|--------------|-----------------------------|
//! | 0               | 0            | test running / idle         |
//! | 1               | 0            | requester wants to advance  |
//! | 1               | 1            | waiter ready                |
//! | 0               | 1            | requester says go           |
//! | 0               | 0            | waiter acknowledges, repeat |
//!
//! Neither side can skip a phase: every transition waits for the peer's
//! previous one. `setup` aligns the two boards once at bring-up; `start`
//! gates each test case.

use silica_hal::gpio::{InputPin, OutputPin};
use silica_hal::Status;

/// Request half of the rendezvous.
pub struct SyncRequester<O: OutputPin, I: InputPin> {
    drive: O,
    sense: I,
}

impl<O: OutputPin, I: InputPin> SyncRequester<O, I> {
    /// Wrap the two handshake lines. `drive` must be wired to the peer's
    /// sense pin and `sense` to the peer's drive pin.
    pub fn new(mut drive: O, sense: I) -> Self {
        drive.set_low();
        Self { drive, sense }
    }

    /// One-time bring-up rendezvous; returns once the peer has entered its
    /// matching [`SyncWaiter::setup`]. Polls forever if the peer is absent.
    pub fn setup(&mut self) {
        self.rendezvous();
    }

    /// Per-test rendezvous; returns once the peer has acknowledged the
    /// advance. Polls forever if the peer is absent.
    pub fn start(&mut self) {
        self.rendezvous();
    }

    /// Per-test rendezvous with a bounded wait.
    ///
    /// `ticks` is the total poll budget across both wait phases. On expiry
    /// the drive line is dropped and [`Status::Timeout`] comes back;
    /// otherwise [`Status::Done`].
    pub fn start_with_timeout(&mut self, ticks: u32) -> Status {
        let mut budget = ticks;

        self.drive.set_high();
        if !self.wait_sense(true, &mut budget) {
            self.drive.set_low();
            return Status::Timeout;
        }

        self.drive.set_low();
        if !self.wait_sense(false, &mut budget) {
            return Status::Timeout;
        }
        Status::Done
    }

    /// Hand the pins back.
    pub fn release(self) -> (O, I) {
        (self.drive, self.sense)
    }

    fn rendezvous(&mut self) {
        self.drive.set_high();
        while self.sense.is_low() {
            core::hint::spin_loop();
        }
        self.drive.set_low();
        while self.sense.is_high() {
            core::hint::spin_loop();
        }
    }

    fn wait_sense(&mut self, high: bool, budget: &mut u32) -> bool {
        while self.sense.is_high() != high {
            if *budget == 0 {
                return false;
            }
            *budget -= 1;
            core::hint::spin_loop();
        }
        true
    }
}

/// Wait half of the rendezvous.
pub struct SyncWaiter<O: OutputPin, I: InputPin> {
    drive: O,
    sense: I,
}

impl<O: OutputPin, I: InputPin> SyncWaiter<O, I> {
    /// Wrap the two handshake lines, cross-wired to the requester.
    pub fn new(mut drive: O, sense: I) -> Self {
        drive.set_low();
        Self { drive, sense }
    }

    /// One-time bring-up rendezvous; returns once the peer has completed
    /// its matching [`SyncRequester::setup`]. Polls forever if the peer is
    /// absent.
    pub fn setup(&mut self) {
        self.rendezvous();
    }

    /// Per-test rendezvous; blocks until the peer requests the next case.
    pub fn start(&mut self) {
        self.rendezvous();
    }

    /// Hand the pins back.
    pub fn release(self) -> (O, I) {
        (self.drive, self.sense)
    }

    fn rendezvous(&mut self) {
        while self.sense.is_low() {
            core::hint::spin_loop();
        }
        self.drive.set_high();
        while self.sense.is_high() {
            core::hint::spin_loop();
        }
        self.drive.set_low();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    /// One wire of the simulated harness.
    #[derive(Clone)]
    struct Wire(Arc<AtomicBool>);

    impl Wire {
        fn new() -> Self {
            Self(Arc::new(AtomicBool::new(false)))
        }
    }

    /// The driving end of a wire.
    struct DriveEnd(Wire);

    impl OutputPin for DriveEnd {
        fn set_high(&mut self) {
            (self.0).0.store(true, Ordering::SeqCst);
        }

        fn set_low(&mut self) {
            (self.0).0.store(false, Ordering::SeqCst);
        }

        fn toggle(&mut self) {
            (self.0).0.fetch_xor(true, Ordering::SeqCst);
        }

        fn is_set_high(&self) -> bool {
            (self.0).0.load(Ordering::SeqCst)
        }
    }

    /// The sensing end of a wire.
    struct SenseEnd(Wire);

    impl InputPin for SenseEnd {
        fn is_high(&self) -> bool {
            (self.0).0.load(Ordering::SeqCst)
        }
    }

    /// A cross-wired board pair: (requester pins, waiter pins).
    fn wire_boards() -> ((DriveEnd, SenseEnd), (DriveEnd, SenseEnd)) {
        let req_to_wait = Wire::new();
        let wait_to_req = Wire::new();
        (
            (DriveEnd(req_to_wait.clone()), SenseEnd(wait_to_req.clone())),
            (DriveEnd(wait_to_req), SenseEnd(req_to_wait)),
        )
    }

    #[test]
    fn test_setup_waits_for_peer() {
        let ((req_drive, req_sense), (wait_drive, wait_sense)) = wire_boards();
        let peer_entered = Arc::new(AtomicBool::new(false));

        let entered = peer_entered.clone();
        let peer = thread::spawn(move || {
            let mut waiter = SyncWaiter::new(wait_drive, wait_sense);
            // Hold back so the requester provably blocks on us
            thread::sleep(Duration::from_millis(50));
            entered.store(true, Ordering::SeqCst);
            waiter.setup();
        });

        let mut requester = SyncRequester::new(req_drive, req_sense);
        requester.setup();
        assert!(
            peer_entered.load(Ordering::SeqCst),
            "requester setup returned before the peer entered its setup"
        );
        peer.join().unwrap();
    }

    #[test]
    fn test_full_cycle_repeats_in_order() {
        let ((req_drive, req_sense), (wait_drive, wait_sense)) = wire_boards();
        const ROUNDS: usize = 10;

        let peer = thread::spawn(move || {
            let mut waiter = SyncWaiter::new(wait_drive, wait_sense);
            waiter.setup();
            let mut seen = 0;
            for _ in 0..ROUNDS {
                waiter.start();
                seen += 1;
            }
            seen
        });

        let mut requester = SyncRequester::new(req_drive, req_sense);
        requester.setup();
        for _ in 0..ROUNDS {
            requester.start();
        }

        assert_eq!(peer.join().unwrap(), ROUNDS);
    }

    #[test]
    fn test_lines_return_to_idle_after_cycle() {
        let ((req_drive, req_sense), (wait_drive, wait_sense)) = wire_boards();

        let peer = thread::spawn(move || {
            let mut waiter = SyncWaiter::new(wait_drive, wait_sense);
            waiter.setup();
            waiter.release()
        });

        let mut requester = SyncRequester::new(req_drive, req_sense);
        requester.setup();
        let (req_drive, req_sense) = requester.release();
        let (wait_drive, _) = peer.join().unwrap();

        // Both drive lines back at the test-running level
        assert!(req_drive.is_set_low());
        assert!(wait_drive.is_set_low());
        assert!(req_sense.is_low());
    }

    #[test]
    fn test_timeout_when_peer_never_responds() {
        let ((req_drive, req_sense), _peer_pins) = wire_boards();
        let mut requester = SyncRequester::new(req_drive, req_sense);

        let status = requester.start_with_timeout(10_000);
        assert_eq!(status, Status::Timeout);

        // The request level was retracted on the way out
        let (drive, _) = requester.release();
        assert!(drive.is_set_low());
    }

    #[test]
    fn test_timeout_variant_succeeds_with_live_peer() {
        let ((req_drive, req_sense), (wait_drive, wait_sense)) = wire_boards();

        let peer = thread::spawn(move || {
            let mut waiter = SyncWaiter::new(wait_drive, wait_sense);
            waiter.start();
        });

        let mut requester = SyncRequester::new(req_drive, req_sense);
        // A budget the live peer cannot plausibly exhaust
        let status = requester.start_with_timeout(u32::MAX);
        assert_eq!(status, Status::Done);
        peer.join().unwrap();
    }
}
