//! Lockstep test runner
//!
//! Both boards register the same ordered list of test cases; the
//! rendezvous before each case keeps the lists aligned even when the
//! boards run at different speeds. Results are tallied locally - the
//! harness synchronizes progress, not verdicts.

use heapless::Vec;
use silica_hal::gpio::{InputPin, OutputPin};

use crate::sync::{SyncRequester, SyncWaiter};

/// Most cases one runner can hold.
pub const MAX_CASES: usize = 32;

/// One on-target test case.
#[derive(Debug, Clone, Copy)]
pub struct TestCase {
    /// Name, for whatever reporting channel the board has
    pub name: &'static str,
    /// The test body; true = pass
    pub run: fn() -> bool,
}

/// Tally of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TestReport {
    pub passed: usize,
    pub failed: usize,
}

impl TestReport {
    /// True if every case passed.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Cases executed.
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }
}

/// An ordered list of cases run in lockstep with a peer board.
pub struct LockstepRunner {
    cases: Vec<TestCase, MAX_CASES>,
}

impl LockstepRunner {
    /// An empty runner.
    pub const fn new() -> Self {
        Self { cases: Vec::new() }
    }

    /// Append a case. Errors once [`MAX_CASES`] is reached.
    pub fn add(&mut self, name: &'static str, run: fn() -> bool) -> Result<(), TestCase> {
        self.cases.push(TestCase { name, run })
    }

    /// Registered cases, in execution order.
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Drive the run from the request side: one bring-up rendezvous, then
    /// one rendezvous ahead of each case.
    pub fn run_requesting<O: OutputPin, I: InputPin>(
        &self,
        link: &mut SyncRequester<O, I>,
    ) -> TestReport {
        link.setup();
        let mut report = TestReport::default();
        for case in &self.cases {
            link.start();
            if (case.run)() {
                report.passed += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }

    /// Follow the run from the wait side.
    pub fn run_waiting<O: OutputPin, I: InputPin>(
        &self,
        link: &mut SyncWaiter<O, I>,
    ) -> TestReport {
        link.setup();
        let mut report = TestReport::default();
        for case in &self.cases {
            link.start();
            if (case.run)() {
                report.passed += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }
}

impl Default for LockstepRunner {
    fn default() -> Self {
        Self::new()
    }
}
