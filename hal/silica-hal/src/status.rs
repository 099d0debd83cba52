//! Shared result codes
//!
//! The whole HAL reports through one closed set of result codes. Nothing
//! panics and nothing logs; every illegal operation returns a code and
//! leaves state untouched.

/// Result code returned by drivers and the test-sync harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// Operation completed without error
    NoError,
    /// Generic failure, typically an illegal call for the current state
    Error,
    /// A transfer was admitted and is now in flight
    Started,
    /// The channel is mid-transfer; the request was refused without
    /// touching any state
    Busy,
    /// The operation ran to completion and released its resources
    Done,
    /// The channel is already owned by another caller
    InUse,
    /// A bounded wait expired before the peer responded
    Timeout,
}

impl Status {
    /// True for the codes that report success of the requested operation.
    pub fn is_ok(self) -> bool {
        matches!(self, Status::NoError | Status::Started | Status::Done)
    }

    /// True for the codes that report refusal or failure.
    pub fn is_err(self) -> bool {
        !self.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_codes() {
        assert!(Status::NoError.is_ok());
        assert!(Status::Started.is_ok());
        assert!(Status::Done.is_ok());
    }

    #[test]
    fn test_failure_codes() {
        for status in [Status::Error, Status::Busy, Status::InUse, Status::Timeout] {
            assert!(status.is_err());
            assert!(!status.is_ok());
        }
    }
}
