//! Timer handles
//!
//! A `TimerHandle` is the opaque identifier callers hold for a scheduled
//! timer. It pairs a slot index with a serial number so that a handle kept
//! across frames reliably stops resolving once its timer is gone, even if
//! the slot is later reused for an unrelated timer.

use std::fmt;

/// Opaque identifier for a scheduled timer.
///
/// The default handle is invalid and never matches a live timer. Handles
/// compare by exact `(index, serial)` match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    index: u32,
    serial: u64,
}

impl TimerHandle {
    /// Serial 0 is reserved for the invalid sentinel
    pub(crate) const INVALID_SERIAL: u64 = 0;

    pub(crate) fn new(index: u32, serial: u64) -> Self {
        Self { index, serial }
    }

    /// Whether this handle has ever referred to a timer.
    ///
    /// A valid handle may still be stale; only the scheduler can tell.
    pub fn is_valid(&self) -> bool {
        self.serial != Self::INVALID_SERIAL
    }

    /// Reset to the invalid sentinel
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn index(&self) -> u32 {
        self.index
    }

    pub(crate) fn serial(&self) -> u64 {
        self.serial
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}:{}", self.index, self.serial)
        } else {
            write!(f, "invalid")
        }
    }
}
