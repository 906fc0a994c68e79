//! Timer records (runtime state)
//!
//! A `TimerRecord` is the per-slot state behind a handle: countdown
//! parameters, the callback, and where the timer sits in its lifecycle.

use super::callback::{OwnerKey, TimerCallback};
use super::context::ContextTag;

/// Lifecycle state of a timer.
///
/// `expire_time` semantics depend on the state: absolute scheduler time for
/// `Active`/`Executing`, remaining time for `Paused`/`Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerStatus {
    /// Created between ticks; activated at the end of the next tick
    Pending,
    /// Counting down on the active heap
    Active,
    /// Held off the heap with its remaining time preserved
    Paused,
    /// Popped from the heap, callback invocation(s) in progress
    Executing,
    /// Cleared while on the heap; the next pop discards it
    ActivePendingRemoval,
}

impl TimerStatus {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Executing => "executing",
            Self::ActivePendingRemoval => "pending-removal",
        }
    }
}

/// Per-slot timer state
pub(crate) struct TimerRecord {
    /// Seconds between firings; always > 0 for timers created via `set_timer`
    pub rate: f64,

    /// Whether the timer rearms after firing
    pub looping: bool,

    /// Absolute expiry (Active/Executing) or remaining time (Paused/Pending)
    pub expire_time: f64,

    pub status: TimerStatus,

    /// None while the callback is checked out for invocation during a tick
    pub callback: Option<TimerCallback>,

    /// Drop the timer instead of rearming if the callback comes unbound
    pub requires_callback: bool,

    /// Identity for the owner index, if the callback is owner-bound
    pub owner_key: Option<OwnerKey>,

    /// Execution context captured at registration, restored around firing
    pub context_tag: Option<ContextTag>,
}

impl std::fmt::Debug for TimerRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerRecord")
            .field("rate", &self.rate)
            .field("looping", &self.looping)
            .field("expire_time", &self.expire_time)
            .field("status", &self.status)
            .field("has_callback", &self.callback.is_some())
            .field("requires_callback", &self.requires_callback)
            .field("owner_key", &self.owner_key)
            .field("context_tag", &self.context_tag)
            .finish()
    }
}
