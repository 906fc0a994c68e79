//! Timer callbacks and owner identity
//!
//! A callback is one capability: invoke, plus a bound-ness query and an
//! owner identity accessor. Two flavors exist:
//!
//! - a plain closure, always bound and ownerless
//! - an owner-bound closure, alive only while its [`TimerOwner`] is
//!
//! Owner-bound callbacks let the scheduler drop a looping timer whose
//! owning object has gone away instead of rearming it, and make the timer
//! reachable through [`TimerScheduler::clear_all_timers_for_owner`].
//!
//! [`TimerScheduler::clear_all_timers_for_owner`]: super::TimerScheduler::clear_all_timers_for_owner

use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use super::handle::TimerHandle;
use super::manager::TimerScheduler;

/// Callbacks receive the scheduler and the handle of the firing timer, so
/// they can reentrantly mutate the timer set (including clearing or
/// replacing themselves) without reaching for globals.
pub type TimerFn = Box<dyn FnMut(&mut TimerScheduler, TimerHandle)>;

static NEXT_OWNER_KEY: AtomicU64 = AtomicU64::new(1);

/// Identity used to group timers bound to the same logical object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerKey(u64);

impl OwnerKey {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Liveness anchor held by an object that owns timers.
///
/// Dropping the `TimerOwner` unbinds every callback created from it; the
/// scheduler then drops those timers instead of rearming them.
#[derive(Debug)]
pub struct TimerOwner {
    key: OwnerKey,
    alive: Rc<()>,
}

impl TimerOwner {
    pub fn new() -> Self {
        Self {
            key: OwnerKey(NEXT_OWNER_KEY.fetch_add(1, Ordering::Relaxed)),
            alive: Rc::new(()),
        }
    }

    pub fn key(&self) -> OwnerKey {
        self.key
    }

    /// Weak reference for embedding in callbacks
    pub fn owner_ref(&self) -> OwnerRef {
        OwnerRef {
            key: self.key,
            alive: Rc::downgrade(&self.alive),
        }
    }
}

impl Default for TimerOwner {
    fn default() -> Self {
        Self::new()
    }
}

/// Weak owner identity captured by a bound callback
#[derive(Debug, Clone)]
pub struct OwnerRef {
    key: OwnerKey,
    alive: Weak<()>,
}

impl OwnerRef {
    pub fn key(&self) -> OwnerKey {
        self.key
    }

    pub fn is_alive(&self) -> bool {
        self.alive.strong_count() > 0
    }
}

/// An invocable timer callback
pub enum TimerCallback {
    /// Plain closure; always bound, no owner identity
    Function(TimerFn),
    /// Closure bound to an owner; unbound once the owner is dropped
    Bound { owner: OwnerRef, call: TimerFn },
}

impl TimerCallback {
    pub fn function(f: impl FnMut(&mut TimerScheduler, TimerHandle) + 'static) -> Self {
        Self::Function(Box::new(f))
    }

    pub fn bound(
        owner: &TimerOwner,
        f: impl FnMut(&mut TimerScheduler, TimerHandle) + 'static,
    ) -> Self {
        Self::Bound {
            owner: owner.owner_ref(),
            call: Box::new(f),
        }
    }

    /// Whether invoking would reach a live target
    pub fn is_bound(&self) -> bool {
        match self {
            Self::Function(_) => true,
            Self::Bound { owner, .. } => owner.is_alive(),
        }
    }

    /// Owner identity, if this callback is owner-bound
    pub fn owner_key(&self) -> Option<OwnerKey> {
        match self {
            Self::Function(_) => None,
            Self::Bound { owner, .. } => Some(owner.key()),
        }
    }

    /// Invoke the callback. A bound callback whose owner has been dropped
    /// is a no-op.
    pub(crate) fn invoke(&mut self, scheduler: &mut TimerScheduler, handle: TimerHandle) {
        match self {
            Self::Function(call) => call(scheduler, handle),
            Self::Bound { owner, call } => {
                if owner.is_alive() {
                    call(scheduler, handle);
                }
            }
        }
    }
}

impl fmt::Debug for TimerCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("TimerCallback::Function"),
            Self::Bound { owner, .. } => f
                .debug_struct("TimerCallback::Bound")
                .field("owner", &owner.key())
                .field("alive", &owner.is_alive())
                .finish(),
        }
    }
}
