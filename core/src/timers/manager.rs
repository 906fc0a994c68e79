//! Timer scheduler
//!
//! Owns all timer state: the slot table, the active heap, the paused and
//! pending sets, and the owner index. All operations are synchronous and
//! single-threaded; exactly one `tick` may be in flight at a time and every
//! other call is expected from the same thread.
//!
//! Every public operation has a defined result for every input. Stale or
//! invalid handles act as "no such timer": mutations are no-ops and queries
//! return `false` or the `-1.0` sentinel.

use std::fmt::Write as _;
use std::rc::Rc;

use hashbrown::{HashMap, HashSet};

use super::callback::{OwnerKey, TimerCallback};
use super::context::ContextSwitch;
use super::definition::TimerDefinition;
use super::handle::TimerHandle;
use super::heap::ActiveHeap;
use super::record::{TimerRecord, TimerStatus};
use super::slots::SlotTable;
use super::tick;

/// Tick-driven timer scheduler with generation-tagged handles
pub struct TimerScheduler {
    pub(crate) slots: SlotTable,
    pub(crate) active_heap: ActiveHeap,
    pub(crate) paused: HashSet<TimerHandle>,
    pub(crate) pending: HashSet<TimerHandle>,
    pub(crate) owner_index: HashMap<OwnerKey, HashSet<TimerHandle>>,

    /// Handle whose callback is on the stack right now, if any
    pub(crate) currently_executing: Option<TimerHandle>,

    /// Logical clock, advanced only by `tick`
    pub(crate) now: f64,

    /// Frame id of the last completed tick, for per-frame idempotence
    pub(crate) last_ticked_frame: Option<u64>,

    /// False from the start of a tick until its end, so timers registered
    /// from inside callbacks land in the pending set
    pub(crate) ticked_this_cycle: bool,

    pub(crate) context: Option<Rc<dyn ContextSwitch>>,
}

impl TimerScheduler {
    pub fn new() -> Self {
        Self {
            slots: SlotTable::new(),
            active_heap: ActiveHeap::new(),
            paused: HashSet::new(),
            pending: HashSet::new(),
            owner_index: HashMap::new(),
            currently_executing: None,
            now: 0.0,
            last_ticked_frame: None,
            ticked_this_cycle: false,
            context: None,
        }
    }

    /// Install the host's execution-context hook. Timers registered after
    /// this capture the current context and restore it around firing.
    pub fn set_context_switch(&mut self, switch: Rc<dyn ContextSwitch>) {
        self.context = Some(switch);
    }

    /// Current value of the logical clock
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Whether a tick has completed in the current update cycle
    pub fn has_ticked_this_cycle(&self) -> bool {
        self.ticked_this_cycle
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Registration
    // ═══════════════════════════════════════════════════════════════════════

    /// Register a timer that fires `callback` every `rate` seconds.
    ///
    /// If `handle` already refers to a live timer it is cleared first; no
    /// state carries over. A non-positive `rate` only clears. The first
    /// firing happens after `first_delay` seconds when one is given (and
    /// non-negative), otherwise after `rate`.
    ///
    /// Timers registered before this cycle's tick (including from inside a
    /// timer callback) stay pending and cannot fire until the next tick;
    /// timers registered after it go straight onto the active heap.
    ///
    /// On return `handle` refers to the new timer, or is invalid if none
    /// was created.
    pub fn set_timer(
        &mut self,
        handle: &mut TimerHandle,
        callback: TimerCallback,
        rate: f64,
        looping: bool,
        first_delay: Option<f64>,
    ) {
        self.clear_handle(*handle);
        handle.invalidate();

        if rate <= 0.0 {
            return;
        }

        let first_delay = match first_delay {
            Some(delay) if delay >= 0.0 => delay,
            _ => rate,
        };

        let owner_key = callback.owner_key();
        let context_tag = self.context.as_ref().map(|switch| switch.capture());

        let (status, expire_time) = if self.ticked_this_cycle {
            (TimerStatus::Active, self.now + first_delay)
        } else {
            (TimerStatus::Pending, first_delay)
        };

        let new_handle = self.slots.allocate(TimerRecord {
            rate,
            looping,
            expire_time,
            status,
            callback: Some(callback),
            requires_callback: owner_key.is_some(),
            owner_key,
            context_tag,
        });

        if status == TimerStatus::Active {
            self.active_heap.push(new_handle, expire_time);
        } else {
            self.pending.insert(new_handle);
        }
        if let Some(key) = owner_key {
            self.owner_index.entry(key).or_default().insert(new_handle);
        }

        tracing::debug!(
            handle = %new_handle,
            rate,
            looping,
            status = status.label(),
            "timer set"
        );
        *handle = new_handle;
    }

    /// Register a timer from a loaded definition. Disabled definitions are
    /// skipped and leave `handle` untouched.
    pub fn set_timer_from_definition(
        &mut self,
        handle: &mut TimerHandle,
        definition: &TimerDefinition,
        callback: TimerCallback,
    ) {
        if !definition.enabled {
            tracing::debug!(id = %definition.id, "skipping disabled timer definition");
            return;
        }
        self.set_timer(
            handle,
            callback,
            definition.rate_secs,
            definition.looping,
            definition.first_delay_secs,
        );
    }

    /// Fire-once convenience: due immediately on the next tick. If a tick
    /// is in progress and has not drained the heap past the current time
    /// yet, that still counts.
    pub fn set_timer_for_next_tick(&mut self, callback: TimerCallback) -> TimerHandle {
        let owner_key = callback.owner_key();
        let context_tag = self.context.as_ref().map(|switch| switch.capture());

        let handle = self.slots.allocate(TimerRecord {
            rate: 0.0,
            looping: false,
            expire_time: self.now,
            status: TimerStatus::Active,
            callback: Some(callback),
            requires_callback: owner_key.is_some(),
            owner_key,
            context_tag,
        });
        self.active_heap.push(handle, self.now);
        if let Some(key) = owner_key {
            self.owner_index.entry(key).or_default().insert(handle);
        }
        handle
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Clearing
    // ═══════════════════════════════════════════════════════════════════════

    /// Remove the timer behind `handle` and invalidate the caller's
    /// variable. No-op for unknown or stale handles.
    pub fn clear_timer(&mut self, handle: &mut TimerHandle) {
        self.clear_handle(*handle);
        handle.invalidate();
    }

    /// Remove every timer whose callback is bound to `owner`
    pub fn clear_all_timers_for_owner(&mut self, owner: OwnerKey) {
        let Some(handles) = self.owner_index.get(&owner) else {
            return;
        };
        // Snapshot: clearing mutates the index set we are iterating
        let handles: Vec<TimerHandle> = handles.iter().copied().collect();
        tracing::debug!(owner = owner.as_u64(), count = handles.len(), "bulk clear");
        for handle in handles {
            self.clear_handle(handle);
        }
    }

    pub(crate) fn clear_handle(&mut self, handle: TimerHandle) {
        let Some(record) = self.slots.lookup(handle) else {
            return;
        };

        match record.status {
            TimerStatus::Pending => {
                self.pending.remove(&handle);
                self.free_slot(handle);
            }
            TimerStatus::Active => {
                // Cannot cheaply remove from the middle of the heap; the
                // next pop that reaches this entry discards it
                if let Some(record) = self.slots.lookup_mut(handle) {
                    record.status = TimerStatus::ActivePendingRemoval;
                    record.callback = None;
                }
            }
            TimerStatus::Paused => {
                self.paused.remove(&handle);
                self.free_slot(handle);
            }
            TimerStatus::Executing => {
                // Stops any remaining catch-up invocations and the rearm
                if self.currently_executing == Some(handle) {
                    self.currently_executing = None;
                }
                self.free_slot(handle);
            }
            // Already cleared, awaiting lazy heap removal
            TimerStatus::ActivePendingRemoval => return,
        }
        tracing::debug!(handle = %handle, "timer cleared");
    }

    /// Free the slot and drop the owner-index entry. The last handle for an
    /// owner removes that owner's entry entirely.
    pub(crate) fn free_slot(&mut self, handle: TimerHandle) {
        let Some(record) = self.slots.free(handle) else {
            return;
        };
        if let Some(key) = record.owner_key {
            if let Some(set) = self.owner_index.get_mut(&key) {
                set.remove(&handle);
                if set.is_empty() {
                    self.owner_index.remove(&key);
                }
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Pause / unpause
    // ═══════════════════════════════════════════════════════════════════════

    /// Take a timer off the clock, preserving its remaining time. A
    /// non-looping timer paused while its own callback runs is treated as
    /// finished and removed.
    pub fn pause_timer(&mut self, handle: TimerHandle) {
        let Some(record) = self.find_timer(handle) else {
            return;
        };
        let status = record.status;
        let looping = record.looping;

        match status {
            TimerStatus::Paused => return,
            TimerStatus::Active => {
                self.active_heap.remove(handle);
            }
            TimerStatus::Pending => {
                self.pending.remove(&handle);
            }
            TimerStatus::Executing => {
                if !looping {
                    if self.currently_executing == Some(handle) {
                        self.currently_executing = None;
                    }
                    self.free_slot(handle);
                    return;
                }
                if self.currently_executing == Some(handle) {
                    self.currently_executing = None;
                }
            }
            TimerStatus::ActivePendingRemoval => return,
        }

        let now = self.now;
        if let Some(record) = self.slots.lookup_mut(handle) {
            record.status = TimerStatus::Paused;
            // Pending expiry is already relative; anything else was on the
            // absolute clock and becomes "time remaining"
            if status != TimerStatus::Pending {
                record.expire_time -= now;
            }
        }
        self.paused.insert(handle);
    }

    /// Put a paused timer back on the clock with its preserved remaining
    /// time. No-op unless currently paused.
    pub fn unpause_timer(&mut self, handle: TimerHandle) {
        let Some(record) = self.find_timer(handle) else {
            return;
        };
        if record.status != TimerStatus::Paused {
            return;
        }
        self.paused.remove(&handle);

        let now = self.now;
        if self.ticked_this_cycle {
            if let Some(record) = self.slots.lookup_mut(handle) {
                record.status = TimerStatus::Active;
                record.expire_time += now;
                let expire_time = record.expire_time;
                self.active_heap.push(handle, expire_time);
            }
        } else if let Some(record) = self.slots.lookup_mut(handle) {
            record.status = TimerStatus::Pending;
            self.pending.insert(handle);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Tick
    // ═══════════════════════════════════════════════════════════════════════

    /// Advance the logical clock by `delta_seconds` and fire every due
    /// timer. `frame` identifies the update cycle: a second call with the
    /// same frame id is a no-op.
    pub fn tick(&mut self, delta_seconds: f64, frame: u64) {
        tick::run_tick(self, delta_seconds, frame);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    /// Whether the handle refers to a live timer
    pub fn timer_exists(&self, handle: TimerHandle) -> bool {
        self.find_timer(handle).is_some()
    }

    /// Live and not paused (pending and executing timers count as active)
    pub fn is_timer_active(&self, handle: TimerHandle) -> bool {
        self.find_timer(handle)
            .is_some_and(|record| record.status != TimerStatus::Paused)
    }

    pub fn is_timer_paused(&self, handle: TimerHandle) -> bool {
        self.find_timer(handle)
            .is_some_and(|record| record.status == TimerStatus::Paused)
    }

    pub fn is_timer_pending(&self, handle: TimerHandle) -> bool {
        self.find_timer(handle)
            .is_some_and(|record| record.status == TimerStatus::Pending)
    }

    /// Seconds between firings, or `-1.0` for an unknown handle
    pub fn timer_rate(&self, handle: TimerHandle) -> f64 {
        match self.find_timer(handle) {
            Some(record) => record.rate,
            None => -1.0,
        }
    }

    /// Seconds elapsed since the last (re)arming, or `-1.0` for an unknown
    /// handle
    pub fn timer_elapsed(&self, handle: TimerHandle) -> f64 {
        match self.find_timer(handle) {
            Some(record) => match record.status {
                TimerStatus::Active | TimerStatus::Executing => {
                    record.rate - (record.expire_time - self.now)
                }
                _ => record.rate - record.expire_time,
            },
            None => -1.0,
        }
    }

    /// Seconds until the next firing, or `-1.0` for an unknown handle
    pub fn timer_remaining(&self, handle: TimerHandle) -> f64 {
        match self.find_timer(handle) {
            Some(record) => match record.status {
                TimerStatus::Active => record.expire_time - self.now,
                TimerStatus::Executing => 0.0,
                _ => record.expire_time,
            },
            None => -1.0,
        }
    }

    /// Count of timers counting down (active or mid-fire)
    pub fn active_timer_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|(_, record)| {
                matches!(
                    record.status,
                    TimerStatus::Active | TimerStatus::Executing
                )
            })
            .count()
    }

    pub fn paused_timer_count(&self) -> usize {
        self.paused.len()
    }

    pub fn pending_timer_count(&self) -> usize {
        self.pending.len()
    }

    /// Diagnostic text dump of every live timer
    pub fn list_timers(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "timer scheduler: clock {:.3}s, {} active, {} paused, {} pending",
            self.now,
            self.active_timer_count(),
            self.paused.len(),
            self.pending.len(),
        );
        for (handle, record) in self.slots.iter() {
            if record.status == TimerStatus::ActivePendingRemoval {
                continue;
            }
            let remaining = match record.status {
                TimerStatus::Active => record.expire_time - self.now,
                TimerStatus::Executing => 0.0,
                _ => record.expire_time,
            };
            let _ = writeln!(
                out,
                "  {:<14} {:<10} rate {:>9.3}s  remaining {:>9.3}s  loop {}",
                handle.to_string(),
                record.status.label(),
                record.rate,
                remaining,
                record.looping,
            );
        }
        out
    }

    /// Resolve a handle the way the public surface sees it: timers cleared
    /// but still awaiting lazy heap removal do not exist.
    pub(crate) fn find_timer(&self, handle: TimerHandle) -> Option<&TimerRecord> {
        self.slots
            .lookup(handle)
            .filter(|record| record.status != TimerStatus::ActivePendingRemoval)
    }
}

impl Default for TimerScheduler {
    fn default() -> Self {
        Self::new()
    }
}
