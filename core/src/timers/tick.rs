//! The tick algorithm
//!
//! Extracted from `TimerScheduler` so the firing loop, with its reentrancy
//! and catch-up handling, lives in one place.
//!
//! Reentrancy model: callbacks receive `&mut TimerScheduler` and may
//! mutate the timer set freely. The loop never holds a reference into the
//! slot table across an invocation; the firing timer's callback is checked
//! out of its record, invoked, and handed back only if the record still
//! resolves by handle afterwards. A callback that cleared, paused, or
//! replaced its own timer simply stops the remaining invocations.

use super::context::ContextGuard;
use super::manager::TimerScheduler;
use super::record::TimerStatus;

pub(crate) fn run_tick(scheduler: &mut TimerScheduler, delta_seconds: f64, frame: u64) {
    // Idempotent within one update cycle
    if scheduler.last_ticked_frame == Some(frame) {
        tracing::trace!(frame, "tick already ran this frame");
        return;
    }
    debug_assert!(delta_seconds >= 0.0, "tick delta must be non-negative");

    scheduler.ticked_this_cycle = false;
    scheduler.now += delta_seconds;

    loop {
        let Some((handle, expire_time)) = scheduler.active_heap.peek() else {
            break;
        };

        // Entries cleared while on the heap are discarded here instead of
        // being removed from the middle of the heap at clear time
        match scheduler.slots.lookup(handle).map(|record| record.status) {
            Some(TimerStatus::ActivePendingRemoval) | None => {
                scheduler.active_heap.pop();
                scheduler.free_slot(handle);
                continue;
            }
            _ => {}
        }

        if expire_time > scheduler.now {
            break;
        }
        scheduler.active_heap.pop();

        let Some(record) = scheduler.slots.lookup_mut(handle) else {
            continue;
        };
        record.status = TimerStatus::Executing;

        // Catch-up: a looping timer whose host stalled for several periods
        // fires once per missed period instead of drifting
        let call_count = if record.looping {
            ((scheduler.now - record.expire_time) / record.rate) as u32 + 1
        } else {
            1
        };
        let context_tag = record.context_tag;
        let mut callback = record.callback.take();

        scheduler.currently_executing = Some(handle);

        let _context = match (scheduler.context.clone(), context_tag) {
            (Some(switch), Some(tag)) => Some(ContextGuard::enter(switch, tag)),
            _ => None,
        };

        let mut calls_made = 0u32;
        if let Some(callback) = callback.as_mut() {
            for _ in 0..call_count {
                // Re-resolve before every invocation: a previous one may
                // have cleared, paused, or replaced this very timer
                if scheduler.currently_executing != Some(handle) {
                    break;
                }
                let still_executing = scheduler
                    .slots
                    .lookup(handle)
                    .is_some_and(|record| record.status == TimerStatus::Executing);
                if !still_executing {
                    break;
                }
                callback.invoke(scheduler, handle);
                calls_made += 1;
            }
        }
        scheduler.currently_executing = None;
        tracing::trace!(handle = %handle, calls = calls_made, "timer fired");

        match scheduler.slots.lookup_mut(handle) {
            Some(record) if record.status == TimerStatus::Executing => {
                let still_bound = callback
                    .as_ref()
                    .is_some_and(|callback| callback.is_bound());
                if record.looping && (!record.requires_callback || still_bound) {
                    // Rearm relative to the old expiry, not to now, so the
                    // firing cadence never drifts
                    record.expire_time += f64::from(call_count) * record.rate;
                    record.status = TimerStatus::Active;
                    record.callback = callback;
                    let expire_time = record.expire_time;
                    scheduler.active_heap.push(handle, expire_time);
                } else {
                    if record.looping {
                        tracing::debug!(handle = %handle, "dropping looping timer with unbound callback");
                    }
                    scheduler.free_slot(handle);
                }
            }
            Some(record) => {
                // Paused (or pushed back to pending) by its own callback;
                // hand the checked-out callback back
                record.callback = callback;
            }
            None => {
                // Cleared itself; the checked-out callback drops here
            }
        }
    }

    // Timers registered since the last tick join the clock now, which
    // guarantees nothing fires in the same cycle that created it
    if !scheduler.pending.is_empty() {
        let pending: Vec<_> = scheduler.pending.drain().collect();
        for handle in pending {
            if let Some(record) = scheduler.slots.lookup_mut(handle) {
                record.expire_time += scheduler.now;
                record.status = TimerStatus::Active;
                let expire_time = record.expire_time;
                scheduler.active_heap.push(handle, expire_time);
            }
        }
    }

    scheduler.last_ticked_frame = Some(frame);
    scheduler.ticked_this_cycle = true;
}
