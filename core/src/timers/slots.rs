//! Slot table: stable-index storage for timer records
//!
//! Records live in an arena of slots with a free list. Each allocation
//! stamps the slot with a fresh serial number, so a stale handle (one whose
//! slot has since been freed or reused) fails lookup instead of resolving
//! to the wrong timer.

use super::handle::TimerHandle;
use super::record::TimerRecord;

struct Slot {
    /// Serial of the most recent allocation at this index
    serial: u64,
    /// None while the slot sits on the free list
    record: Option<TimerRecord>,
}

/// Arena of timer records addressed by generation-tagged handles
#[derive(Default)]
pub(crate) struct SlotTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    last_serial: u64,
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record and return a handle stamped with a fresh serial.
    pub fn allocate(&mut self, record: TimerRecord) -> TimerHandle {
        let serial = self.next_serial();

        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.serial = serial;
                slot.record = Some(record);
                index
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    serial,
                    record: Some(record),
                });
                index
            }
        };

        TimerHandle::new(index, serial)
    }

    /// Resolve a handle, returning None for out-of-range, freed, or stale
    /// (serial mismatch) handles.
    pub fn lookup(&self, handle: TimerHandle) -> Option<&TimerRecord> {
        let slot = self.slots.get(handle.index() as usize)?;
        if slot.serial != handle.serial() {
            return None;
        }
        slot.record.as_ref()
    }

    pub fn lookup_mut(&mut self, handle: TimerHandle) -> Option<&mut TimerRecord> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.serial != handle.serial() {
            return None;
        }
        slot.record.as_mut()
    }

    /// Return the slot to the free list. The stored serial is left in place
    /// so the freed handle keeps failing lookup until the slot is reused
    /// under a different serial.
    pub fn free(&mut self, handle: TimerHandle) -> Option<TimerRecord> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.serial != handle.serial() {
            return None;
        }
        let record = slot.record.take()?;
        self.free.push(handle.index());
        Some(record)
    }

    /// Iterate live records with their handles
    pub fn iter(&self) -> impl Iterator<Item = (TimerHandle, &TimerRecord)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.record
                .as_ref()
                .map(|record| (TimerHandle::new(index as u32, slot.serial), record))
        })
    }

    /// Next serial from the monotonically increasing counter.
    ///
    /// Wraparound skips the reserved sentinel; actually exhausting 64 bits
    /// of serials is not reachable in practice, so treat it as a bug.
    fn next_serial(&mut self) -> u64 {
        self.last_serial = self.last_serial.wrapping_add(1);
        if self.last_serial == TimerHandle::INVALID_SERIAL {
            debug_assert!(false, "timer serial counter wrapped");
            self.last_serial = 1;
        }
        self.last_serial
    }
}

#[cfg(test)]
mod tests {
    use super::super::record::TimerStatus;
    use super::*;

    fn make_record() -> TimerRecord {
        TimerRecord {
            rate: 1.0,
            looping: false,
            expire_time: 1.0,
            status: TimerStatus::Pending,
            callback: None,
            requires_callback: false,
            owner_key: None,
            context_tag: None,
        }
    }

    #[test]
    fn allocate_and_lookup() {
        let mut table = SlotTable::new();
        let handle = table.allocate(make_record());

        assert!(handle.is_valid());
        assert!(table.lookup(handle).is_some());
    }

    #[test]
    fn freed_handle_fails_lookup() {
        let mut table = SlotTable::new();
        let handle = table.allocate(make_record());

        assert!(table.free(handle).is_some());
        assert!(table.lookup(handle).is_none());
        // double free is a no-op
        assert!(table.free(handle).is_none());
    }

    #[test]
    fn reused_slot_does_not_resolve_stale_handle() {
        let mut table = SlotTable::new();
        let first = table.allocate(make_record());
        table.free(first);

        // Reuses the same slot index under a new serial
        let second = table.allocate(make_record());
        assert_eq!(first.index(), second.index());
        assert_ne!(first.serial(), second.serial());

        assert!(table.lookup(first).is_none());
        assert!(table.lookup(second).is_some());
    }

    #[test]
    fn serials_are_unique_across_allocations() {
        let mut table = SlotTable::new();
        let a = table.allocate(make_record());
        let b = table.allocate(make_record());
        let c = table.allocate(make_record());

        assert_ne!(a.serial(), b.serial());
        assert_ne!(b.serial(), c.serial());
    }

    #[test]
    fn iter_skips_freed_slots() {
        let mut table = SlotTable::new();
        let a = table.allocate(make_record());
        let b = table.allocate(make_record());
        table.free(a);

        let live: Vec<_> = table.iter().map(|(h, _)| h).collect();
        assert_eq!(live, vec![b]);
    }
}
