//! Monotonic ID allocation, recovered from the highest `ID_KEY` entry at
//! startup.

use std::sync::atomic::{AtomicU64, Ordering};

use dict_values::ValueId;
use redb::ReadableTable;

use crate::error::DictError;
use crate::index::{id_key, TAG_ID};

/// A single counter handing out IDs `1, 2, 3, ...`. Never persisted
/// independently -- recovered by scanning for the highest existing
/// `ID_KEY` entry each time the store is opened.
pub(crate) struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub(crate) fn from_next(next: ValueId) -> Self {
        Self {
            next: AtomicU64::new(next),
        }
    }

    /// Return the current value and increment. Callers are expected to
    /// only call this inside a write transaction and to leave the
    /// allocator's value unreverted on commit -- on abort the caller must
    /// restore the pre-transaction snapshot itself.
    pub(crate) fn allocate(&self) -> ValueId {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// Snapshot the current value, for restoring on transaction abort.
    pub(crate) fn snapshot(&self) -> ValueId {
        self.next.load(Ordering::SeqCst)
    }

    /// Restore a previously taken snapshot (transaction abort).
    pub(crate) fn restore(&self, snapshot: ValueId) {
        self.next.store(snapshot, Ordering::SeqCst);
    }

    pub(crate) fn peek_next(&self) -> ValueId {
        self.next.load(Ordering::SeqCst)
    }
}

/// Recover `nextId` from an open read transaction's table: find the
/// highest `ID_KEY` entry and return `id + 1`, or `1` if the table holds
/// no `ID_KEY` entries at all.
pub(crate) fn recover_next_id(
    table: &impl ReadableTable<&'static [u8], &'static [u8]>,
) -> Result<ValueId, DictError> {
    let lower = id_key(0);
    let upper = id_key(u64::MAX);
    let mut range = table.range(lower.as_slice()..=upper.as_slice())?;
    match range.next_back() {
        Some(entry) => {
            let (key, _) = entry?;
            let key_bytes = key.value();
            debug_assert_eq!(key_bytes[0], TAG_ID);
            let id = u64::from_be_bytes(key_bytes[1..9].try_into().unwrap());
            Ok(id + 1)
        }
        None => Ok(1),
    }
}
