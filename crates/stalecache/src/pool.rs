use std::fmt;
use std::sync::{Arc, Mutex};

/// How many spare slots a cache keeps around at most.
const MAX_SPARE_SLOTS: usize = 4;

/// A small pool of empty slots.
///
/// Every refresh attempt needs a fresh slot, but only one of the racing attempts gets to install
/// it. The losers put their never-used slot back here, so a refresh storm does not turn into an
/// allocation storm. The pool only ever holds empty slots, and it is never consulted for data.
pub(crate) struct SlotPool<S> {
    spare: Mutex<Vec<Arc<S>>>,
}

impl<S: Default> SlotPool<S> {
    pub fn new() -> Self {
        Self {
            spare: Mutex::new(Vec::with_capacity(MAX_SPARE_SLOTS)),
        }
    }

    /// Takes a spare slot, or allocates a new one.
    pub fn get(&self) -> Arc<S> {
        let spare = self.spare.lock().ok().and_then(|mut spare| spare.pop());
        spare.unwrap_or_default()
    }

    /// Returns a slot that lost its race.
    ///
    /// The slot is dropped instead if anyone else still holds a reference to it, or if the pool
    /// is full.
    pub fn put(&self, slot: Arc<S>) {
        if Arc::strong_count(&slot) != 1 {
            return;
        }
        if let Ok(mut spare) = self.spare.lock() {
            if spare.len() < MAX_SPARE_SLOTS {
                spare.push(slot);
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.spare.lock().map(|spare| spare.len()).unwrap_or_default()
    }
}

impl<S> fmt::Debug for SlotPool<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spare = self
            .spare
            .try_lock()
            .map(|spare| spare.len())
            .unwrap_or_default();
        f.debug_struct("SlotPool").field("spare", &spare).finish()
    }
}
