use std::sync::{Arc, OnceLock};

use crate::cache::GenerationSlot;
use crate::generation::{Generation, SlotState};

/// One generation of the cached value, filled by at most one load.
///
/// Threads calling [`load`](Self::load) while the load is running block until it is done.
pub(crate) struct Slot<T, E> {
    generation: OnceLock<Generation<T, E>>,
}

impl<T, E> Default for Slot<T, E> {
    fn default() -> Self {
        Self {
            generation: OnceLock::new(),
        }
    }
}

impl<T, E> Slot<T, E> {
    /// Fills this slot by calling `load`, unless it has been filled already.
    ///
    /// `filled` runs exactly once, right before the generation becomes visible to anyone.
    pub fn load<F, R>(&self, load: F, filled: R) -> &Generation<T, E>
    where
        F: FnOnce() -> Generation<T, E>,
        R: FnOnce(&Generation<T, E>),
    {
        self.generation.get_or_init(|| {
            let generation = load();
            filled(&generation);
            generation
        })
    }
}

impl<T, E> GenerationSlot for Slot<T, E> {
    type Value = T;
    type Error = E;

    fn filled(value: Arc<T>) -> Self {
        Self {
            generation: OnceLock::from(Generation::from_value(value)),
        }
    }

    fn state(&self) -> SlotState<'_, T, E> {
        match self.generation.get() {
            Some(generation) => SlotState::Loaded(generation),
            None => SlotState::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_threads_share_one_load() {
        let calls = AtomicUsize::new(0);
        let slot = Slot::<usize, ()>::default();
        let barrier = Barrier::new(4);

        let values: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        let generation = slot.load(
                            || {
                                thread::sleep(Duration::from_millis(10));
                                Generation::from_result(Ok(calls.fetch_add(1, Ordering::SeqCst)))
                            },
                            |_| {},
                        );
                        generation.value().map(|v| **v)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(values, vec![Some(0); 4]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_load_is_final() {
        let slot = Slot::<u32, &str>::default();
        assert!(matches!(slot.state(), SlotState::Empty));

        let filled = AtomicUsize::new(0);
        let count = |_: &Generation<u32, &str>| {
            filled.fetch_add(1, Ordering::SeqCst);
        };

        slot.load(|| Generation::from_result(Err("boom")), count);
        let generation = slot.load(|| Generation::from_result(Ok(1)), count);
        assert!(generation.value().is_none());
        assert!(matches!(slot.state(), SlotState::Loaded(_)));
        assert_eq!(filled.load(Ordering::SeqCst), 1);
    }
}
