use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::cache::GenerationSlot;
use crate::generation::{Generation, SlotState};

type PendingLoad<T, E> = Shared<BoxFuture<'static, Generation<T, E>>>;

/// One generation of the cached value, filled by at most one load.
///
/// Every caller of [`load`](Self::load) waits for the same single loader call and then observes
/// the same [`Generation`].
pub(crate) struct Slot<T, E> {
    generation: OnceLock<Generation<T, E>>,
    /// The load in flight, polled by whoever is waiting for it.
    pending: Mutex<Option<PendingLoad<T, E>>>,
}

impl<T, E> Default for Slot<T, E> {
    fn default() -> Self {
        Self {
            generation: OnceLock::new(),
            pending: Mutex::new(None),
        }
    }
}

impl<T, E> Slot<T, E> {
    /// Fills this slot by awaiting the future returned by `load`, unless it has been filled
    /// already.
    ///
    /// `load` is called at most once per slot. Its future lives in the slot rather than in the
    /// caller that started it, so dropping that caller does not cancel the load: the remaining
    /// waiters, or the next caller, keep driving the same future.
    ///
    /// `filled` runs exactly once, right before the generation becomes visible to anyone.
    pub async fn load<F, R>(&self, load: F, filled: R) -> &Generation<T, E>
    where
        F: FnOnce() -> BoxFuture<'static, Generation<T, E>>,
        R: FnOnce(&Generation<T, E>),
    {
        if let Some(generation) = self.generation.get() {
            return generation;
        }

        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(|| load().shared())
            .clone();
        let generation = pending.await;

        self.generation.get_or_init(|| {
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
            pending: Mutex::new(None),
        }
    }

    fn state(&self) -> SlotState<'_, T, E> {
        if let Some(generation) = self.generation.get() {
            return SlotState::Loaded(generation);
        }
        let loading = match self.pending.try_lock() {
            Ok(pending) => pending.is_some(),
            Err(_) => true,
        };
        if loading {
            SlotState::Loading
        } else {
            SlotState::Empty
        }
    }
}
