//! The state and bookkeeping shared by both cache flavours.
//!
//! The flavours differ only in how a load is driven and how the validator is called. Everything
//! else, from swapping generations to picking the stale value handed out on failure, lives here.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::config::CacheConfig;
use crate::freshness::{normalize_ttl, within_ttl};
use crate::generation::{Generation, SlotState};
use crate::pool::SlotPool;
use crate::time::Instant;

/// A single-flight cell holding one generation of the cached value.
pub(crate) trait GenerationSlot: Default {
    type Value;
    type Error;

    /// A slot that is already filled with `value`.
    fn filled(value: Arc<Self::Value>) -> Self;

    fn state(&self) -> SlotState<'_, Self::Value, Self::Error>;
}

/// The settings both builders collect before the cache is created.
#[derive(Debug, Default)]
pub(crate) struct Settings {
    pub name: Option<String>,
    pub ttl: Option<Duration>,
}

impl Settings {
    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = normalize_ttl(ttl);
    }

    /// Applies the settings given in `config`, keeping the ones it leaves out.
    pub fn apply(&mut self, config: &CacheConfig) {
        if let Some(ttl) = config.ttl {
            self.set_ttl(ttl);
        }
        if let Some(name) = &config.name {
            self.name = Some(name.clone());
        }
    }
}

pub(crate) struct CacheCore<S: GenerationSlot> {
    name: Option<String>,
    ttl: Option<Duration>,

    /// The current generation. This is the only state that changes over the cache's life.
    active: ArcSwap<S>,
    /// The value of the latest successful generation, served when a refresh fails.
    ///
    /// Only ever written while holding the lock and checking `active`, so a load that was
    /// overtaken by [`update`](Self::update) cannot overwrite the updated value.
    last_good: Mutex<Option<Arc<S::Value>>>,
    pool: SlotPool<S>,
}

impl<S: GenerationSlot> CacheCore<S> {
    pub fn new(settings: Settings) -> Self {
        let pool = SlotPool::new();
        Self {
            name: settings.name,
            ttl: settings.ttl,
            active: ArcSwap::new(pool.get()),
            last_good: Mutex::new(None),
            pool,
        }
    }

    pub fn active(&self) -> Arc<S> {
        self.active.load_full()
    }

    pub fn within_ttl(&self, loaded_at: Instant) -> bool {
        within_ttl(self.ttl, loaded_at)
    }

    /// The value handed out along with the error when refreshing `generation` fails.
    pub fn stale_fallback(
        &self,
        generation: &Generation<S::Value, S::Error>,
    ) -> Option<Arc<S::Value>> {
        // A failed generation has no data of its own, so fall back to the last one that had.
        generation
            .value()
            .cloned()
            .or_else(|| self.last_good().clone())
    }

    /// Installs an empty slot in place of `curr`, unless someone else already replaced it.
    pub fn replace(&self, curr: &Arc<S>) {
        let slot = self.pool.get();
        let prev = self.active.compare_and_swap(curr, Arc::clone(&slot));
        if Arc::ptr_eq(&prev, curr) {
            tracing::debug!(cache = self.name.as_deref(), "Replaced stale generation");
        } else {
            drop(prev);
            self.pool.put(slot);
        }
    }

    /// Bookkeeping for a generation that finished loading into `slot`.
    ///
    /// Runs exactly once per loaded slot, before its generation becomes visible.
    pub fn record(&self, slot: &Arc<S>, generation: &Generation<S::Value, S::Error>)
    where
        S::Error: fmt::Display,
    {
        match &generation.contents {
            Ok(value) => {
                let mut last_good = self.last_good();
                if Arc::ptr_eq(&self.active.load(), slot) {
                    *last_good = Some(Arc::clone(value));
                    tracing::debug!(cache = self.name.as_deref(), "Loaded new value");
                } else {
                    tracing::debug!(
                        cache = self.name.as_deref(),
                        "Loaded value was overtaken by an update"
                    );
                }
            }
            Err(err) => {
                tracing::debug!(
                    cache = self.name.as_deref(),
                    error = %err,
                    "Failed to load value"
                );
            }
        }
    }

    /// Installs a generation holding `value`, replacing whatever is active.
    pub fn update(&self, value: S::Value) {
        let value = Arc::new(value);
        let mut last_good = self.last_good();
        *last_good = Some(Arc::clone(&value));
        self.active.store(Arc::new(S::filled(value)));
        drop(last_good);

        tracing::debug!(cache = self.name.as_deref(), "Updated cached value");
    }

    /// Writes the `Debug` representation of the cache owning this core.
    pub fn fmt_debug(&self, f: &mut fmt::Formatter<'_>, has_validator: bool) -> fmt::Result {
        let active = self.active.load();
        f.debug_struct("StaleCache")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("validator", &has_validator)
            .field("active", &active.state())
            .field("pool", &self.pool)
            .finish()
    }

    #[cfg(test)]
    pub fn spare_slots(&self) -> usize {
        self.pool.len()
    }

    fn last_good(&self) -> MutexGuard<'_, Option<Arc<S::Value>>> {
        self.last_good
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
