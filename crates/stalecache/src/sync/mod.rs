//! The blocking flavour of the cache.
//!
//! Loaders and validators are plain functions. Threads that need a value while it is being
//! loaded block until the load finishes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheCore, Settings};
use crate::config::CacheConfig;
use crate::error::LoadError;
use crate::generation::Generation;
use crate::time::Instant;

mod slot;

use slot::Slot;

type BoxedLoader<T, E> = Box<dyn Fn() -> Result<T, E> + Send + Sync>;
type BoxedValidator<T> = Box<dyn Fn(&T, Instant) -> bool + Send + Sync>;

/// A single cached value that is reloaded once it goes stale, for use from plain threads.
///
/// This behaves exactly like [`future::StaleCache`](crate::future::StaleCache), except that the
/// loader and validator are blocking functions, and [`load`](Self::load) blocks while another
/// thread is loading the value.
pub struct StaleCache<T, E> {
    loader: BoxedLoader<T, E>,
    validator: Option<BoxedValidator<T>>,
    core: CacheCore<Slot<T, E>>,
}

impl<T, E> fmt::Debug for StaleCache<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.core.fmt_debug(f, self.validator.is_some())
    }
}

impl<T, E> StaleCache<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Creates a cache that loads its value using `loader` and never expires.
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        Self::builder(loader).build()
    }

    /// Starts building a cache that loads its value using `loader`.
    pub fn builder<F>(loader: F) -> StaleCacheBuilder<T, E>
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        StaleCacheBuilder {
            loader: Box::new(loader),
            validator: None,
            settings: Settings::default(),
        }
    }

    /// Returns the cached value, loading it first if it is missing or stale.
    ///
    /// Blocks while another thread loads the value. See
    /// [`future::StaleCache::load`](crate::future::StaleCache::load) for the details.
    pub fn load(&self) -> Result<Arc<T>, LoadError<T, E>>
    where
        E: fmt::Display,
    {
        let curr = self.core.active();
        let generation = curr.load(|| self.fetch(), |loaded| self.core.record(&curr, loaded));

        if let Some(data) = generation.value() {
            if self.is_fresh(data, generation.loaded_at) {
                return Ok(Arc::clone(data));
            }
        }

        let stale = self.core.stale_fallback(generation);
        self.core.replace(&curr);

        let next = self.core.active();
        let generation = next.load(|| self.fetch(), |loaded| self.core.record(&next, loaded));
        match &generation.contents {
            Ok(data) => Ok(Arc::clone(data)),
            Err(error) => Err(LoadError::new(Arc::clone(error), stale)),
        }
    }

    /// Makes `value` the current cached value, as if the loader had just returned it.
    ///
    /// This restarts the TTL. A load running concurrently on another thread is not awaited,
    /// and its result is discarded.
    pub fn update(&self, value: T) {
        self.core.update(value);
    }

    fn fetch(&self) -> Generation<T, E> {
        Generation::from_result((self.loader)())
    }

    fn is_fresh(&self, data: &T, loaded_at: Instant) -> bool {
        self.core.within_ttl(loaded_at)
            && self
                .validator
                .as_ref()
                .is_none_or(|validator| validator(data, loaded_at))
    }
}

/// Builds a [`StaleCache`].
pub struct StaleCacheBuilder<T, E> {
    loader: BoxedLoader<T, E>,
    validator: Option<BoxedValidator<T>>,
    settings: Settings,
}

impl<T, E> StaleCacheBuilder<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Sets how long a loaded value stays fresh. Zero, the default, means forever.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.settings.set_ttl(ttl);
        self
    }

    /// Sets a validator that is consulted for values that are still within their TTL.
    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&T, Instant) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Sets a name that identifies the cache in log output.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.settings.name = Some(name.into());
        self
    }

    /// Applies the settings given in `config`.
    pub fn config(mut self, config: &CacheConfig) -> Self {
        self.settings.apply(config);
        self
    }

    /// Creates the cache. Nothing is loaded until the first [`StaleCache::load`].
    pub fn build(self) -> StaleCache<T, E> {
        StaleCache {
            loader: self.loader,
            validator: self.validator,
            core: CacheCore::new(self.settings),
        }
    }
}
