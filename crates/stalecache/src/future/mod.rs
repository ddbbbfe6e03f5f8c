//! The async flavour of the cache.
//!
//! Loaders and validators return futures, and callers waiting for a load in progress are
//! suspended rather than blocked. Loads are driven by the callers waiting for them, so the cache
//! does not depend on any particular runtime.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Ready};

use crate::cache::{CacheCore, Settings};
use crate::config::CacheConfig;
use crate::error::LoadError;
use crate::generation::Generation;
use crate::time::Instant;

mod slot;

use slot::Slot;

type BoxedLoader<T, E> = Box<dyn Fn() -> BoxFuture<'static, Generation<T, E>> + Send + Sync>;

/// The validator type of a cache that was built without a validator.
pub type NoValidator<T> = fn(Arc<T>, Instant) -> Ready<bool>;

/// A single cached value that is reloaded once it goes stale.
///
/// Values are loaded lazily by the loader given at construction, on the first call to
/// [`load`](Self::load), and again whenever the current value turns stale. A value is stale once
/// its TTL has passed, or when the validator rejects it.
///
/// No matter how many tasks call [`load`](Self::load) concurrently, at most one loader call is in
/// flight at any time, and all tasks waiting for it share its result.
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use std::time::Duration;
///
/// use stalecache::future::StaleCache;
///
/// let cache = StaleCache::builder(|| async { Ok::<_, std::io::Error>(String::from("hello")) })
///     .ttl(Duration::from_secs(60))
///     .build();
///
/// assert_eq!(*cache.load().await.unwrap(), "hello");
/// # }
/// ```
pub struct StaleCache<T, E, V = NoValidator<T>> {
    loader: BoxedLoader<T, E>,
    validator: Option<V>,
    core: CacheCore<Slot<T, E>>,
}

impl<T, E, V> fmt::Debug for StaleCache<T, E, V> {
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
    pub fn new<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::builder(loader).build()
    }

    /// Starts building a cache that loads its value using `loader`.
    pub fn builder<F, Fut>(loader: F) -> StaleCacheBuilder<T, E>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        StaleCacheBuilder {
            loader: Box::new(move || {
                let load = loader();
                async move { Generation::from_result(load.await) }.boxed()
            }),
            validator: None,
            settings: Settings::default(),
        }
    }
}

impl<T, E, V, Fut> StaleCache<T, E, V>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
    V: Fn(Arc<T>, Instant) -> Fut,
    Fut: Future<Output = bool>,
{
    /// Returns the cached value, loading it first if it is missing or stale.
    ///
    /// Returning a fresh value takes no lock and allocates nothing, unless the validator does.
    ///
    /// If the current generation failed to load, the loader is called again right away, so a
    /// single call may invoke the loader twice: once for a generation that another caller
    /// started, and once more to retry it.
    ///
    /// Dropping the returned future does not cancel a load it started. The load keeps running
    /// for the other callers waiting on it, or for the next caller if there is none.
    ///
    /// When loading fails, the returned [`LoadError`] carries the last successfully loaded value,
    /// if any.
    pub async fn load(&self) -> Result<Arc<T>, LoadError<T, E>>
    where
        E: fmt::Display,
    {
        let curr = self.core.active();
        let generation = curr
            .load(|| (self.loader)(), |loaded| self.core.record(&curr, loaded))
            .await;

        if let Some(data) = generation.value() {
            if self.is_fresh(data, generation.loaded_at).await {
                return Ok(Arc::clone(data));
            }
        }

        let stale = self.core.stale_fallback(generation);
        self.core.replace(&curr);

        let next = self.core.active();
        let generation = next
            .load(|| (self.loader)(), |loaded| self.core.record(&next, loaded))
            .await;
        match &generation.contents {
            Ok(data) => Ok(Arc::clone(data)),
            Err(error) => Err(LoadError::new(Arc::clone(error), stale)),
        }
    }

    /// Makes `value` the current cached value, as if the loader had just returned it.
    ///
    /// This restarts the TTL. The new value replaces the current generation unconditionally: if a
    /// reload is in flight concurrently, callers already waiting for it still get its result, but
    /// that result will neither become the cached value nor the stale fallback.
    pub fn update(&self, value: T) {
        self.core.update(value);
    }

    async fn is_fresh(&self, data: &Arc<T>, loaded_at: Instant) -> bool {
        if !self.core.within_ttl(loaded_at) {
            return false;
        }
        match &self.validator {
            Some(validator) => validator(Arc::clone(data), loaded_at).await,
            None => true,
        }
    }
}

/// Builds a [`StaleCache`].
///
/// Created by [`StaleCache::builder`].
pub struct StaleCacheBuilder<T, E, V = NoValidator<T>> {
    loader: BoxedLoader<T, E>,
    validator: Option<V>,
    settings: Settings,
}

impl<T, E, V> StaleCacheBuilder<T, E, V>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Sets how long a loaded value stays fresh.
    ///
    /// A zero TTL, which is also the default, means the value never expires by time.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.settings.set_ttl(ttl);
        self
    }

    /// Sets a validator that decides whether a value within its TTL is still fresh.
    ///
    /// The validator gets the value and the time it was loaded at, and is only consulted once
    /// the TTL check passed. This is useful when a cheaper source can tell whether the data
    /// changed, for example a version number kept in redis.
    pub fn validator<W, Fut>(self, validator: W) -> StaleCacheBuilder<T, E, W>
    where
        W: Fn(Arc<T>, Instant) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        StaleCacheBuilder {
            loader: self.loader,
            validator: Some(validator),
            settings: self.settings,
        }
    }

    /// Sets a name that identifies the cache in log output.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.settings.name = Some(name.into());
        self
    }

    /// Applies the settings given in `config`.
    ///
    /// Settings missing from `config` keep their current value.
    pub fn config(mut self, config: &CacheConfig) -> Self {
        self.settings.apply(config);
        self
    }

    /// Creates the cache. Nothing is loaded until the first [`StaleCache::load`].
    pub fn build(self) -> StaleCache<T, E, V> {
        StaleCache {
            loader: self.loader,
            validator: self.validator,
            core: CacheCore::new(self.settings),
        }
    }
}
