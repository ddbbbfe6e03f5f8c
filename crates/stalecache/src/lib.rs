//! A single-value cache that lazily loads its content and reloads it once it goes stale.
//!
//! The cache holds exactly one value, produced by a loader function supplied at
//! construction. Every read checks whether the current value is still fresh, according to
//! an optional TTL and an optional validator. Stale values are reloaded transparently, and
//! concurrent readers never cause more than one loader call at a time: every reader of a
//! generation shares the outcome of that generation's single load.
//!
//! If a reload fails, readers get the loader error together with the previously loaded
//! value (see [`LoadError::stale`]), so a flaky source degrades a cache instead of breaking it.
//!
//! The cache comes in two flavours with identical semantics:
//!
//! - [`future::StaleCache`] for async code, with async loaders and validators.
//! - [`sync::StaleCache`] for blocking code running on plain threads.
//!
//! ```
//! use std::time::Duration;
//!
//! use stalecache::sync::StaleCache;
//!
//! let cache = StaleCache::builder(|| Ok::<_, std::io::Error>(42))
//!     .ttl(Duration::from_secs(60))
//!     .build();
//!
//! assert_eq!(*cache.load().unwrap(), 42);
//! ```

#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod freshness;
mod generation;
mod pool;

pub mod future;
pub mod sync;

pub use config::CacheConfig;
pub use error::LoadError;


#[cfg(test)]
pub(crate) use tokio::time;

#[cfg(not(test))]
pub(crate) use std::time;
