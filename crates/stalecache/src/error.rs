use std::fmt;
use std::sync::Arc;

/// The error returned when the cache could not produce a fresh value.
///
/// This wraps the error returned by the loader, verbatim. The loader error is shared between
/// all callers that waited on the same load, hence the [`Arc`].
///
/// If an earlier load succeeded, the last successfully loaded value is carried along as
/// [`stale`](Self::stale). Callers that can live with outdated data may use it; an error does
/// not imply the absence of a value.
///
/// Displays as the loader error. That error is not reported again as the
/// [`source`](std::error::Error::source), use [`error`](Self::error) to inspect it.
#[derive(thiserror::Error)]
#[error("{error}")]
pub struct LoadError<T, E> {
    error: Arc<E>,
    stale: Option<Arc<T>>,
}

impl<T, E> LoadError<T, E> {
    pub(crate) fn new(error: Arc<E>, stale: Option<Arc<T>>) -> Self {
        Self { error, stale }
    }

    /// The error returned by the loader.
    pub fn error(&self) -> &Arc<E> {
        &self.error
    }

    /// The last successfully loaded value, if there ever was one.
    pub fn stale(&self) -> Option<&Arc<T>> {
        self.stale.as_ref()
    }

    /// Discards the error, returning the last successfully loaded value.
    pub fn into_stale(self) -> Option<Arc<T>> {
        self.stale
    }

    /// Splits this into the loader error and the stale value.
    pub fn into_parts(self) -> (Arc<E>, Option<Arc<T>>) {
        (self.error, self.stale)
    }
}

impl<T, E> Clone for LoadError<T, E> {
    fn clone(&self) -> Self {
        Self {
            error: Arc::clone(&self.error),
            stale: self.stale.clone(),
        }
    }
}

impl<T, E: fmt::Debug> fmt::Debug for LoadError<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadError")
            .field("error", &self.error)
            .field("has_stale", &self.stale.is_some())
            .finish()
    }
}
