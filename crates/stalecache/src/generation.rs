use std::fmt;
use std::sync::Arc;

use crate::time::Instant;

/// The outcome of loading one generation of the cached value.
///
/// A generation is written exactly once, by whoever fills its slot, and is immutable afterwards.
pub(crate) struct Generation<T, E> {
    pub contents: Result<Arc<T>, Arc<E>>,
    pub loaded_at: Instant,
}

impl<T, E> Generation<T, E> {
    /// Wraps the result of a loader call that just returned.
    pub fn from_result(result: Result<T, E>) -> Self {
        Self {
            contents: result.map(Arc::new).map_err(Arc::new),
            loaded_at: Instant::now(),
        }
    }

    /// A successful generation for a value that was handed to us directly.
    pub fn from_value(value: Arc<T>) -> Self {
        Self {
            contents: Ok(value),
            loaded_at: Instant::now(),
        }
    }

    /// The loaded value, if the load succeeded.
    pub fn value(&self) -> Option<&Arc<T>> {
        self.contents.as_ref().ok()
    }
}

impl<T, E> Clone for Generation<T, E> {
    fn clone(&self) -> Self {
        Self {
            contents: self.contents.clone(),
            loaded_at: self.loaded_at,
        }
    }
}

/// The observable state of a slot, used for `Debug` output.
pub(crate) enum SlotState<'a, T, E> {
    Empty,
    Loading,
    Loaded(&'a Generation<T, E>),
}

impl<T, E> fmt::Debug for SlotState<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Loading => f.write_str("Loading"),
            Self::Loaded(generation) => {
                let status = match generation.contents {
                    Ok(_) => "Loaded",
                    Err(_) => "Failed",
                };
                f.debug_struct(status)
                    .field("age", &generation.loaded_at.elapsed())
                    .finish()
            }
        }
    }
}
