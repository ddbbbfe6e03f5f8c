use std::time::Duration;

use crate::time::Instant;

/// Normalizes a configured TTL: a zero TTL means the value never expires by time.
pub(crate) fn normalize_ttl(ttl: Duration) -> Option<Duration> {
    (!ttl.is_zero()).then_some(ttl)
}

/// Whether a value loaded at `loaded_at` is still within its `ttl`.
///
/// The deadline itself is already stale. A deadline that does not fit into an [`Instant`] is
/// never reached.
pub(crate) fn within_ttl(ttl: Option<Duration>, loaded_at: Instant) -> bool {
    let Some(ttl) = ttl else {
        return true;
    };
    match loaded_at.checked_add(ttl) {
        Some(deadline) => Instant::now() < deadline,
        None => true,
    }
}
