#![forbid(unsafe_code)]

//! Readiness: every tracked key has received at least one value.
//!
//! Both functions read only [`RenderState`]; sources are never queried.

use crate::state::RenderState;

/// Whether every key in `tracked` is set. An empty key set is ready.
#[must_use]
pub fn is_ready<V, K: AsRef<str>>(state: &RenderState<V>, tracked: &[K]) -> bool {
    tracked.iter().all(|key| state.contains(key.as_ref()))
}

/// Tracked keys that are still unset, in declaration order.
#[must_use]
pub fn pending_keys<'a, V, K: AsRef<str>>(state: &RenderState<V>, tracked: &'a [K]) -> Vec<&'a str> {
    tracked
        .iter()
        .map(|key| AsRef::<str>::as_ref(key))
        .filter(|key| !state.contains(key))
        .collect()
}
