#![forbid(unsafe_code)]

//! Render state and the patches that mutate it.
//!
//! [`RenderState`] is owned by one component instance. Render paths get a
//! shared reference; the only write path is [`RenderState::apply_patch`],
//! which is crate-private and called exclusively by consolidated groups.
//! Every patch bumps the version by exactly one, no matter how many keys it
//! touches, so a host can compare versions to decide whether to re-render.

use ahash::AHashMap;

/// One atomic state update: `(key, value)` pairs in group order.
///
/// `None` means the key is unresolved and is removed from the state.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch<V> {
    entries: Vec<(String, Option<V>)>,
}

impl<V> Patch<V> {
    /// Build a patch from ordered entries.
    #[must_use]
    pub fn new(entries: Vec<(String, Option<V>)>) -> Self {
        Self { entries }
    }

    /// Entries in group order.
    #[must_use]
    pub fn entries(&self) -> &[(String, Option<V>)] {
        &self.entries
    }

    /// Number of keys covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the patch covers no key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of keys carrying a value.
    #[must_use]
    pub fn resolved(&self) -> usize {
        self.entries.iter().filter(|(_, v)| v.is_some()).count()
    }
}

/// Key/value state consumed by rendering.
#[derive(Debug, Clone)]
pub struct RenderState<V> {
    values: AHashMap<String, V>,
    version: u64,
}

impl<V> Default for RenderState<V> {
    fn default() -> Self {
        Self {
            values: AHashMap::new(),
            version: 0,
        }
    }
}

impl<V> RenderState<V> {
    /// Empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, if it has been resolved.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.values.get(key)
    }

    /// Whether `key` holds a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of resolved keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no key is resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of patches applied so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Iterate resolved keys and values (unordered).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Apply every entry of `patch` as one mutation.
    pub(crate) fn apply_patch(&mut self, patch: Patch<V>) {
        for (key, value) in patch.entries {
            match value {
                Some(v) => {
                    self.values.insert(key, v);
                }
                None => {
                    self.values.remove(&key);
                }
            }
        }
        self.version += 1;
    }
}
