#![forbid(unsafe_code)]

//! External inputs supplied by the host on each render pass.

use std::fmt;

use ahash::AHashMap;

use crate::source::{Input, ReactiveSource, SourceRef};

/// Name → input mapping, replaced wholesale between passes.
pub struct Inputs<V> {
    entries: AHashMap<String, Input<V>>,
}

impl<V> Default for Inputs<V> {
    fn default() -> Self {
        Self {
            entries: AHashMap::new(),
        }
    }
}

impl<V: Clone> Clone for Inputs<V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Inputs<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.entries.keys().collect();
        keys.sort();
        let mut map = f.debug_map();
        for key in keys {
            map.entry(key, &self.entries[key]);
        }
        map.finish()
    }
}

impl<V> Inputs<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a static value.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: V) -> Self {
        self.entries.insert(key.into(), Input::Value(value));
        self
    }

    /// Add a reactive source.
    #[must_use]
    pub fn with_source(mut self, key: impl Into<String>, source: SourceRef<V>) -> Self {
        self.entries.insert(key.into(), Input::Source(source));
        self
    }

    /// Add a concrete reactive source.
    #[must_use]
    pub fn with<S>(self, key: impl Into<String>, source: S) -> Self
    where
        S: ReactiveSource<V> + 'static,
    {
        self.with_source(key, SourceRef::new(source))
    }

    /// Insert or replace an input.
    pub fn insert(&mut self, key: impl Into<String>, input: Input<V>) {
        self.entries.insert(key.into(), input);
    }

    /// Raw input for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Input<V>> {
        self.entries.get(key)
    }

    /// Static value for `key`; `None` for sources and absent keys.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&V> {
        self.entries.get(key).and_then(Input::as_value)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Input<V>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<V, K: Into<String>> FromIterator<(K, Input<V>)> for Inputs<V> {
    fn from_iter<I: IntoIterator<Item = (K, Input<V>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
