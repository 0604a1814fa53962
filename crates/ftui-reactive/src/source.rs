#![forbid(unsafe_code)]

//! The reactive source contract consumed by the consolidation engine.
//!
//! A reactive source is an opaque handle that may be subscribed to, delivers
//! zero or more values over time, and is "unready" until its first value
//! arrives. This crate never inspects a source beyond [`ReactiveSource`]:
//! anything implementing it can be bound to a component input.
//!
//! # Contract
//!
//! 1. `subscribe` returns a token that is unique for the lifetime of the
//!    source.
//! 2. If the source is already resolved, `subscribe` delivers the current
//!    value synchronously before returning. Otherwise nothing is delivered
//!    until the source resolves.
//! 3. `unsubscribe` with an unknown or already-removed token is a no-op.
//! 4. There is no ordering guarantee across distinct sources.
//!
//! Identity matters: two [`SourceRef`]s are the same source iff their sources
//! report the same [`ReactiveSource::identity`]. Rebinding an input to a
//! different source forces the owning group to be torn down and rebuilt.

use std::fmt;
use std::rc::Rc;

/// Callback invoked with every value a source emits.
pub type EmitFn<V> = Rc<dyn Fn(&V)>;

/// Disposal token handed out by [`ReactiveSource::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(pub u64);

impl SubscriptionToken {
    /// Create a token from a raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw token value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// A subscribable, asynchronously-resolving value.
pub trait ReactiveSource<V> {
    /// Register `on_emit` and return the token that removes it again.
    fn subscribe(&self, on_emit: EmitFn<V>) -> SubscriptionToken;

    /// Remove the subscription identified by `token`.
    fn unsubscribe(&self, token: SubscriptionToken);

    /// Short label used in diagnostics.
    fn label(&self) -> &str {
        "source"
    }

    /// Identity of the underlying source.
    ///
    /// Handles that share state (e.g. clones of one observable) must report
    /// the same identity. Defaults to the address of `self`.
    fn identity(&self) -> usize {
        (self as *const Self).cast::<()>() as usize
    }
}

/// Shared handle to a reactive source.
///
/// Cloning the handle does not clone the source; both handles compare as the
/// same source under [`SourceRef::same_source`].
pub struct SourceRef<V> {
    inner: Rc<dyn ReactiveSource<V>>,
}

impl<V> SourceRef<V> {
    /// Wrap a concrete source.
    pub fn new<S>(source: S) -> Self
    where
        S: ReactiveSource<V> + 'static,
    {
        Self {
            inner: Rc::new(source),
        }
    }

    /// Wrap an already shared source.
    #[must_use]
    pub fn from_rc(inner: Rc<dyn ReactiveSource<V>>) -> Self {
        Self { inner }
    }

    /// Whether both handles point to the same source.
    #[must_use]
    pub fn same_source(&self, other: &Self) -> bool {
        self.inner.identity() == other.inner.identity()
    }

    /// Subscribe through the handle.
    pub fn subscribe(&self, on_emit: EmitFn<V>) -> SubscriptionToken {
        self.inner.subscribe(on_emit)
    }

    /// Unsubscribe through the handle.
    pub fn unsubscribe(&self, token: SubscriptionToken) {
        self.inner.unsubscribe(token);
    }

    /// Diagnostic label of the underlying source.
    #[must_use]
    pub fn label(&self) -> &str {
        self.inner.label()
    }
}

impl<V> Clone for SourceRef<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for SourceRef<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRef")
            .field("label", &self.inner.label())
            .field("identity", &self.inner.identity())
            .finish()
    }
}

/// One external input: either a plain value or a reactive source.
pub enum Input<V> {
    /// Already resolved.
    Value(V),
    /// Resolved whenever the source emits.
    Source(SourceRef<V>),
}

impl<V> Input<V> {
    /// Bind a concrete source.
    pub fn source<S>(source: S) -> Self
    where
        S: ReactiveSource<V> + 'static,
    {
        Self::Source(SourceRef::new(source))
    }

    /// Whether this input is reactive.
    #[must_use]
    pub fn is_source(&self) -> bool {
        matches!(self, Self::Source(_))
    }

    /// The static value, if any.
    #[must_use]
    pub fn as_value(&self) -> Option<&V> {
        match self {
            Self::Value(v) => Some(v),
            Self::Source(_) => None,
        }
    }

    /// The source handle, if any.
    #[must_use]
    pub fn as_source(&self) -> Option<&SourceRef<V>> {
        match self {
            Self::Value(_) => None,
            Self::Source(s) => Some(s),
        }
    }
}

impl<V: Clone> Clone for Input<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(v) => Self::Value(v.clone()),
            Self::Source(s) => Self::Source(s.clone()),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Input<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Source(s) => f.debug_tuple("Source").field(&s.label()).finish(),
        }
    }
}

impl<V> From<SourceRef<V>> for Input<V> {
    fn from(source: SourceRef<V>) -> Self {
        Self::Source(source)
    }
}
