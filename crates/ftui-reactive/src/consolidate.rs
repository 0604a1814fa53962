#![forbid(unsafe_code)]

//! Subscription consolidation.
//!
//! A [`ConsolidatedSubscription`] aggregates an ordered group of named
//! bindings into one subscription. Every emission from any source in the
//! group recomputes the complete value array and hands it to a single patch
//! sink, so N sources updating produce whole-group patches instead of N
//! partial writes.
//!
//! # Design
//!
//! The slot array lives in shared, reference-counted storage. Each source
//! callback holds only a `Weak` handle to it, so a source that outlives the
//! group cannot keep it alive. Build happens in two phases: all sources are
//! subscribed first (collecting any values delivered synchronously), then the
//! initial patch is applied once.
//!
//! # Invariants
//!
//! 1. Every source bound in the group is subscribed exactly once at build
//!    and unsubscribed exactly once at disposal.
//! 2. Disposal is idempotent; a disposed group never patches again, even if
//!    a source keeps emitting through a stale callback.
//! 3. Each flush applies one patch covering every key in group order.
//! 4. Inside a [`BatchScope`](crate::batch::BatchScope) a group flushes at
//!    most once per batch.
//!
//! # Failure Modes
//!
//! - **Sink panics**: propagates to the caller of the emission; the slot
//!   values are already updated and the next flush re-applies them.
//! - **Subscribe panics during build**: propagates; sources subscribed
//!   before it are unsubscribed while unwinding.
//! - **Source never emits**: its key stays unset forever. Not an error.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::batch;
use crate::source::{Input, SourceRef, SubscriptionToken};
use crate::state::Patch;

static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a consolidated group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(u64);

impl GroupId {
    /// Allocate a fresh id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// What a key in a group is bound to.
pub enum Binding<V> {
    /// Resolved immediately with a literal value.
    Static(V),
    /// Resolved whenever the source emits.
    Source(SourceRef<V>),
    /// Declared but not supplied; stays unset.
    Absent,
}

impl<V> Binding<V> {
    /// Binding for an optional external input.
    #[must_use]
    pub fn from_input(input: Option<&Input<V>>) -> Self
    where
        V: Clone,
    {
        match input {
            Some(Input::Value(v)) => Self::Static(v.clone()),
            Some(Input::Source(s)) => Self::Source(s.clone()),
            None => Self::Absent,
        }
    }

    /// Whether two bindings would produce the same subscription.
    ///
    /// Sources compare by identity, static values by equality.
    #[must_use]
    pub fn same_binding(&self, other: &Self) -> bool
    where
        V: PartialEq,
    {
        match (self, other) {
            (Self::Static(a), Self::Static(b)) => a == b,
            (Self::Source(a), Self::Source(b)) => a.same_source(b),
            (Self::Absent, Self::Absent) => true,
            _ => false,
        }
    }
}

impl<V: Clone> Clone for Binding<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(v) => Self::Static(v.clone()),
            Self::Source(s) => Self::Source(s.clone()),
            Self::Absent => Self::Absent,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Binding<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(v) => f.debug_tuple("Static").field(v).finish(),
            Self::Source(s) => f.debug_tuple("Source").field(&s.label()).finish(),
            Self::Absent => f.write_str("Absent"),
        }
    }
}

/// Receives each whole-group patch.
pub type PatchSink<V> = Rc<dyn Fn(Patch<V>)>;

struct GroupInner<V> {
    id: GroupId,
    keys: Vec<String>,
    slots: Vec<Option<V>>,
    sink: PatchSink<V>,
    /// Set while sources are being subscribed; emissions only fill slots.
    building: bool,
    live: bool,
    patches: u64,
}

impl<V: Clone + 'static> GroupInner<V> {
    fn snapshot(&self) -> Patch<V> {
        Patch::new(
            self.keys
                .iter()
                .cloned()
                .zip(self.slots.iter().cloned())
                .collect(),
        )
    }
}

/// One aggregated subscription over an ordered group of bindings.
///
/// Dropping the handle disposes it.
pub struct ConsolidatedSubscription<V: Clone + 'static> {
    inner: Rc<RefCell<GroupInner<V>>>,
    bindings: Vec<(SourceRef<V>, SubscriptionToken)>,
    /// The entries the group was built from, kept for rebuild comparisons.
    entries: Vec<(String, Binding<V>)>,
    disposed: bool,
}

impl<V: Clone + 'static> ConsolidatedSubscription<V> {
    /// Subscribe to every source in `entries` and apply the initial patch.
    ///
    /// An empty group subscribes nothing and applies no patch.
    pub fn build(entries: Vec<(String, Binding<V>)>, sink: PatchSink<V>) -> Self {
        let id = GroupId::next();
        let keys: Vec<String> = entries.iter().map(|(k, _)| k.clone()).collect();
        let slots: Vec<Option<V>> = entries
            .iter()
            .map(|(_, b)| match b {
                Binding::Static(v) => Some(v.clone()),
                Binding::Source(_) | Binding::Absent => None,
            })
            .collect();

        let inner = Rc::new(RefCell::new(GroupInner {
            id,
            keys,
            slots,
            sink,
            building: true,
            live: true,
            patches: 0,
        }));

        // If a subscribe panics, `Drop` releases the bindings made so far.
        let mut group = Self {
            inner,
            bindings: Vec::new(),
            entries,
            disposed: false,
        };
        for (index, (_, binding)) in group.entries.iter().enumerate() {
            let Binding::Source(source) = binding else {
                continue;
            };
            let weak = Rc::downgrade(&group.inner);
            let token = source.subscribe(Rc::new(move |value: &V| {
                on_emit(&weak, index, value);
            }));
            group.bindings.push((source.clone(), token));
        }

        group.inner.borrow_mut().building = false;

        tracing::debug!(
            group = %id,
            keys = group.entries.len(),
            sources = group.bindings.len(),
            "consolidated group built"
        );

        if !group.entries.is_empty() {
            flush(&group.inner);
        }
        group
    }

    /// Unsubscribe every source. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.inner.borrow_mut().live = false;
        let released = self.bindings.len();
        for (source, token) in self.bindings.drain(..) {
            source.unsubscribe(token);
        }
        tracing::debug!(group = %self.id(), released, "consolidated group disposed");
    }

    /// Group id.
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.inner.borrow().id
    }

    /// Keys in group order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().keys.clone()
    }

    /// Number of patches applied by this group.
    #[must_use]
    pub fn patches_applied(&self) -> u64 {
        self.inner.borrow().patches
    }

    /// Number of source subscriptions still held.
    #[must_use]
    pub fn live_bindings(&self) -> usize {
        self.bindings.len()
    }

    /// Whether [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether rebuilding from `entries` would yield an identical group.
    #[must_use]
    pub fn matches(&self, entries: &[(String, Binding<V>)]) -> bool
    where
        V: PartialEq,
    {
        !self.disposed
            && self.entries.len() == entries.len()
            && self
                .entries
                .iter()
                .zip(entries)
                .all(|((ka, ba), (kb, bb))| ka == kb && ba.same_binding(bb))
    }
}

impl<V: Clone + 'static> Drop for ConsolidatedSubscription<V> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<V: Clone + fmt::Debug + 'static> fmt::Debug for ConsolidatedSubscription<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ConsolidatedSubscription")
            .field("id", &inner.id)
            .field("keys", &inner.keys)
            .field("slots", &inner.slots)
            .field("patches", &inner.patches)
            .field("disposed", &self.disposed)
            .finish()
    }
}

fn on_emit<V: Clone + 'static>(weak: &Weak<RefCell<GroupInner<V>>>, index: usize, value: &V) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let (id, building) = {
        let mut g = inner.borrow_mut();
        if !g.live {
            return;
        }
        g.slots[index] = Some(value.clone());
        (g.id, g.building)
    };
    if building {
        return;
    }
    let deferred = Rc::downgrade(&inner);
    let queued = batch::defer(id, move || {
        if let Some(inner) = deferred.upgrade() {
            flush(&inner);
        }
    });
    if !queued {
        flush(&inner);
    }
}

fn flush<V: Clone + 'static>(inner: &Rc<RefCell<GroupInner<V>>>) {
    let (patch, sink, id) = {
        let mut g = inner.borrow_mut();
        if !g.live {
            return;
        }
        g.patches += 1;
        (g.snapshot(), Rc::clone(&g.sink), g.id)
    };
    tracing::trace!(
        group = %id,
        keys = patch.len(),
        resolved = patch.resolved(),
        "apply patch"
    );
    sink(patch);
}
