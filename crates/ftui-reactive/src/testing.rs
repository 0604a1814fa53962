#![forbid(unsafe_code)]

//! Test helpers (enabled with the `test-helpers` feature).
//!
//! [`ProbeSource`] is a reactive source that records every subscribe and
//! unsubscribe, so tests can assert exactly-once pairing and detect leaks.

use std::cell::RefCell;
use std::rc::Rc;

use crate::source::{EmitFn, ReactiveSource, SourceRef, SubscriptionToken};

struct ProbeInner<V> {
    value: Option<V>,
    next_token: u64,
    live: Vec<(SubscriptionToken, EmitFn<V>)>,
    retired: Vec<EmitFn<V>>,
    subscribes: usize,
    unsubscribes: usize,
    double_unsubscribes: usize,
}

/// Instrumented reactive source.
pub struct ProbeSource<V> {
    inner: Rc<RefCell<ProbeInner<V>>>,
}

impl<V> Clone for ProbeSource<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: Clone + 'static> ProbeSource<V> {
    /// A probe that has not resolved yet.
    #[must_use]
    pub fn pending() -> Self {
        Self::with_value(None)
    }

    /// A probe that delivers `value` on subscribe.
    #[must_use]
    pub fn resolved(value: V) -> Self {
        Self::with_value(Some(value))
    }

    fn with_value(value: Option<V>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ProbeInner {
                value,
                next_token: 1,
                live: Vec::new(),
                retired: Vec::new(),
                subscribes: 0,
                unsubscribes: 0,
                double_unsubscribes: 0,
            })),
        }
    }

    /// Emit to every live subscriber.
    pub fn emit(&self, value: V) {
        let callbacks: Vec<EmitFn<V>> = {
            let mut inner = self.inner.borrow_mut();
            inner.value = Some(value.clone());
            inner.live.iter().map(|(_, cb)| Rc::clone(cb)).collect()
        };
        for cb in callbacks {
            cb(&value);
        }
    }

    /// Emit to live subscribers and to callbacks that were already removed,
    /// imitating a source that delivers late after unsubscribe.
    pub fn emit_to_all_ever(&self, value: V) {
        let callbacks: Vec<EmitFn<V>> = {
            let inner = self.inner.borrow();
            inner
                .live
                .iter()
                .map(|(_, cb)| Rc::clone(cb))
                .chain(inner.retired.iter().cloned())
                .collect()
        };
        for cb in callbacks {
            cb(&value);
        }
    }

    /// Total subscribe calls.
    #[must_use]
    pub fn subscribes(&self) -> usize {
        self.inner.borrow().subscribes
    }

    /// Total unsubscribe calls that removed a live subscription.
    #[must_use]
    pub fn unsubscribes(&self) -> usize {
        self.inner.borrow().unsubscribes
    }

    /// Unsubscribe calls with a token that was not live.
    #[must_use]
    pub fn double_unsubscribes(&self) -> usize {
        self.inner.borrow().double_unsubscribes
    }

    /// Subscriptions currently held.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.inner.borrow().live.len()
    }

    /// Shared handle for binding the probe to an input.
    #[must_use]
    pub fn to_source(&self) -> SourceRef<V> {
        SourceRef::new(self.clone())
    }
}

impl<V: Clone + 'static> ReactiveSource<V> for ProbeSource<V> {
    fn subscribe(&self, on_emit: EmitFn<V>) -> SubscriptionToken {
        let (token, current) = {
            let mut inner = self.inner.borrow_mut();
            let token = SubscriptionToken::new(inner.next_token);
            inner.next_token += 1;
            inner.subscribes += 1;
            inner.live.push((token, Rc::clone(&on_emit)));
            (token, inner.value.clone())
        };
        if let Some(value) = current {
            on_emit(&value);
        }
        token
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        let mut inner = self.inner.borrow_mut();
        match inner.live.iter().position(|(t, _)| *t == token) {
            Some(pos) => {
                let (_, cb) = inner.live.remove(pos);
                inner.retired.push(cb);
                inner.unsubscribes += 1;
            }
            None => inner.double_unsubscribes += 1,
        }
    }

    fn label(&self) -> &str {
        "probe"
    }

    fn identity(&self) -> usize {
        Rc::as_ptr(&self.inner).cast::<()>() as usize
    }
}
