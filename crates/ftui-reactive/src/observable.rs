#![forbid(unsafe_code)]

//! A shared, version-tracked value that may start out unresolved.
//!
//! [`Observable<V>`] is the stock [`ReactiveSource`] shipped with this crate.
//! It is cheap to clone (all clones share one inner cell) and delivers its
//! current value to new subscribers immediately when resolved.
//!
//! # Invariants
//!
//! 1. `version` increments exactly once per successful `set`.
//! 2. Subscribers are notified in registration order.
//! 3. A subscriber removed during a notification cycle is not called again
//!    in that cycle if it has not been reached yet.
//! 4. An unresolved observable never notifies.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::source::{EmitFn, ReactiveSource, SourceRef, SubscriptionToken};

struct ObservableInner<V> {
    value: Option<V>,
    version: u64,
    next_token: u64,
    subscribers: Vec<(SubscriptionToken, EmitFn<V>)>,
}

/// Shared reactive value.
pub struct Observable<V> {
    inner: Rc<RefCell<ObservableInner<V>>>,
    label: Rc<str>,
}

impl<V> Clone for Observable<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            label: Rc::clone(&self.label),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Observable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("label", &self.label)
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl<V: Clone + 'static> Observable<V> {
    /// Create an already resolved observable.
    #[must_use]
    pub fn new(value: V) -> Self {
        Self::with_state(Some(value))
    }

    /// Create an observable that has not produced a value yet.
    #[must_use]
    pub fn pending() -> Self {
        Self::with_state(None)
    }

    fn with_state(value: Option<V>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                next_token: 1,
                subscribers: Vec::new(),
            })),
            label: Rc::from("observable"),
        }
    }

    /// Set the diagnostic label.
    #[must_use]
    pub fn labelled(mut self, label: &str) -> Self {
        self.label = Rc::from(label);
        self
    }

    /// Resolve or update the value and notify every subscriber.
    pub fn set(&self, value: V) {
        let callbacks: Vec<EmitFn<V>> = {
            let mut inner = self.inner.borrow_mut();
            inner.value = Some(value.clone());
            inner.version += 1;
            inner
                .subscribers
                .iter()
                .map(|(_, cb)| Rc::clone(cb))
                .collect()
        };
        for cb in &callbacks {
            if self.still_subscribed(cb) {
                cb(&value);
            }
        }
    }

    fn still_subscribed(&self, cb: &EmitFn<V>) -> bool {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .any(|(_, live)| Rc::ptr_eq(live, cb))
    }

    /// Current value, if resolved.
    #[must_use]
    pub fn get(&self) -> Option<V> {
        self.inner.borrow().value.clone()
    }

    /// Whether a value has been produced.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.inner.borrow().value.is_some()
    }

    /// Number of successful `set` calls.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Shared handle for binding this observable to an input.
    #[must_use]
    pub fn to_source(&self) -> SourceRef<V> {
        SourceRef::new(self.clone())
    }
}

impl<V: Clone + PartialEq + 'static> Observable<V> {
    /// Like [`set`](Self::set), but a no-op when the value is unchanged.
    ///
    /// Returns whether subscribers were notified.
    pub fn set_if_changed(&self, value: V) -> bool {
        if self.inner.borrow().value.as_ref() == Some(&value) {
            return false;
        }
        self.set(value);
        true
    }
}

impl<V: Clone + 'static> ReactiveSource<V> for Observable<V> {
    fn subscribe(&self, on_emit: EmitFn<V>) -> SubscriptionToken {
        let (token, current) = {
            let mut inner = self.inner.borrow_mut();
            let token = SubscriptionToken::new(inner.next_token);
            inner.next_token += 1;
            inner.subscribers.push((token, Rc::clone(&on_emit)));
            (token, inner.value.clone())
        };
        if let Some(value) = current {
            on_emit(&value);
        }
        token
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        self.inner
            .borrow_mut()
            .subscribers
            .retain(|(t, _)| *t != token);
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn identity(&self) -> usize {
        Rc::as_ptr(&self.inner).cast::<()>() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn collector() -> (Rc<RefCell<Vec<i32>>>, EmitFn<i32>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, Rc::new(move |v: &i32| sink.borrow_mut().push(*v)))
    }

    #[test]
    fn resolved_value_is_delivered_on_subscribe() {
        let obs = Observable::new(5);
        let (seen, cb) = collector();
        let _token = obs.subscribe(cb);
        assert_eq!(*seen.borrow(), vec![5]);
    }

    #[test]
    fn pending_value_delivers_nothing_until_set() {
        let obs = Observable::pending();
        let (seen, cb) = collector();
        let _token = obs.subscribe(cb);
        assert!(seen.borrow().is_empty());
        assert!(!obs.is_resolved());

        obs.set(9);
        assert_eq!(*seen.borrow(), vec![9]);
        assert_eq!(obs.get(), Some(9));
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let obs = Observable::pending();
        let (seen, cb) = collector();
        let token = obs.subscribe(cb);
        obs.set(1);
        obs.unsubscribe(token);
        obs.set(2);
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn unknown_token_is_ignored() {
        let obs: Observable<i32> = Observable::pending();
        obs.unsubscribe(SubscriptionToken::new(99));
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn subscribers_notified_in_registration_order() {
        let obs = Observable::pending();
        let order = Rc::new(RefCell::new(Vec::new()));
        for id in 0..3 {
            let order = Rc::clone(&order);
            let _ = obs.subscribe(Rc::new(move |_: &i32| order.borrow_mut().push(id)));
        }
        obs.set(0);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn subscriber_removed_mid_cycle_is_skipped() {
        let obs = Observable::pending();
        let second_token = Rc::new(Cell::new(None));
        let calls = Rc::new(Cell::new(0));

        let obs_for_first = obs.clone();
        let token_for_first = Rc::clone(&second_token);
        let _first = obs.subscribe(Rc::new(move |_: &i32| {
            if let Some(t) = token_for_first.get() {
                obs_for_first.unsubscribe(t);
            }
        }));
        let calls_for_second = Rc::clone(&calls);
        let t = obs.subscribe(Rc::new(move |_: &i32| {
            calls_for_second.set(calls_for_second.get() + 1);
        }));
        second_token.set(Some(t));

        obs.set(1);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn set_if_changed_skips_equal_values() {
        let obs = Observable::new(3);
        assert!(!obs.set_if_changed(3));
        assert_eq!(obs.version(), 0);
        assert!(obs.set_if_changed(4));
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn clones_share_state() {
        let a = Observable::pending();
        let b = a.clone();
        a.set(11);
        assert_eq!(b.get(), Some(11));
        assert!(a.to_source().same_source(&b.to_source()));
        assert!(!a.to_source().same_source(&Observable::<i32>::pending().to_source()));
    }

    #[test]
    fn debug_format_mentions_label() {
        let obs = Observable::new(1).labelled("clock");
        let dbg = format!("{obs:?}");
        assert!(dbg.contains("clock"));
        assert!(dbg.contains("Observable"));
    }
}
