#![forbid(unsafe_code)]

//! A reactive source advanced by an external clock.
//!
//! [`Ticker`] stays unresolved until the host calls [`Ticker::tick`] for the
//! first time. Each tick produces a value from the tick index and emits it to
//! every subscriber. The host decides when ticks happen (timer, frame loop,
//! test); the ticker only records when the last one occurred.

use std::cell::RefCell;
use std::rc::Rc;

use web_time::{Duration, Instant};

use crate::observable::Observable;
use crate::source::{EmitFn, ReactiveSource, SourceRef, SubscriptionToken};

struct TickState {
    ticks: u64,
    last_tick: Option<Instant>,
    started: Instant,
}

/// Reactive source that emits `produce(tick_index)` on every tick.
pub struct Ticker<V> {
    value: Observable<V>,
    produce: Rc<dyn Fn(u64) -> V>,
    state: Rc<RefCell<TickState>>,
}

impl<V> Clone for Ticker<V> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            produce: Rc::clone(&self.produce),
            state: Rc::clone(&self.state),
        }
    }
}

impl<V: Clone + 'static> Ticker<V> {
    /// Create a ticker; nothing is emitted before the first tick.
    pub fn new(produce: impl Fn(u64) -> V + 'static) -> Self {
        Self {
            value: Observable::pending().labelled("ticker"),
            produce: Rc::new(produce),
            state: Rc::new(RefCell::new(TickState {
                ticks: 0,
                last_tick: None,
                started: Instant::now(),
            })),
        }
    }

    /// Advance by one tick and emit.
    pub fn tick(&self) -> V {
        let index = {
            let mut state = self.state.borrow_mut();
            let index = state.ticks;
            state.ticks += 1;
            state.last_tick = Some(Instant::now());
            index
        };
        let value = (self.produce)(index);
        self.value.set(value.clone());
        value
    }

    /// Number of ticks so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.state.borrow().ticks
    }

    /// Time of the most recent tick.
    #[must_use]
    pub fn last_tick(&self) -> Option<Instant> {
        self.state.borrow().last_tick
    }

    /// Time since the ticker was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.state.borrow().started.elapsed()
    }

    /// Last emitted value.
    #[must_use]
    pub fn current(&self) -> Option<V> {
        self.value.get()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.value.subscriber_count()
    }

    #[must_use]
    pub fn to_source(&self) -> SourceRef<V> {
        SourceRef::new(self.clone())
    }
}

impl<V: Clone + 'static> ReactiveSource<V> for Ticker<V> {
    fn subscribe(&self, on_emit: EmitFn<V>) -> SubscriptionToken {
        self.value.subscribe(on_emit)
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        self.value.unsubscribe(token);
    }

    fn label(&self) -> &str {
        "ticker"
    }

    fn identity(&self) -> usize {
        self.value.identity()
    }
}
