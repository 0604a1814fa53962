#![forbid(unsafe_code)]

//! Emission batching.
//!
//! A [`BatchScope`] marks one scheduling turn. While any scope is open on the
//! current thread, consolidated groups do not apply their patch on every
//! emission; they register a deferred flush instead. When the outermost scope
//! closes, each registered group flushes exactly once with its latest values.
//!
//! Sources still store their values immediately; only the write into render
//! state is deferred. Nested scopes are supported and only the outermost one
//! triggers the flush. A panicking flush propagates once the remaining
//! groups have flushed.
//!
//! ```
//! use ftui_reactive::batch::{BatchScope, is_batching};
//!
//! assert!(!is_batching());
//! {
//!     let _turn = BatchScope::new();
//!     assert!(is_batching());
//! }
//! assert!(!is_batching());
//! ```

use std::cell::RefCell;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};

use crate::consolidate::GroupId;

type Flush = Box<dyn FnOnce()>;

#[derive(Default)]
struct BatchContext {
    depth: u32,
    pending: Vec<(GroupId, Flush)>,
}

thread_local! {
    static BATCH: RefCell<BatchContext> = RefCell::new(BatchContext::default());
}

/// RAII guard for one batch. Not `Send`: batches are per-thread.
#[must_use = "the batch closes as soon as the scope is dropped"]
pub struct BatchScope {
    _not_send: PhantomData<*const ()>,
}

impl BatchScope {
    /// Open a (possibly nested) batch.
    pub fn new() -> Self {
        BATCH.with(|ctx| ctx.borrow_mut().depth += 1);
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Default for BatchScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        let flushes = BATCH.with(|ctx| {
            let mut ctx = ctx.borrow_mut();
            ctx.depth = ctx.depth.saturating_sub(1);
            if ctx.depth == 0 {
                std::mem::take(&mut ctx.pending)
            } else {
                Vec::new()
            }
        });
        if !flushes.is_empty() {
            tracing::trace!(groups = flushes.len(), "batch flush");
        }
        PendingFlushes(flushes.into_iter()).run();
    }
}

/// Flushes taken from a closing batch.
///
/// If one flush panics, the rest still run while the panic unwinds.
struct PendingFlushes(std::vec::IntoIter<(GroupId, Flush)>);

impl PendingFlushes {
    fn run(&mut self) {
        for (_, flush) in self.0.by_ref() {
            flush();
        }
    }
}

impl Drop for PendingFlushes {
    fn drop(&mut self) {
        for (group, flush) in self.0.by_ref() {
            if panic::catch_unwind(AssertUnwindSafe(flush)).is_err() {
                tracing::warn!(group = %group, "deferred flush panicked");
            }
        }
    }
}

/// Run `f` inside a batch and flush afterwards.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let _scope = BatchScope::new();
    f()
}

/// Whether a batch is open on this thread.
#[must_use]
pub fn is_batching() -> bool {
    BATCH.with(|ctx| ctx.borrow().depth > 0)
}

/// Register a deferred flush for `group`.
///
/// Returns `false` (and drops `flush`) when no batch is open, in which case
/// the caller flushes immediately. A group already registered in the current
/// batch is not registered twice.
pub(crate) fn defer(group: GroupId, flush: impl FnOnce() + 'static) -> bool {
    BATCH.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        if ctx.depth == 0 {
            return false;
        }
        if !ctx.pending.iter().any(|(id, _)| *id == group) {
            ctx.pending.push((group, Box::new(flush)));
        }
        true
    })
}
