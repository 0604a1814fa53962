#![forbid(unsafe_code)]

//! Reactive inputs for FrankenTUI components.
//!
//! A component declares which of its inputs may be reactive sources and which
//! sources it tracks for its whole lifetime. This crate keeps the component's
//! render state in step with those sources:
//!
//! - [`ConsolidatedSubscription`]: one subscription per input group; every
//!   emission produces one whole-group patch.
//! - [`LifecycleAdapter`]: builds, rebuilds and disposes the groups on mount,
//!   input replacement and unmount.
//! - [`readiness`]: every tracked key has a value.
//! - [`RenderPaths`] / [`render::dispatch`]: ready vs. unready rendering.
//! - [`ComponentInstance`] + [`Host`]: the pieces wired to the host contract.
//!
//! # Architecture
//!
//! Everything is single-threaded (`Rc<RefCell<..>>`). Source callbacks hold
//! `Weak` handles to their group, and groups hold a `Weak` handle to render
//! state, so nothing a source retains can keep a detached component alive.
//! The patch sink is the only writer of [`RenderState`].
//!
//! # Invariants
//!
//! 1. At most one live group per kind (fixed, input) per component.
//! 2. Every subscribe is paired with exactly one unsubscribe.
//! 3. A tracked key is unset or holds the latest value of its current source.
//! 4. Readiness reads render state only.
//! 5. Within a [`BatchScope`], a group patches at most once.

pub mod batch;
pub mod component;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod host;
pub mod inputs;
pub mod lifecycle;
pub mod observable;
pub mod readiness;
pub mod render;
pub mod source;
pub mod state;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
pub mod ticker;

pub use batch::{BatchScope, batch};
pub use component::{ComponentInstance, HostComponent};
pub use config::{RebuildPolicy, ReactiveConfig};
pub use consolidate::{Binding, ConsolidatedSubscription, GroupId};
pub use error::{ReactiveError, Result};
pub use host::Host;
pub use inputs::Inputs;
pub use lifecycle::{Declaration, HookCx, LifecycleAdapter, LifecycleEvent, LifecycleStats, Phase};
pub use observable::Observable;
pub use render::{RenderPaths, RenderView};
pub use source::{EmitFn, Input, ReactiveSource, SourceRef, SubscriptionToken};
pub use state::{Patch, RenderState};
pub use ticker::Ticker;
